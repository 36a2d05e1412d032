//! First-fit search for free rectangles.

use cardgrid_core::{GridPosition, GridRect, GridSize};

use crate::item::GridItem;
use crate::options::GridOptions;

/// Rows scanned when `max_row` is unbounded.
pub const UNBOUNDED_SCAN_ROWS: u16 = 100;

/// Whether `rect` overlaps no item other than `exclude` (an index into `items`).
#[must_use]
pub fn is_free(items: &[GridItem], rect: GridRect, exclude: Option<usize>) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(idx, item)| Some(idx) == exclude || !item.rect().intersects(&rect))
}

/// Lowest occupied row boundary (exclusive), ignoring `exclude`.
#[must_use]
pub fn bottom_row(items: &[GridItem], exclude: Option<usize>) -> u16 {
    items
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != exclude)
        .map(|(_, item)| item.rect().bottom())
        .max()
        .unwrap_or(0)
}

/// Row-major scan for the first free `size` rectangle.
///
/// Rows run from 0 to `max_row - h` on bounded grids, or up to
/// [`UNBOUNDED_SCAN_ROWS`] otherwise. Columns run from 0 to `column - w`.
#[must_use]
pub fn find_position(
    items: &[GridItem],
    size: GridSize,
    exclude: Option<usize>,
    options: &GridOptions,
) -> Option<GridPosition> {
    if size.w > options.column {
        return None;
    }
    let last_x = options.column - size.w;
    let row_limit = if options.is_bounded() {
        if size.h > options.max_row {
            return None;
        }
        options.max_row - size.h + 1
    } else {
        UNBOUNDED_SCAN_ROWS
    };

    (0..row_limit).find_map(|y| {
        (0..=last_x)
            .map(|x| GridPosition::new(x, y))
            .find(|pos| is_free(items, GridRect::from_parts(*pos, size), exclude))
    })
}

/// First free position, or the append slot below the lowest item.
///
/// Returns `None` only on a bounded grid with no room left.
#[must_use]
pub fn place(
    items: &[GridItem],
    size: GridSize,
    exclude: Option<usize>,
    options: &GridOptions,
) -> Option<GridPosition> {
    if let Some(pos) = find_position(items, size, exclude, options) {
        return Some(pos);
    }
    let y = bottom_row(items, exclude);
    if options.is_bounded() && y.saturating_add(size.h) > options.max_row {
        return None;
    }
    Some(GridPosition::new(0, y))
}

/// Settle every item after a column or row-limit change.
///
/// Each item is clamped into the new bounds. Fixed items keep their clamped
/// rectangle, except a locked item that now overlaps an earlier locked item,
/// which is re-placed like a movable one. Movable items are visited in
/// `(y, x)` order and slide down their own column to the first free row, or
/// go through [`place`] when the column has no room. Returns the index of the
/// first item that cannot be placed.
pub fn reflow(items: &mut [GridItem], options: &GridOptions) -> Result<(), usize> {
    for item in items.iter_mut() {
        let rect = item.clamp_rect(item.rect(), options);
        item.set_rect(rect);
    }

    // Only fixed items and already settled movers are obstacles.
    let mut settled: Vec<bool> = items.iter().map(|item| item.is_static).collect();
    for i in 0..items.len() {
        if items[i].is_static || !items[i].locked {
            continue;
        }
        let rect = items[i].rect();
        let clash = items[..i]
            .iter()
            .enumerate()
            .any(|(j, other)| settled[j] && !other.is_static && other.rect().intersects(&rect));
        settled[i] = !clash;
    }

    let mut order: Vec<usize> = (0..items.len()).filter(|&i| !settled[i]).collect();
    order.sort_by_key(|&i| (items[i].y, items[i].x));
    for idx in order {
        let rect = items[idx].rect();
        let blocked_by_settled = |candidate: GridRect, items: &[GridItem]| {
            items
                .iter()
                .enumerate()
                .any(|(i, other)| settled[i] && i != idx && other.rect().intersects(&candidate))
        };

        let mut target = None;
        let max_y = if options.is_bounded() {
            options.max_row.saturating_sub(rect.h)
        } else {
            u16::MAX - rect.h
        };
        let mut y = rect.y;
        while y <= max_y {
            let candidate = GridRect::new(rect.x, y, rect.w, rect.h);
            if !blocked_by_settled(candidate, &*items) {
                target = Some(candidate);
                break;
            }
            y += 1;
        }

        let target = match target {
            Some(target) => target,
            None => {
                let obstacles: Vec<GridItem> = items
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| settled[*i])
                    .map(|(_, item)| item.clone())
                    .collect();
                let pos = place(&obstacles, rect.size(), None, options).ok_or(idx)?;
                GridRect::from_parts(pos, rect.size())
            }
        };
        items[idx].set_rect(target);
        settled[idx] = true;
    }
    Ok(())
}
