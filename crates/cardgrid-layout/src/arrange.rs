//! Whole-layout arrangements and alignment guides.
//!
//! [`arrange`] computes a target rectangle for every movable item under one
//! [`Arrangement`]. Static and locked items keep their rectangles. `Compact`
//! packs around them; the other arrangements ignore them and leave any
//! overlap to [`crate::LayoutStore::arrange`], which re-settles the result.
//!
//! [`snap_to_guides`] and [`alignment_guides`] are pure geometry for hosts
//! that draw alignment lines while a card is dragged.

use cardgrid_core::{GridPosition, GridRect, GridSize};
use serde::{Deserialize, Serialize};

use crate::item::GridItem;
use crate::options::GridOptions;
use crate::placement;

/// Default distance, in cells, within which an edge snaps to a guide.
pub const DEFAULT_SNAP_THRESHOLD: u16 = 10;

const MASONRY_TRACKS: u16 = 3;
const COLUMN_TRACKS: u16 = 4;
const GRID_SPACING: u16 = 1;

/// Automatic arrangement applied to every movable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrangement {
    /// Largest items first, each in the first free slot.
    Compact,
    /// Left to right in store order, wrapping at the last column.
    Flow,
    /// Equal square cells on a near-square lattice.
    Grid,
    /// Equal-width tracks; each item joins the shortest track.
    Masonry,
    /// Equal-width tracks filled round-robin.
    Columns,
}

impl Arrangement {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Flow => "flow",
            Self::Grid => "grid",
            Self::Masonry => "masonry",
            Self::Columns => "columns",
        }
    }
}

/// Tuning for [`arrange`].
///
/// `spacing` is the empty cells left between neighbours by `Flow` (default
/// 0) and `Grid` (default 1). `tracks` is the track count for `Masonry`
/// (default 3) and `Columns` (default 4).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrangeOptions {
    pub spacing: Option<u16>,
    pub tracks: Option<u16>,
}

impl ArrangeOptions {
    #[must_use]
    pub const fn with_spacing(mut self, spacing: u16) -> Self {
        self.spacing = Some(spacing);
        self
    }

    #[must_use]
    pub const fn with_tracks(mut self, tracks: u16) -> Self {
        self.tracks = Some(tracks);
        self
    }
}

/// Target rectangle for every item, in store order.
///
/// Targets are not clamped to item constraints and may overlap fixed items.
#[must_use]
pub fn arrange(
    items: &[GridItem],
    arrangement: Arrangement,
    tuning: &ArrangeOptions,
    options: &GridOptions,
) -> Vec<GridRect> {
    let mut targets: Vec<GridRect> = items.iter().map(GridItem::rect).collect();
    let movable: Vec<usize> = (0..items.len()).filter(|&i| !items[i].is_fixed()).collect();
    if movable.is_empty() {
        return targets;
    }
    let column = options.column;
    match arrangement {
        Arrangement::Compact => {
            let mut order = movable;
            order.sort_by_key(|&i| std::cmp::Reverse(items[i].rect().area()));
            let mut obstacles: Vec<GridItem> =
                items.iter().filter(|item| item.is_fixed()).cloned().collect();
            for idx in order {
                let size = items[idx].clamp_size(items[idx].size(), GridPosition::new(0, 0), options);
                let Some(pos) = placement::place(&obstacles, size, None, options) else {
                    continue;
                };
                let rect = GridRect::from_parts(pos, size);
                targets[idx] = rect;
                let mut placed = items[idx].clone();
                placed.set_rect(rect);
                obstacles.push(placed);
            }
        }
        Arrangement::Flow => {
            let spacing = tuning.spacing.unwrap_or(0);
            let (mut x, mut y, mut row_h) = (0_u16, 0_u16, 0_u16);
            for idx in movable {
                let w = items[idx].w.min(column);
                let h = items[idx].h;
                if x > 0 && u32::from(x) + u32::from(w) > u32::from(column) {
                    x = 0;
                    y = y.saturating_add(row_h).saturating_add(spacing);
                    row_h = 0;
                }
                targets[idx] = GridRect::new(x, y, w, h);
                x = x.saturating_add(w).saturating_add(spacing);
                row_h = row_h.max(h);
            }
        }
        Arrangement::Grid => {
            let spacing = tuning.spacing.unwrap_or(GRID_SPACING);
            let per_row = lattice_width(movable.len());
            let side = grid_cell(movable.len(), spacing, column).w;
            let stride = side.saturating_add(spacing);
            for (n, idx) in movable.into_iter().enumerate() {
                let n = u16::try_from(n).unwrap_or(u16::MAX);
                let x = (n % per_row).saturating_mul(stride);
                let y = (n / per_row).saturating_mul(stride);
                targets[idx] = GridRect::new(x, y, side, side);
            }
        }
        Arrangement::Masonry | Arrangement::Columns => {
            let default = if arrangement == Arrangement::Masonry {
                MASONRY_TRACKS
            } else {
                COLUMN_TRACKS
            };
            let tracks = tuning.tracks.unwrap_or(default).clamp(1, column.max(1));
            let track_w = (column / tracks).max(1);
            let mut heights = vec![0_u16; usize::from(tracks)];
            for (n, idx) in movable.into_iter().enumerate() {
                let track = if arrangement == Arrangement::Masonry {
                    shortest_track(&heights)
                } else {
                    n % heights.len()
                };
                let h = items[idx].h;
                let x = u16::try_from(track).unwrap_or(0).saturating_mul(track_w);
                targets[idx] = GridRect::new(x, heights[track], track_w, h);
                heights[track] = heights[track].saturating_add(h);
            }
        }
    }
    targets
}

/// Smallest `k` with `k * k >= count`.
fn lattice_width(count: usize) -> u16 {
    let mut k: u16 = 1;
    while usize::from(k) * usize::from(k) < count {
        k += 1;
    }
    k
}

/// First track with the least height.
fn shortest_track(heights: &[u16]) -> usize {
    heights
        .iter()
        .enumerate()
        .min_by_key(|&(i, &h)| (h, i))
        .map_or(0, |(i, _)| i)
}

/// Per-axis position a rectangle snaps to. `None` leaves that axis alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTarget {
    pub x: Option<u16>,
    pub y: Option<u16>,
}

impl SnapTarget {
    /// `rect` moved to the snapped position.
    #[must_use]
    pub fn apply(self, rect: GridRect) -> GridRect {
        GridRect::from_parts(
            GridPosition::new(self.x.unwrap_or(rect.x), self.y.unwrap_or(rect.y)),
            rect.size(),
        )
    }
}

/// Align `rect` with the nearest edge of any of `others`.
///
/// On each axis the leading edges (left/top) and the trailing edges
/// (right/bottom) are compared; the closest match strictly within
/// `threshold` cells wins, earlier candidates winning ties.
#[must_use]
pub fn snap_to_guides(
    rect: GridRect,
    others: impl IntoIterator<Item = GridRect>,
    threshold: u16,
) -> SnapTarget {
    let mut snapped = SnapTarget::default();
    let (mut best_x, mut best_y) = (u16::MAX, u16::MAX);
    for other in others {
        let leading = rect.x.abs_diff(other.x);
        if leading < threshold && leading < best_x {
            snapped.x = Some(other.x);
            best_x = leading;
        }
        let trailing = rect.right().abs_diff(other.right());
        if trailing < threshold && trailing < best_x && other.right() >= rect.w {
            snapped.x = Some(other.right() - rect.w);
            best_x = trailing;
        }

        let top = rect.y.abs_diff(other.y);
        if top < threshold && top < best_y {
            snapped.y = Some(other.y);
            best_y = top;
        }
        let bottom = rect.bottom().abs_diff(other.bottom());
        if bottom < threshold && bottom < best_y && other.bottom() >= rect.h {
            snapped.y = Some(other.bottom() - rect.h);
            best_y = bottom;
        }
    }
    snapped
}

/// Orientation of an alignment guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuideAxis {
    /// A column boundary.
    Vertical,
    /// A row boundary.
    Horizontal,
}

/// A grid line `rect` lies close to, for the host to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guide {
    pub axis: GuideAxis,
    /// Column or row boundary index.
    pub position: u16,
}

/// Every edge of `others` that `rect`'s matching edge lies within
/// `threshold` cells of, without duplicates, in discovery order.
#[must_use]
pub fn alignment_guides(
    rect: GridRect,
    others: impl IntoIterator<Item = GridRect>,
    threshold: u16,
) -> Vec<Guide> {
    let mut guides = Vec::new();
    let mut push = |axis, position| {
        let guide = Guide { axis, position };
        if !guides.contains(&guide) {
            guides.push(guide);
        }
    };
    for other in others {
        if rect.x.abs_diff(other.x) < threshold {
            push(GuideAxis::Vertical, other.x);
        }
        if rect.right().abs_diff(other.right()) < threshold {
            push(GuideAxis::Vertical, other.right());
        }
        if rect.y.abs_diff(other.y) < threshold {
            push(GuideAxis::Horizontal, other.y);
        }
        if rect.bottom().abs_diff(other.bottom()) < threshold {
            push(GuideAxis::Horizontal, other.bottom());
        }
    }
    guides
}

/// Size of the lattice cell [`Arrangement::Grid`] uses for `count` items.
#[must_use]
pub fn grid_cell(count: usize, spacing: u16, column: u16) -> GridSize {
    let per_row = lattice_width(count);
    let side = (column.saturating_sub((per_row - 1).saturating_mul(spacing)) / per_row).max(1);
    GridSize::new(side, side)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, x: u16, y: u16, w: u16, h: u16) -> GridItem {
        GridItem::new(id, w, h).at(x, y)
    }

    fn arranged(items: &[GridItem], arrangement: Arrangement, tuning: ArrangeOptions) -> Vec<GridRect> {
        arrange(items, arrangement, &tuning, &GridOptions::default())
    }

    #[test]
    fn compact_places_largest_first() {
        let items = vec![item("s", 5, 5, 2, 1), item("l", 0, 9, 6, 2), item("m", 3, 3, 4, 2)];
        let rects = arranged(&items, Arrangement::Compact, ArrangeOptions::default());
        assert_eq!(rects[1], GridRect::new(0, 0, 6, 2));
        assert_eq!(rects[2], GridRect::new(6, 0, 4, 2));
        assert_eq!(rects[0], GridRect::new(10, 0, 2, 1));
    }

    #[test]
    fn compact_packs_around_fixed_items() {
        let items = vec![item("wall", 0, 0, 6, 1).with_static(true), item("a", 0, 4, 6, 1)];
        let rects = arranged(&items, Arrangement::Compact, ArrangeOptions::default());
        assert_eq!(rects[0], GridRect::new(0, 0, 6, 1));
        assert_eq!(rects[1], GridRect::new(6, 0, 6, 1));
    }

    #[test]
    fn flow_wraps_at_last_column() {
        let items = vec![item("a", 0, 0, 5, 1), item("b", 0, 0, 5, 2), item("c", 0, 0, 5, 1)];
        let rects = arranged(&items, Arrangement::Flow, ArrangeOptions::default());
        assert_eq!(rects, vec![
            GridRect::new(0, 0, 5, 1),
            GridRect::new(5, 0, 5, 2),
            GridRect::new(0, 2, 5, 1),
        ]);

        let spaced = arranged(&items, Arrangement::Flow, ArrangeOptions::default().with_spacing(1));
        assert_eq!(spaced[1], GridRect::new(6, 0, 5, 2));
        assert_eq!(spaced[2], GridRect::new(0, 3, 5, 1));
    }

    #[test]
    fn grid_uses_square_cells() {
        let items: Vec<GridItem> = (0..5).map(|i| item(&format!("i{i}"), 0, 0, 1, 1)).collect();
        let rects = arranged(&items, Arrangement::Grid, ArrangeOptions::default());
        // Three per row: (12 - 2) / 3 = 3 wide, stride 4.
        assert_eq!(grid_cell(5, 1, 12), GridSize::new(3, 3));
        assert_eq!(rects[0], GridRect::new(0, 0, 3, 3));
        assert_eq!(rects[2], GridRect::new(8, 0, 3, 3));
        assert_eq!(rects[3], GridRect::new(0, 4, 3, 3));
    }

    #[test]
    fn masonry_fills_shortest_track() {
        let items = vec![
            item("a", 0, 0, 1, 3),
            item("b", 0, 0, 1, 1),
            item("c", 0, 0, 1, 1),
            item("d", 0, 0, 1, 2),
        ];
        let rects = arranged(&items, Arrangement::Masonry, ArrangeOptions::default());
        assert_eq!(rects[0], GridRect::new(0, 0, 4, 3));
        assert_eq!(rects[1], GridRect::new(4, 0, 4, 1));
        assert_eq!(rects[2], GridRect::new(8, 0, 4, 1));
        assert_eq!(rects[3], GridRect::new(4, 1, 4, 2));
    }

    #[test]
    fn columns_fill_round_robin() {
        let items: Vec<GridItem> = (0..5).map(|i| item(&format!("i{i}"), 0, 0, 1, 2)).collect();
        let rects = arranged(&items, Arrangement::Columns, ArrangeOptions::default());
        assert_eq!(rects[3], GridRect::new(9, 0, 3, 2));
        assert_eq!(rects[4], GridRect::new(0, 2, 3, 2));

        let two = arranged(&items, Arrangement::Columns, ArrangeOptions::default().with_tracks(2));
        assert_eq!(two[1], GridRect::new(6, 0, 6, 2));
    }

    #[test]
    fn fixed_items_keep_their_rects() {
        let items = vec![item("l", 3, 3, 2, 2).with_locked(true), item("a", 7, 7, 2, 2)];
        for arrangement in [
            Arrangement::Flow,
            Arrangement::Grid,
            Arrangement::Masonry,
            Arrangement::Columns,
        ] {
            assert_eq!(arranged(&items, arrangement, ArrangeOptions::default())[0], items[0].rect());
        }
    }

    #[test]
    fn snap_prefers_closest_edge() {
        let rect = GridRect::new(5, 3, 2, 2);
        let others = [GridRect::new(2, 0, 2, 2), GridRect::new(4, 8, 4, 1)];
        let snap = snap_to_guides(rect, others, DEFAULT_SNAP_THRESHOLD);
        // Left edges 5 and 4 and right edges 7 and 8 are both one apart;
        // the left edge is checked first.
        assert_eq!(snap.x, Some(4));
        assert_eq!(snap.y, Some(0));
        assert_eq!(snap.apply(rect), GridRect::new(4, 0, 2, 2));

        let far = snap_to_guides(rect, [GridRect::new(0, 0, 1, 1)], 2);
        assert_eq!(far, SnapTarget::default());
    }

    #[test]
    fn guides_list_nearby_edges_once() {
        let rect = GridRect::new(4, 0, 4, 2);
        let guides = alignment_guides(rect, [GridRect::new(4, 2, 4, 2), GridRect::new(4, 6, 4, 1)], 1);
        assert_eq!(guides, vec![
            Guide {
                axis: GuideAxis::Vertical,
                position: 4
            },
            Guide {
                axis: GuideAxis::Vertical,
                position: 8
            },
        ]);
    }
}
