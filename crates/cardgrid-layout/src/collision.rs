//! Collision detection and resolution.
//!
//! # Resolution
//!
//! One item, the *mover*, has just been given a new rectangle. The resolver
//! makes room for it according to [`CollisionMode`]:
//!
//! - `Push`: colliders are visited closest-first (Manhattan distance between
//!   top-left corners) and each is moved to the row just below the item that
//!   displaced it. Displaced items are resolved the same way through a work
//!   queue.
//! - `Swap`: a sole movable collider takes the mover's previous position.
//!   Anything else degrades to `Push`.
//! - `None`: overlap is allowed.
//!
//! The mover is pinned for the whole cascade. A displaced item that runs into
//! the mover or into a static/locked item moves itself below that blocker.
//! A mover that lands directly on a static/locked item is rejected.
//!
//! The queue is bounded by [`cascade_step_limit`]. When the bound trips, the
//! offending item and everything still queued is re-placed with the
//! first-fit search.

use std::collections::VecDeque;

use cardgrid_core::{GridPosition, GridRect};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::item::{GridItem, ItemId};
use crate::options::{CollisionMode, GridOptions};
use crate::placement;

/// Cascade steps allowed per item in the layout.
pub const CASCADE_STEP_LIMIT: usize = 32;

/// Total cascade steps allowed for a layout of `item_count` items.
#[must_use]
pub const fn cascade_step_limit(item_count: usize) -> usize {
    let count = if item_count == 0 { 1 } else { item_count };
    CASCADE_STEP_LIMIT.saturating_mul(count)
}

/// Overlap query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionReport {
    pub collides: bool,
    pub overlapping: Vec<ItemId>,
}

/// Items overlapping `rect`, skipping the item at `exclude`.
#[must_use]
pub fn check_collision(items: &[GridItem], rect: GridRect, exclude: Option<usize>) -> CollisionReport {
    let overlapping: Vec<ItemId> = overlapping_indices(items, rect, exclude)
        .into_iter()
        .map(|idx| items[idx].id.clone())
        .collect();
    CollisionReport {
        collides: !overlapping.is_empty(),
        overlapping,
    }
}

/// First pair of non-static items that overlap, in store order.
#[must_use]
pub fn first_overlap(items: &[GridItem]) -> Option<(usize, usize)> {
    for (i, a) in items.iter().enumerate() {
        if a.is_static {
            continue;
        }
        for (j, b) in items.iter().enumerate().skip(i + 1) {
            if !b.is_static && a.rect().intersects(&b.rect()) {
                return Some((i, j));
            }
        }
    }
    None
}

fn overlapping_indices(items: &[GridItem], rect: GridRect, exclude: Option<usize>) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(idx, item)| Some(*idx) != exclude && item.rect().intersects(&rect))
        .map(|(idx, _)| idx)
        .collect()
}

/// Closest-first by top-left Manhattan distance; ties keep store order.
fn sort_by_distance(items: &[GridItem], from: GridRect, indices: &mut [usize]) {
    indices.sort_by_key(|&idx| (items[idx].rect().manhattan_distance(&from), idx));
}

/// Why a resolution was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// The mover landed on a static or locked item.
    FixedBlocker { blocker: ItemId },
    /// A displaced item has nowhere to go on a bounded grid.
    NoRoom { item: ItemId },
    /// The target itself is static or locked.
    ItemFixed { item: ItemId },
}

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every overlap involving movable items is gone. `displaced` lists the
    /// items that moved, in the order they were first moved.
    Settled { displaced: Vec<ItemId> },
    /// The layout cannot accommodate the mover. Items may have been left
    /// partially moved; callers roll back.
    Rejected(RejectReason),
}

impl Resolution {
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}

/// Resolve overlaps caused by the item at `mover`.
///
/// `previous` is the mover's rectangle before the change. Swap mode uses it
/// as the destination for a displaced sole collider.
pub fn resolve(
    items: &mut [GridItem],
    mover: usize,
    previous: Option<GridRect>,
    options: &GridOptions,
) -> Resolution {
    if options.collision == CollisionMode::None {
        return Resolution::Settled {
            displaced: Vec::new(),
        };
    }
    let _span = tracing::debug_span!(
        target: "cardgrid.layout",
        "layout.resolve",
        mover = %items[mover].id,
        mode = ?options.collision,
    )
    .entered();

    let mover_rect = items[mover].rect();
    let mut colliders = overlapping_indices(items, mover_rect, Some(mover));
    if colliders.is_empty() {
        return Resolution::Settled {
            displaced: Vec::new(),
        };
    }
    if let Some(&fixed) = colliders.iter().find(|&&idx| items[idx].is_fixed()) {
        let blocker = items[fixed].id.clone();
        warn!(
            target: "cardgrid.layout",
            mover = %items[mover].id,
            blocker = %blocker,
            "placement rejected: mover overlaps fixed item"
        );
        return Resolution::Rejected(RejectReason::FixedBlocker { blocker });
    }

    let mut cascade = Cascade::new(items.len(), mover);

    if options.collision == CollisionMode::Swap && colliders.len() == 1 {
        let other = colliders[0];
        if let Some(target) = swap_target(items, mover, other, previous, options) {
            debug!(
                target: "cardgrid.layout",
                item = %items[other].id,
                x = target.x,
                y = target.y,
                "swap displacement"
            );
            items[other].set_rect(target);
            cascade.displace(other);
            return cascade.run(items, options);
        }
    }

    sort_by_distance(items, mover_rect, &mut colliders);
    for other in colliders {
        if let Err(reason) = push_below(items, other, mover_rect, options) {
            return Resolution::Rejected(reason);
        }
        cascade.displace(other);
    }
    cascade.run(items, options)
}

/// Destination for a swapped collider, or `None` to fall back to push.
fn swap_target(
    items: &[GridItem],
    mover: usize,
    other: usize,
    previous: Option<GridRect>,
    options: &GridOptions,
) -> Option<GridRect> {
    let size = items[other].size();
    let position = match previous {
        Some(prev) => GridItem::clamp_position(prev.position(), size, options),
        // The mover stays in `items` and so counts as an obstacle.
        None => placement::find_position(items, size, Some(other), options)?,
    };
    let target = GridRect::from_parts(position, size);
    if target.intersects(&items[mover].rect()) {
        return None;
    }
    Some(target)
}

/// Move `idx` to the row below `blocker`. On a bounded grid without room
/// there, fall back to a first-fit position.
fn push_below(
    items: &mut [GridItem],
    idx: usize,
    blocker: GridRect,
    options: &GridOptions,
) -> Result<(), RejectReason> {
    let h = items[idx].h;
    let y = blocker.bottom();
    if !options.is_bounded() || y.saturating_add(h) <= options.max_row {
        debug!(
            target: "cardgrid.layout",
            item = %items[idx].id,
            from_y = items[idx].y,
            to_y = y,
            "push displacement"
        );
        items[idx].y = y;
        return Ok(());
    }
    let size = items[idx].size();
    match placement::find_position(items, size, Some(idx), options) {
        Some(pos) => {
            debug!(
                target: "cardgrid.layout",
                item = %items[idx].id,
                x = pos.x,
                y = pos.y,
                "push overflow; relocated to first free slot"
            );
            set_position(&mut items[idx], pos);
            Ok(())
        }
        None => Err(RejectReason::NoRoom {
            item: items[idx].id.clone(),
        }),
    }
}

fn set_position(item: &mut GridItem, pos: GridPosition) {
    item.x = pos.x;
    item.y = pos.y;
}

/// Bounded work queue of displaced items.
struct Cascade {
    queue: VecDeque<usize>,
    pinned: usize,
    displaced: Vec<usize>,
    seen: FxHashSet<usize>,
    steps: usize,
    limit: usize,
}

impl Cascade {
    fn new(item_count: usize, pinned: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            pinned,
            displaced: Vec::new(),
            seen: FxHashSet::default(),
            steps: 0,
            limit: cascade_step_limit(item_count),
        }
    }

    fn displace(&mut self, idx: usize) {
        if self.seen.insert(idx) {
            self.displaced.push(idx);
        }
        self.queue.push_back(idx);
    }

    fn run(mut self, items: &mut [GridItem], options: &GridOptions) -> Resolution {
        while let Some(current) = self.queue.pop_front() {
            self.steps += 1;
            if self.steps > self.limit {
                warn!(
                    target: "cardgrid.layout",
                    item = %items[current].id,
                    steps = self.steps,
                    limit = self.limit,
                    "cascade step limit exceeded; falling back to auto-placement"
                );
                self.queue.push_front(current);
                return self.abort(items, options);
            }

            let rect = items[current].rect();
            let mut others = overlapping_indices(items, rect, Some(current));
            if others.is_empty() {
                continue;
            }
            sort_by_distance(items, rect, &mut others);

            // A pinned or fixed blocker wins: the displaced item moves itself.
            if let Some(&blocker) = others
                .iter()
                .find(|&&idx| idx == self.pinned || items[idx].is_fixed())
            {
                let blocker_rect = items[blocker].rect();
                if let Err(reason) = push_below(items, current, blocker_rect, options) {
                    return Resolution::Rejected(reason);
                }
                self.displace(current);
                continue;
            }

            for other in others {
                if let Err(reason) = push_below(items, other, rect, options) {
                    return Resolution::Rejected(reason);
                }
                self.displace(other);
            }
        }
        self.finish(items)
    }

    /// Re-place every still-overlapping queued item with first-fit search.
    fn abort(mut self, items: &mut [GridItem], options: &GridOptions) -> Resolution {
        let pending: Vec<usize> = self.queue.drain(..).collect();
        let mut handled = FxHashSet::default();
        for idx in pending {
            if !handled.insert(idx) {
                continue;
            }
            if overlapping_indices(items, items[idx].rect(), Some(idx)).is_empty() {
                continue;
            }
            match placement::place(items, items[idx].size(), Some(idx), options) {
                Some(pos) => set_position(&mut items[idx], pos),
                None => {
                    return Resolution::Rejected(RejectReason::NoRoom {
                        item: items[idx].id.clone(),
                    });
                }
            }
        }
        self.finish(items)
    }

    fn finish(self, items: &[GridItem]) -> Resolution {
        Resolution::Settled {
            displaced: self
                .displaced
                .into_iter()
                .map(|idx| items[idx].id.clone())
                .collect(),
        }
    }
}
