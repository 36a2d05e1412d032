//! Vertical compaction.
//!
//! A single greedy pass: movable items are visited top-to-bottom and each one
//! rises row by row until the next row up would overlap something. Static and
//! locked items never move but still block.
//!
//! Running the pass twice is a no-op. After one pass every item that stopped
//! above row 0 is blocked by an item that was already final when it stopped,
//! so a second pass finds no first item able to rise.

use crate::item::{GridItem, ItemId};
use crate::options::GridOptions;
use crate::placement::is_free;

/// Visit order: `(y, x)` ascending, with `x` descending under RTL.
#[must_use]
pub fn compaction_order(items: &[GridItem], rtl: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).filter(|&i| !items[i].is_fixed()).collect();
    order.sort_by(|&a, &b| {
        let (ia, ib) = (&items[a], &items[b]);
        let by_x = if rtl { ib.x.cmp(&ia.x) } else { ia.x.cmp(&ib.x) };
        ia.y.cmp(&ib.y).then(by_x)
    });
    order
}

/// Pull movable items upward. Returns the ids that moved, in visit order.
///
/// Does nothing under [`GridOptions::float`].
pub fn compact(items: &mut [GridItem], options: &GridOptions) -> Vec<ItemId> {
    if !options.compacts() {
        return Vec::new();
    }
    let mut moved = Vec::new();
    for idx in compaction_order(items, options.rtl) {
        let start = items[idx].y;
        let mut rect = items[idx].rect();
        while rect.y > 0 {
            let mut up = rect;
            up.y -= 1;
            if !is_free(items, up, Some(idx)) {
                break;
            }
            rect = up;
        }
        if rect.y != start {
            items[idx].y = rect.y;
            moved.push(items[idx].id.clone());
        }
    }
    moved
}
