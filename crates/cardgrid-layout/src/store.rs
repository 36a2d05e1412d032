//! Canonical layout state.
//!
//! [`LayoutStore`] owns every item's committed rectangle. Items live in an
//! insertion-ordered arena with an id index beside it. Every mutation that
//! can displace other items runs against a saved copy of the arena: if the
//! collision resolver rejects the result, the copy is put back and the store
//! is exactly as it was before the call.
//!
//! # Invariants (outside an active batch or interaction)
//!
//! 1. `x + w <= column` for every item.
//! 2. `y + h <= max_row` when `max_row > 0`.
//! 3. `w`/`h` within each item's min/max constraints.
//! 4. Unless collision mode is `None`, no two non-static items overlap.
//! 5. Ids are unique.
//!
//! [`LayoutStore::check_invariants`] verifies all five.

use cardgrid_core::{GridPosition, GridRect, GridSize};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::arrange::{self, ArrangeOptions, Arrangement, Guide};
use crate::collision::{self, CollisionReport, RejectReason, Resolution};
use crate::compact;
use crate::error::{InvariantViolation, LayoutError};
use crate::item::{GridItem, ItemId, ItemPatch};
use crate::options::{CollisionMode, GridOptions};
use crate::placement;

/// Result of applying a rectangle to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The rectangle was applied and collisions settled.
    Applied,
    /// The clamped rectangle equals the current one.
    Unchanged,
    /// The resolver refused; the store is untouched.
    Rejected(RejectReason),
    /// No item has that id.
    Missing,
}

impl ApplyOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Dry-run result of [`LayoutStore::validate_placement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementReport {
    /// The requested position was already inside the grid.
    pub in_bounds: bool,
    /// Rectangle the item would occupy after clamping.
    pub rect: GridRect,
    /// Items overlapping `rect` before resolution.
    pub colliders: Vec<ItemId>,
    /// Items the resolver would move.
    pub displaced: Vec<ItemId>,
    /// Set when the placement would be refused.
    pub rejected: Option<RejectReason>,
}

/// The canonical collection of grid items.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    options: GridOptions,
    items: Vec<GridItem>,
    index: FxHashMap<ItemId, usize>,
    batch_depth: u32,
    batch_touched: Vec<ItemId>,
    batch_seen: FxHashSet<ItemId>,
    last_touched: Vec<ItemId>,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::empty(GridOptions::default())
    }
}

impl LayoutStore {
    /// Empty store with validated options.
    pub fn new(options: GridOptions) -> Result<Self, LayoutError> {
        options.validate()?;
        Ok(Self::empty(options))
    }

    fn empty(options: GridOptions) -> Self {
        Self {
            options,
            items: Vec::new(),
            index: FxHashMap::default(),
            batch_depth: 0,
            batch_touched: Vec::new(),
            batch_seen: FxHashSet::default(),
            last_touched: Vec::new(),
        }
    }

    /// Build a store from persisted items.
    ///
    /// Every item is validated before anything is placed. Explicitly
    /// positioned items are clamped and separated first, then auto-positioned
    /// items are placed in order, then the layout is compacted.
    pub fn from_items(
        options: GridOptions,
        items: impl IntoIterator<Item = GridItem>,
    ) -> Result<Self, LayoutError> {
        let mut store = Self::new(options)?;
        let items: Vec<GridItem> = items.into_iter().collect();

        let mut seen = FxHashSet::default();
        for item in &items {
            if !seen.insert(item.id.clone()) {
                return Err(LayoutError::DuplicateId {
                    id: item.id.clone(),
                });
            }
            item.validate(&store.options)?;
        }

        let (auto, mut placed): (Vec<GridItem>, Vec<GridItem>) =
            items.into_iter().partition(|item| item.auto_position);
        placement::reflow(&mut placed, &store.options).map_err(|idx| LayoutError::NoSpace {
            id: placed[idx].id.clone(),
            w: placed[idx].w,
            h: placed[idx].h,
        })?;
        store.items = placed;

        for mut item in auto {
            let size = item.clamp_size(item.size(), GridPosition::new(0, 0), &store.options);
            let pos = placement::place(&store.items, size, None, &store.options).ok_or_else(
                || LayoutError::NoSpace {
                    id: item.id.clone(),
                    w: size.w,
                    h: size.h,
                },
            )?;
            item.set_rect(GridRect::from_parts(pos, size));
            item.auto_position = false;
            store.items.push(item);
        }
        store.reindex();
        compact::compact(&mut store.items, &store.options);
        Ok(store)
    }

    #[must_use]
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[GridItem] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&GridItem> {
        self.index.get(id).map(|&idx| &self.items[idx])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a batch is open.
    #[must_use]
    pub const fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Ids changed by the most recent mutating call, including items moved
    /// by collision resolution and compaction.
    #[must_use]
    pub fn last_touched(&self) -> &[ItemId] {
        &self.last_touched
    }

    /// Add one item.
    ///
    /// The item is auto-placed when `auto_position` is set or the item asks
    /// for it. Otherwise it is clamped into bounds and colliders are resolved
    /// (static items skip resolution). If resolution is refused, the item is
    /// auto-placed instead.
    pub fn add_item(&mut self, mut item: GridItem, auto_position: bool) -> Result<ItemId, LayoutError> {
        let _span = tracing::debug_span!(
            target: "cardgrid.layout",
            "layout.add",
            id = %item.id,
            auto = auto_position || item.auto_position,
        )
        .entered();
        self.last_touched.clear();

        if self.index.contains_key(&item.id) {
            return Err(LayoutError::DuplicateId { id: item.id });
        }
        item.validate(&self.options)?;

        let id = item.id.clone();
        let auto = auto_position || item.auto_position;
        item.auto_position = false;

        if auto {
            self.push_auto_placed(item)?;
        } else {
            let rect = item.clamp_rect(item.rect(), &self.options);
            item.set_rect(rect);
            let fallback = item.clone();
            let is_static = item.is_static;
            let base = self.items.clone();
            self.items.push(item);
            if !is_static {
                let idx = self.items.len() - 1;
                match collision::resolve(&mut self.items, idx, None, &self.options) {
                    Resolution::Settled { displaced } => {
                        for other in &displaced {
                            self.touch(other);
                        }
                    }
                    Resolution::Rejected(reason) => {
                        warn!(
                            target: "cardgrid.layout",
                            id = %id,
                            reason = ?reason,
                            "requested position rejected; auto-placing"
                        );
                        self.items = base;
                        self.push_auto_placed(fallback)?;
                    }
                }
            }
        }

        self.reindex();
        self.touch(&id);
        self.compact_unless_batching();
        Ok(id)
    }

    fn push_auto_placed(&mut self, mut item: GridItem) -> Result<(), LayoutError> {
        let size = item.clamp_size(item.size(), GridPosition::new(0, 0), &self.options);
        let pos = placement::place(&self.items, size, None, &self.options).ok_or_else(|| {
            LayoutError::NoSpace {
                id: item.id.clone(),
                w: size.w,
                h: size.h,
            }
        })?;
        debug!(
            target: "cardgrid.layout",
            id = %item.id,
            x = pos.x,
            y = pos.y,
            "auto-placed"
        );
        item.set_rect(GridRect::from_parts(pos, size));
        self.items.push(item);
        Ok(())
    }

    /// Add several items inside one batch.
    ///
    /// All-or-nothing: on the first error every item added by this call is
    /// removed again and the error is returned.
    pub fn add_items(
        &mut self,
        items: impl IntoIterator<Item = GridItem>,
    ) -> Result<Vec<ItemId>, LayoutError> {
        let base_items = self.items.clone();
        let touched_mark = self.batch_touched.len();
        self.begin_batch();

        let mut ids = Vec::new();
        for item in items {
            match self.add_item(item, false) {
                Ok(id) => ids.push(id),
                Err(err) => {
                    self.items = base_items;
                    self.reindex();
                    for id in self.batch_touched.drain(touched_mark..) {
                        self.batch_seen.remove(&id);
                    }
                    self.batch_depth -= 1;
                    self.last_touched.clear();
                    return Err(err);
                }
            }
        }

        let touched = self.end_batch();
        if !touched.is_empty() {
            self.last_touched = touched;
        }
        Ok(ids)
    }

    /// Remove an item. `None` when the id is unknown.
    pub fn remove_item(&mut self, id: &str) -> Option<GridItem> {
        let idx = *self.index.get(id)?;
        let _span = tracing::debug_span!(target: "cardgrid.layout", "layout.remove", id = %id).entered();
        self.last_touched.clear();
        let removed = self.items.remove(idx);
        self.reindex();
        self.touch(&removed.id);
        self.compact_unless_batching();
        Some(removed)
    }

    /// Remove every item, returning them in insertion order.
    pub fn clear(&mut self) -> Vec<GridItem> {
        self.last_touched.clear();
        self.index.clear();
        let removed: Vec<GridItem> = self.items.drain(..).collect();
        for item in &removed {
            self.touch(&item.id);
        }
        removed
    }

    /// Move an item's top-left cell.
    ///
    /// Returns false when the id is unknown, the item is static or locked,
    /// the clamped target equals the current position, or the resolver
    /// refuses the placement.
    pub fn move_item(&mut self, id: &str, x: u16, y: u16) -> bool {
        let Some(&idx) = self.index.get(id) else {
            return false;
        };
        let item = &self.items[idx];
        if item.is_fixed() {
            return false;
        }
        let pos = GridItem::clamp_position(GridPosition::new(x, y), item.size(), &self.options);
        if pos == item.position() {
            return false;
        }
        let rect = GridRect::from_parts(pos, item.size());
        let _span = tracing::debug_span!(
            target: "cardgrid.layout",
            "layout.move",
            id = %id,
            x = pos.x,
            y = pos.y,
        )
        .entered();
        self.mutate(idx, rect).is_applied()
    }

    /// Resize an item, keeping its top-left cell where possible.
    ///
    /// The span is clamped to the item's constraints and to the columns
    /// right of `x` (and rows above `max_row` when bounded).
    pub fn resize_item(&mut self, id: &str, w: u16, h: u16) -> bool {
        let Some(&idx) = self.index.get(id) else {
            return false;
        };
        let item = &self.items[idx];
        if item.is_fixed() {
            return false;
        }
        let size = item.clamp_size(GridSize::new(w, h), item.position(), &self.options);
        let pos = GridItem::clamp_position(item.position(), size, &self.options);
        let rect = GridRect::from_parts(pos, size);
        if rect == item.rect() {
            return false;
        }
        let _span = tracing::debug_span!(
            target: "cardgrid.layout",
            "layout.resize",
            id = %id,
            w = size.w,
            h = size.h,
        )
        .entered();
        self.mutate(idx, rect).is_applied()
    }

    /// Move and resize in one step.
    pub fn apply_rect(&mut self, id: &str, rect: GridRect) -> ApplyOutcome {
        let Some(&idx) = self.index.get(id) else {
            return ApplyOutcome::Missing;
        };
        let item = &self.items[idx];
        if item.is_fixed() {
            return ApplyOutcome::Rejected(RejectReason::ItemFixed {
                item: item.id.clone(),
            });
        }
        let rect = item.clamp_rect(rect, &self.options);
        if rect == item.rect() {
            return ApplyOutcome::Unchanged;
        }
        let _span = tracing::debug_span!(
            target: "cardgrid.layout",
            "layout.apply_rect",
            id = %id,
            x = rect.x,
            y = rect.y,
            w = rect.w,
            h = rect.h,
        )
        .entered();
        self.mutate(idx, rect)
    }

    fn mutate(&mut self, idx: usize, rect: GridRect) -> ApplyOutcome {
        self.last_touched.clear();
        let previous = self.items[idx].rect();
        let base = self.items.clone();
        self.items[idx].set_rect(rect);
        match collision::resolve(&mut self.items, idx, Some(previous), &self.options) {
            Resolution::Settled { displaced } => {
                let id = self.items[idx].id.clone();
                self.touch(&id);
                for other in &displaced {
                    self.touch(other);
                }
                self.compact_unless_batching();
                ApplyOutcome::Applied
            }
            Resolution::Rejected(reason) => {
                warn!(
                    target: "cardgrid.layout",
                    id = %self.items[idx].id,
                    reason = ?reason,
                    "placement rejected; rolled back"
                );
                self.items = base;
                ApplyOutcome::Rejected(reason)
            }
        }
    }

    /// Merge a partial update into an item.
    ///
    /// Returns false when the id is unknown, the merged constraints are
    /// invalid, or a geometry change is refused by the resolver.
    pub fn update_item(&mut self, id: &str, patch: &ItemPatch) -> bool {
        let Some(&idx) = self.index.get(id) else {
            return false;
        };
        let _span = tracing::debug_span!(target: "cardgrid.layout", "layout.update", id = %id).entered();
        self.last_touched.clear();

        let mut updated = self.items[idx].clone();
        patch.apply_to(&mut updated);
        if let Err(err) = updated.validate(&self.options) {
            warn!(target: "cardgrid.layout", id = %id, error = %err, "update rejected");
            return false;
        }
        let item_id = updated.id.clone();

        if !patch.touches_geometry() {
            self.items[idx] = updated;
            self.touch(&item_id);
            return true;
        }

        let previous = self.items[idx].rect();
        let base = self.items.clone();
        let rect = updated.clamp_rect(updated.rect(), &self.options);
        updated.set_rect(rect);
        let is_static = updated.is_static;
        self.items[idx] = updated;
        if !is_static {
            match collision::resolve(&mut self.items, idx, Some(previous), &self.options) {
                Resolution::Settled { displaced } => {
                    for other in &displaced {
                        self.touch(other);
                    }
                }
                Resolution::Rejected(reason) => {
                    warn!(
                        target: "cardgrid.layout",
                        id = %id,
                        reason = ?reason,
                        "update rejected; rolled back"
                    );
                    self.items = base;
                    return false;
                }
            }
        }
        self.touch(&item_id);
        self.compact_unless_batching();
        true
    }

    /// Open a batch. Batches nest.
    pub fn begin_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_add(1);
    }

    /// Close a batch.
    ///
    /// Closing the outermost batch compacts once and returns every id touched
    /// since it opened. Inner closes and unmatched calls return an empty list.
    pub fn end_batch(&mut self) -> Vec<ItemId> {
        if self.batch_depth == 0 {
            return Vec::new();
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return Vec::new();
        }
        let moved = compact::compact(&mut self.items, &self.options);
        for id in moved {
            if self.batch_seen.insert(id.clone()) {
                self.batch_touched.push(id);
            }
        }
        self.batch_seen.clear();
        let touched = std::mem::take(&mut self.batch_touched);
        self.last_touched.clone_from(&touched);
        touched
    }

    /// Run `f` inside a batch and return its result with the touched ids.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> (R, Vec<ItemId>) {
        self.begin_batch();
        let result = f(self);
        let touched = self.end_batch();
        (result, touched)
    }

    /// Compact now. Returns the ids that moved.
    pub fn compact(&mut self) -> Vec<ItemId> {
        let _span = tracing::debug_span!(target: "cardgrid.layout", "layout.compact").entered();
        self.last_touched.clear();
        let moved = compact::compact(&mut self.items, &self.options);
        for id in &moved {
            self.touch(id);
        }
        moved
    }

    fn compact_unless_batching(&mut self) {
        if self.is_batching() {
            return;
        }
        let _span = tracing::debug_span!(target: "cardgrid.layout", "layout.compact").entered();
        for id in compact::compact(&mut self.items, &self.options) {
            self.touch(&id);
        }
    }

    /// Independent copy of every item's persisted fields.
    #[must_use]
    pub fn serialize(&self) -> Vec<GridItem> {
        self.items.clone()
    }

    /// Items overlapping `rect`, optionally ignoring one id.
    #[must_use]
    pub fn check_collision(&self, rect: GridRect, exclude: Option<&str>) -> CollisionReport {
        let exclude = exclude.and_then(|id| self.index.get(id).copied());
        collision::check_collision(&self.items, rect, exclude)
    }

    /// First free position for a span, if any.
    #[must_use]
    pub fn find_position(&self, size: GridSize) -> Option<GridPosition> {
        placement::find_position(&self.items, size, None, &self.options)
    }

    /// Dry-run a move without touching the store.
    #[must_use]
    pub fn validate_placement(&self, id: &str, position: GridPosition) -> Option<PlacementReport> {
        let &idx = self.index.get(id)?;
        let item = &self.items[idx];
        let clamped = GridItem::clamp_position(position, item.size(), &self.options);
        let rect = GridRect::from_parts(clamped, item.size());
        let colliders = collision::check_collision(&self.items, rect, Some(idx)).overlapping;

        let mut trial = self.items.clone();
        trial[idx].set_rect(rect);
        let (displaced, rejected) = if item.is_fixed() {
            (
                Vec::new(),
                Some(RejectReason::ItemFixed {
                    item: item.id.clone(),
                }),
            )
        } else {
            match collision::resolve(&mut trial, idx, Some(item.rect()), &self.options) {
                Resolution::Settled { displaced } => (displaced, None),
                Resolution::Rejected(reason) => (Vec::new(), Some(reason)),
            }
        };

        Some(PlacementReport {
            in_bounds: clamped == position,
            rect,
            colliders,
            displaced,
            rejected,
        })
    }

    /// Items overlapping a region, in insertion order.
    #[must_use]
    pub fn items_in_region(&self, region: GridRect) -> Vec<&GridItem> {
        self.items
            .iter()
            .filter(|item| item.rect().intersects(&region))
            .collect()
    }

    /// Lowest occupied row boundary (exclusive).
    #[must_use]
    pub fn bottom_row(&self) -> u16 {
        placement::bottom_row(&self.items, None)
    }

    /// Replace the options and reflow every item into the new bounds.
    ///
    /// Returns the ids whose rectangle changed. On error nothing changes.
    pub fn set_options(&mut self, options: GridOptions) -> Result<Vec<ItemId>, LayoutError> {
        options.validate()?;
        for item in &self.items {
            item.validate(&options)?;
        }
        let _span = tracing::debug_span!(
            target: "cardgrid.layout",
            "layout.set_options",
            column = options.column,
            max_row = options.max_row,
        )
        .entered();

        let mut items = self.items.clone();
        placement::reflow(&mut items, &options).map_err(|idx| LayoutError::NoSpace {
            id: items[idx].id.clone(),
            w: items[idx].w,
            h: items[idx].h,
        })?;

        self.last_touched.clear();
        let changed: Vec<ItemId> = items
            .iter()
            .zip(&self.items)
            .filter(|(new, old)| new.rect() != old.rect())
            .map(|(new, _)| new.id.clone())
            .collect();
        self.options = options;
        self.items = items;
        for id in &changed {
            self.touch(id);
        }
        self.compact_unless_batching();
        Ok(changed)
    }

    /// Rearrange every movable item, then settle overlaps and compact.
    ///
    /// Targets from [`arrange::arrange`] are clamped to each item's
    /// constraints. Unless collision mode is `None` the result is re-settled
    /// around fixed items before it is adopted. Returns every id that moved.
    /// On error nothing changes.
    pub fn arrange(
        &mut self,
        arrangement: Arrangement,
        tuning: &ArrangeOptions,
    ) -> Result<Vec<ItemId>, LayoutError> {
        let _span = tracing::debug_span!(
            target: "cardgrid.layout",
            "layout.arrange",
            arrangement = arrangement.name(),
            items = self.items.len(),
        )
        .entered();

        let targets = arrange::arrange(&self.items, arrangement, tuning, &self.options);
        let mut items = self.items.clone();
        for (item, target) in items.iter_mut().zip(targets) {
            let rect = item.clamp_rect(target, &self.options);
            item.set_rect(rect);
        }
        if self.options.collision != CollisionMode::None {
            placement::reflow(&mut items, &self.options).map_err(|idx| LayoutError::NoSpace {
                id: items[idx].id.clone(),
                w: items[idx].w,
                h: items[idx].h,
            })?;
        }

        self.last_touched.clear();
        let changed: Vec<ItemId> = items
            .iter()
            .zip(&self.items)
            .filter(|(new, old)| new.rect() != old.rect())
            .map(|(new, _)| new.id.clone())
            .collect();
        self.items = items;
        for id in &changed {
            self.touch(id);
        }
        self.compact_unless_batching();
        Ok(self.last_touched.clone())
    }

    /// Repack the layout largest-first, closing every gap it can.
    pub fn optimize(&mut self) -> Result<Vec<ItemId>, LayoutError> {
        self.arrange(Arrangement::Compact, &ArrangeOptions::default())
    }

    /// `rect` aligned with the nearest edges of the other items.
    ///
    /// `id` is left out of the candidates. The result is clamped into
    /// bounds but not checked for collisions.
    #[must_use]
    pub fn snap_rect(&self, id: &str, rect: GridRect, threshold: u16) -> GridRect {
        let others = self
            .items
            .iter()
            .filter(|item| item.id.as_str() != id)
            .map(GridItem::rect);
        let snapped = arrange::snap_to_guides(rect, others, threshold).apply(rect);
        let position = GridItem::clamp_position(snapped.position(), snapped.size(), &self.options);
        GridRect::from_parts(position, snapped.size())
    }

    /// Alignment guides for `rect` against every item except `id`.
    #[must_use]
    pub fn guides_for(&self, id: &str, rect: GridRect, threshold: u16) -> Vec<Guide> {
        let others = self
            .items
            .iter()
            .filter(|item| item.id.as_str() != id)
            .map(GridItem::rect);
        arrange::alignment_guides(rect, others, threshold)
    }

    /// Copy every matching item's rectangle from `snapshot`.
    ///
    /// See [`LayoutStore::restore_rects`]. Returns the ids that changed.
    pub fn restore_geometry(&mut self, snapshot: &LayoutStore) -> Vec<ItemId> {
        self.restore_rects(|id| snapshot.item(id.as_str()).map(GridItem::rect))
    }

    /// Put saved rectangles back, one lookup per item.
    ///
    /// Items without a saved rectangle keep theirs. Restored rectangles are
    /// clamped to the current options. Items added or moved since the save
    /// can overlap restored ones, so the result is re-settled before it is
    /// adopted; if it cannot be settled the store is left as it was. Returns
    /// the ids whose rectangle changed.
    pub fn restore_rects(&mut self, saved: impl Fn(&ItemId) -> Option<GridRect>) -> Vec<ItemId> {
        let _span = tracing::debug_span!(target: "cardgrid.layout", "layout.restore").entered();
        self.last_touched.clear();
        let mut items = self.items.clone();
        for item in &mut items {
            if let Some(rect) = saved(&item.id) {
                let rect = item.clamp_rect(rect, &self.options);
                item.set_rect(rect);
            }
        }
        if self.options.collision != CollisionMode::None
            && let Some((first, second)) = collision::first_overlap(&items)
        {
            debug!(
                target: "cardgrid.layout",
                first = %items[first].id,
                second = %items[second].id,
                "restored rects overlap; re-settling"
            );
            if let Err(idx) = placement::reflow(&mut items, &self.options) {
                warn!(
                    target: "cardgrid.layout",
                    id = %items[idx].id,
                    "restored layout does not fit; kept current geometry"
                );
                return Vec::new();
            }
        }

        let changed: Vec<ItemId> = items
            .iter()
            .zip(&self.items)
            .filter(|(new, old)| new.rect() != old.rect())
            .map(|(new, _)| new.id.clone())
            .collect();
        self.items = items;
        for id in &changed {
            self.touch(id);
        }
        changed
    }

    /// Verify the layout invariants.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let options = &self.options;
        let mut seen = FxHashSet::default();
        for (idx, item) in self.items.iter().enumerate() {
            if !seen.insert(&item.id) {
                return Err(InvariantViolation::DuplicateId {
                    id: item.id.clone(),
                });
            }
            if self.index.get(&item.id) != Some(&idx) {
                return Err(InvariantViolation::IndexMismatch {
                    id: item.id.clone(),
                });
            }
            let rect = item.rect();
            if rect.right() > options.column {
                return Err(InvariantViolation::OutOfColumns {
                    id: item.id.clone(),
                    right: rect.right(),
                    column: options.column,
                });
            }
            if options.is_bounded() && rect.bottom() > options.max_row {
                return Err(InvariantViolation::OutOfRows {
                    id: item.id.clone(),
                    bottom: rect.bottom(),
                    max_row: options.max_row,
                });
            }
            let w_ok = item.w >= item.min_w && item.max_w.is_none_or(|max| item.w <= max);
            let h_ok = item.h >= item.min_h && item.max_h.is_none_or(|max| item.h <= max);
            if !w_ok || !h_ok {
                return Err(InvariantViolation::ConstraintViolated {
                    id: item.id.clone(),
                });
            }
        }
        if self.index.len() != self.items.len() {
            let stale = self
                .index
                .keys()
                .find(|id| !seen.contains(id))
                .cloned()
                .unwrap_or_else(|| ItemId::new(""));
            return Err(InvariantViolation::IndexMismatch { id: stale });
        }

        if options.collision != CollisionMode::None
            && let Some((first, second)) = collision::first_overlap(&self.items)
        {
            return Err(InvariantViolation::Overlap {
                first: self.items[first].id.clone(),
                second: self.items[second].id.clone(),
            });
        }
        Ok(())
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (idx, item) in self.items.iter().enumerate() {
            self.index.insert(item.id.clone(), idx);
        }
    }

    fn touch(&mut self, id: &ItemId) {
        if !self.last_touched.contains(id) {
            self.last_touched.push(id.clone());
        }
        if self.is_batching() && self.batch_seen.insert(id.clone()) {
            self.batch_touched.push(id.clone());
        }
    }
}
