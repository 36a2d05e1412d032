//! The public grid: one layout store, one interaction controller, container
//! metrics and listeners.

use std::fmt;

use cardgrid_layout::arrange;
use cardgrid_layout::transform::{self, CellMetrics};
use cardgrid_layout::{
    ApplyOutcome, ArrangeOptions, Arrangement, Breakpoint, CancelReason, CommitKind, GridItem,
    GridOptions, GridRect, Guide, InteractionController, InteractionEffect, InteractionKind,
    InteractionState, InteractionTransition, ItemId, ItemPatch, LayoutSnapshot, LayoutStore,
    PixelPoint, PixelRect, Preview, ResizeHandle, StartGuard,
};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::batch::GridBatch;
use crate::error::Result;
use crate::event::{ChangeKind, ChangeSource, GridEvent};

/// Handle returned by [`Grid::on`], used to unregister the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&GridEvent) + Send>;

/// A card grid.
///
/// `Grid` owns the canonical layout. Every mutation goes through it, and
/// listeners hear about each one after it completes. A mutation made while a
/// gesture is live cancels the gesture first.
///
/// While a breakpoint is active the live layout is a reflowed view of the
/// full layout kept under the base options. Returning to the base options,
/// or saving, puts back every rectangle the full layout still holds; items
/// edited under the breakpoint carry their new rectangle over instead.
///
/// # Example
///
/// ```
/// use cardgrid::{Grid, GridItem, GridOptions};
///
/// let mut grid = Grid::new(GridOptions::default()).unwrap();
/// grid.set_container_width(1330.0).unwrap();
/// grid.add_item(GridItem::new("chart", 4, 2).at(0, 0)).unwrap();
/// grid.add_item(GridItem::new("table", 4, 2)).unwrap();
///
/// assert_eq!(grid.item("table").unwrap().x, 4);
/// let px = grid.pixel_rect("chart").unwrap();
/// assert_eq!(px.left, 10.0);
/// ```
pub struct Grid {
    store: LayoutStore,
    controller: InteractionController,
    /// Options as configured, before any breakpoint override.
    base_options: GridOptions,
    breakpoint: Option<String>,
    /// Rectangles under the base options, kept while a breakpoint is active.
    full_rects: Option<FxHashMap<ItemId, GridRect>>,
    container_width: f64,
    metrics: CellMetrics,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("store", &self.store)
            .field("controller", &self.controller)
            .field("breakpoint", &self.breakpoint)
            .field("container_width", &self.container_width)
            .field("metrics", &self.metrics)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Grid {
    /// Empty grid. Call [`Grid::set_container_width`] before pointer input.
    pub fn new(options: GridOptions) -> Result<Self> {
        let store = LayoutStore::new(options.clone())?;
        Ok(Self {
            store,
            controller: InteractionController::new(),
            base_options: options,
            breakpoint: None,
            full_rects: None,
            container_width: 0.0,
            metrics: CellMetrics::default(),
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    /// Effective options, including the active breakpoint.
    #[must_use]
    pub fn options(&self) -> &GridOptions {
        self.store.options()
    }

    #[must_use]
    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&GridItem> {
        self.store.item(id)
    }

    #[must_use]
    pub fn items(&self) -> &[GridItem] {
        self.store.items()
    }

    #[must_use]
    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    #[must_use]
    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    #[must_use]
    pub fn active_breakpoint(&self) -> Option<&str> {
        self.breakpoint.as_deref()
    }

    // --- listeners -------------------------------------------------------

    /// Register a listener for every event.
    pub fn on(&mut self, listener: impl FnMut(&GridEvent) + Send + 'static) -> ListenerId {
        self.next_listener = self.next_listener.saturating_add(1);
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: GridEvent) {
        debug!(target: "cardgrid", event = event.name(), "emit");
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    fn emit_change(&mut self, kind: ChangeKind, items: Vec<ItemId>, source: ChangeSource) {
        if items.is_empty() {
            return;
        }
        self.emit(GridEvent::Change {
            kind,
            items,
            source,
        });
    }

    /// Emit a change made by a mutation. The full layout forgets the
    /// affected items so their live rectangles carry over.
    fn record_change(&mut self, kind: ChangeKind, items: Vec<ItemId>, source: ChangeSource) {
        self.forget_full_rects(&items);
        self.emit_change(kind, items, source);
    }

    fn forget_full_rects(&mut self, ids: &[ItemId]) {
        if let Some(rects) = &mut self.full_rects {
            for id in ids {
                rects.remove(id);
            }
        }
    }

    fn touched(&self) -> Vec<ItemId> {
        self.store.last_touched().to_vec()
    }

    // --- layout operations -----------------------------------------------

    /// Add one item. It is auto-placed when it asks for it.
    pub fn add_item(&mut self, item: GridItem) -> Result<ItemId> {
        self.abandon_interaction();
        let id = self.store.add_item(item, false)?;
        self.emit(GridEvent::Added {
            items: vec![id.clone()],
        });
        self.record_change(ChangeKind::Add, self.touched(), ChangeSource::Api);
        Ok(id)
    }

    /// Add several items with one compaction. All-or-nothing.
    pub fn add_items(&mut self, items: impl IntoIterator<Item = GridItem>) -> Result<Vec<ItemId>> {
        self.abandon_interaction();
        let ids = self.store.add_items(items)?;
        if ids.is_empty() {
            return Ok(ids);
        }
        self.emit(GridEvent::Added { items: ids.clone() });
        self.record_change(ChangeKind::Batch, self.touched(), ChangeSource::Api);
        Ok(ids)
    }

    pub fn remove_item(&mut self, id: &str) -> Option<GridItem> {
        if !self.store.contains(id) {
            return None;
        }
        self.abandon_interaction();
        let removed = self.store.remove_item(id)?;
        self.emit(GridEvent::Removed {
            items: vec![removed.id.clone()],
        });
        self.record_change(ChangeKind::Remove, self.touched(), ChangeSource::Api);
        Some(removed)
    }

    /// Remove every item.
    pub fn remove_all(&mut self) -> Vec<GridItem> {
        self.abandon_interaction();
        let removed = self.store.clear();
        if !removed.is_empty() {
            let ids: Vec<ItemId> = removed.iter().map(|item| item.id.clone()).collect();
            self.emit(GridEvent::Removed { items: ids.clone() });
            self.record_change(ChangeKind::Remove, ids, ChangeSource::Api);
        }
        removed
    }

    pub fn update_item(&mut self, id: &str, patch: &ItemPatch) -> bool {
        self.abandon_interaction();
        let changed = self.store.update_item(id, patch);
        if changed {
            self.record_change(ChangeKind::Update, self.touched(), ChangeSource::Api);
        }
        changed
    }

    pub fn move_item(&mut self, id: &str, x: u16, y: u16) -> bool {
        self.abandon_interaction();
        let moved = self.store.move_item(id, x, y);
        if moved {
            self.record_change(ChangeKind::Move, self.touched(), ChangeSource::Api);
        }
        moved
    }

    pub fn resize_item(&mut self, id: &str, w: u16, h: u16) -> bool {
        self.abandon_interaction();
        let resized = self.store.resize_item(id, w, h);
        if resized {
            self.record_change(ChangeKind::Resize, self.touched(), ChangeSource::Api);
        }
        resized
    }

    /// Run several operations with one compaction.
    ///
    /// Listeners hear [`GridEvent::Added`] and [`GridEvent::Removed`] for
    /// the items the batch added or removed, then one
    /// [`ChangeKind::Batch`] change.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut GridBatch<'_>) -> R) -> R {
        self.abandon_interaction();
        let ((result, added, removed), touched) = self.store.batch(|store| {
            let mut batch = GridBatch::new(store);
            let result = f(&mut batch);
            let (added, removed) = batch.into_parts();
            (result, added, removed)
        });
        if !added.is_empty() {
            self.emit(GridEvent::Added { items: added });
        }
        if !removed.is_empty() {
            self.emit(GridEvent::Removed { items: removed });
        }
        self.record_change(ChangeKind::Batch, touched, ChangeSource::Api);
        result
    }

    /// Compact now, emitting [`GridEvent::Compact`] when anything moved.
    pub fn compact(&mut self) -> Vec<ItemId> {
        self.abandon_interaction();
        let moved = self.store.compact();
        if !moved.is_empty() {
            self.forget_full_rects(&moved);
            self.emit(GridEvent::Compact {
                moved: moved.clone(),
            });
        }
        moved
    }

    /// Rearrange every movable item. Nothing changes on error.
    pub fn arrange(&mut self, arrangement: Arrangement, tuning: &ArrangeOptions) -> Result<Vec<ItemId>> {
        self.abandon_interaction();
        let moved = self.store.arrange(arrangement, tuning)?;
        self.emit(GridEvent::Arrange {
            arrangement,
            moved: moved.clone(),
        });
        self.record_change(ChangeKind::Batch, moved.clone(), ChangeSource::Api);
        Ok(moved)
    }

    /// Repack largest-first, closing every gap.
    pub fn optimize(&mut self) -> Result<Vec<ItemId>> {
        self.arrange(Arrangement::Compact, &ArrangeOptions::default())
    }

    /// Replace the base options and reflow.
    ///
    /// A breakpoint matching the current container width still overrides
    /// the column count. Nothing changes on error.
    pub fn set_options(&mut self, options: GridOptions) -> Result<Vec<ItemId>> {
        options.validate()?;
        let breakpoint = options.breakpoint_for(self.container_width).cloned();
        let mut full = self.full_layout();
        full.set_options(options.clone())?;
        let changed = self.switch_layout(full, options, breakpoint, self.container_width)?;
        self.emit_change(ChangeKind::Update, changed.clone(), ChangeSource::Api);
        Ok(changed)
    }

    // --- persistence -----------------------------------------------------

    /// Replace the whole layout.
    ///
    /// The snapshot is validated and a new store built before anything is
    /// swapped in. On error the live layout is untouched.
    pub fn load(&mut self, snapshot: LayoutSnapshot) -> Result<()> {
        let store = snapshot.to_store()?;
        let breakpoint = snapshot.options.breakpoint_for(self.container_width).cloned();
        self.switch_layout(store, snapshot.options, breakpoint, self.container_width)?;
        info!(
            target: "cardgrid",
            items = self.store.len(),
            column = self.store.options().column,
            "layout loaded"
        );
        let ids = self.store.items().iter().map(|item| item.id.clone()).collect();
        self.emit_change(ChangeKind::Batch, ids, ChangeSource::Load);
        Ok(())
    }

    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let snapshot = LayoutSnapshot::from_json(json)?;
        self.load(snapshot)
    }

    /// The full layout with the base options.
    ///
    /// Under a breakpoint this is the layout the grid returns to at full
    /// width, not the reflowed view.
    #[must_use]
    pub fn save(&self) -> LayoutSnapshot {
        LayoutSnapshot::new(self.base_options.clone(), self.full_layout().serialize())
    }

    pub fn save_json(&self) -> Result<String> {
        Ok(self.save().to_json()?)
    }

    // --- geometry --------------------------------------------------------

    /// Record the host surface width, re-measure cells and apply the
    /// matching breakpoint.
    pub fn set_container_width(&mut self, width: f64) -> Result<()> {
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        let breakpoint = self.base_options.breakpoint_for(width).cloned();
        let name = breakpoint.as_ref().map(|bp| bp.name.clone());
        if name == self.breakpoint {
            self.container_width = width;
            self.metrics = CellMetrics::measure(width, self.store.options());
            return Ok(());
        }
        let full = self.full_layout();
        let base = self.base_options.clone();
        let changed = self.switch_layout(full, base, breakpoint, width)?;
        self.emit_change(ChangeKind::Update, changed, ChangeSource::Api);
        Ok(())
    }

    /// The layout under the base options: the live items with every
    /// rectangle the full layout still holds put back.
    fn full_layout(&self) -> LayoutStore {
        let Some(rects) = &self.full_rects else {
            return self.store.clone();
        };
        let mut full = self.store.clone();
        if let Err(err) = full.set_options(self.base_options.clone()) {
            warn!(target: "cardgrid", error = %err, "live layout does not fit the base options");
            return self.store.clone();
        }
        full.restore_rects(|id| rects.get(id).copied());
        full
    }

    /// Adopt `full` (laid out under `base`) and derive the live view for
    /// `breakpoint`. Returns the ids whose live rectangle changed. Nothing
    /// changes on error.
    fn switch_layout(
        &mut self,
        full: LayoutStore,
        base: GridOptions,
        breakpoint: Option<Breakpoint>,
        width: f64,
    ) -> Result<Vec<ItemId>> {
        let mut store = full.clone();
        let full_rects = match &breakpoint {
            Some(bp) => {
                store.set_options(effective_options(&base, Some(bp)))?;
                Some(
                    full.items()
                        .iter()
                        .map(|item| (item.id.clone(), item.rect()))
                        .collect(),
                )
            }
            None => None,
        };
        let changed = changed_rects(&self.store, &store);

        self.abandon_interaction();
        self.store = store;
        self.base_options = base;
        self.full_rects = full_rects;
        self.container_width = width;
        self.metrics = CellMetrics::measure(width, self.store.options());
        self.note_breakpoint(breakpoint);
        Ok(changed)
    }

    fn note_breakpoint(&mut self, breakpoint: Option<Breakpoint>) {
        let name = breakpoint.map(|bp| bp.name);
        if name == self.breakpoint {
            return;
        }
        self.breakpoint = name.clone();
        let column = self.store.options().column;
        debug!(target: "cardgrid", breakpoint = ?name, column, "breakpoint changed");
        self.emit(GridEvent::Breakpoint { name, column });
    }

    /// Pixel rectangle for an item. While a gesture is previewing, this is
    /// the previewed position.
    #[must_use]
    pub fn pixel_rect(&self, id: &str) -> Option<PixelRect> {
        let rect = self
            .controller
            .preview()
            .and_then(|preview| preview.rect_of(id))
            .or_else(|| self.store.item(id).map(GridItem::rect))?;
        Some(self.to_pixels(rect))
    }

    /// Pixel rectangle for any grid rectangle under the current metrics.
    #[must_use]
    pub fn to_pixels(&self, rect: GridRect) -> PixelRect {
        transform::grid_to_pixel(
            rect,
            self.metrics.cell_width,
            self.metrics.cell_height,
            self.store.options(),
        )
    }

    /// Guides the live gesture's candidate lies within `threshold` cells of,
    /// for the host to draw. Empty when no gesture is previewing.
    #[must_use]
    pub fn alignment_guides(&self, threshold: u16) -> Vec<Guide> {
        let Some(preview) = self.controller.preview() else {
            return Vec::new();
        };
        let others = preview
            .rects
            .iter()
            .filter(|(id, _)| *id != preview.item)
            .map(|&(_, rect)| rect);
        arrange::alignment_guides(preview.candidate, others, threshold)
    }

    /// Height the host surface needs to show every row.
    #[must_use]
    pub fn surface_height(&self) -> f64 {
        let preview_rows = self
            .controller
            .preview()
            .and_then(|preview| preview.rects.iter().map(|(_, rect)| rect.bottom()).max())
            .unwrap_or(0);
        let rows = self
            .store
            .bottom_row()
            .max(preview_rows)
            .max(self.store.options().min_row);
        transform::grid_pixel_height(rows, self.metrics, self.store.options())
    }

    // --- interaction -----------------------------------------------------

    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.controller.is_active()
    }

    #[must_use]
    pub fn preview(&self) -> Option<&Preview> {
        self.controller.preview()
    }

    /// Install or clear the predicate consulted before each gesture starts.
    pub fn set_start_guard(&mut self, guard: Option<StartGuard>) {
        self.controller.set_start_guard(guard);
    }

    pub fn begin_drag(&mut self, id: &str, pointer: PixelPoint) -> Result<()> {
        let transition = self
            .controller
            .begin_drag(&self.store, id, pointer, self.metrics)?;
        self.dispatch(transition);
        Ok(())
    }

    pub fn begin_resize(&mut self, id: &str, handle: ResizeHandle, pointer: PixelPoint) -> Result<()> {
        let transition = self
            .controller
            .begin_resize(&self.store, id, handle, pointer, self.metrics)?;
        self.dispatch(transition);
        Ok(())
    }

    /// Feed a pointer sample. Samples inside the current frame are held
    /// until [`Grid::poll`] or [`Grid::release`].
    pub fn pointer_move(&mut self, pointer: PixelPoint, now: Instant) -> Result<()> {
        let transition = self.controller.pointer_move(pointer, now)?;
        self.dispatch(transition);
        Ok(())
    }

    /// Process a held pointer sample whose frame has come due.
    pub fn poll(&mut self, now: Instant) {
        if let Some(transition) = self.controller.poll(now) {
            self.dispatch(transition);
        }
    }

    /// End the gesture and commit it.
    pub fn release(&mut self) -> Result<()> {
        let transition = self.controller.commit(&mut self.store)?;
        self.dispatch(transition);
        Ok(())
    }

    /// End the gesture without committing; the layout is restored.
    pub fn cancel_interaction(&mut self) -> Result<()> {
        let transition = self
            .controller
            .cancel(&mut self.store, CancelReason::UserAbort)?;
        self.dispatch(transition);
        Ok(())
    }

    fn abandon_interaction(&mut self) {
        if let Some(transition) = self.controller.force_cancel() {
            self.dispatch(transition);
        }
    }

    fn dispatch(&mut self, transition: InteractionTransition) {
        match transition.effect {
            InteractionEffect::Started { item, kind, origin } => {
                let event = match kind {
                    InteractionKind::Drag => GridEvent::DragStart { item, rect: origin },
                    InteractionKind::Resize { .. } => GridEvent::ResizeStart { item, rect: origin },
                };
                self.emit(event);
            }
            InteractionEffect::Previewed {
                item,
                kind,
                candidate,
                blocked,
            } => {
                let event = match kind {
                    InteractionKind::Drag => GridEvent::Drag {
                        item,
                        candidate,
                        blocked,
                    },
                    InteractionKind::Resize { .. } => GridEvent::Resize {
                        item,
                        candidate,
                        blocked,
                    },
                };
                self.emit(event);
            }
            InteractionEffect::Committed {
                item,
                kind,
                rect,
                displaced,
            } => {
                let mut changed = Vec::new();
                if self.store.last_touched().contains(&item) {
                    changed = self.touched();
                }
                let (event, change) = match kind {
                    CommitKind::Move => (
                        GridEvent::DragEnd {
                            item,
                            rect,
                            displaced,
                            rejected: None,
                        },
                        ChangeKind::Move,
                    ),
                    CommitKind::Resize => (
                        GridEvent::ResizeEnd {
                            item,
                            rect,
                            displaced,
                            rejected: None,
                        },
                        ChangeKind::Resize,
                    ),
                };
                self.emit(event);
                self.record_change(change, changed, ChangeSource::User);
            }
            InteractionEffect::Rejected {
                item,
                reason,
                restored,
            } => {
                let rect = self
                    .store
                    .item(item.as_str())
                    .map_or_else(GridRect::default, GridItem::rect);
                let event = match &transition.from {
                    InteractionState::Committing {
                        kind: InteractionKind::Resize { .. },
                        ..
                    } => GridEvent::ResizeEnd {
                        item,
                        rect,
                        displaced: Vec::new(),
                        rejected: Some(reason),
                    },
                    _ => GridEvent::DragEnd {
                        item,
                        rect,
                        displaced: Vec::new(),
                        rejected: Some(reason),
                    },
                };
                self.emit(event);
                self.emit_change(ChangeKind::Move, restored, ChangeSource::User);
            }
            InteractionEffect::Cancelled {
                item,
                kind,
                reason,
                restored,
            } => {
                let event = match kind {
                    InteractionKind::Drag => GridEvent::DragCancel { item, reason },
                    InteractionKind::Resize { .. } => GridEvent::ResizeCancel { item, reason },
                };
                self.emit(event);
                self.emit_change(ChangeKind::Move, restored, ChangeSource::User);
            }
            InteractionEffect::CommitRequested { .. }
            | InteractionEffect::CancelRequested { .. }
            | InteractionEffect::Noop { .. } => {}
        }
    }

    /// Apply a rectangle directly, bypassing the gesture lifecycle.
    pub fn apply_rect(&mut self, id: &str, rect: GridRect) -> ApplyOutcome {
        self.abandon_interaction();
        let outcome = self.store.apply_rect(id, rect);
        if outcome.is_applied() {
            self.record_change(ChangeKind::Update, self.touched(), ChangeSource::Api);
        }
        outcome
    }
}

/// Ids in `new` whose rectangle differs from `old`, or that `old` lacks.
fn changed_rects(old: &LayoutStore, new: &LayoutStore) -> Vec<ItemId> {
    new.items()
        .iter()
        .filter(|item| old.item(item.id.as_str()).is_none_or(|prev| prev.rect() != item.rect()))
        .map(|item| item.id.clone())
        .collect()
}

fn effective_options(base: &GridOptions, breakpoint: Option<&Breakpoint>) -> GridOptions {
    let Some(bp) = breakpoint else {
        return base.clone();
    };
    let mut options = base.clone().with_column(bp.column);
    if let Some(cell_height) = bp.cell_height {
        options = options.with_cell_height(cell_height);
    }
    options
}
