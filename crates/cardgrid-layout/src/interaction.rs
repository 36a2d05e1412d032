//! Drag/resize interaction lifecycle.
//!
//! ```text
//! Idle -> Active -> Committing -> Idle
//!            \----> Cancelling -> Idle
//! Idle -> Idle (start vetoed)
//! ```
//!
//! The controller never mutates the canonical [`LayoutStore`] while a gesture
//! is live. At start it clones the store; each pointer tick computes a
//! candidate rectangle for the target, applies it to a fresh copy of that
//! clone and reports the settled result as a [`Preview`]. The canonical store
//! is touched exactly once, by [`InteractionController::commit`] or
//! [`InteractionController::cancel`].
//!
//! Every step is recorded as an [`InteractionTransition`] with a monotonic
//! `transition_id`, including coalesced samples, which are reported as
//! [`InteractionEffect::Noop`].

use std::collections::VecDeque;
use std::fmt;

use cardgrid_core::{FrameThrottle, GridRect, PixelPoint};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use web_time::{Duration, Instant};

use crate::collision::RejectReason;
use crate::error::InteractionError;
use crate::item::{GridItem, ItemId};
use crate::options::{GridOptions, ResizeHandle};
use crate::store::{ApplyOutcome, LayoutStore};
use crate::transform::{self, CellMetrics};

/// Transitions kept for [`InteractionController::drain_transitions`].
pub const TRANSITION_HISTORY_LIMIT: usize = 256;

/// Gesture being performed on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionKind {
    Drag,
    Resize { handle: ResizeHandle },
}

impl InteractionKind {
    #[must_use]
    pub const fn commit_kind(self) -> CommitKind {
        match self {
            Self::Drag => CommitKind::Move,
            Self::Resize { .. } => CommitKind::Resize,
        }
    }
}

/// What a successful commit did to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    Move,
    Resize,
}

/// Why an interaction ended without a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The user aborted the gesture (escape key, pointer cancel).
    UserAbort,
    /// The start guard refused the gesture.
    Vetoed,
    /// Host code cancelled.
    Programmatic,
    /// The target disappeared from the store before commit.
    TargetRemoved,
}

/// Controller lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InteractionState {
    Idle,
    Active { item: ItemId, kind: InteractionKind },
    Committing { item: ItemId, kind: InteractionKind },
    Cancelling { item: ItemId, kind: InteractionKind },
}

impl InteractionState {
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Explicit no-op diagnostics for samples that change nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionNoopReason {
    /// The sample is held until the next frame.
    SampleCoalesced,
    /// The sample maps to the current candidate.
    CandidateUnchanged,
}

/// Effect emitted by one lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum InteractionEffect {
    Started {
        item: ItemId,
        kind: InteractionKind,
        origin: GridRect,
    },
    Previewed {
        item: ItemId,
        kind: InteractionKind,
        candidate: GridRect,
        blocked: bool,
    },
    CommitRequested {
        item: ItemId,
        candidate: GridRect,
    },
    Committed {
        item: ItemId,
        kind: CommitKind,
        rect: GridRect,
        displaced: Vec<ItemId>,
    },
    Rejected {
        item: ItemId,
        reason: RejectReason,
        restored: Vec<ItemId>,
    },
    CancelRequested {
        item: ItemId,
        reason: CancelReason,
    },
    Cancelled {
        item: ItemId,
        kind: InteractionKind,
        reason: CancelReason,
        restored: Vec<ItemId>,
    },
    Noop {
        reason: InteractionNoopReason,
    },
}

/// One state-machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionTransition {
    pub transition_id: u64,
    pub from: InteractionState,
    pub to: InteractionState,
    pub effect: InteractionEffect,
}

/// Settled layout for the current candidate, computed on a scratch copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub item: ItemId,
    pub candidate: GridRect,
    /// The candidate would land on a static/locked item or overflow a
    /// bounded grid. `rects` then shows the unchanged layout.
    pub blocked: bool,
    /// Every item's previewed rectangle, in store order.
    pub rects: Vec<(ItemId, GridRect)>,
}

impl Preview {
    #[must_use]
    pub fn rect_of(&self, id: &str) -> Option<GridRect> {
        self.rects
            .iter()
            .find(|(item, _)| item.as_str() == id)
            .map(|&(_, rect)| rect)
    }
}

/// Predicate consulted before a gesture starts. Returning `false` vetoes it.
pub type StartGuard = Box<dyn FnMut(&GridItem, InteractionKind) -> bool + Send>;

#[derive(Debug)]
struct Session {
    item: ItemId,
    kind: InteractionKind,
    origin_pointer: PixelPoint,
    /// Pointer offset from the target's pixel top-left at start.
    grab_offset: (f64, f64),
    original: GridRect,
    snapshot: LayoutStore,
    candidates: FxHashMap<ItemId, GridRect>,
    throttle: FrameThrottle<PixelPoint>,
    metrics: CellMetrics,
    preview: Option<Preview>,
}

impl Session {
    fn candidate(&self) -> GridRect {
        self.candidates
            .get(&self.item)
            .copied()
            .unwrap_or(self.original)
    }

    fn options(&self) -> &GridOptions {
        self.snapshot.options()
    }

    /// Candidate rectangle for a pointer sample.
    fn candidate_for(&self, pointer: PixelPoint) -> GridRect {
        match self.kind {
            InteractionKind::Drag => self.drag_candidate(pointer),
            InteractionKind::Resize { handle } => self.resize_candidate(pointer, handle),
        }
    }

    fn drag_candidate(&self, pointer: PixelPoint) -> GridRect {
        let options = self.options();
        let top_left = PixelPoint::new(
            pointer.x - self.grab_offset.0,
            pointer.y - self.grab_offset.1,
        );
        let cell = transform::pixel_to_grid(
            top_left,
            self.metrics.cell_width,
            self.metrics.cell_height,
            options,
        );
        let size = self.original.size();
        GridRect::from_parts(GridItem::clamp_position(cell, size, options), size)
    }

    fn resize_candidate(&self, pointer: PixelPoint, handle: ResizeHandle) -> GridRect {
        let options = self.options();
        let original = self.original;
        let Some(item) = self.snapshot.item(self.item.as_str()) else {
            return original;
        };
        let (dx, dy) = pointer.delta_from(self.origin_pointer);
        let cols = transform::delta_to_cells(dx, self.metrics.cell_width, options.gap);
        let rows = transform::delta_to_cells(dy, self.metrics.cell_height, options.gap);

        let mut w = i32::from(original.w);
        let mut h = i32::from(original.h);
        if handle.east() {
            w = w.saturating_add(cols);
        }
        if handle.west() {
            w = w.saturating_sub(cols);
        }
        if handle.south() {
            h = h.saturating_add(rows);
        }
        if handle.north() {
            h = h.saturating_sub(rows);
        }

        let room_w = if handle.west() {
            original.right()
        } else {
            options.column.saturating_sub(original.x)
        };
        let room_h = if handle.north() {
            original.bottom()
        } else if options.is_bounded() {
            options.max_row.saturating_sub(original.y)
        } else {
            u16::MAX
        };
        let w = clamp_span(w, item.min_w, item.max_w, room_w);
        let h = clamp_span(h, item.min_h, item.max_h, room_h);

        let x = if handle.west() {
            original.right().saturating_sub(w)
        } else {
            original.x
        };
        let y = if handle.north() {
            original.bottom().saturating_sub(h)
        } else {
            original.y
        };
        GridRect::new(x, y, w, h)
    }

    fn compute_preview(&self, candidate: GridRect) -> Preview {
        let mut scratch = self.snapshot.clone();
        let blocked = matches!(
            scratch.apply_rect(self.item.as_str(), candidate),
            ApplyOutcome::Rejected(_)
        );
        Preview {
            item: self.item.clone(),
            candidate,
            blocked,
            rects: scratch
                .items()
                .iter()
                .map(|item| (item.id.clone(), item.rect()))
                .collect(),
        }
    }
}

fn clamp_span(value: i32, min: u16, max: Option<u16>, room: u16) -> u16 {
    let upper = max.unwrap_or(u16::MAX).min(room).max(min);
    value.clamp(i32::from(min), i32::from(upper)) as u16
}

/// Drives one drag or resize gesture at a time.
pub struct InteractionController {
    state: InteractionState,
    session: Option<Session>,
    transition_counter: u64,
    history: VecDeque<InteractionTransition>,
    start_guard: Option<StartGuard>,
    frame_interval: Duration,
}

impl fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionController")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("transition_counter", &self.transition_counter)
            .field("history", &self.history.len())
            .field("start_guard", &self.start_guard.is_some())
            .field("frame_interval", &self.frame_interval)
            .finish()
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    #[must_use]
    pub fn new() -> Self {
        Self::with_frame_interval(cardgrid_core::DEFAULT_FRAME_INTERVAL)
    }

    /// Controller whose pointer throttle releases at most once per `interval`.
    #[must_use]
    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            state: InteractionState::Idle,
            session: None,
            transition_counter: 0,
            history: VecDeque::new(),
            start_guard: None,
            frame_interval,
        }
    }

    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Target of the live gesture.
    #[must_use]
    pub fn active_item(&self) -> Option<&ItemId> {
        self.session.as_ref().map(|session| &session.item)
    }

    #[must_use]
    pub fn active_kind(&self) -> Option<InteractionKind> {
        self.session.as_ref().map(|session| session.kind)
    }

    /// Candidate rectangle for `id` in the live gesture.
    #[must_use]
    pub fn candidate(&self, id: &str) -> Option<GridRect> {
        self.session
            .as_ref()
            .and_then(|session| session.candidates.get(id).copied())
    }

    /// Most recent preview, if the pointer has moved since start.
    #[must_use]
    pub fn preview(&self) -> Option<&Preview> {
        self.session.as_ref().and_then(|session| session.preview.as_ref())
    }

    /// Install or clear the start guard.
    pub fn set_start_guard(&mut self, guard: Option<StartGuard>) {
        self.start_guard = guard;
    }

    /// Take the recorded transitions, oldest first.
    pub fn drain_transitions(&mut self) -> Vec<InteractionTransition> {
        self.history.drain(..).collect()
    }

    /// Start dragging `id`. `pointer` is where the press happened.
    pub fn begin_drag(
        &mut self,
        store: &LayoutStore,
        id: &str,
        pointer: PixelPoint,
        metrics: CellMetrics,
    ) -> Result<InteractionTransition, InteractionError> {
        self.begin(store, id, InteractionKind::Drag, pointer, metrics)
    }

    /// Start resizing `id` from `handle`.
    pub fn begin_resize(
        &mut self,
        store: &LayoutStore,
        id: &str,
        handle: ResizeHandle,
        pointer: PixelPoint,
        metrics: CellMetrics,
    ) -> Result<InteractionTransition, InteractionError> {
        self.begin(store, id, InteractionKind::Resize { handle }, pointer, metrics)
    }

    fn begin(
        &mut self,
        store: &LayoutStore,
        id: &str,
        kind: InteractionKind,
        pointer: PixelPoint,
        metrics: CellMetrics,
    ) -> Result<InteractionTransition, InteractionError> {
        if let Some(session) = &self.session {
            return Err(InteractionError::AlreadyActive {
                active: session.item.clone(),
            });
        }
        let item = store
            .item(id)
            .ok_or_else(|| InteractionError::UnknownItem { id: ItemId::new(id) })?;
        let options = store.options();
        match kind {
            InteractionKind::Drag => {
                if !item.can_drag(options) {
                    return Err(InteractionError::NotDraggable {
                        id: item.id.clone(),
                    });
                }
            }
            InteractionKind::Resize { handle } => {
                if !options.handle_enabled(handle) {
                    return Err(InteractionError::HandleDisabled {
                        handle: handle.as_str(),
                    });
                }
                if !item.can_resize(options) {
                    return Err(InteractionError::NotResizable {
                        id: item.id.clone(),
                    });
                }
            }
        }

        if let Some(guard) = self.start_guard.as_mut()
            && !guard(item, kind)
        {
            debug!(target: "cardgrid.interaction", id = %item.id, ?kind, "start vetoed");
            return Ok(self.record(
                InteractionState::Idle,
                InteractionEffect::Cancelled {
                    item: item.id.clone(),
                    kind,
                    reason: CancelReason::Vetoed,
                    restored: Vec::new(),
                },
            ));
        }

        let original = item.rect();
        let pixel = transform::grid_to_pixel(
            original,
            metrics.cell_width,
            metrics.cell_height,
            options,
        );
        let item_id = item.id.clone();
        let mut candidates = FxHashMap::default();
        candidates.insert(item_id.clone(), original);
        self.session = Some(Session {
            item: item_id.clone(),
            kind,
            origin_pointer: pointer,
            grab_offset: pointer.delta_from(pixel.origin()),
            original,
            snapshot: store.clone(),
            candidates,
            throttle: FrameThrottle::with_interval(self.frame_interval),
            metrics,
            preview: None,
        });
        debug!(
            target: "cardgrid.interaction",
            id = %item_id,
            ?kind,
            x = original.x,
            y = original.y,
            "interaction started"
        );
        Ok(self.record(
            InteractionState::Active {
                item: item_id.clone(),
                kind,
            },
            InteractionEffect::Started {
                item: item_id,
                kind,
                origin: original,
            },
        ))
    }

    /// Feed one pointer sample.
    ///
    /// Samples inside the current frame are held and reported as
    /// [`InteractionNoopReason::SampleCoalesced`]; [`Self::poll`] releases
    /// them once the frame boundary passes.
    pub fn pointer_move(
        &mut self,
        pointer: PixelPoint,
        now: Instant,
    ) -> Result<InteractionTransition, InteractionError> {
        let session = self.session.as_mut().ok_or(InteractionError::NotActive)?;
        let effect = match session.throttle.push(pointer, now) {
            Some(sample) => Self::tick(session, sample),
            None => InteractionEffect::Noop {
                reason: InteractionNoopReason::SampleCoalesced,
            },
        };
        let to = self.state.clone();
        Ok(self.record(to, effect))
    }

    /// Release a held sample whose frame has come due.
    pub fn poll(&mut self, now: Instant) -> Option<InteractionTransition> {
        let session = self.session.as_mut()?;
        let sample = session.throttle.poll(now)?;
        let effect = Self::tick(session, sample);
        let to = self.state.clone();
        Some(self.record(to, effect))
    }

    fn tick(session: &mut Session, pointer: PixelPoint) -> InteractionEffect {
        let candidate = session.candidate_for(pointer);
        if candidate == session.candidate() && session.preview.is_some() {
            return InteractionEffect::Noop {
                reason: InteractionNoopReason::CandidateUnchanged,
            };
        }
        let _span = tracing::debug_span!(
            target: "cardgrid.interaction",
            "interaction.preview",
            id = %session.item,
            x = candidate.x,
            y = candidate.y,
            w = candidate.w,
            h = candidate.h,
        )
        .entered();
        session.candidates.insert(session.item.clone(), candidate);
        let preview = session.compute_preview(candidate);
        let blocked = preview.blocked;
        session.preview = Some(preview);
        InteractionEffect::Previewed {
            item: session.item.clone(),
            kind: session.kind,
            candidate,
            blocked,
        }
    }

    /// Apply the final candidate to the canonical store.
    ///
    /// Any held sample is flushed first. The candidate is resolved against
    /// `store` as it is now, not against the preview. If the store refuses,
    /// every item's geometry is restored from the start snapshot and the
    /// effect is [`InteractionEffect::Rejected`]. A target removed since
    /// start ends the gesture as cancelled.
    pub fn commit(&mut self, store: &mut LayoutStore) -> Result<InteractionTransition, InteractionError> {
        let mut session = self.session.take().ok_or(InteractionError::NotActive)?;
        if let Some(sample) = session.throttle.flush() {
            let candidate = session.candidate_for(sample);
            session.candidates.insert(session.item.clone(), candidate);
        }
        let item = session.item.clone();
        let kind = session.kind;
        let candidate = session.candidate();
        let _span = tracing::debug_span!(
            target: "cardgrid.interaction",
            "interaction.commit",
            id = %item,
            x = candidate.x,
            y = candidate.y,
            w = candidate.w,
            h = candidate.h,
        )
        .entered();

        self.record(
            InteractionState::Committing {
                item: item.clone(),
                kind,
            },
            InteractionEffect::CommitRequested {
                item: item.clone(),
                candidate,
            },
        );

        let effect = match store.apply_rect(item.as_str(), candidate) {
            outcome @ (ApplyOutcome::Applied | ApplyOutcome::Unchanged) => {
                let displaced = if outcome.is_applied() {
                    store
                        .last_touched()
                        .iter()
                        .filter(|id| **id != item)
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                let rect = store.item(item.as_str()).map_or(candidate, GridItem::rect);
                debug!(
                    target: "cardgrid.interaction",
                    id = %item,
                    displaced = displaced.len(),
                    "interaction committed"
                );
                InteractionEffect::Committed {
                    item,
                    kind: kind.commit_kind(),
                    rect,
                    displaced,
                }
            }
            ApplyOutcome::Rejected(reason) => {
                let restored = store.restore_geometry(&session.snapshot);
                warn!(
                    target: "cardgrid.interaction",
                    id = %item,
                    reason = ?reason,
                    "commit rejected; layout restored"
                );
                InteractionEffect::Rejected {
                    item,
                    reason,
                    restored,
                }
            }
            ApplyOutcome::Missing => {
                warn!(target: "cardgrid.interaction", id = %item, "target removed before commit");
                InteractionEffect::Cancelled {
                    item,
                    kind,
                    reason: CancelReason::TargetRemoved,
                    restored: Vec::new(),
                }
            }
        };
        Ok(self.record(InteractionState::Idle, effect))
    }

    /// Abandon the gesture and restore every item's geometry from the start
    /// snapshot.
    pub fn cancel(
        &mut self,
        store: &mut LayoutStore,
        reason: CancelReason,
    ) -> Result<InteractionTransition, InteractionError> {
        let session = self.session.take().ok_or(InteractionError::NotActive)?;
        let item = session.item.clone();
        let kind = session.kind;
        self.record(
            InteractionState::Cancelling {
                item: item.clone(),
                kind,
            },
            InteractionEffect::CancelRequested {
                item: item.clone(),
                reason,
            },
        );
        let restored = store.restore_geometry(&session.snapshot);
        debug!(
            target: "cardgrid.interaction",
            id = %item,
            ?reason,
            restored = restored.len(),
            "interaction cancelled"
        );
        Ok(self.record(
            InteractionState::Idle,
            InteractionEffect::Cancelled {
                item,
                kind,
                reason,
                restored,
            },
        ))
    }

    /// Drop the live gesture without touching any store.
    ///
    /// For hosts that are about to replace the store wholesale. Returns
    /// `None` when idle.
    pub fn force_cancel(&mut self) -> Option<InteractionTransition> {
        let session = self.session.take()?;
        Some(self.record(
            InteractionState::Idle,
            InteractionEffect::Cancelled {
                item: session.item,
                kind: session.kind,
                reason: CancelReason::Programmatic,
                restored: Vec::new(),
            },
        ))
    }

    fn record(&mut self, to: InteractionState, effect: InteractionEffect) -> InteractionTransition {
        let from = std::mem::replace(&mut self.state, to.clone());
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = InteractionTransition {
            transition_id: self.transition_counter,
            from,
            to,
            effect,
        };
        if self.history.len() == TRANSITION_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(transition.clone());
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CollisionMode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Default options: margin 10, gap 10. Strides are 110 x 90.
    const METRICS: CellMetrics = CellMetrics {
        cell_width: 100.0,
        cell_height: 80.0,
    };

    fn at_cell(x: u16, y: u16) -> PixelPoint {
        PixelPoint::new(10.0 + 110.0 * f64::from(x) + 5.0, 10.0 + 90.0 * f64::from(y) + 5.0)
    }

    fn store_with(options: GridOptions, items: &[GridItem]) -> LayoutStore {
        let mut store = LayoutStore::new(options).expect("options");
        for item in items {
            store.add_item(item.clone(), false).expect("add");
        }
        store
    }

    fn two_cards() -> LayoutStore {
        store_with(
            GridOptions::default(),
            &[
                GridItem::new("a", 4, 2).at(0, 0),
                GridItem::new("b", 4, 2).at(4, 0),
            ],
        )
    }

    #[test]
    fn drag_previews_without_touching_store() {
        let mut store = two_cards();
        let before = store.serialize();
        let mut ctl = InteractionController::new();
        let now = Instant::now();

        let start = ctl
            .begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        assert!(matches!(start.effect, InteractionEffect::Started { .. }));
        assert!(matches!(ctl.state(), InteractionState::Active { .. }));

        let tick = ctl.pointer_move(at_cell(4, 0), now).expect("move");
        assert!(matches!(
            tick.effect,
            InteractionEffect::Previewed { blocked: false, .. }
        ));
        assert_eq!(ctl.candidate("a"), Some(GridRect::new(4, 0, 4, 2)));
        let preview = ctl.preview().expect("preview");
        assert_eq!(preview.rect_of("b"), Some(GridRect::new(4, 2, 4, 2)));
        assert_eq!(store.serialize(), before);

        let done = ctl.commit(&mut store).expect("commit");
        match done.effect {
            InteractionEffect::Committed {
                kind, displaced, ..
            } => {
                assert_eq!(kind, CommitKind::Move);
                assert_eq!(displaced, vec![ItemId::from("b")]);
            }
            other => panic!("unexpected effect {other:?}"),
        }
        assert_eq!(store.item("b").map(GridItem::rect), Some(GridRect::new(4, 2, 4, 2)));
        assert!(ctl.state().is_idle());
        assert!(store.check_invariants().is_ok());
    }

    #[test]
    fn second_start_is_rejected() {
        let store = two_cards();
        let mut ctl = InteractionController::new();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        assert_eq!(
            ctl.begin_drag(&store, "b", at_cell(4, 0), METRICS),
            Err(InteractionError::AlreadyActive { active: "a".into() })
        );
    }

    #[test]
    fn start_checks_permissions() {
        let options = GridOptions::default().with_resize_handles([ResizeHandle::Se, ResizeHandle::W]);
        let store = store_with(
            options,
            &[
                GridItem::new("pinned", 2, 2).at(0, 0).with_locked(true),
                GridItem::new("still", 2, 2).at(2, 0).with_draggable(false),
                GridItem::new("free", 2, 2).at(4, 0),
            ],
        );
        let mut ctl = InteractionController::new();
        let p = at_cell(0, 0);
        assert!(matches!(
            ctl.begin_drag(&store, "nope", p, METRICS),
            Err(InteractionError::UnknownItem { .. })
        ));
        assert!(matches!(
            ctl.begin_drag(&store, "pinned", p, METRICS),
            Err(InteractionError::NotDraggable { .. })
        ));
        assert!(matches!(
            ctl.begin_drag(&store, "still", p, METRICS),
            Err(InteractionError::NotDraggable { .. })
        ));
        assert!(matches!(
            ctl.begin_resize(&store, "free", ResizeHandle::N, p, METRICS),
            Err(InteractionError::HandleDisabled { handle: "n" })
        ));
        assert!(matches!(
            ctl.begin_resize(&store, "pinned", ResizeHandle::Se, p, METRICS),
            Err(InteractionError::NotResizable { .. })
        ));
        assert!(ctl.state().is_idle());
        assert!(
            ctl.begin_resize(&store, "still", ResizeHandle::W, p, METRICS)
                .is_ok()
        );
    }

    #[test]
    fn start_guard_vetoes() {
        let store = two_cards();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut ctl = InteractionController::new();
        ctl.set_start_guard(Some(Box::new(move |item: &GridItem, _kind: InteractionKind| {
            seen.fetch_add(1, Ordering::SeqCst);
            item.id.as_str() != "b"
        })));

        let vetoed = ctl
            .begin_drag(&store, "b", at_cell(4, 0), METRICS)
            .expect("vetoed is not an error");
        assert_eq!(vetoed.from, InteractionState::Idle);
        assert_eq!(vetoed.to, InteractionState::Idle);
        assert!(matches!(
            vetoed.effect,
            InteractionEffect::Cancelled {
                reason: CancelReason::Vetoed,
                ..
            }
        ));
        assert!(!ctl.is_active());
        assert!(ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn samples_coalesce_within_a_frame() {
        let store = two_cards();
        let mut ctl = InteractionController::new();
        let now = Instant::now();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");

        assert!(matches!(
            ctl.pointer_move(at_cell(1, 0), now).expect("move").effect,
            InteractionEffect::Previewed { .. }
        ));
        let held = ctl.pointer_move(at_cell(2, 0), now).expect("move");
        assert_eq!(
            held.effect,
            InteractionEffect::Noop {
                reason: InteractionNoopReason::SampleCoalesced
            }
        );
        ctl.pointer_move(at_cell(3, 0), now).expect("move");
        assert!(ctl.poll(now).is_none());

        let released = ctl
            .poll(now + Duration::from_millis(16))
            .expect("due sample");
        assert!(matches!(
            released.effect,
            InteractionEffect::Previewed {
                candidate: GridRect { x: 3, .. },
                ..
            }
        ));
    }

    #[test]
    fn commit_flushes_held_sample() {
        let mut store = two_cards();
        let mut ctl = InteractionController::new();
        let now = Instant::now();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        ctl.pointer_move(at_cell(0, 1), now).expect("move");
        ctl.pointer_move(at_cell(8, 3), now).expect("held");
        ctl.commit(&mut store).expect("commit");
        assert_eq!(store.item("a").map(|a| a.x), Some(8));
    }

    #[test]
    fn unchanged_candidate_is_a_noop() {
        let store = two_cards();
        let mut ctl = InteractionController::with_frame_interval(Duration::ZERO);
        let now = Instant::now();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        ctl.pointer_move(at_cell(2, 0), now).expect("move");
        let again = ctl
            .pointer_move(PixelPoint::new(at_cell(2, 0).x + 3.0, 15.0), now)
            .expect("move");
        assert_eq!(
            again.effect,
            InteractionEffect::Noop {
                reason: InteractionNoopReason::CandidateUnchanged
            }
        );
    }

    #[test]
    fn cancel_restores_exact_geometry() {
        let mut store = two_cards();
        let before = store.serialize();
        let mut ctl = InteractionController::new();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        ctl.pointer_move(at_cell(4, 0), Instant::now()).expect("move");
        // A host mutation mid-gesture is undone too.
        assert!(store.move_item("b", 8, 3));

        let done = ctl
            .cancel(&mut store, CancelReason::UserAbort)
            .expect("cancel");
        assert_eq!(done.from, InteractionState::Cancelling {
            item: "a".into(),
            kind: InteractionKind::Drag,
        });
        assert!(matches!(
            done.effect,
            InteractionEffect::Cancelled {
                reason: CancelReason::UserAbort,
                ..
            }
        ));
        assert_eq!(store.serialize(), before);
        assert_eq!(ctl.cancel(&mut store, CancelReason::UserAbort), Err(InteractionError::NotActive));
    }

    #[test]
    fn cancel_after_host_add_keeps_layout_disjoint() {
        let mut store = two_cards();
        let mut ctl = InteractionController::new();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        store
            .add_item(GridItem::new("c", 4, 2).at(4, 0), false)
            .expect("add c");
        assert_eq!(store.item("b").map(GridItem::rect), Some(GridRect::new(4, 2, 4, 2)));

        let done = ctl
            .cancel(&mut store, CancelReason::UserAbort)
            .expect("cancel");
        let InteractionEffect::Cancelled { restored, .. } = done.effect else {
            panic!("expected cancel, got {:?}", done.effect);
        };
        assert!(restored.contains(&"b".into()) && restored.contains(&"c".into()));
        assert_eq!(store.item("b").map(GridItem::rect), Some(GridRect::new(4, 0, 4, 2)));
        assert_eq!(store.item("c").map(GridItem::rect), Some(GridRect::new(4, 2, 4, 2)));
        assert!(store.check_invariants().is_ok());
    }

    #[test]
    fn east_resize_is_limited_by_remaining_columns() {
        let mut store = store_with(GridOptions::default(), &[GridItem::new("a", 2, 2).at(10, 0)]);
        let mut ctl = InteractionController::new();
        let grip = PixelPoint::new(1300.0, 180.0);
        ctl.begin_resize(&store, "a", ResizeHandle::Se, grip, METRICS)
            .expect("start");
        ctl.pointer_move(PixelPoint::new(grip.x + 220.0, grip.y), Instant::now())
            .expect("move");
        assert_eq!(ctl.candidate("a"), Some(GridRect::new(10, 0, 2, 2)));
        let done = ctl.commit(&mut store).expect("commit");
        assert!(matches!(
            done.effect,
            InteractionEffect::Committed {
                kind: CommitKind::Resize,
                ..
            }
        ));
        assert_eq!(store.item("a").map(|a| a.w), Some(2));
    }

    #[test]
    fn west_resize_keeps_right_edge() {
        let options = GridOptions::default().with_resize_handles([ResizeHandle::W, ResizeHandle::Nw]);
        let mut store = store_with(options, &[GridItem::new("a", 2, 2).at(6, 0).with_max(Some(5), None)]);
        let mut ctl = InteractionController::with_frame_interval(Duration::ZERO);
        let grip = at_cell(6, 0);
        let now = Instant::now();
        ctl.begin_resize(&store, "a", ResizeHandle::W, grip, METRICS)
            .expect("start");

        ctl.pointer_move(PixelPoint::new(grip.x - 220.0, grip.y), now)
            .expect("grow");
        assert_eq!(ctl.candidate("a"), Some(GridRect::new(4, 0, 4, 2)));

        ctl.pointer_move(PixelPoint::new(grip.x - 660.0, grip.y), now)
            .expect("capped by max_w");
        assert_eq!(ctl.candidate("a"), Some(GridRect::new(3, 0, 5, 2)));

        ctl.pointer_move(PixelPoint::new(grip.x + 440.0, grip.y), now)
            .expect("shrink to min");
        assert_eq!(ctl.candidate("a"), Some(GridRect::new(7, 0, 1, 2)));

        ctl.commit(&mut store).expect("commit");
        assert_eq!(store.item("a").map(GridItem::rect), Some(GridRect::new(7, 0, 1, 2)));
    }

    #[test]
    fn blocked_preview_and_rejected_commit() {
        let mut store = store_with(
            GridOptions::default(),
            &[
                GridItem::new("wall", 4, 2).at(4, 0).with_static(true),
                GridItem::new("a", 4, 2).at(0, 0),
            ],
        );
        let before = store.serialize();
        let mut ctl = InteractionController::new();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        let tick = ctl.pointer_move(at_cell(3, 0), Instant::now()).expect("move");
        assert!(matches!(
            tick.effect,
            InteractionEffect::Previewed { blocked: true, .. }
        ));

        let done = ctl.commit(&mut store).expect("commit");
        assert!(matches!(
            done.effect,
            InteractionEffect::Rejected {
                reason: RejectReason::FixedBlocker { .. },
                ..
            }
        ));
        assert_eq!(store.serialize(), before);
    }

    #[test]
    fn removed_target_cancels_commit() {
        let mut store = two_cards();
        let mut ctl = InteractionController::new();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        store.remove_item("a");
        let done = ctl.commit(&mut store).expect("commit");
        assert!(matches!(
            done.effect,
            InteractionEffect::Cancelled {
                reason: CancelReason::TargetRemoved,
                ..
            }
        ));
    }

    #[test]
    fn swap_mode_commit_exchanges_positions() {
        let mut store = store_with(
            GridOptions::default().with_collision(CollisionMode::Swap),
            &[
                GridItem::new("a", 2, 2).at(0, 0),
                GridItem::new("b", 2, 2).at(2, 0),
            ],
        );
        let mut ctl = InteractionController::new();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        ctl.pointer_move(at_cell(2, 0), Instant::now()).expect("move");
        ctl.commit(&mut store).expect("commit");
        assert_eq!(store.item("a").map(GridItem::rect), Some(GridRect::new(2, 0, 2, 2)));
        assert_eq!(store.item("b").map(GridItem::rect), Some(GridRect::new(0, 0, 2, 2)));
    }

    #[test]
    fn transition_ids_are_monotonic_and_drainable() {
        let mut store = two_cards();
        let mut ctl = InteractionController::new();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        ctl.pointer_move(at_cell(1, 1), Instant::now()).expect("move");
        ctl.commit(&mut store).expect("commit");
        assert!(ctl.force_cancel().is_none());

        let log = ctl.drain_transitions();
        assert_eq!(log.len(), 4);
        assert!(log.windows(2).all(|w| w[0].transition_id < w[1].transition_id));
        assert!(matches!(log[2].to, InteractionState::Committing { .. }));
        assert!(ctl.drain_transitions().is_empty());
    }

    #[test]
    fn force_cancel_leaves_store_alone() {
        let store = two_cards();
        let mut ctl = InteractionController::new();
        ctl.begin_drag(&store, "a", at_cell(0, 0), METRICS)
            .expect("start");
        let t = ctl.force_cancel().expect("active");
        assert!(matches!(
            t.effect,
            InteractionEffect::Cancelled {
                reason: CancelReason::Programmatic,
                ..
            }
        ));
        assert!(ctl.state().is_idle());
    }
}
