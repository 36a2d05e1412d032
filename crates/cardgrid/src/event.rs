//! Events delivered to [`crate::Grid`] listeners.

use cardgrid_layout::{Arrangement, CancelReason, GridRect, ItemId, RejectReason};
use serde::{Deserialize, Serialize};

/// What kind of mutation a [`GridEvent::Change`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Remove,
    Update,
    Move,
    Resize,
    Batch,
}

/// Who caused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// A pointer gesture committed or cancelled by the user.
    User,
    /// A direct API call.
    Api,
    /// A persisted layout was loaded.
    Load,
}

/// Notification emitted after the grid changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GridEvent {
    Added {
        items: Vec<ItemId>,
    },
    Removed {
        items: Vec<ItemId>,
    },
    /// Every item whose stored state changed, including collateral moves.
    Change {
        kind: ChangeKind,
        items: Vec<ItemId>,
        source: ChangeSource,
    },
    DragStart {
        item: ItemId,
        rect: GridRect,
    },
    Drag {
        item: ItemId,
        candidate: GridRect,
        blocked: bool,
    },
    /// `rejected` is set when the drop was refused and nothing moved.
    DragEnd {
        item: ItemId,
        rect: GridRect,
        displaced: Vec<ItemId>,
        rejected: Option<RejectReason>,
    },
    DragCancel {
        item: ItemId,
        reason: CancelReason,
    },
    ResizeStart {
        item: ItemId,
        rect: GridRect,
    },
    Resize {
        item: ItemId,
        candidate: GridRect,
        blocked: bool,
    },
    ResizeEnd {
        item: ItemId,
        rect: GridRect,
        displaced: Vec<ItemId>,
        rejected: Option<RejectReason>,
    },
    ResizeCancel {
        item: ItemId,
        reason: CancelReason,
    },
    Compact {
        moved: Vec<ItemId>,
    },
    /// Every movable item was rearranged. `moved` lists the items whose
    /// rectangle changed.
    Arrange {
        arrangement: Arrangement,
        moved: Vec<ItemId>,
    },
    /// The active breakpoint changed. `name` is `None` when the base options
    /// apply again.
    Breakpoint {
        name: Option<String>,
        column: u16,
    },
}

impl GridEvent {
    /// Stable snake_case name, matching the serialized `event` tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Removed { .. } => "removed",
            Self::Change { .. } => "change",
            Self::DragStart { .. } => "drag_start",
            Self::Drag { .. } => "drag",
            Self::DragEnd { .. } => "drag_end",
            Self::DragCancel { .. } => "drag_cancel",
            Self::ResizeStart { .. } => "resize_start",
            Self::Resize { .. } => "resize",
            Self::ResizeEnd { .. } => "resize_end",
            Self::ResizeCancel { .. } => "resize_cancel",
            Self::Compact { .. } => "compact",
            Self::Arrange { .. } => "arrange",
            Self::Breakpoint { .. } => "breakpoint",
        }
    }
}
