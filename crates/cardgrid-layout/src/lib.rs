#![forbid(unsafe_code)]

//! Grid layout engine for draggable, resizable cards.
//!
//! # Role in cardgrid
//! `cardgrid-layout` owns every rule about where cards may sit:
//!
//! - [`LayoutStore`]: canonical item rectangles, batching and rollback.
//! - [`collision`]: overlap detection and push/swap resolution.
//! - [`placement`]: first-fit search and reflow into new bounds.
//! - [`compact`]: upward gravity.
//! - [`arrange`]: whole-layout arrangements and alignment guides.
//! - [`transform`]: grid units to host pixels and back.
//! - [`InteractionController`]: the drag/resize preview, commit and cancel
//!   lifecycle.
//! - [`LayoutSnapshot`]: the versioned persisted form.
//!
//! # How it fits in the system
//! The `cardgrid` facade owns one store and one controller, translates host
//! pointer input through [`transform`], and turns store results into events.
//! Nothing here renders or performs I/O.

pub mod arrange;
pub mod collision;
pub mod compact;
pub mod error;
pub mod interaction;
pub mod item;
pub mod options;
pub mod placement;
pub mod snapshot;
pub mod store;
pub mod transform;

pub use arrange::{
    ArrangeOptions, Arrangement, DEFAULT_SNAP_THRESHOLD, Guide, GuideAxis, SnapTarget,
};
pub use collision::{CollisionReport, RejectReason, Resolution};
pub use error::{InteractionError, InvariantViolation, LayoutError, OptionsError, SnapshotError};
pub use interaction::{
    CancelReason, CommitKind, InteractionController, InteractionEffect, InteractionKind,
    InteractionNoopReason, InteractionState, InteractionTransition, Preview, StartGuard,
};
pub use item::{GridItem, ItemId, ItemPatch};
pub use options::{Breakpoint, CellHeight, CollisionMode, GridOptions, ResizeHandle};
pub use snapshot::{LAYOUT_SCHEMA_VERSION, LayoutSnapshot};
pub use store::{ApplyOutcome, LayoutStore, PlacementReport};
pub use transform::CellMetrics;

pub use cardgrid_core::{GridPosition, GridRect, GridSize, PixelPoint, PixelRect, Sides};
