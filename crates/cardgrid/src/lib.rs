#![forbid(unsafe_code)]

//! Draggable, resizable card grid.
//!
//! [`Grid`] ties the layout engine in `cardgrid-layout` to a host surface:
//! it tracks the container width and active breakpoint, drives pointer
//! gestures through the interaction controller, persists layouts as JSON
//! and notifies listeners with [`GridEvent`]s.
//!
//! Rendering is left to the host. It asks [`Grid::pixel_rect`] where each
//! card goes and [`Grid::surface_height`] how tall the surface must be.

pub mod batch;
pub mod error;
pub mod event;
pub mod grid;

pub use batch::GridBatch;
pub use error::{Error, Result};
pub use event::{ChangeKind, ChangeSource, GridEvent};
pub use grid::{Grid, ListenerId};

pub use cardgrid_layout::{
    ApplyOutcome, ArrangeOptions, Arrangement, Breakpoint, CancelReason, CellHeight, CellMetrics,
    CollisionMode, DEFAULT_SNAP_THRESHOLD, GridItem, GridOptions, GridPosition, GridRect, GridSize,
    Guide, GuideAxis, InteractionKind, ItemId, ItemPatch, LAYOUT_SCHEMA_VERSION, LayoutSnapshot,
    LayoutStore, PixelPoint, PixelRect, Preview, RejectReason, ResizeHandle, Sides, SnapTarget,
    StartGuard,
};

/// Install a global JSON `tracing` subscriber filtered by `RUST_LOG`.
///
/// Returns an error if a global subscriber is already set.
#[cfg(feature = "tracing-json")]
pub fn init_tracing() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
}
