//! Grid configuration.
//!
//! [`GridOptions`] is plain serde data with builder-style `with_*` methods.
//! Every consumer calls [`GridOptions::validate`] before trusting a value
//! that came from outside the process (a persisted snapshot, a host setting).

use cardgrid_core::Sides;
use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Default column count.
pub const DEFAULT_COLUMNS: u16 = 12;
/// Default fixed cell height in pixels.
pub const DEFAULT_CELL_HEIGHT: f64 = 80.0;
/// Default gap between cells in pixels.
pub const DEFAULT_GAP: f64 = 10.0;
/// Default margin on every side of the grid surface in pixels.
pub const DEFAULT_MARGIN: f64 = 10.0;

/// How the resolver treats a mover that overlaps other items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionMode {
    /// Displace colliders downward, cascading.
    #[default]
    Push,
    /// Exchange places with a sole collider.
    Swap,
    /// Allow overlap.
    None,
}

/// Row height policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellHeight {
    /// Fixed height in pixels.
    Fixed(f64),
    /// Square cells: height follows the computed cell width.
    Auto,
}

impl Default for CellHeight {
    fn default() -> Self {
        Self::Fixed(DEFAULT_CELL_HEIGHT)
    }
}

/// Resize handle, named by the edge or corner it drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        Self::N,
        Self::S,
        Self::E,
        Self::W,
        Self::Ne,
        Self::Nw,
        Self::Se,
        Self::Sw,
    ];

    /// Moves the top edge.
    #[must_use]
    pub const fn north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Moves the bottom edge.
    #[must_use]
    pub const fn south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Moves the right edge.
    #[must_use]
    pub const fn east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Moves the left edge.
    #[must_use]
    pub const fn west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::Ne => "ne",
            Self::Nw => "nw",
            Self::Se => "se",
            Self::Sw => "sw",
        }
    }
}

/// A responsive column count selected by container width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub name: String,
    /// Minimum container width in pixels at which this breakpoint applies.
    pub min_width: f64,
    pub column: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_height: Option<CellHeight>,
}

impl Breakpoint {
    #[must_use]
    pub fn new(name: impl Into<String>, min_width: f64, column: u16) -> Self {
        Self {
            name: name.into(),
            min_width,
            column,
            cell_height: None,
        }
    }

    #[must_use]
    pub fn with_cell_height(mut self, cell_height: CellHeight) -> Self {
        self.cell_height = Some(cell_height);
        self
    }
}

/// Grid-wide layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridOptions {
    pub column: u16,
    pub cell_height: CellHeight,
    pub gap: f64,
    pub margin: Sides,
    pub collision: CollisionMode,
    /// Disable compaction; items stay where they are dropped.
    pub float: bool,
    /// Row limit; 0 means unbounded.
    pub max_row: u16,
    /// Minimum rendered rows regardless of content.
    pub min_row: u16,
    pub rtl: bool,
    pub draggable: bool,
    pub resizable: bool,
    pub resize_handles: Vec<ResizeHandle>,
    pub breakpoints: Vec<Breakpoint>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            column: DEFAULT_COLUMNS,
            cell_height: CellHeight::default(),
            gap: DEFAULT_GAP,
            margin: Sides::all(DEFAULT_MARGIN),
            collision: CollisionMode::Push,
            float: false,
            max_row: 0,
            min_row: 0,
            rtl: false,
            draggable: true,
            resizable: true,
            resize_handles: vec![ResizeHandle::Se],
            breakpoints: Vec::new(),
        }
    }
}

impl GridOptions {
    #[must_use]
    pub fn with_column(mut self, column: u16) -> Self {
        self.column = column;
        self
    }

    #[must_use]
    pub fn with_cell_height(mut self, cell_height: CellHeight) -> Self {
        self.cell_height = cell_height;
        self
    }

    #[must_use]
    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: impl Into<Sides>) -> Self {
        self.margin = margin.into();
        self
    }

    #[must_use]
    pub fn with_collision(mut self, collision: CollisionMode) -> Self {
        self.collision = collision;
        self
    }

    #[must_use]
    pub fn with_float(mut self, float: bool) -> Self {
        self.float = float;
        self
    }

    #[must_use]
    pub fn with_max_row(mut self, max_row: u16) -> Self {
        self.max_row = max_row;
        self
    }

    #[must_use]
    pub fn with_min_row(mut self, min_row: u16) -> Self {
        self.min_row = min_row;
        self
    }

    #[must_use]
    pub fn with_rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }

    #[must_use]
    pub fn with_draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    #[must_use]
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    #[must_use]
    pub fn with_resize_handles(mut self, handles: impl IntoIterator<Item = ResizeHandle>) -> Self {
        self.resize_handles = handles.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_breakpoints(mut self, breakpoints: impl IntoIterator<Item = Breakpoint>) -> Self {
        self.breakpoints = breakpoints.into_iter().collect();
        self
    }

    /// Whether `max_row` limits the grid height.
    #[inline]
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.max_row > 0
    }

    /// Whether compaction runs after mutations.
    #[inline]
    #[must_use]
    pub const fn compacts(&self) -> bool {
        !self.float
    }

    #[must_use]
    pub fn handle_enabled(&self, handle: ResizeHandle) -> bool {
        self.resize_handles.contains(&handle)
    }

    /// Widest breakpoint whose `min_width` fits `container_width`.
    #[must_use]
    pub fn breakpoint_for(&self, container_width: f64) -> Option<&Breakpoint> {
        self.breakpoints
            .iter()
            .filter(|bp| bp.min_width <= container_width)
            .max_by(|a, b| a.min_width.total_cmp(&b.min_width))
    }

    /// Check every field for values no layout can be computed with.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.column == 0 {
            return Err(OptionsError::ZeroColumns);
        }
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(OptionsError::InvalidGap { gap: self.gap });
        }
        if !self.margin.is_valid() {
            return Err(OptionsError::InvalidMargin);
        }
        validate_cell_height(self.cell_height)?;
        if self.is_bounded() && self.min_row > self.max_row {
            return Err(OptionsError::MinRowAboveMaxRow {
                min_row: self.min_row,
                max_row: self.max_row,
            });
        }
        for bp in &self.breakpoints {
            if bp.column == 0 || !bp.min_width.is_finite() || bp.min_width < 0.0 {
                return Err(OptionsError::InvalidBreakpoint {
                    name: bp.name.clone(),
                });
            }
            if let Some(cell_height) = bp.cell_height {
                validate_cell_height(cell_height)?;
            }
        }
        Ok(())
    }
}

fn validate_cell_height(cell_height: CellHeight) -> Result<(), OptionsError> {
    match cell_height {
        CellHeight::Fixed(height) if !height.is_finite() || height <= 0.0 => {
            Err(OptionsError::InvalidCellHeight { height })
        }
        _ => Ok(()),
    }
}
