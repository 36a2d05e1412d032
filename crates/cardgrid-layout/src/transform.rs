//! Grid-unit <-> pixel coordinate transform.
//!
//! Every function here is pure. Results depend only on the container width
//! and [`GridOptions`], so hosts recompute [`CellMetrics`] whenever their
//! surface resizes and pass the same values back in.

use cardgrid_core::{GridPosition, GridRect, PixelPoint, PixelRect};

use crate::options::{CellHeight, GridOptions};

/// Pixel width of one column.
///
/// Negative results (container narrower than its margins and gaps) are
/// floored at zero.
#[must_use]
pub fn cell_width(container_width: f64, options: &GridOptions) -> f64 {
    let columns = f64::from(options.column.max(1));
    let gaps = options.gap * (columns - 1.0);
    let width = (container_width - options.margin.horizontal_sum() - gaps) / columns;
    if width.is_finite() { width.max(0.0) } else { 0.0 }
}

/// Pixel height of one row.
#[must_use]
pub fn cell_height(container_width: f64, options: &GridOptions) -> f64 {
    match options.cell_height {
        CellHeight::Fixed(height) => height,
        CellHeight::Auto => cell_width(container_width, options),
    }
}

/// Measured cell size for one container width.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellMetrics {
    pub cell_width: f64,
    pub cell_height: f64,
}

impl CellMetrics {
    #[must_use]
    pub fn measure(container_width: f64, options: &GridOptions) -> Self {
        Self {
            cell_width: cell_width(container_width, options),
            cell_height: cell_height(container_width, options),
        }
    }

    /// Horizontal distance between the left edges of adjacent columns.
    #[inline]
    #[must_use]
    pub fn column_stride(&self, options: &GridOptions) -> f64 {
        self.cell_width + options.gap
    }

    /// Vertical distance between the top edges of adjacent rows.
    #[inline]
    #[must_use]
    pub fn row_stride(&self, options: &GridOptions) -> f64 {
        self.cell_height + options.gap
    }
}

/// Pixel rectangle covered by a grid rectangle.
#[must_use]
pub fn grid_to_pixel(rect: GridRect, cell_w: f64, cell_h: f64, options: &GridOptions) -> PixelRect {
    let gap = options.gap;
    let (x, y) = (f64::from(rect.x), f64::from(rect.y));
    let (w, h) = (f64::from(rect.w), f64::from(rect.h));
    PixelRect::new(
        options.margin.left + x * (cell_w + gap),
        options.margin.top + y * (cell_h + gap),
        w * cell_w + (w - 1.0).max(0.0) * gap,
        h * cell_h + (h - 1.0).max(0.0) * gap,
    )
}

/// Nearest grid cell to a pixel point, floored at `(0, 0)`.
#[must_use]
pub fn pixel_to_grid(
    point: PixelPoint,
    cell_w: f64,
    cell_h: f64,
    options: &GridOptions,
) -> GridPosition {
    let x = round_to_cell((point.x - options.margin.left) / (cell_w + options.gap));
    let y = round_to_cell((point.y - options.margin.top) / (cell_h + options.gap));
    GridPosition::new(x, y)
}

/// Pixel height of a surface holding `rows` rows.
#[must_use]
pub fn grid_pixel_height(rows: u16, metrics: CellMetrics, options: &GridOptions) -> f64 {
    let margins = options.margin.vertical_sum();
    if rows == 0 {
        return margins;
    }
    margins + f64::from(rows) * metrics.row_stride(options) - options.gap
}

/// Whole-cell count for a pointer delta along one axis.
#[must_use]
pub fn delta_to_cells(delta_px: f64, cell: f64, gap: f64) -> i32 {
    round_to_i32(delta_px / (cell + gap))
}

fn round_to_i32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    if value >= f64::from(i32::MAX) {
        return i32::MAX;
    }
    if value <= f64::from(i32::MIN) {
        return i32::MIN;
    }
    value.round() as i32
}

fn round_to_cell(value: f64) -> u16 {
    round_to_i32(value).clamp(0, i32::from(u16::MAX)) as u16
}
