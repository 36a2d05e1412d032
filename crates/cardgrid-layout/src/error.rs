//! Error types for layout, snapshot and interaction operations.

use std::fmt;

use crate::item::ItemId;

/// Option values no layout can be computed with.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsError {
    ZeroColumns,
    InvalidGap { gap: f64 },
    InvalidMargin,
    InvalidCellHeight { height: f64 },
    MinRowAboveMaxRow { min_row: u16, max_row: u16 },
    InvalidBreakpoint { name: String },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroColumns => write!(f, "column count must be > 0"),
            Self::InvalidGap { gap } => write!(f, "gap must be finite and >= 0 (got {gap})"),
            Self::InvalidMargin => write!(f, "margins must be finite and >= 0"),
            Self::InvalidCellHeight { height } => {
                write!(f, "cell height must be finite and > 0 (got {height})")
            }
            Self::MinRowAboveMaxRow { min_row, max_row } => {
                write!(f, "min_row {min_row} exceeds max_row {max_row}")
            }
            Self::InvalidBreakpoint { name } => write!(f, "breakpoint '{name}' is invalid"),
        }
    }
}

impl std::error::Error for OptionsError {}

/// Layout store mutation errors.
///
/// Unknown ids are not errors; operations that target an absent item report
/// that through their `bool`/`Option` return instead.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    DuplicateId {
        id: ItemId,
    },
    InvalidConstraints {
        id: ItemId,
        reason: &'static str,
    },
    /// The item's minimum span cannot fit the grid.
    InvalidSize {
        id: ItemId,
        min_w: u16,
        min_h: u16,
        column: u16,
        max_row: u16,
    },
    /// A bounded grid has no free rectangle for the item.
    NoSpace {
        id: ItemId,
        w: u16,
        h: u16,
    },
    InvalidOptions(OptionsError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "item id '{id}' already exists"),
            Self::InvalidConstraints { id, reason } => {
                write!(f, "item '{id}' has invalid constraints: {reason}")
            }
            Self::InvalidSize {
                id,
                min_w,
                min_h,
                column,
                max_row,
            } => write!(
                f,
                "item '{id}' minimum span {min_w}x{min_h} cannot fit {column} columns / max_row {max_row}"
            ),
            Self::NoSpace { id, w, h } => {
                write!(f, "no free {w}x{h} space for item '{id}' in bounded grid")
            }
            Self::InvalidOptions(error) => write!(f, "invalid grid options: {error}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::InvalidOptions(error) = self {
            return Some(error);
        }
        None
    }
}

impl From<OptionsError> for LayoutError {
    fn from(value: OptionsError) -> Self {
        Self::InvalidOptions(value)
    }
}

/// Persisted layout decode/validation errors.
#[derive(Debug)]
pub enum SnapshotError {
    UnsupportedVersion { expected: u16, actual: u16 },
    DuplicateId { id: ItemId },
    InvalidItem(LayoutError),
    InvalidOptions(OptionsError),
    Json(serde_json::Error),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { expected, actual } => write!(
                f,
                "unsupported layout schema version {actual} (expected {expected})"
            ),
            Self::DuplicateId { id } => write!(f, "layout contains duplicate id '{id}'"),
            Self::InvalidItem(error) => write!(f, "invalid layout item: {error}"),
            Self::InvalidOptions(error) => write!(f, "invalid layout options: {error}"),
            Self::Json(error) => write!(f, "layout JSON decode failed: {error}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidItem(error) => Some(error),
            Self::InvalidOptions(error) => Some(error),
            Self::Json(error) => Some(error),
            Self::UnsupportedVersion { .. } | Self::DuplicateId { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Interaction controller lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    AlreadyActive { active: ItemId },
    NotActive,
    UnknownItem { id: ItemId },
    NotDraggable { id: ItemId },
    NotResizable { id: ItemId },
    HandleDisabled { handle: &'static str },
}

impl fmt::Display for InteractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive { active } => {
                write!(f, "an interaction on '{active}' is already active")
            }
            Self::NotActive => write!(f, "no interaction is active"),
            Self::UnknownItem { id } => write!(f, "unknown item '{id}'"),
            Self::NotDraggable { id } => write!(f, "item '{id}' cannot be dragged"),
            Self::NotResizable { id } => write!(f, "item '{id}' cannot be resized"),
            Self::HandleDisabled { handle } => {
                write!(f, "resize handle '{handle}' is not enabled")
            }
        }
    }
}

impl std::error::Error for InteractionError {}

/// A broken layout invariant, reported by
/// [`crate::LayoutStore::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    OutOfColumns { id: ItemId, right: u16, column: u16 },
    OutOfRows { id: ItemId, bottom: u16, max_row: u16 },
    ConstraintViolated { id: ItemId },
    Overlap { first: ItemId, second: ItemId },
    DuplicateId { id: ItemId },
    IndexMismatch { id: ItemId },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfColumns { id, right, column } => {
                write!(f, "item '{id}' right edge {right} exceeds {column} columns")
            }
            Self::OutOfRows {
                id,
                bottom,
                max_row,
            } => write!(f, "item '{id}' bottom edge {bottom} exceeds max_row {max_row}"),
            Self::ConstraintViolated { id } => {
                write!(f, "item '{id}' size is outside its min/max constraints")
            }
            Self::Overlap { first, second } => {
                write!(f, "items '{first}' and '{second}' overlap")
            }
            Self::DuplicateId { id } => write!(f, "id '{id}' appears more than once"),
            Self::IndexMismatch { id } => write!(f, "index entry for '{id}' is stale"),
        }
    }
}

impl std::error::Error for InvariantViolation {}
