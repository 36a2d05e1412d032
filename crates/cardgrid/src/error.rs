//! Facade error type.

use std::fmt;

use cardgrid_layout::{InteractionError, LayoutError, OptionsError, SnapshotError};

/// Any failure surfaced by [`crate::Grid`].
#[derive(Debug)]
pub enum Error {
    Layout(LayoutError),
    Options(OptionsError),
    Snapshot(SnapshotError),
    Interaction(InteractionError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(error) => write!(f, "layout: {error}"),
            Self::Options(error) => write!(f, "options: {error}"),
            Self::Snapshot(error) => write!(f, "snapshot: {error}"),
            Self::Interaction(error) => write!(f, "interaction: {error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(error) => Some(error),
            Self::Options(error) => Some(error),
            Self::Snapshot(error) => Some(error),
            Self::Interaction(error) => Some(error),
        }
    }
}

impl From<LayoutError> for Error {
    fn from(value: LayoutError) -> Self {
        Self::Layout(value)
    }
}

impl From<OptionsError> for Error {
    fn from(value: OptionsError) -> Self {
        Self::Options(value)
    }
}

impl From<SnapshotError> for Error {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<InteractionError> for Error {
    fn from(value: InteractionError) -> Self {
        Self::Interaction(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Snapshot(SnapshotError::Json(value))
    }
}
