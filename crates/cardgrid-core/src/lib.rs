#![forbid(unsafe_code)]

//! Core: grid and pixel geometry plus pointer coalescing.
//!
//! # Role in cardgrid
//! `cardgrid-core` is the leaf crate. It owns the value types shared by the
//! layout engine and the public facade:
//!
//! - **Grid geometry**: [`GridRect`], [`GridPosition`], [`GridSize`] in grid units.
//! - **Pixel geometry**: [`PixelRect`], [`PixelPoint`], [`Sides`] in host pixels.
//! - **Frame throttle**: [`FrameThrottle`] coalesces high-frequency pointer
//!   samples so interaction recomputes run at most once per display frame.
//!
//! Nothing here performs I/O or reads platform input types; hosts translate
//! their native pointer events into [`PixelPoint`] before handing them in.

pub mod frame_throttle;
pub mod geometry;

pub use frame_throttle::{DEFAULT_FRAME_INTERVAL, FrameThrottle};
pub use geometry::{GridPosition, GridRect, GridSize, PixelPoint, PixelRect, Sides};
