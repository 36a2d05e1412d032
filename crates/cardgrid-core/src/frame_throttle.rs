#![forbid(unsafe_code)]

//! Frame-rate throttling for high-frequency pointer samples.
//!
//! Pointer-move callbacks can fire far more often than the host repaints.
//! Recomputing a layout preview for each one wastes work and floods
//! listeners. [`FrameThrottle`] keeps only the latest pending sample and
//! releases it at most once per frame interval.
//!
//! # Design
//!
//! - Latest wins: pushing a sample replaces any pending one.
//! - A sample pushed after the interval has elapsed is released immediately.
//! - A sample pushed too early stays pending until [`FrameThrottle::poll`]
//!   is called at or after the next frame boundary, or until
//!   [`FrameThrottle::flush`] forces it out.
//!
//! Time is always supplied by the caller, so behaviour is deterministic under
//! test.
//!
//! # Usage
//!
//! ```
//! use cardgrid_core::{FrameThrottle, PixelPoint};
//! use web_time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut throttle = FrameThrottle::new();
//!
//! // First sample goes straight through.
//! assert!(throttle.push(PixelPoint::new(1.0, 1.0), start).is_some());
//!
//! // Samples inside the same frame coalesce.
//! assert!(throttle.push(PixelPoint::new(2.0, 2.0), start).is_none());
//! assert!(throttle.push(PixelPoint::new(3.0, 3.0), start).is_none());
//!
//! // Polling on the next frame releases only the latest one.
//! let later = start + Duration::from_millis(16);
//! assert_eq!(throttle.poll(later), Some(PixelPoint::new(3.0, 3.0)));
//! ```

use web_time::{Duration, Instant};

/// One display frame at 60 Hz, rounded down.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Coalesces samples to at most one release per frame interval.
///
/// `FrameThrottle` is not thread-safe. It should be driven from the single
/// thread that receives pointer input.
#[derive(Debug, Clone)]
pub struct FrameThrottle<T> {
    interval: Duration,
    last_release: Option<Instant>,
    pending: Option<T>,
    coalesced: u64,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self::with_interval(DEFAULT_FRAME_INTERVAL)
    }
}

impl<T> FrameThrottle<T> {
    /// Create a throttle with [`DEFAULT_FRAME_INTERVAL`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a throttle with a custom interval.
    ///
    /// A zero interval releases every sample immediately.
    #[must_use]
    pub const fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_release: None,
            pending: None,
            coalesced: 0,
        }
    }

    /// Configured frame interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Push a sample.
    ///
    /// Returns `Some(sample)` when a frame boundary has been reached and the
    /// sample should be processed now, or `None` when it is held pending.
    pub fn push(&mut self, sample: T, now: Instant) -> Option<T> {
        if self.pending.replace(sample).is_some() {
            self.coalesced = self.coalesced.saturating_add(1);
        }
        self.poll(now)
    }

    /// Release the pending sample if the frame interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_none() || !self.is_due(now) {
            return None;
        }
        self.last_release = Some(now);
        self.pending.take()
    }

    /// Release the pending sample regardless of timing.
    ///
    /// Does not reset the frame clock.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Whether a sample is waiting for the next frame.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of samples replaced before they were released.
    #[must_use]
    pub const fn coalesced_count(&self) -> u64 {
        self.coalesced
    }

    /// Drop any pending sample and reset the frame clock.
    pub fn clear(&mut self) {
        self.pending = None;
        self.last_release = None;
        self.coalesced = 0;
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.last_release {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }
}
