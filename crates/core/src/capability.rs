//! Capability snapshot.
//!
//! Probed once per mount by the host (offscreen canvas context queries plus
//! the reduced-motion media query) and treated as immutable for the session.
//! The controller only routes on it; it never mutates it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CapabilitySnapshot {
    pub raster2d: bool,
    pub gpu: bool,
    pub reduced_motion: bool,
}

impl CapabilitySnapshot {
    /// Everything available, animation unconstrained. Used by tests and by
    /// headless hosts that render nowhere.
    pub fn full() -> Self {
        Self {
            raster2d: true,
            gpu: true,
            reduced_motion: false,
        }
    }
}
