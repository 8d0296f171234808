//! Debug HUD support: frame-rate sampling and the diagnostics export.

use serde::Serialize;
use web_time::Instant;

use simlab::capability::CapabilitySnapshot;
use simlab::kernel::Viewport;

/// Sampling window for the FPS readout; short enough to feel live, long
/// enough not to flicker.
const SAMPLE_WINDOW_MS: u128 = 450;

pub(super) struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    pub(super) fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
        }
    }

    /// Count one frame; yields a fresh FPS value when the window rolls over.
    pub(super) fn frame(&mut self) -> Option<f64> {
        self.frames += 1;
        let elapsed = self.window_start.elapsed().as_millis();
        if elapsed < SAMPLE_WINDOW_MS {
            return None;
        }
        let fps = self.frames as f64 * 1000.0 / elapsed as f64;
        self.window_start = Instant::now();
        self.frames = 0;
        Some(fps)
    }
}

/// One-shot diagnostics record, logged to the browser console as JSON.
#[derive(Serialize)]
pub(super) struct DiagnosticsSnapshot<'a> {
    pub(super) experiment: &'a str,
    pub(super) effective: &'a str,
    pub(super) backend: &'a str,
    pub(super) degraded: bool,
    pub(super) diagnostic: Option<&'a str>,
    pub(super) fps: f64,
    pub(super) capabilities: CapabilitySnapshot,
    pub(super) viewport: Viewport,
}

impl DiagnosticsSnapshot<'_> {
    pub(super) fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}
