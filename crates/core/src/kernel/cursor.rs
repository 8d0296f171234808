//! Cursor-reactive vector field.
//!
//! A fixed lattice of direction arrows. Each arrow's angle blends a slow
//! ambient trig term (driven by a phase accumulator) with an attraction term
//! toward the last known pointer position, weighted by inverse distance
//! clamped to `[0,1]` inside the influence radius. Until a pointer has been
//! seen, only the ambient term applies.

use crate::kernel::Viewport;
use crate::params::ParameterSet;

/// Ambient phase advance in px-equivalent units per second at full motion.
const PHASE_RATE: f32 = 84.0;

#[derive(Debug, Clone, Copy)]
pub struct Arrow {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub len: f32,
}

#[derive(Debug, Default)]
pub struct CursorFieldSim {
    phase: f32,
    pointer: Option<(f32, f32)>,
}

impl CursorFieldSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.pointer
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = Some((x, y));
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
    }

    pub fn step(&mut self, motion: f32, dt: f32) {
        self.phase += PHASE_RATE * motion * dt;
    }

    /// Angle at a lattice point for the current phase and pointer.
    pub fn angle_at(&self, x: f32, y: f32, influence: f32) -> f32 {
        let ambient = ((x + self.phase) * 0.01).sin() * 0.6 + ((y - self.phase) * 0.011).cos() * 0.6;
        let Some((mx, my)) = self.pointer else {
            return ambient;
        };
        let dx = mx - x;
        let dy = my - y;
        let dist = dx.hypot(dy);
        let attract = (1.0 - dist / influence.max(1.0)).clamp(0.0, 1.0);
        let target = dy.atan2(dx);
        (1.0 - attract) * ambient + attract * target
    }

    /// Arrow magnitude boost near the pointer, clamped to `[0.7, 1.8]`.
    pub fn magnitude_at(&self, x: f32, y: f32, influence: f32) -> f32 {
        let Some((mx, my)) = self.pointer else {
            return 1.0;
        };
        let dist = (mx - x).hypot(my - y);
        let influence = influence.max(1.0);
        (1.0 + (influence - dist) / influence).clamp(0.7, 1.8)
    }

    /// The full lattice for the current viewport, in render order.
    ///
    /// Reduced motion widens the spacing so the lattice population scales
    /// down with the motion multiplier.
    pub fn arrows(&self, params: &ParameterSet, viewport: Viewport, motion: f32) -> Vec<Arrow> {
        let spacing = params.get("cursor", "spacing") / motion.max(0.05).sqrt();
        let influence = params.get("cursor", "influence");
        let base_len = params.get("cursor", "arrow_length");

        let mut out = Vec::new();
        let mut y = spacing * 0.6;
        while y < viewport.height {
            let mut x = spacing * 0.6;
            while x < viewport.width {
                out.push(Arrow {
                    x,
                    y,
                    angle: self.angle_at(x, y, influence),
                    len: base_len * self.magnitude_at(x, y, influence),
                });
                x += spacing;
            }
            y += spacing;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_only_before_any_pointer_motion() {
        let sim = CursorFieldSim::new();
        assert!(sim.pointer().is_none());
        let a = sim.angle_at(100.0, 100.0, 210.0);
        assert!(a.is_finite());
        assert!(a.abs() <= 1.2 + 1.0e-6, "ambient angle bounded by blend");
        assert_eq!(sim.magnitude_at(100.0, 100.0, 210.0), 1.0);
    }

    #[test]
    fn arrows_point_at_a_very_close_pointer() {
        let mut sim = CursorFieldSim::new();
        sim.pointer_moved(103.0, 100.0);
        // Distance 3 px with influence 210 px: attraction weight ~0.986, so
        // the angle is nearly atan2 toward the pointer (0 rad, pointing +x).
        let a = sim.angle_at(100.0, 100.0, 210.0);
        assert!(a.abs() < 0.1, "angle {a}");
    }

    #[test]
    fn attraction_weight_clamps_outside_influence() {
        let mut sim = CursorFieldSim::new();
        sim.pointer_moved(1000.0, 1000.0);
        // Far outside the radius the blend must reduce to the ambient term.
        let with_pointer = sim.angle_at(0.0, 0.0, 80.0);
        sim.pointer_left();
        let ambient = sim.angle_at(0.0, 0.0, 80.0);
        assert!((with_pointer - ambient).abs() < 1.0e-6);
    }

    #[test]
    fn magnitude_boost_is_clamped() {
        let mut sim = CursorFieldSim::new();
        sim.pointer_moved(50.0, 50.0);
        let near = sim.magnitude_at(50.0, 50.0, 210.0);
        let far = sim.magnitude_at(5000.0, 5000.0, 210.0);
        assert!((near - 1.8).abs() < 0.05);
        assert!((far - 0.7).abs() < 1.0e-6);
    }

    #[test]
    fn lattice_covers_viewport() {
        let sim = CursorFieldSim::new();
        let params = ParameterSet::defaults();
        let vp = Viewport::new(280.0, 140.0, 1.0);
        let arrows = sim.arrows(&params, vp, 1.0);
        assert!(!arrows.is_empty());
        for a in &arrows {
            assert!(a.x < vp.width && a.y < vp.height);
            assert!(a.len > 0.0);
        }
        // Reduced motion thins the lattice.
        let reduced = sim.arrows(&params, vp, crate::kernel::REDUCED_MOTION_SCALE);
        assert!(reduced.len() < arrows.len());
    }
}
