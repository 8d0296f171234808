//! Incompressible flow-field advection.
//!
//! Particles live in the normalized domain `[0,1]²` and are advected by a
//! time-varying field derived from the stream function
//! `ψ(x̃, ỹ, t) = cos(a·x̃)·cos(b·ỹ)` (up to scale), so
//!
//! ```text
//! vx =  b·sin(a·x̃)·cos(b·ỹ)
//! vy = -a·cos(a·x̃)·sin(b·ỹ)
//! ```
//!
//! with `x̃ = 2πx − π`. The analytic divergence is identically zero, so
//! particles never cluster into sinks; they only leave through the domain
//! boundary and respawn uniformly at random. Integration is midpoint RK2.

use crate::params::ParameterSet;
use crate::prng::Prng;

/// Converts the `intensity` parameter (10..50) into normalized units/sec.
const INTENSITY_SCALE: f32 = 0.003;

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Position at the start of the last step, for trail segments.
    pub px: f32,
    pub py: f32,
}

pub struct FlowFieldSim {
    particles: Vec<Particle>,
    t: f32,
    rng: Prng,
}

/// Field velocity at a normalized point, before the intensity scale.
///
/// Kept free-standing so the divergence test can finite-difference the exact
/// formula the step uses.
pub fn field_at(x: f32, y: f32, t: f32) -> (f32, f32) {
    let xn = x * core::f32::consts::TAU - core::f32::consts::PI;
    let yn = y * core::f32::consts::TAU - core::f32::consts::PI;
    let a = 1.6 + 0.2 * (t * 0.25).sin();
    let b = 1.2 + 0.15 * (t * 0.19).cos();
    let vx = b * (a * xn).sin() * (b * yn).cos();
    let vy = -a * (a * xn).cos() * (b * yn).sin();
    (vx, vy)
}

impl FlowFieldSim {
    pub fn new(params: &ParameterSet, seed: u64) -> Self {
        let mut sim = Self {
            particles: Vec::new(),
            t: 0.0,
            rng: Prng::new(seed),
        };
        let count = params.get("flow", "particles").round().max(1.0) as usize;
        sim.resize_population(count);
        sim
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn time(&self) -> f32 {
        self.t
    }

    fn spawn(&mut self) -> Particle {
        let x = self.rng.next_f32_01();
        let y = self.rng.next_f32_01();
        Particle { x, y, px: x, py: y }
    }

    fn resize_population(&mut self, target: usize) {
        while self.particles.len() < target {
            let p = self.spawn();
            self.particles.push(p);
        }
        self.particles.truncate(target);
    }

    pub fn step(&mut self, params: &ParameterSet, motion: f32, dt: f32) {
        let target = (params.get("flow", "particles") * motion).round().max(1.0) as usize;
        self.resize_population(target);

        let speed = params.get("flow", "speed") * motion;
        let gain = params.get("flow", "intensity") * INTENSITY_SCALE * speed;
        let t = self.t;

        for i in 0..self.particles.len() {
            let p = self.particles[i];
            let (k1x, k1y) = field_at(p.x, p.y, t);
            let mx = p.x + 0.5 * dt * k1x * gain;
            let my = p.y + 0.5 * dt * k1y * gain;
            let (k2x, k2y) = field_at(mx, my, t + 0.5 * dt);
            let nx = p.x + dt * k2x * gain;
            let ny = p.y + dt * k2y * gain;

            if (0.0..=1.0).contains(&nx) && (0.0..=1.0).contains(&ny) {
                self.particles[i] = Particle {
                    x: nx,
                    y: ny,
                    px: p.x,
                    py: p.y,
                };
            } else {
                self.particles[i] = self.spawn();
            }
        }

        self.t = t + dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> ParameterSet {
        ParameterSet::defaults()
    }

    #[test]
    fn field_divergence_is_numerically_zero() {
        // Central finite difference of the analytic field over interior points
        // at two different times.
        let h = 1.0e-3_f32;
        for &t in &[0.0_f32, 2.7] {
            for ix in 1..9 {
                for iy in 1..9 {
                    let x = ix as f32 / 10.0;
                    let y = iy as f32 / 10.0;
                    let (vxp, _) = field_at(x + h, y, t);
                    let (vxm, _) = field_at(x - h, y, t);
                    let (_, vyp) = field_at(x, y + h, t);
                    let (_, vym) = field_at(x, y - h, t);
                    let div = (vxp - vxm) / (2.0 * h) + (vyp - vym) / (2.0 * h);
                    assert!(div.abs() < 1.0e-2, "div {div} at ({x},{y},t={t})");
                }
            }
        }
    }

    #[test]
    fn particles_stay_in_domain_and_finite() {
        let params = default_params();
        let mut sim = FlowFieldSim::new(&params, 99);
        for _ in 0..600 {
            sim.step(&params, 1.0, 1.0 / 60.0);
        }
        for p in sim.particles() {
            assert!(p.x.is_finite() && p.y.is_finite());
            assert!((0.0..=1.0).contains(&p.x));
            assert!((0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn zero_intensity_does_not_stall_or_divide() {
        let mut params = default_params();
        // Schema floor for intensity is 10; drive the effective gain to zero
        // through the speed floor instead, then also check the raw field path.
        params.set("flow", "speed", 0.0);
        let mut sim = FlowFieldSim::new(&params, 7);
        for _ in 0..120 {
            sim.step(&params, 1.0, 1.0 / 60.0);
        }
        // Speed clamps to the schema minimum of 0.2, so drift is near zero;
        // the step must stay finite and inside the domain regardless.
        for p in sim.particles() {
            assert!(p.x.is_finite() && p.y.is_finite());
            assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn live_particle_count_edit_resizes_population() {
        let mut params = default_params();
        let mut sim = FlowFieldSim::new(&params, 3);
        assert_eq!(sim.particles().len(), 520);

        params.set("flow", "particles", 200.0);
        sim.step(&params, 1.0, 1.0 / 60.0);
        assert_eq!(sim.particles().len(), 200);

        params.set("flow", "particles", 800.0);
        sim.step(&params, 1.0, 1.0 / 60.0);
        assert_eq!(sim.particles().len(), 800);
    }

    #[test]
    fn reduced_motion_scales_population_multiplicatively() {
        let params = default_params();
        let mut sim = FlowFieldSim::new(&params, 3);
        sim.step(&params, crate::kernel::REDUCED_MOTION_SCALE, 1.0 / 60.0);
        assert_eq!(sim.particles().len(), (520.0_f32 * 0.35).round() as usize);
    }
}
