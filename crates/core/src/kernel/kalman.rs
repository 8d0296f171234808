//! Constant-velocity Kalman tracker over a synthetic noisy trajectory.
//!
//! State is `[x, y, vx, vy]` in surface pixels. Ground truth follows a closed
//! Lissajous-like curve scaled to the current viewport; measurements are the
//! true position corrupted by independent Gaussian noise of standard
//! deviation `sigma` per axis. The filter runs the standard predict/update
//! cycle; a near-singular innovation covariance skips the update for that
//! tick instead of propagating NaN.
//!
//! The RMSE diagnostic is a plain running sum/count with no decay or window.
//! Long sessions therefore wash out recent-error signal; acceptable for a
//! short demo session and kept that way deliberately.

use crate::kernel::Viewport;
use crate::params::ParameterSet;
use crate::prng::Prng;

type Mat4 = [[f64; 4]; 4];
type Vec4 = [f64; 4];

fn mat_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j] + a[i][3] * b[3][j];
        }
    }
    out
}

fn mat_vec(a: &Mat4, v: &Vec4) -> Vec4 {
    let mut out = [0.0; 4];
    for i in 0..4 {
        out[i] = a[i][0] * v[0] + a[i][1] * v[1] + a[i][2] * v[2] + a[i][3] * v[3];
    }
    out
}

fn transpose(a: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            out[i][j] = a[j][i];
        }
    }
    out
}

/// Inverse of a 2x2 matrix; `None` when the determinant is numerically zero.
fn invert2(m: [[f64; 2]; 2]) -> Option<[[f64; 2]; 2]> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if det.abs() < 1.0e-9 {
        return None;
    }
    let inv = 1.0 / det;
    Some([
        [m[1][1] * inv, -m[0][1] * inv],
        [-m[1][0] * inv, m[0][0] * inv],
    ])
}

/// Undecayed running RMSE accumulator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunningRmse {
    sum_sq: f64,
    count: u64,
}

impl RunningRmse {
    pub fn record(&mut self, err: f64) {
        self.sum_sq += err * err;
        self.count += 1;
    }

    pub fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum_sq / self.count as f64).sqrt()
        }
    }
}

pub struct KalmanSim {
    t: f64,
    x: Vec4,
    p: Mat4,
    true_pos: (f64, f64),
    true_vel: (f64, f64),
    last_measurement: (f64, f64),
    update_skipped: bool,
    rmse: RunningRmse,
    true_trail: Vec<(f64, f64)>,
    estimate_trail: Vec<(f64, f64)>,
    measurement_trail: Vec<(f64, f64)>,
    rng: Prng,
}

fn truth_at(t: f64, vp: Viewport) -> (f64, f64) {
    let w = vp.width as f64;
    let h = vp.height as f64;
    let x = w * 0.5 + w * 0.34 * (0.55 * t).cos() + w * 0.09 * (1.8 * t).cos();
    let y = h * 0.52 + h * 0.3 * (0.72 * t).sin();
    (x, y)
}

impl KalmanSim {
    pub fn new(viewport: Viewport, seed: u64) -> Self {
        let start = truth_at(0.0, viewport);
        let mut p = [[0.0; 4]; 4];
        p[0][0] = 100.0;
        p[1][1] = 100.0;
        p[2][2] = 25.0;
        p[3][3] = 25.0;
        Self {
            t: 0.0,
            // Start the estimate off-truth so convergence is visible.
            x: [viewport.width as f64 * 0.25, viewport.height as f64 * 0.5, 0.0, 0.0],
            p,
            true_pos: start,
            true_vel: (0.0, 0.0),
            last_measurement: start,
            update_skipped: false,
            rmse: RunningRmse::default(),
            true_trail: Vec::new(),
            estimate_trail: Vec::new(),
            measurement_trail: Vec::new(),
            rng: Prng::new(seed),
        }
    }

    pub fn estimate(&self) -> (f64, f64) {
        (self.x[0], self.x[1])
    }

    pub fn true_position(&self) -> (f64, f64) {
        self.true_pos
    }

    pub fn true_speed(&self) -> f64 {
        self.true_vel.0.hypot(self.true_vel.1)
    }

    pub fn last_measurement(&self) -> (f64, f64) {
        self.last_measurement
    }

    /// Whether the last tick fell back to prediction-only.
    pub fn update_skipped(&self) -> bool {
        self.update_skipped
    }

    pub fn rmse(&self) -> f64 {
        self.rmse.value()
    }

    /// `sqrt(P[0][0] + P[1][1])`, the position uncertainty radius.
    pub fn uncertainty(&self) -> f64 {
        (self.p[0][0] + self.p[1][1]).max(1.0).sqrt()
    }

    pub fn true_trail(&self) -> &[(f64, f64)] {
        &self.true_trail
    }

    pub fn estimate_trail(&self) -> &[(f64, f64)] {
        &self.estimate_trail
    }

    pub fn measurement_trail(&self) -> &[(f64, f64)] {
        &self.measurement_trail
    }

    pub fn step(&mut self, params: &ParameterSet, viewport: Viewport, motion: f32, dt: f32) {
        // Reduced motion lowers the injected noise rather than the animation.
        let sigma = params.get("kalman", "sigma") as f64 * motion.max(0.7) as f64;
        let q = params.get("kalman", "process_noise") as f64;
        let trail_cap = params.get("kalman", "trail").round().max(2.0) as usize;
        self.step_with_noise(sigma, q, trail_cap, viewport, dt);
    }

    /// Core predict/measure/update cycle with explicit noise levels.
    pub fn step_with_noise(
        &mut self,
        sigma: f64,
        q: f64,
        trail_cap: usize,
        viewport: Viewport,
        dt: f32,
    ) {
        let dt = dt as f64;
        if dt <= 0.0 {
            return;
        }

        self.t += dt;
        let prev = self.true_pos;
        self.true_pos = truth_at(self.t, viewport);
        self.true_vel = (
            (self.true_pos.0 - prev.0) / dt,
            (self.true_pos.1 - prev.1) / dt,
        );

        let z = [
            self.true_pos.0 + sigma * self.rng.next_gaussian(),
            self.true_pos.1 + sigma * self.rng.next_gaussian(),
        ];
        self.last_measurement = (z[0], z[1]);

        // Predict: x' = F·x, P' = F·P·Fᵗ + Q.
        let f = [
            [1.0, 0.0, dt, 0.0],
            [0.0, 1.0, 0.0, dt],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        self.x = mat_vec(&f, &self.x);
        self.p = mat_mul(&mat_mul(&f, &self.p), &transpose(&f));

        // Discrete white-noise acceleration model.
        let q11 = 0.25 * dt * dt * dt * dt * q;
        let q13 = 0.5 * dt * dt * dt * q;
        let q33 = dt * dt * q;
        self.p[0][0] += q11;
        self.p[1][1] += q11;
        self.p[0][2] += q13;
        self.p[2][0] += q13;
        self.p[1][3] += q13;
        self.p[3][1] += q13;
        self.p[2][2] += q33;
        self.p[3][3] += q33;

        self.update(z, sigma);

        let err = (self.x[0] - self.true_pos.0).hypot(self.x[1] - self.true_pos.1);
        self.rmse.record(err);

        push_capped(&mut self.true_trail, self.true_pos, trail_cap);
        push_capped(&mut self.estimate_trail, (self.x[0], self.x[1]), trail_cap);
        push_capped(&mut self.measurement_trail, self.last_measurement, trail_cap / 2);
    }

    /// Measurement update with H = position selector, R = sigma²·I.
    ///
    /// When S is near-singular the update is skipped and the predicted state
    /// is retained for this tick.
    fn update(&mut self, z: [f64; 2], sigma: f64) {
        let r = sigma * sigma;
        let s = [
            [self.p[0][0] + r, self.p[0][1]],
            [self.p[1][0], self.p[1][1] + r],
        ];
        let Some(s_inv) = invert2(s) else {
            self.update_skipped = true;
            return;
        };
        self.update_skipped = false;

        let residual = [z[0] - self.x[0], z[1] - self.x[1]];

        // K = P'·Hᵗ·S⁻¹ where P'·Hᵗ is just the first two columns of P.
        let mut k = [[0.0; 2]; 4];
        for i in 0..4 {
            k[i][0] = self.p[i][0] * s_inv[0][0] + self.p[i][1] * s_inv[1][0];
            k[i][1] = self.p[i][0] * s_inv[0][1] + self.p[i][1] * s_inv[1][1];
        }

        for i in 0..4 {
            self.x[i] += k[i][0] * residual[0] + k[i][1] * residual[1];
        }

        // P = (I − K·H)·P'.
        let mut ikh = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                let id = if i == j { 1.0 } else { 0.0 };
                let kh = if j < 2 { k[i][j] } else { 0.0 };
                ikh[i][j] = id - kh;
            }
        }
        self.p = mat_mul(&ikh, &self.p);
    }
}

fn push_capped(trail: &mut Vec<(f64, f64)>, point: (f64, f64), cap: usize) {
    trail.push(point);
    if trail.len() > cap.max(1) {
        let excess = trail.len() - cap.max(1);
        trail.drain(..excess);
    }
}
