//! Simulation kernels.
//!
//! Each kernel is a self-contained state-transition struct: `new` builds the
//! state from the live parameters, `step` advances it by `dt` seconds. State
//! is owned by the controller and transformed here; nothing in a kernel
//! touches the environment. Randomness is confined to the seeded [`Prng`]
//! each kernel carries.

pub mod cursor;
pub mod flow;
pub mod kalman;
pub mod plasma;

use crate::params::ParameterSet;
use crate::registry::{Backend, ExperimentDescriptor, ExperimentId};

pub use cursor::CursorFieldSim;
pub use flow::FlowFieldSim;
pub use kalman::KalmanSim;
pub use plasma::PlasmaSim;

/// Logical surface size in CSS pixels plus the device pixel ratio.
///
/// Kernels treat positions as valid for the previous dimensions until their
/// next step re-normalizes them; a resize never forces a reseed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            dpr: dpr.max(0.5),
        }
    }
}

/// Multiplier applied to particle counts and step speed when the user asked
/// for reduced motion. The system stays observably live, just calmer.
pub const REDUCED_MOTION_SCALE: f32 = 0.35;

/// Active kernel state, one variant per experiment.
pub enum Kernel {
    Flow(FlowFieldSim),
    Cursor(CursorFieldSim),
    Kalman(KalmanSim),
    Plasma(PlasmaSim),
}

impl Kernel {
    /// Build the kernel for a descriptor's experiment.
    pub fn for_experiment(
        desc: &ExperimentDescriptor,
        params: &ParameterSet,
        viewport: Viewport,
        seed: u64,
    ) -> Self {
        match desc.id {
            ExperimentId::FlowField => Kernel::Flow(FlowFieldSim::new(params, seed)),
            ExperimentId::CursorField => Kernel::Cursor(CursorFieldSim::new()),
            ExperimentId::KalmanTracker => Kernel::Kalman(KalmanSim::new(viewport, seed)),
            ExperimentId::PlasmaSheet => Kernel::Plasma(PlasmaSim::new()),
        }
    }

    pub fn step(&mut self, params: &ParameterSet, viewport: Viewport, motion: f32, dt: f32) {
        match self {
            Kernel::Flow(sim) => sim.step(params, motion, dt),
            Kernel::Cursor(sim) => sim.step(motion, dt),
            Kernel::Kalman(sim) => sim.step(params, viewport, motion, dt),
            Kernel::Plasma(sim) => sim.step(params, motion, dt),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Kernel::Plasma(_) => crate::registry::descriptor(ExperimentId::PlasmaSheet).backend,
            _ => Backend::Raster2d,
        }
    }
}
