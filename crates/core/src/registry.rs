//! Fixed experiment catalog.
//!
//! The catalog is pure data: identity, display metadata, the declared backend,
//! and the ordered parameter schema. The set of ids is closed at compile time;
//! resolution by string id is for the page boundary (URL fragments, buttons)
//! and a miss is an explicit error the controller recovers from.

use thiserror::Error;

use crate::kernel::plasma::PLASMA_SHADER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ExperimentId {
    FlowField,
    CursorField,
    KalmanTracker,
    PlasmaSheet,
}

impl ExperimentId {
    pub fn as_str(self) -> &'static str {
        match self {
            ExperimentId::FlowField => "flow-field",
            ExperimentId::CursorField => "cursor-field",
            ExperimentId::KalmanTracker => "kalman-tracker",
            ExperimentId::PlasmaSheet => "plasma-sheet",
        }
    }

    pub fn all() -> &'static [ExperimentId] {
        &[
            ExperimentId::FlowField,
            ExperimentId::CursorField,
            ExperimentId::KalmanTracker,
            ExperimentId::PlasmaSheet,
        ]
    }
}

/// Rendering technology an experiment is drawn with.
///
/// A GPU experiment carries its fragment shader source so the renderer can
/// compile it once at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Backend {
    Raster2d,
    Gpu { shader: &'static str },
}

/// One tunable parameter: hard bounds, UI step, and the seed default.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub group: &'static str,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExperimentDescriptor {
    pub id: ExperimentId,
    pub title: &'static str,
    pub description: &'static str,
    pub backend: Backend,
    pub schema: &'static [ParamSpec],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown experiment id: {0}")]
    UnknownId(String),
}

const FLOW_SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        key: "particles",
        label: "Particles",
        group: "flow",
        min: 120.0,
        max: 1200.0,
        step: 20.0,
        default: 520.0,
    },
    ParamSpec {
        key: "speed",
        label: "Speed",
        group: "flow",
        min: 0.2,
        max: 2.5,
        step: 0.1,
        default: 1.0,
    },
    ParamSpec {
        key: "intensity",
        label: "Intensity",
        group: "flow",
        min: 10.0,
        max: 50.0,
        step: 1.0,
        default: 28.0,
    },
];

const CURSOR_SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        key: "spacing",
        label: "Grid spacing",
        group: "cursor",
        min: 16.0,
        max: 44.0,
        step: 2.0,
        default: 28.0,
    },
    ParamSpec {
        key: "influence",
        label: "Influence radius",
        group: "cursor",
        min: 80.0,
        max: 360.0,
        step: 10.0,
        default: 210.0,
    },
    ParamSpec {
        key: "arrow_length",
        label: "Arrow length",
        group: "cursor",
        min: 6.0,
        max: 24.0,
        step: 1.0,
        default: 14.0,
    },
];

const KALMAN_SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        key: "sigma",
        label: "Measurement noise",
        group: "kalman",
        min: 4.0,
        max: 24.0,
        step: 1.0,
        default: 13.0,
    },
    ParamSpec {
        key: "process_noise",
        label: "Process noise",
        group: "kalman",
        min: 0.05,
        max: 1.2,
        step: 0.05,
        default: 0.4,
    },
    ParamSpec {
        key: "trail",
        label: "Trail length",
        group: "kalman",
        min: 80.0,
        max: 360.0,
        step: 10.0,
        default: 240.0,
    },
];

const PLASMA_SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        key: "speed",
        label: "Speed",
        group: "plasma",
        min: 0.2,
        max: 3.0,
        step: 0.1,
        default: 1.0,
    },
    ParamSpec {
        key: "scale",
        label: "Scale",
        group: "plasma",
        min: 1.0,
        max: 12.0,
        step: 0.5,
        default: 6.0,
    },
    ParamSpec {
        key: "warp",
        label: "Warp",
        group: "plasma",
        min: 0.0,
        max: 2.0,
        step: 0.05,
        default: 0.8,
    },
];

const EXPERIMENTS: &[ExperimentDescriptor] = &[
    ExperimentDescriptor {
        id: ExperimentId::FlowField,
        title: "Hamiltonian Flow Field",
        description: "Divergence-free particle advection from a stream function.",
        backend: Backend::Raster2d,
        schema: FLOW_SCHEMA,
    },
    ExperimentDescriptor {
        id: ExperimentId::CursorField,
        title: "Cursor Vector Field",
        description: "Arrow lattice with local vector attraction toward the cursor.",
        backend: Backend::Raster2d,
        schema: CURSOR_SCHEMA,
    },
    ExperimentDescriptor {
        id: ExperimentId::KalmanTracker,
        title: "Kalman Target Tracker",
        description: "2D constant-velocity filter under noisy observations.",
        backend: Backend::Raster2d,
        schema: KALMAN_SCHEMA,
    },
    ExperimentDescriptor {
        id: ExperimentId::PlasmaSheet,
        title: "Plasma Sheet",
        description: "Single-pass fragment shader over a full-screen quad.",
        backend: Backend::Gpu {
            shader: PLASMA_SHADER,
        },
        schema: PLASMA_SCHEMA,
    },
];

/// Ordered catalog. The first entry doubles as the registry-miss fallback.
pub fn experiments() -> &'static [ExperimentDescriptor] {
    EXPERIMENTS
}

pub fn resolve(id: &str) -> Result<&'static ExperimentDescriptor, RegistryError> {
    EXPERIMENTS
        .iter()
        .find(|d| d.id.as_str() == id)
        .ok_or_else(|| RegistryError::UnknownId(id.to_string()))
}

pub fn descriptor(id: ExperimentId) -> &'static ExperimentDescriptor {
    EXPERIMENTS
        .iter()
        .find(|d| d.id == id)
        .unwrap_or(&EXPERIMENTS[0])
}

/// Look up a parameter spec by `(group, key)` across the whole catalog.
pub fn find_spec(group: &str, key: &str) -> Option<&'static ParamSpec> {
    EXPERIMENTS
        .iter()
        .flat_map(|d| d.schema.iter())
        .find(|s| s.group == group && s.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let list = experiments();
        assert_eq!(list.len(), ExperimentId::all().len());
        for (d, &id) in list.iter().zip(ExperimentId::all()) {
            assert_eq!(d.id, id);
        }
        for (i, a) in list.iter().enumerate() {
            for b in &list[i + 1..] {
                assert_ne!(a.id.as_str(), b.id.as_str());
            }
        }
    }

    #[test]
    fn resolve_known_and_unknown() {
        assert_eq!(
            resolve("kalman-tracker").map(|d| d.id),
            Ok(ExperimentId::KalmanTracker)
        );
        assert_eq!(
            resolve("not-an-experiment"),
            Err(RegistryError::UnknownId("not-an-experiment".to_string()))
        );
    }

    #[test]
    fn every_experiment_declares_exactly_one_backend_group() {
        for d in experiments() {
            for s in d.schema {
                assert!(s.min < s.max, "{}:{}", s.group, s.key);
                assert!(
                    s.default >= s.min && s.default <= s.max,
                    "{}:{} default out of bounds",
                    s.group,
                    s.key
                );
                // Each schema entry belongs to its own experiment's group.
                assert_eq!(s.group, d.schema[0].group);
            }
        }
    }

    #[test]
    fn gpu_experiment_carries_shader_source() {
        let d = descriptor(ExperimentId::PlasmaSheet);
        match d.backend {
            Backend::Gpu { shader } => assert!(shader.contains("u_resolution")),
            Backend::Raster2d => panic!("plasma-sheet must declare the gpu backend"),
        }
    }
}
