//! # simlab
//!
//! Numerical kernels and the host-agnostic controller behind the interactive
//! simulation lab.
//!
//! Everything here is pure state transformation: kernels advance when the
//! controller ticks them, the controller talks to the outside world only
//! through the [`controller::EnvAdapter`] seam, and nothing in this crate
//! touches a rendering surface. A browser shell (or a test harness) supplies
//! the scheduler, the events, and the pixels.
//!
//! ## Quick Start
//!
//! ```
//! use simlab::prelude::*;
//!
//! struct NullEnv(u64);
//! impl EnvAdapter for NullEnv {
//!     fn request_frame(&mut self) -> FrameHandle {
//!         self.0 += 1;
//!         FrameHandle(self.0)
//!     }
//!     fn cancel_frame(&mut self, _: FrameHandle) {}
//!     fn add_listener(&mut self, _: ListenerKind) -> ListenerHandle {
//!         self.0 += 1;
//!         ListenerHandle(self.0)
//!     }
//!     fn remove_listener(&mut self, _: ListenerHandle) {}
//! }
//!
//! let caps = CapabilitySnapshot::full();
//! let mut lab = LabController::new(NullEnv(0), caps, Viewport::new(800.0, 500.0, 1.0));
//!
//! lab.select("flow-field");
//! lab.tick(16.7);
//! lab.set_parameter("flow", "speed", 1.8);
//!
//! assert!(lab.is_running());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization for the HUD's diagnostic export
//!
//! ## Modules
//!
//! - [`registry`]: experiment catalog, backends, parameter schemas
//! - [`params`]: clamped live parameter store
//! - [`kernel`]: the four simulation kernels
//! - [`controller`]: activation, ticking, degradation, teardown
//! - [`capability`]: host capability snapshot

pub mod capability;
pub mod controller;
pub mod kernel;
pub mod params;
pub mod prng;
pub mod registry;

/// Prelude module for convenient imports.
///
/// ```
/// use simlab::prelude::*;
/// ```
pub mod prelude {
    pub use crate::capability::CapabilitySnapshot;
    pub use crate::controller::{
        EnvAdapter, FrameHandle, LabController, ListenerHandle, ListenerKind, Phase,
    };
    pub use crate::kernel::{Kernel, Viewport, REDUCED_MOTION_SCALE};
    pub use crate::params::ParameterSet;
    pub use crate::registry::{
        Backend, ExperimentDescriptor, ExperimentId, ParamSpec, RegistryError,
    };
}
