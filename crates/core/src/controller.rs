//! Lab controller.
//!
//! The orchestrating state machine: owns the active experiment, the live
//! parameter store, the kernel state, and — through the injected environment
//! adapter — the animation-frame subscription and the event listeners the
//! active experiment installed. Everything runs on the host's single
//! rendering thread; the adapter is the only seam to the outside.
//!
//! Cancellation is explicit and total: switching experiments or unmounting
//! cancels the pending frame request and removes every listener registered
//! by the outgoing experiment before anything new is scheduled, so no stray
//! callback can ever touch a discarded kernel state.

use crate::capability::CapabilitySnapshot;
use crate::kernel::{Kernel, Viewport, REDUCED_MOTION_SCALE};
use crate::params::ParameterSet;
use crate::registry::{self, Backend, ExperimentDescriptor, ExperimentId};

/// Nominal frame interval, used for the very first tick of an activation.
const NOMINAL_DT: f32 = 1.0 / 60.0;

/// Upper bound on a single step, roughly three nominal frames. Bounds the
/// work per tick after the tab was backgrounded.
const MAX_DT: f32 = 0.05;

/// Raster experiment substituted when the requested backend is unavailable.
const FALLBACK: ExperimentId = ExperimentId::FlowField;

const KERNEL_SEED: u64 = 0x51AB_5EED;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    PointerMove,
    PointerLeave,
    Resize,
}

/// Opaque handle for a pending animation-frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(pub u64);

/// Opaque handle for an installed event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(pub u64);

/// Environment adapter: the controller's only route to the scheduler and the
/// host's event sources. Browser hosts map this onto
/// `requestAnimationFrame`/`addEventListener`; tests record the calls.
pub trait EnvAdapter {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle;
    fn remove_listener(&mut self, handle: ListenerHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Activating(ExperimentId),
    Running(ExperimentId),
    Deactivating(ExperimentId),
}

pub struct LabController<E: EnvAdapter> {
    env: E,
    caps: CapabilitySnapshot,
    phase: Phase,
    degraded: bool,
    diagnostic: Option<String>,
    /// What the user picked; preserved even while a fallback renders.
    selected: ExperimentId,
    /// What is actually stepping and drawing.
    effective: ExperimentId,
    params: ParameterSet,
    kernel: Option<Kernel>,
    frame: Option<FrameHandle>,
    listeners: Vec<ListenerHandle>,
    viewport: Viewport,
    last_timestamp: Option<f64>,
}

impl<E: EnvAdapter> LabController<E> {
    pub fn new(env: E, caps: CapabilitySnapshot, viewport: Viewport) -> Self {
        Self {
            env,
            caps,
            phase: Phase::Idle,
            degraded: false,
            diagnostic: None,
            selected: FALLBACK,
            effective: FALLBACK,
            params: ParameterSet::defaults(),
            kernel: None,
            frame: None,
            listeners: Vec::new(),
            viewport,
            last_timestamp: None,
        }
    }

    /// Activate an experiment by string id.
    ///
    /// An unknown id falls back to the first catalog entry. Selecting the
    /// already-active experiment is a no-op.
    pub fn select(&mut self, id: &str) {
        let desc = match registry::resolve(id) {
            Ok(d) => d,
            // Registry miss is a config error, recovered by substituting the
            // first catalog entry.
            Err(_) => &registry::experiments()[0],
        };

        if matches!(self.phase, Phase::Running(cur) if cur == desc.id) {
            return;
        }

        self.deactivate();

        self.phase = Phase::Activating(desc.id);
        self.selected = desc.id;
        self.degraded = false;
        self.diagnostic = None;
        self.effective = self.route(desc);

        self.params = ParameterSet::defaults();
        let eff_desc = registry::descriptor(self.effective);
        self.kernel = Some(Kernel::for_experiment(
            eff_desc,
            &self.params,
            self.viewport,
            KERNEL_SEED,
        ));
        self.install_listeners(self.effective);
        self.last_timestamp = None;
        self.frame = Some(self.env.request_frame());
        self.phase = Phase::Running(desc.id);
    }

    /// Capability routing: substitute the raster fallback when the declared
    /// backend is unsupported, keeping the displayed selection intact.
    fn route(&mut self, desc: &ExperimentDescriptor) -> ExperimentId {
        match desc.backend {
            Backend::Raster2d if self.caps.raster2d => desc.id,
            Backend::Gpu { .. } if self.caps.gpu => desc.id,
            Backend::Gpu { .. } => {
                self.degraded = true;
                self.diagnostic = Some(format!(
                    "GPU shading is unavailable here; \"{}\" is shown as \"{}\" on the 2D raster backend.",
                    desc.title,
                    registry::descriptor(FALLBACK).title
                ));
                FALLBACK
            }
            Backend::Raster2d => {
                // No raster surface at all: the host shows the static
                // fallback layer, but the controller still degrades cleanly.
                self.degraded = true;
                self.diagnostic =
                    Some("2D canvas rendering is unavailable in this environment.".to_string());
                FALLBACK
            }
        }
    }

    fn install_listeners(&mut self, effective: ExperimentId) {
        self.listeners.push(self.env.add_listener(ListenerKind::Resize));
        if effective == ExperimentId::CursorField {
            self.listeners
                .push(self.env.add_listener(ListenerKind::PointerMove));
            self.listeners
                .push(self.env.add_listener(ListenerKind::PointerLeave));
        }
    }

    fn deactivate(&mut self) {
        if let Phase::Running(id) | Phase::Activating(id) = self.phase {
            self.phase = Phase::Deactivating(id);
        }
        if let Some(frame) = self.frame.take() {
            self.env.cancel_frame(frame);
        }
        for handle in self.listeners.drain(..) {
            self.env.remove_listener(handle);
        }
        self.kernel = None;
        self.last_timestamp = None;
        self.phase = Phase::Idle;
    }

    /// Advance one animation frame. `timestamp_ms` comes from the scheduler.
    ///
    /// The pending frame handle is consumed here; a new one is requested
    /// after the step so the loop keeps itself alive while `Running`.
    pub fn tick(&mut self, timestamp_ms: f64) {
        if !matches!(self.phase, Phase::Running(_)) {
            return;
        }
        self.frame = None;

        let dt = match self.last_timestamp {
            None => NOMINAL_DT,
            Some(prev) => (((timestamp_ms - prev) / 1000.0) as f32).clamp(0.0, MAX_DT),
        };
        self.last_timestamp = Some(timestamp_ms);

        let motion = if self.caps.reduced_motion {
            REDUCED_MOTION_SCALE
        } else {
            1.0
        };

        if let Some(kernel) = &mut self.kernel {
            kernel.step(&self.params, self.viewport, motion, dt);
        }

        self.frame = Some(self.env.request_frame());
    }

    /// Update the backing-surface dimensions. Identical dimensions are a
    /// no-op; kernel state is never reinitialized on resize.
    pub fn resize(&mut self, width: f32, height: f32) {
        let next = Viewport::new(width, height, self.viewport.dpr);
        if next == self.viewport {
            return;
        }
        self.viewport = next;
    }

    /// Clamped parameter write; only applied while `Running`. Returns the
    /// stored value.
    pub fn set_parameter(&mut self, group: &str, key: &str, value: f32) -> Option<f32> {
        if !matches!(self.phase, Phase::Running(_)) {
            return None;
        }
        self.params.set(group, key, value)
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if let Some(Kernel::Cursor(sim)) = &mut self.kernel {
            sim.pointer_moved(x, y);
        }
    }

    pub fn pointer_left(&mut self) {
        if let Some(Kernel::Cursor(sim)) = &mut self.kernel {
            sim.pointer_left();
        }
    }

    /// Host-side backend construction failed (shader compile/link error).
    ///
    /// Local recovery: record the diagnostic, flag degraded, and reroute to
    /// the raster fallback kernel while the displayed selection stays put.
    pub fn backend_failed(&mut self, diagnostic: String) {
        self.degraded = true;
        self.diagnostic = Some(if diagnostic.is_empty() {
            "backend construction failed".to_string()
        } else {
            diagnostic
        });

        if self.effective != FALLBACK {
            self.effective = FALLBACK;
            let eff_desc = registry::descriptor(FALLBACK);
            self.kernel = Some(Kernel::for_experiment(
                eff_desc,
                &self.params,
                self.viewport,
                KERNEL_SEED,
            ));
            for handle in self.listeners.drain(..) {
                self.env.remove_listener(handle);
            }
            self.install_listeners(FALLBACK);
        }
    }

    /// Terminal teardown; safe to call from any state, any number of times.
    pub fn unmount(&mut self) {
        self.deactivate();
        self.degraded = false;
        self.diagnostic = None;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    pub fn degraded(&self) -> bool {
        self.degraded
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Descriptor of the user's selection (displayed even while degraded).
    pub fn selected_descriptor(&self) -> &'static ExperimentDescriptor {
        registry::descriptor(self.selected)
    }

    /// Descriptor of what is actually rendering.
    pub fn effective_descriptor(&self) -> &'static ExperimentDescriptor {
        registry::descriptor(self.effective)
    }

    pub fn kernel(&self) -> Option<&Kernel> {
        self.kernel.as_ref()
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn capabilities(&self) -> CapabilitySnapshot {
        self.caps
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;

    #[derive(Default)]
    struct RecordingEnv {
        next: u64,
        requested_frames: u64,
        cancelled_frames: Vec<u64>,
        active_listeners: Vec<(u64, ListenerKind)>,
        removed_listeners: Vec<u64>,
    }

    impl EnvAdapter for RecordingEnv {
        fn request_frame(&mut self) -> FrameHandle {
            self.next += 1;
            self.requested_frames += 1;
            FrameHandle(self.next)
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.cancelled_frames.push(handle.0);
        }

        fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle {
            self.next += 1;
            self.active_listeners.push((self.next, kind));
            ListenerHandle(self.next)
        }

        fn remove_listener(&mut self, handle: ListenerHandle) {
            self.active_listeners.retain(|&(id, _)| id != handle.0);
            self.removed_listeners.push(handle.0);
        }
    }

    fn controller(caps: CapabilitySnapshot) -> LabController<RecordingEnv> {
        LabController::new(
            RecordingEnv::default(),
            caps,
            Viewport::new(800.0, 500.0, 1.0),
        )
    }

    #[test]
    fn select_activates_and_schedules_a_frame() {
        let mut c = controller(CapabilitySnapshot::full());
        assert_eq!(c.phase(), Phase::Idle);
        c.select("flow-field");
        assert_eq!(c.phase(), Phase::Running(ExperimentId::FlowField));
        assert!(c.pending_frame().is_some());
        assert!(!c.degraded());
    }

    #[test]
    fn selecting_the_active_experiment_is_a_noop() {
        let mut c = controller(CapabilitySnapshot::full());
        c.select("flow-field");
        let frame = c.pending_frame();
        c.select("flow-field");
        assert_eq!(c.pending_frame(), frame);
        assert!(c.env().cancelled_frames.is_empty());
    }

    #[test]
    fn switch_cancels_frames_and_drains_listeners() {
        let mut c = controller(CapabilitySnapshot::full());
        c.select("cursor-field");
        let kinds: Vec<ListenerKind> = c
            .env()
            .active_listeners
            .iter()
            .map(|&(_, k)| k)
            .collect();
        assert_eq!(
            kinds,
            [
                ListenerKind::Resize,
                ListenerKind::PointerMove,
                ListenerKind::PointerLeave
            ]
        );

        c.tick(16.0);
        let pending = c.pending_frame().expect("frame after tick");

        c.select("flow-field");
        // The outgoing experiment's frame request was cancelled...
        assert!(c.env().cancelled_frames.contains(&pending.0));
        // ...and none of its listeners survive; only the new resize hook.
        let kinds: Vec<ListenerKind> = c
            .env()
            .active_listeners
            .iter()
            .map(|&(_, k)| k)
            .collect();
        assert_eq!(kinds, [ListenerKind::Resize]);
        assert!(matches!(c.kernel(), Some(Kernel::Flow(_))));
    }

    #[test]
    fn registry_miss_falls_back_to_first_entry() {
        let mut c = controller(CapabilitySnapshot::full());
        c.select("definitely-not-real");
        assert_eq!(c.phase(), Phase::Running(ExperimentId::FlowField));
        assert_eq!(c.selected_descriptor().id, ExperimentId::FlowField);
    }

    #[test]
    fn gpu_absence_degrades_but_keeps_displayed_selection() {
        let caps = CapabilitySnapshot {
            raster2d: true,
            gpu: false,
            reduced_motion: false,
        };
        let mut c = controller(caps);
        c.select("plasma-sheet");

        assert!(c.degraded());
        assert!(!c.diagnostic().unwrap_or_default().is_empty());
        assert_eq!(c.selected_descriptor().id, ExperimentId::PlasmaSheet);
        assert_eq!(c.effective_descriptor().id, ExperimentId::FlowField);
        assert!(matches!(c.kernel(), Some(Kernel::Flow(_))));

        // The fallback genuinely produces frames.
        c.tick(16.0);
        assert!(c.pending_frame().is_some());
        match c.kernel() {
            Some(Kernel::Flow(sim)) => assert!(sim.time() > 0.0),
            other => panic!("unexpected kernel: {:?}", other.is_some()),
        }
    }

    #[test]
    fn backend_failure_reroutes_to_raster_fallback() {
        let mut c = controller(CapabilitySnapshot::full());
        c.select("plasma-sheet");
        assert!(matches!(c.kernel(), Some(Kernel::Plasma(_))));

        c.backend_failed("shader compile failed: syntax error".to_string());
        assert!(c.degraded());
        assert!(c.diagnostic().unwrap_or_default().contains("compile"));
        assert_eq!(c.selected_descriptor().id, ExperimentId::PlasmaSheet);
        assert!(matches!(c.kernel(), Some(Kernel::Flow(_))));
        // Still running; the displayed selection did not change.
        assert_eq!(c.phase(), Phase::Running(ExperimentId::PlasmaSheet));
    }

    #[test]
    fn dt_is_clamped_after_backgrounding() {
        let mut c = controller(CapabilitySnapshot::full());
        c.select("flow-field");
        c.tick(0.0);
        // Ten simulated seconds between frames: the step must clamp.
        c.tick(10_000.0);
        match c.kernel() {
            Some(Kernel::Flow(sim)) => {
                assert!(sim.time() <= NOMINAL_DT + MAX_DT + 1.0e-6, "t={}", sim.time());
            }
            _ => panic!("flow kernel expected"),
        }
    }

    #[test]
    fn set_parameter_clamps_and_requires_running() {
        let mut c = controller(CapabilitySnapshot::full());
        assert_eq!(c.set_parameter("flow", "speed", 1.0), None);

        c.select("flow-field");
        assert_eq!(c.set_parameter("flow", "speed", 99.0), Some(2.5));
        assert_eq!(c.params().get("flow", "speed"), 2.5);

        c.unmount();
        assert_eq!(c.set_parameter("flow", "speed", 1.0), None);
    }

    #[test]
    fn resize_is_idempotent_and_preserves_kernel_state() {
        let mut c = controller(CapabilitySnapshot::full());
        c.select("kalman-tracker");
        c.tick(0.0);
        c.tick(16.0);
        let before = match c.kernel() {
            Some(Kernel::Kalman(sim)) => (sim.estimate(), sim.true_trail().len()),
            _ => panic!("kalman kernel expected"),
        };

        c.resize(640.0, 480.0);
        c.resize(640.0, 480.0);
        assert_eq!(c.viewport(), Viewport::new(640.0, 480.0, 1.0));

        let after = match c.kernel() {
            Some(Kernel::Kalman(sim)) => (sim.estimate(), sim.true_trail().len()),
            _ => panic!("kalman kernel expected"),
        };
        assert_eq!(before, after);
    }

    #[test]
    fn pointer_events_reach_the_cursor_kernel() {
        let mut c = controller(CapabilitySnapshot::full());
        c.select("cursor-field");
        c.pointer_moved(120.0, 80.0);
        match c.kernel() {
            Some(Kernel::Cursor(sim)) => assert_eq!(sim.pointer(), Some((120.0, 80.0))),
            _ => panic!("cursor kernel expected"),
        }
        c.pointer_left();
        match c.kernel() {
            Some(Kernel::Cursor(sim)) => assert_eq!(sim.pointer(), None),
            _ => panic!("cursor kernel expected"),
        }
    }

    #[test]
    fn reduced_motion_scales_the_step() {
        let caps = CapabilitySnapshot {
            raster2d: true,
            gpu: true,
            reduced_motion: true,
        };
        let mut c = controller(caps);
        c.select("flow-field");
        c.tick(0.0);
        match c.kernel() {
            Some(Kernel::Flow(sim)) => {
                assert_eq!(sim.particles().len(), (520.0_f32 * 0.35).round() as usize);
            }
            _ => panic!("flow kernel expected"),
        }
    }

    #[test]
    fn unmount_is_idempotent_and_total() {
        let mut c = controller(CapabilitySnapshot::full());
        c.select("cursor-field");
        c.tick(0.0);
        c.unmount();
        c.unmount();
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.pending_frame().is_none());
        assert!(c.kernel().is_none());
        assert!(c.env().active_listeners.is_empty());
        // Ticks after unmount are ignored.
        c.tick(32.0);
        assert!(c.pending_frame().is_none());
    }
}
