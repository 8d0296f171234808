//! Leptos CSR shell for the simulation lab.
//!
//! The reactive layer here is deliberately thin: signals mirror what the UI
//! shows (selection, degradation, FPS), while the [`LabHost`] owns the
//! controller, the render surfaces, and the frame loop. DOM callbacks reach
//! the host through a thread-local slot so reactive closures never have to
//! capture it.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::html;
use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use simlab::capability::CapabilitySnapshot;
use simlab::controller::LabController;
use simlab::kernel::{Kernel, Viewport, REDUCED_MOTION_SCALE};
use simlab::registry::{self, Backend, ExperimentId};

mod canvas;
mod env;
mod gl;
mod hud;
mod parameter_field;
mod probe;

use canvas::RasterSurface;
use env::{BrowserEnv, RafClosure};
use gl::GpuProgram;
use hud::{DiagnosticsSnapshot, FpsCounter};
use parameter_field::parameter_row;

pub(crate) type HostSlot = Rc<RefCell<Option<LabHost>>>;

thread_local! {
    static HOST: HostSlot = Rc::new(RefCell::new(None));
}

fn with_host<R>(f: impl FnOnce(&mut LabHost) -> R) -> Option<R> {
    HOST.with(|slot| slot.borrow_mut().as_mut().map(f))
}

pub fn start() {
    mount_to_body(|| view! { <App /> });
}

enum BackendSurface {
    Raster(RasterSurface),
    Gpu(GpuProgram),
}

pub(crate) struct LabHost {
    controller: LabController<BrowserEnv>,
    surface: Option<BackendSurface>,
    stage: web_sys::HtmlElement,
    raster_canvas: web_sys::HtmlCanvasElement,
    gpu_canvas: web_sys::HtmlCanvasElement,
    fps: FpsCounter,
    last_fps: f64,
    set_fps: WriteSignal<f64>,
    set_degraded_msg: WriteSignal<Option<String>>,
    set_effective: WriteSignal<ExperimentId>,
}

impl LabHost {
    fn activate(&mut self, id: &str) {
        self.controller.select(id);
        self.build_surface();
        self.sync_surface_size();
        self.publish();
    }

    /// Build the render surface for the effective backend. A GPU failure is
    /// reported to the controller, which reroutes to the raster fallback.
    fn build_surface(&mut self) {
        self.surface = None;
        if let Backend::Gpu { shader } = self.controller.effective_descriptor().backend {
            match GpuProgram::new(&self.gpu_canvas, shader) {
                Ok(program) => {
                    self.surface = Some(BackendSurface::Gpu(program));
                    self.show_gpu(true);
                    return;
                }
                Err(diagnostic) => self.controller.backend_failed(diagnostic),
            }
        }
        self.show_gpu(false);
        match RasterSurface::new(&self.raster_canvas) {
            Ok(surface) => self.surface = Some(BackendSurface::Raster(surface)),
            Err(diagnostic) => self.controller.backend_failed(diagnostic),
        }
    }

    fn show_gpu(&self, gpu: bool) {
        let (on, off) = if gpu {
            (&self.gpu_canvas, &self.raster_canvas)
        } else {
            (&self.raster_canvas, &self.gpu_canvas)
        };
        let _ = on.style().set_property("display", "block");
        let _ = off.style().set_property("display", "none");
    }

    /// Re-read the stage's CSS size and pixel ratio and bring both the
    /// controller's viewport and the backing stores up to date.
    pub(crate) fn sync_surface_size(&mut self) {
        let rect = self.stage.get_bounding_client_rect();
        let dpr = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0);
        self.controller
            .resize(rect.width() as f32, rect.height() as f32);

        let viewport = self.controller.viewport();
        match &mut self.surface {
            Some(BackendSurface::Raster(surface)) => {
                let viewport = Viewport::new(viewport.width, viewport.height, dpr as f32);
                surface.resize(viewport);
            }
            Some(BackendSurface::Gpu(_)) => {
                self.gpu_canvas
                    .set_width((viewport.width as f64 * dpr) as u32);
                self.gpu_canvas
                    .set_height((viewport.height as f64 * dpr) as u32);
            }
            None => {}
        }
    }

    pub(crate) fn frame(&mut self, timestamp_ms: f64) {
        self.controller.tick(timestamp_ms);
        self.render();
        if let Some(fps) = self.fps.frame() {
            self.last_fps = fps;
            self.set_fps.set(fps);
        }
    }

    fn render(&mut self) {
        let viewport = self.controller.viewport();
        let params = self.controller.params();
        let motion = if self.controller.capabilities().reduced_motion {
            REDUCED_MOTION_SCALE
        } else {
            1.0
        };

        match (&mut self.surface, self.controller.kernel()) {
            (Some(BackendSurface::Raster(surface)), Some(Kernel::Flow(sim))) => {
                surface.draw_flow(sim, viewport);
            }
            (Some(BackendSurface::Raster(surface)), Some(Kernel::Cursor(sim))) => {
                surface.draw_cursor(sim, params, viewport, motion);
            }
            (Some(BackendSurface::Raster(surface)), Some(Kernel::Kalman(sim))) => {
                surface.draw_kalman(sim, viewport);
            }
            (Some(BackendSurface::Gpu(program)), Some(Kernel::Plasma(sim))) => {
                program.render(
                    sim.phase(),
                    params.get("plasma", "scale"),
                    params.get("plasma", "warp"),
                    self.gpu_canvas.width(),
                    self.gpu_canvas.height(),
                );
            }
            _ => {}
        }
    }

    pub(crate) fn pointer_moved(&mut self, x: f32, y: f32) {
        self.controller.pointer_moved(x, y);
    }

    pub(crate) fn pointer_left(&mut self) {
        self.controller.pointer_left();
    }

    fn set_parameter(&mut self, group: &'static str, key: &'static str, value: f32) -> Option<f32> {
        self.controller.set_parameter(group, key, value)
    }

    fn publish(&self) {
        self.set_effective.set(self.controller.effective_descriptor().id);
        self.set_degraded_msg.set(if self.controller.degraded() {
            Some(
                self.controller
                    .diagnostic()
                    .unwrap_or("running in degraded mode")
                    .to_string(),
            )
        } else {
            None
        });
    }

    fn log_diagnostics(&self) {
        let snapshot = DiagnosticsSnapshot {
            experiment: self.controller.selected_descriptor().id.as_str(),
            effective: self.controller.effective_descriptor().id.as_str(),
            backend: backend_label(self.controller.effective_descriptor().backend),
            degraded: self.controller.degraded(),
            diagnostic: self.controller.diagnostic(),
            fps: self.last_fps,
            capabilities: self.controller.capabilities(),
            viewport: self.controller.viewport(),
        };
        web_sys::console::log_1(&JsValue::from_str(&snapshot.to_json()));
    }

    fn unmount(&mut self) {
        self.controller.unmount();
        self.surface = None;
    }
}

fn backend_label(backend: Backend) -> &'static str {
    match backend {
        Backend::Raster2d => "canvas2d",
        Backend::Gpu { .. } => "webgl",
    }
}

#[component]
fn App() -> impl IntoView {
    let caps = probe::detect();

    let (selected, set_selected) = signal(ExperimentId::FlowField);
    let (effective, set_effective) = signal(ExperimentId::FlowField);
    let (degraded_msg, set_degraded_msg) = signal::<Option<String>>(None);
    let (fps, set_fps) = signal(0.0f64);
    let (hud_open, set_hud_open) = signal(false);

    let stage_ref = NodeRef::<html::Div>::new();
    let raster_ref = NodeRef::<html::Canvas>::new();
    let gpu_ref = NodeRef::<html::Canvas>::new();

    // One-shot host construction once the stage exists in the DOM.
    Effect::new(move |_| {
        let (Some(stage), Some(raster), Some(gpu)) =
            (stage_ref.get(), raster_ref.get(), gpu_ref.get())
        else {
            return;
        };
        let created = HOST.with(|slot| {
            if slot.borrow().is_some() {
                return false;
            }
            let Some(window) = web_sys::window() else {
                return false;
            };
            let stage: web_sys::HtmlElement = stage.into();

            let raf: RafClosure = Rc::new(RefCell::new(None));
            let env = BrowserEnv::new(
                window,
                stage.clone(),
                Rc::clone(slot),
                Rc::clone(&raf),
            );
            let controller = LabController::new(env, caps, Viewport::new(800.0, 500.0, 1.0));

            raf.borrow_mut().replace(Closure::wrap(Box::new(move |ts: f64| {
                with_host(|lab| lab.frame(ts));
            }) as Box<dyn FnMut(f64)>));

            slot.borrow_mut().replace(LabHost {
                controller,
                surface: None,
                stage,
                raster_canvas: raster,
                gpu_canvas: gpu,
                fps: FpsCounter::new(),
                last_fps: 0.0,
                set_fps,
                set_degraded_msg,
                set_effective,
            });
            true
        });
        if created {
            with_host(|lab| lab.activate(ExperimentId::FlowField.as_str()));
        }
    });

    on_cleanup(|| {
        HOST.with(|slot| {
            if let Some(mut lab) = slot.borrow_mut().take() {
                lab.unmount();
            }
        });
    });

    let backend = move || backend_label(registry::descriptor(effective.get()).backend);

    view! {
        <main class="lab">
            <header class="lab-header">
                <h1 class="lab-title">"Simulation Lab"</h1>
                <span class="subtle">{backend}</span>
                <button
                    class="btn sm ghost"
                    on:click=move |_| set_hud_open.set(!hud_open.get_untracked())
                >
                    "HUD"
                </button>
            </header>

            <Show when=move || degraded_msg.get().is_some()>
                <div class="degraded-banner" role="status">
                    <span class="degraded-label">"Degraded"</span>
                    <span class="degraded-text">
                        {move || degraded_msg.get().unwrap_or_default()}
                    </span>
                </div>
            </Show>

            <div class="lab-body">
                <aside class="lab-sidebar">
                    {ExperimentId::all()
                        .iter()
                        .map(|&id| {
                            let desc = registry::descriptor(id);
                            view! {
                                <button
                                    class=move || {
                                        if selected.get() == id {
                                            "sidebar-item active"
                                        } else {
                                            "sidebar-item"
                                        }
                                    }
                                    title=desc.description
                                    on:click=move |_| {
                                        with_host(|lab| lab.activate(id.as_str()));
                                        set_selected.set(id);
                                    }
                                >
                                    {desc.title}
                                </button>
                            }
                        })
                        .collect_view()}
                </aside>

                <section class="lab-main">
                    <div
                        class="lab-stage"
                        node_ref=stage_ref
                        style="position: relative; width: 100%; height: 420px; overflow: hidden; border-radius: 12px; background: #080f1b;"
                    >
                        <canvas
                            node_ref=raster_ref
                            style="position: absolute; inset: 0; width: 100%; height: 100%;"
                        ></canvas>
                        <canvas
                            node_ref=gpu_ref
                            style="position: absolute; inset: 0; width: 100%; height: 100%; display: none;"
                        ></canvas>
                        <Show when=move || !caps.raster2d && !caps.gpu>
                            <FallbackCards />
                        </Show>
                    </div>

                    <section class="lab-params">
                        {move || {
                            let desc = registry::descriptor(effective.get());
                            desc.schema
                                .iter()
                                .map(|spec| {
                                    parameter_row(spec, |group, key, value| {
                                        with_host(|lab| lab.set_parameter(group, key, value))
                                            .flatten()
                                    })
                                })
                                .collect_view()
                        }}
                    </section>

                    <Show when=move || hud_open.get()>
                        <section class="lab-hud">
                            <div class="hud-row">
                                <span>"fps"</span>
                                <span>{move || format!("{:.0}", fps.get())}</span>
                            </div>
                            <div class="hud-row">
                                <span>"capabilities"</span>
                                <span>{capability_line(caps)}</span>
                            </div>
                            <div class="hud-row">
                                <span>"experiment"</span>
                                <span>{move || {
                                    registry::descriptor(effective.get()).title.to_string()
                                }}</span>
                            </div>
                            <button
                                class="btn sm"
                                on:click=move |_| {
                                    with_host(|lab| lab.log_diagnostics());
                                }
                            >
                                "Log diagnostics JSON"
                            </button>
                        </section>
                    </Show>
                </section>
            </div>
        </main>
    }
}

fn capability_line(caps: CapabilitySnapshot) -> String {
    format!(
        "2d:{} gpu:{} reduced-motion:{}",
        caps.raster2d, caps.gpu, caps.reduced_motion
    )
}

/// Static stand-in rendered when no drawing surface is available at all.
#[component]
fn FallbackCards() -> impl IntoView {
    view! {
        <div class="fallback-cards">
            {registry::experiments()
                .iter()
                .map(|desc| {
                    view! {
                        <div class="fallback-card">
                            <div class="fallback-title">{desc.title}</div>
                            <div class="fallback-text">{desc.description}</div>
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}
