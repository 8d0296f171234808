//! Raster (2D canvas) renderer for the three CPU experiments.
//!
//! All drawing happens in CSS-pixel coordinates; the backing store is scaled
//! by the device pixel ratio once per resize via `set_transform`.

use wasm_bindgen::{JsCast, JsValue};

use simlab::kernel::{CursorFieldSim, FlowFieldSim, KalmanSim, Viewport};
use simlab::params::ParameterSet;

const BACKDROP: &str = "#080f1b";
const TRAIL_FADE: &str = "rgba(8, 15, 27, 0.085)";
const ACCENT: &str = "rgba(122, 162, 255, 0.85)";
const ACCENT_DIM: &str = "rgba(122, 162, 255, 0.35)";
const TRUTH: &str = "rgba(34, 197, 94, 0.9)";
const MEASUREMENT: &str = "rgba(251, 191, 36, 0.55)";
const TEXT: &str = "rgba(226, 232, 240, 0.85)";

pub(super) struct RasterSurface {
    canvas: web_sys::HtmlCanvasElement,
    ctx: web_sys::CanvasRenderingContext2d,
    cleared: bool,
}

#[allow(deprecated)]
impl RasterSurface {
    pub(super) fn new(canvas: &web_sys::HtmlCanvasElement) -> Result<Self, String> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|_| "canvas: get_context threw".to_string())?
            .ok_or("canvas: missing 2d context".to_string())?
            .dyn_into::<web_sys::CanvasRenderingContext2d>()
            .map_err(|_| "canvas: context is not 2d".to_string())?;

        Ok(Self {
            canvas: canvas.clone(),
            ctx,
            cleared: false,
        })
    }

    /// Match the backing store to the CSS size at the current pixel ratio and
    /// rescale the transform. Forces a full clear on the next frame.
    pub(super) fn resize(&mut self, viewport: Viewport) {
        let dpr = viewport.dpr as f64;
        self.canvas
            .set_width((viewport.width as f64 * dpr) as u32);
        self.canvas
            .set_height((viewport.height as f64 * dpr) as u32);
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        self.cleared = false;
    }

    fn backdrop(&mut self, viewport: Viewport) {
        self.ctx.set_fill_style(&JsValue::from_str(BACKDROP));
        self.ctx.fill_rect(
            0.0,
            0.0,
            viewport.width as f64,
            viewport.height as f64,
        );
        self.cleared = true;
    }

    pub(super) fn draw_flow(&mut self, sim: &FlowFieldSim, viewport: Viewport) {
        let (w, h) = (viewport.width as f64, viewport.height as f64);
        if !self.cleared {
            self.backdrop(viewport);
        } else {
            // Low-alpha repaint leaves fading streaks behind each particle.
            self.ctx.set_fill_style(&JsValue::from_str(TRAIL_FADE));
            self.ctx.fill_rect(0.0, 0.0, w, h);
        }

        self.ctx.set_stroke_style(&JsValue::from_str(ACCENT));
        self.ctx.set_line_width(1.0);
        self.ctx.begin_path();
        for p in sim.particles() {
            self.ctx.move_to(p.px as f64 * w, p.py as f64 * h);
            self.ctx.line_to(p.x as f64 * w, p.y as f64 * h);
        }
        self.ctx.stroke();
    }

    pub(super) fn draw_cursor(
        &mut self,
        sim: &CursorFieldSim,
        params: &ParameterSet,
        viewport: Viewport,
        motion: f32,
    ) {
        self.backdrop(viewport);
        self.ctx.set_stroke_style(&JsValue::from_str(ACCENT));
        self.ctx.set_line_width(1.2);
        self.ctx.begin_path();
        for arrow in sim.arrows(params, viewport, motion) {
            let (x, y) = (arrow.x as f64, arrow.y as f64);
            let (cos, sin) = (arrow.angle.cos() as f64, arrow.angle.sin() as f64);
            let len = arrow.len as f64;
            let (tx, ty) = (x + cos * len, y + sin * len);

            self.ctx.move_to(x, y);
            self.ctx.line_to(tx, ty);

            // Head: two short barbs swept back from the tip.
            let head = (len * 0.35).min(5.0);
            let barb = arrow.angle as f64 + std::f64::consts::PI * 0.85;
            self.ctx.move_to(tx, ty);
            self.ctx.line_to(tx + barb.cos() * head, ty + barb.sin() * head);
            let barb = arrow.angle as f64 - std::f64::consts::PI * 0.85;
            self.ctx.move_to(tx, ty);
            self.ctx.line_to(tx + barb.cos() * head, ty + barb.sin() * head);
        }
        self.ctx.stroke();
    }

    pub(super) fn draw_kalman(&mut self, sim: &KalmanSim, viewport: Viewport) {
        self.backdrop(viewport);

        self.stroke_polyline(sim.true_trail(), TRUTH, 1.5);
        self.stroke_polyline(sim.estimate_trail(), ACCENT, 1.5);

        self.ctx.set_fill_style(&JsValue::from_str(MEASUREMENT));
        for &(x, y) in sim.measurement_trail() {
            self.ctx.begin_path();
            let _ = self
                .ctx
                .arc(x, y, 1.6, 0.0, std::f64::consts::TAU);
            self.ctx.fill();
        }

        // 1-sigma position uncertainty around the estimate.
        let (ex, ey) = sim.estimate();
        self.ctx.set_stroke_style(&JsValue::from_str(ACCENT_DIM));
        self.ctx.set_line_width(1.0);
        self.ctx.begin_path();
        let _ = self
            .ctx
            .arc(ex, ey, sim.uncertainty(), 0.0, std::f64::consts::TAU);
        self.ctx.stroke();

        self.ctx.set_fill_style(&JsValue::from_str(TEXT));
        self.ctx.set_font("12px ui-monospace, monospace");
        let _ = self
            .ctx
            .fill_text(&format!("rmse {:5.1} px", sim.rmse()), 12.0, 20.0);
        let _ = self
            .ctx
            .fill_text(&format!("|v|  {:5.0} px/s", sim.true_speed()), 12.0, 36.0);
        if sim.update_skipped() {
            let _ = self.ctx.fill_text("update skipped", 12.0, 52.0);
        }
    }

    fn stroke_polyline(&self, points: &[(f64, f64)], style: &str, width: f64) {
        if points.len() < 2 {
            return;
        }
        self.ctx.set_stroke_style(&JsValue::from_str(style));
        self.ctx.set_line_width(width);
        self.ctx.begin_path();
        self.ctx.move_to(points[0].0, points[0].1);
        for &(x, y) in &points[1..] {
            self.ctx.line_to(x, y);
        }
        self.ctx.stroke();
    }
}
