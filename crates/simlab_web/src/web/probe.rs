//! Host capability probing.
//!
//! Runs once at mount against an offscreen canvas. Every query is wrapped so
//! a hostile or headless environment yields `false` rather than a panic.

use wasm_bindgen::JsCast;

use simlab::capability::CapabilitySnapshot;

pub(super) fn detect() -> CapabilitySnapshot {
    CapabilitySnapshot {
        raster2d: probe_context("2d"),
        gpu: probe_context("webgl2") || probe_context("webgl"),
        reduced_motion: prefers_reduced_motion(),
    }
}

fn probe_context(kind: &str) -> bool {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return false;
    };
    let Ok(element) = document.create_element("canvas") else {
        return false;
    };
    let Ok(canvas) = element.dyn_into::<web_sys::HtmlCanvasElement>() else {
        return false;
    };
    matches!(canvas.get_context(kind), Ok(Some(_)))
}

fn prefers_reduced_motion() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok())
        .flatten()
        .map(|mql| mql.matches())
        .unwrap_or(false)
}
