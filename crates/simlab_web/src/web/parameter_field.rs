//! Range-slider field for one schema parameter.

use leptos::prelude::*;

use simlab::registry::ParamSpec;

fn decimals_for_step(step: f32) -> usize {
    if step >= 1.0 {
        0
    } else if step >= 0.1 {
        1
    } else {
        2
    }
}

pub(super) fn format_float(v: f32, step: f32) -> String {
    match decimals_for_step(step) {
        0 => format!("{v:.0}"),
        1 => format!("{v:.1}"),
        _ => format!("{v:.2}"),
    }
}

/// One labelled slider row. Writes go through `apply`, which returns the
/// value actually stored (clamped by the parameter store); the display always
/// reflects that value, not the raw input.
pub(super) fn parameter_row(
    spec: &'static ParamSpec,
    apply: impl Fn(&'static str, &'static str, f32) -> Option<f32> + 'static,
) -> impl IntoView {
    let (value, set_value) = signal(spec.default);
    let input_id = format!("param-{}-{}", spec.group, spec.key);

    view! {
        <div class="param-field">
            <div class="param-label-row">
                <label class="param-label" for=input_id.clone()>
                    {spec.label}
                </label>
                <span class="param-value">
                    {move || format_float(value.get(), spec.step)}
                </span>
            </div>
            <input
                id=input_id
                class="param-slider"
                type="range"
                min=spec.min
                max=spec.max
                step=spec.step
                prop:value=move || format_float(value.get(), spec.step)
                on:input=move |ev| {
                    let raw = event_target_value(&ev);
                    if let Ok(v) = raw.trim().parse::<f32>() {
                        if let Some(stored) = apply(spec.group, spec.key, v) {
                            set_value.set(stored);
                        }
                    }
                }
            />
        </div>
    }
}
