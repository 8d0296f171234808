//! GPU shader experiment.
//!
//! The kernel side is deliberately tiny: a phase accumulator advanced by the
//! `speed` parameter. Everything visual happens in the fragment shader, which
//! is compiled once at activation and driven per frame through `u_time`,
//! `u_resolution`, `u_scale`, and `u_warp` uniforms.

use crate::params::ParameterSet;

/// GLSL ES 1.00 fragment shader for the full-screen quad pass.
pub const PLASMA_SHADER: &str = r#"
precision mediump float;

uniform float u_time;
uniform vec2 u_resolution;
uniform float u_scale;
uniform float u_warp;

void main() {
    vec2 uv = gl_FragCoord.xy / u_resolution;
    vec2 p = (uv - 0.5) * u_scale;

    float t = u_time;
    float v = sin(p.x + t);
    v += sin(0.5 * (p.y + t));
    v += sin(0.33 * (p.x + p.y + t));
    p += u_warp * vec2(sin(p.y + t * 0.7), cos(p.x - t * 0.6));
    v += sin(length(p) + t);

    vec3 base = vec3(0.031, 0.059, 0.106);
    vec3 accent = vec3(0.298, 0.565, 1.0);
    vec3 glow = vec3(0.173, 0.816, 0.616);
    float s = 0.5 + 0.5 * sin(v * 3.14159);
    vec3 color = mix(base, mix(accent, glow, uv.y), s);

    gl_FragColor = vec4(color, 1.0);
}
"#;

#[derive(Debug, Default)]
pub struct PlasmaSim {
    phase: f32,
}

impl PlasmaSim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated shader time in seconds, pre-scaled by `speed`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn step(&mut self, params: &ParameterSet, motion: f32, dt: f32) {
        self.phase += params.get("plasma", "speed") * motion * dt;
    }
}
