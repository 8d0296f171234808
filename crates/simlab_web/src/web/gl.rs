//! WebGL fragment-shader backend.
//!
//! One fullscreen-quad pipeline per activation. Compile and link failures
//! surface as `Err(String)` carrying the driver's info log so the controller
//! can record the diagnostic and fall back to the raster path.

use wasm_bindgen::JsCast;
use web_sys::WebGlRenderingContext as Gl;

const VERTEX_SHADER: &str = r#"
attribute vec2 a_position;
void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

pub(super) struct GpuProgram {
    gl: Gl,
    program: web_sys::WebGlProgram,
    u_time: Option<web_sys::WebGlUniformLocation>,
    u_resolution: Option<web_sys::WebGlUniformLocation>,
    u_scale: Option<web_sys::WebGlUniformLocation>,
    u_warp: Option<web_sys::WebGlUniformLocation>,
    _quad: web_sys::WebGlBuffer,
}

impl GpuProgram {
    pub(super) fn new(
        canvas: &web_sys::HtmlCanvasElement,
        fragment_source: &str,
    ) -> Result<Self, String> {
        let gl = canvas
            .get_context("webgl")
            .map_err(|_| "gl: get_context threw".to_string())?
            .ok_or("gl: webgl context unavailable".to_string())?
            .dyn_into::<Gl>()
            .map_err(|_| "gl: context is not webgl".to_string())?;

        let vert = compile(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let frag = compile(&gl, Gl::FRAGMENT_SHADER, fragment_source)?;

        let program = gl
            .create_program()
            .ok_or("gl: create_program failed".to_string())?;
        gl.attach_shader(&program, &vert);
        gl.attach_shader(&program, &frag);
        gl.link_program(&program);

        let linked = gl
            .get_program_parameter(&program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !linked {
            let log = gl
                .get_program_info_log(&program)
                .unwrap_or_else(|| "unknown link error".to_string());
            return Err(format!("shader link failed: {log}"));
        }

        let quad = gl.create_buffer().ok_or("gl: create_buffer failed".to_string())?;
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&quad));
        let vertices: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
        let array = js_sys::Float32Array::from(&vertices[..]);
        gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);

        gl.use_program(Some(&program));
        let position = gl.get_attrib_location(&program, "a_position");
        if position < 0 {
            return Err("gl: missing a_position attribute".to_string());
        }
        gl.enable_vertex_attrib_array(position as u32);
        gl.vertex_attrib_pointer_with_i32(position as u32, 2, Gl::FLOAT, false, 0, 0);

        Ok(Self {
            u_time: gl.get_uniform_location(&program, "u_time"),
            u_resolution: gl.get_uniform_location(&program, "u_resolution"),
            u_scale: gl.get_uniform_location(&program, "u_scale"),
            u_warp: gl.get_uniform_location(&program, "u_warp"),
            gl,
            program,
            _quad: quad,
        })
    }

    /// Draw one frame. `width`/`height` are device pixels.
    pub(super) fn render(&self, phase: f32, scale: f32, warp: f32, width: u32, height: u32) {
        let gl = &self.gl;
        gl.viewport(0, 0, width as i32, height as i32);
        gl.use_program(Some(&self.program));
        gl.uniform1f(self.u_time.as_ref(), phase);
        gl.uniform2f(self.u_resolution.as_ref(), width as f32, height as f32);
        gl.uniform1f(self.u_scale.as_ref(), scale);
        gl.uniform1f(self.u_warp.as_ref(), warp);
        gl.draw_arrays(Gl::TRIANGLE_STRIP, 0, 4);
    }
}

fn compile(gl: &Gl, kind: u32, source: &str) -> Result<web_sys::WebGlShader, String> {
    let shader = gl
        .create_shader(kind)
        .ok_or("gl: create_shader failed".to_string())?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let log = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown compile error".to_string());
        Err(format!("shader compile failed: {log}"))
    }
}
