// Graphics backend seam
//
// The overlay only ever touches the GL context through `GraphicsBackend`, so
// bootstrap, drawing and state preservation can run against a recording fake
// in tests. Object names are raw GL names (`0` meaning "nothing bound"), which
// is also what `glGetIntegerv` reports for the host's bindings.
use crate::error::{BootstrapError, ShaderStage};
use glow::HasContext;
use std::ffi::c_void;
use std::num::NonZeroU32;

/// Vertex array plus the buffer feeding its attribute 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadBuffer {
    pub vertex_array: u32,
    pub buffer: u32,
}

/// The subset of OpenGL the overlay needs.
///
/// Implementations assume the GL context they were created for is current on
/// the calling thread.
pub trait GraphicsBackend {
    /// `glGetIntegerv` for a single-valued parameter.
    fn get_integer(&self, parameter: u32) -> i32;
    /// Width and height of the current viewport.
    fn viewport_size(&self) -> (u32, u32);
    fn is_enabled(&self, capability: u32) -> bool;
    fn set_enabled(&self, capability: u32, enabled: bool);
    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);

    fn active_texture(&self, unit: u32);
    fn use_program(&self, program: u32);
    fn bind_texture_2d(&self, texture: u32);
    fn bind_vertex_array(&self, vertex_array: u32);
    fn bind_array_buffer(&self, buffer: u32);

    /// Create a linear-filtered single-channel (`R8`) texture.
    ///
    /// Leaves the new texture bound to `GL_TEXTURE_2D`.
    fn create_coverage_texture(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<u32, BootstrapError>;
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<u32, BootstrapError>;
    /// Link a program from two compiled shaders. The shaders are deleted
    /// whether or not linking succeeds.
    fn link_program(&self, vertex: u32, fragment: u32) -> Result<u32, BootstrapError>;
    /// Create a dynamic vertex buffer of `capacity` bytes whose attribute 0 is
    /// a `vec4` of floats. Leaves both objects bound.
    fn create_quad_buffer(&self, capacity: usize, stride: i32)
        -> Result<QuadBuffer, BootstrapError>;

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32>;
    fn uniform_mat4(&self, location: u32, matrix: &[f32; 16]);
    fn uniform_vec3(&self, location: u32, value: [f32; 3]);
    fn uniform_int(&self, location: u32, value: i32);

    /// `glBufferSubData` on the bound `GL_ARRAY_BUFFER`.
    fn upload_array_buffer(&self, offset: i32, data: &[u8]);
    fn draw_triangles(&self, first: i32, count: i32);
}

/// [`GraphicsBackend`] over a [`glow::Context`] loaded from the host's GL.
pub struct GlowBackend {
    gl: glow::Context,
}

impl GlowBackend {
    /// Load GL entry points through `loader`.
    ///
    /// # Safety
    /// A GL context must be current on this thread, and `loader` must return
    /// entry points valid for that context (or null for unsupported ones).
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        Self {
            gl: glow::Context::from_loader_function(loader),
        }
    }
}

fn program(raw: u32) -> Option<glow::NativeProgram> {
    NonZeroU32::new(raw).map(glow::NativeProgram)
}

fn texture(raw: u32) -> Option<glow::NativeTexture> {
    NonZeroU32::new(raw).map(glow::NativeTexture)
}

fn vertex_array(raw: u32) -> Option<glow::NativeVertexArray> {
    NonZeroU32::new(raw).map(glow::NativeVertexArray)
}

fn buffer(raw: u32) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(raw).map(glow::NativeBuffer)
}

fn shader(raw: u32) -> Result<glow::NativeShader, BootstrapError> {
    NonZeroU32::new(raw)
        .map(glow::NativeShader)
        .ok_or_else(|| BootstrapError::allocation("shader", "null shader name"))
}

// SAFETY (all methods): the caller of `from_loader` guaranteed a current
// context; every name passed in was either produced by this backend or read
// back from the same context.
impl GraphicsBackend for GlowBackend {
    fn get_integer(&self, parameter: u32) -> i32 {
        unsafe { self.gl.get_parameter_i32(parameter) }
    }

    fn viewport_size(&self) -> (u32, u32) {
        let mut viewport = [0i32; 4];
        unsafe { self.gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport) };
        (viewport[2].max(0) as u32, viewport[3].max(0) as u32)
    }

    fn is_enabled(&self, capability: u32) -> bool {
        unsafe { self.gl.is_enabled(capability) }
    }

    fn set_enabled(&self, capability: u32, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(capability);
            } else {
                self.gl.disable(capability);
            }
        }
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        unsafe {
            self.gl
                .blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha)
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(unit) }
    }

    fn use_program(&self, raw: u32) {
        unsafe { self.gl.use_program(program(raw)) }
    }

    fn bind_texture_2d(&self, raw: u32) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture(raw)) }
    }

    fn bind_vertex_array(&self, raw: u32) {
        unsafe { self.gl.bind_vertex_array(vertex_array(raw)) }
    }

    fn bind_array_buffer(&self, raw: u32) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer(raw)) }
    }

    fn create_coverage_texture(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<u32, BootstrapError> {
        unsafe {
            let created = self
                .gl
                .create_texture()
                .map_err(|e| BootstrapError::allocation("atlas texture", e))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(created));

            // Upload from client memory with tight rows, whatever the host set.
            let unpack_buffer = self.gl.get_parameter_i32(glow::PIXEL_UNPACK_BUFFER_BINDING);
            let unpack_alignment = self.gl.get_parameter_i32(glow::UNPACK_ALIGNMENT);
            self.gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, None);
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::R8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RED,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );

            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, unpack_alignment);
            self.gl
                .bind_buffer(glow::PIXEL_UNPACK_BUFFER, buffer(unpack_buffer as u32));

            for (parameter, value) in [
                (glow::TEXTURE_MIN_FILTER, glow::LINEAR),
                (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
                (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
                (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
            ] {
                self.gl
                    .tex_parameter_i32(glow::TEXTURE_2D, parameter, value as i32);
            }

            Ok(created.0.get())
        }
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<u32, BootstrapError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let created = self
                .gl
                .create_shader(kind)
                .map_err(|e| BootstrapError::allocation("shader", e))?;
            self.gl.shader_source(created, source);
            self.gl.compile_shader(created);
            if !self.gl.get_shader_compile_status(created) {
                let log = self.gl.get_shader_info_log(created);
                self.gl.delete_shader(created);
                return Err(BootstrapError::ShaderCompile { stage, log });
            }
            Ok(created.0.get())
        }
    }

    fn link_program(&self, vertex: u32, fragment: u32) -> Result<u32, BootstrapError> {
        let vertex = shader(vertex)?;
        let fragment = shader(fragment)?;
        unsafe {
            let linked = match self.gl.create_program() {
                Ok(p) => p,
                Err(e) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(BootstrapError::allocation("shader program", e));
                }
            };
            self.gl.attach_shader(linked, vertex);
            self.gl.attach_shader(linked, fragment);
            self.gl.link_program(linked);
            let ok = self.gl.get_program_link_status(linked);

            for stage in [vertex, fragment] {
                self.gl.detach_shader(linked, stage);
                self.gl.delete_shader(stage);
            }

            if !ok {
                let log = self.gl.get_program_info_log(linked);
                self.gl.delete_program(linked);
                return Err(BootstrapError::ProgramLink { log });
            }
            Ok(linked.0.get())
        }
    }

    fn create_quad_buffer(
        &self,
        capacity: usize,
        stride: i32,
    ) -> Result<QuadBuffer, BootstrapError> {
        unsafe {
            let vao = self
                .gl
                .create_vertex_array()
                .map_err(|e| BootstrapError::allocation("vertex array", e))?;
            let vbo = self
                .gl
                .create_buffer()
                .map_err(|e| BootstrapError::allocation("vertex buffer", e))?;

            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            self.gl
                .buffer_data_size(glow::ARRAY_BUFFER, capacity as i32, glow::DYNAMIC_DRAW);
            self.gl.enable_vertex_attrib_array(0);
            self.gl
                .vertex_attrib_pointer_f32(0, 4, glow::FLOAT, false, stride, 0);

            Ok(QuadBuffer {
                vertex_array: vao.0.get(),
                buffer: vbo.0.get(),
            })
        }
    }

    fn uniform_location(&self, raw: u32, name: &str) -> Option<u32> {
        let linked = program(raw)?;
        unsafe { self.gl.get_uniform_location(linked, name) }.map(|location| location.0)
    }

    fn uniform_mat4(&self, location: u32, matrix: &[f32; 16]) {
        let location = glow::NativeUniformLocation(location);
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&location), false, matrix)
        }
    }

    fn uniform_vec3(&self, location: u32, value: [f32; 3]) {
        let location = glow::NativeUniformLocation(location);
        unsafe {
            self.gl
                .uniform_3_f32(Some(&location), value[0], value[1], value[2])
        }
    }

    fn uniform_int(&self, location: u32, value: i32) {
        let location = glow::NativeUniformLocation(location);
        unsafe { self.gl.uniform_1_i32(Some(&location), value) }
    }

    fn upload_array_buffer(&self, offset: i32, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, offset, data)
        }
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) }
    }
}
