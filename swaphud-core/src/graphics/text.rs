//! Overlay text renderer
//!
//! Owns the GPU side of the overlay: the atlas texture, the text program and
//! a one-quad dynamic vertex buffer. Text is drawn one glyph at a time, each
//! glyph as two triangles uploaded into the same buffer.

use super::atlas::{GlyphAtlas, GlyphQuad, GlyphTable};
use super::backend::{GraphicsBackend, QuadBuffer};
use super::shaders;
use crate::error::{BootstrapError, ShaderStage};
use glam::Mat4;
use std::mem::size_of;

/// Vertices per glyph quad.
pub const QUAD_VERTICES: usize = 6;

/// One vertex of a glyph quad, laid out as the shader's `vec4 vertex`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl GlyphQuad {
    /// Two triangles covering the quad, counter-clockwise once projected.
    ///
    /// The top screen edge carries `t0`, the top row of the glyph bitmap,
    /// so with a y-down projection glyphs come out upright.
    pub fn vertices(&self) -> [GlyphVertex; QUAD_VERTICES] {
        let v = |x, y, s, t| GlyphVertex {
            position: [x, y],
            tex_coords: [s, t],
        };
        let top_left = v(self.x0, self.y0, self.s0, self.t0);
        let bottom_left = v(self.x0, self.y1, self.s0, self.t1);
        let bottom_right = v(self.x1, self.y1, self.s1, self.t1);
        let top_right = v(self.x1, self.y0, self.s1, self.t0);

        [
            top_left,
            bottom_left,
            bottom_right,
            top_left,
            bottom_right,
            top_right,
        ]
    }
}

/// Pixel-space orthographic projection: origin top-left, y down.
pub fn projection(width: u32, height: u32) -> Mat4 {
    Mat4::orthographic_rh_gl(0.0, width as f32, height as f32, 0.0, -1.0, 1.0)
}

fn uniform<B: GraphicsBackend + ?Sized>(
    gl: &B,
    program: u32,
    name: &'static str,
) -> Result<u32, BootstrapError> {
    gl.uniform_location(program, name)
        .ok_or_else(|| BootstrapError::allocation("uniform location", name))
}

/// GPU resources for drawing overlay text.
#[derive(Debug)]
pub struct OverlayRenderer {
    texture: u32,
    program: u32,
    quad: QuadBuffer,
    color_location: u32,
    glyphs: GlyphTable,
}

impl OverlayRenderer {
    /// Upload the atlas, build the text program and vertex buffer, and set
    /// the projection for a `viewport` of `(width, height)` pixels.
    ///
    /// Leaves the new objects bound; callers restore the host's bindings.
    pub fn new<B: GraphicsBackend + ?Sized>(
        gl: &B,
        atlas: GlyphAtlas,
        viewport: (u32, u32),
    ) -> Result<Self, BootstrapError> {
        // The atlas lives on unit 0; leave the host's other units alone.
        gl.active_texture(glow::TEXTURE0);
        let texture = gl.create_coverage_texture(atlas.width(), atlas.height(), atlas.pixels())?;

        let vertex = gl.compile_shader(ShaderStage::Vertex, shaders::TEXT_VERTEX)?;
        let fragment = gl.compile_shader(ShaderStage::Fragment, shaders::TEXT_FRAGMENT)?;
        let program = gl.link_program(vertex, fragment)?;

        let stride = size_of::<GlyphVertex>();
        let quad = gl.create_quad_buffer(QUAD_VERTICES * stride, stride as i32)?;

        gl.use_program(program);
        let projection_location = uniform(gl, program, shaders::UNIFORM_PROJECTION)?;
        let sampler_location = uniform(gl, program, shaders::UNIFORM_SAMPLER)?;
        let color_location = uniform(gl, program, shaders::UNIFORM_COLOR)?;

        let matrix = projection(viewport.0, viewport.1).to_cols_array();
        gl.uniform_mat4(projection_location, &matrix);
        gl.uniform_int(sampler_location, 0);

        Ok(Self {
            texture,
            program,
            quad,
            color_location,
            glyphs: atlas.into_table(),
        })
    }

    pub fn texture(&self) -> u32 {
        self.texture
    }

    pub fn program(&self) -> u32 {
        self.program
    }

    pub fn quad_buffer(&self) -> QuadBuffer {
        self.quad
    }

    pub fn glyphs(&self) -> &GlyphTable {
        &self.glyphs
    }

    /// Bind the text program, the atlas on texture unit 0 and the quad's
    /// vertex array and buffer.
    pub fn bind<B: GraphicsBackend + ?Sized>(&self, gl: &B) {
        gl.use_program(self.program);
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture_2d(self.texture);
        gl.bind_vertex_array(self.quad.vertex_array);
        gl.bind_array_buffer(self.quad.buffer);
    }

    /// Draw `text` with its baseline starting at `(x, y)` in pixels.
    ///
    /// Issues one draw per printable character and returns how many were
    /// drawn. Blending is on for the call and off afterwards; depth testing
    /// and face culling are suspended if enabled and re-enabled afterwards.
    pub fn draw_text<B: GraphicsBackend + ?Sized>(
        &self,
        gl: &B,
        text: &str,
        x: f32,
        y: f32,
        color: [f32; 3],
    ) -> usize {
        let depth_test = gl.is_enabled(glow::DEPTH_TEST);
        let cull_face = gl.is_enabled(glow::CULL_FACE);
        if depth_test {
            gl.set_enabled(glow::DEPTH_TEST, false);
        }
        if cull_face {
            gl.set_enabled(glow::CULL_FACE, false);
        }

        gl.set_enabled(glow::BLEND, true);
        gl.blend_func_separate(
            glow::SRC_ALPHA,
            glow::ONE_MINUS_SRC_ALPHA,
            glow::SRC_ALPHA,
            glow::ONE_MINUS_SRC_ALPHA,
        );

        self.bind(gl);
        gl.uniform_vec3(self.color_location, color);

        let mut pen = [x, y];
        let mut drawn = 0;
        for c in text.chars() {
            let Some(quad) = self.glyphs.quad(c, &mut pen) else {
                continue;
            };
            let vertices = quad.vertices();
            gl.upload_array_buffer(0, bytemuck::cast_slice(&vertices));
            gl.draw_triangles(0, QUAD_VERTICES as i32);
            drawn += 1;
        }

        gl.bind_vertex_array(0);
        gl.bind_array_buffer(0);
        gl.bind_texture_2d(0);
        gl.set_enabled(glow::BLEND, false);

        if depth_test {
            gl.set_enabled(glow::DEPTH_TEST, true);
        }
        if cull_face {
            gl.set_enabled(glow::CULL_FACE, true);
        }
        drawn
    }
}
