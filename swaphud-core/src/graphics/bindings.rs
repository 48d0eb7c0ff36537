//! Captured binding state
//!
//! The host's binding state that the overlay disturbs, captured as a value so
//! it can be put back exactly after overlay work is done.

use super::backend::GraphicsBackend;

/// Snapshot of the host bindings touched by overlay bootstrap and drawing.
///
/// The 2D texture binding is the one on texture unit 0, where the overlay
/// binds its atlas; the host's active unit is recorded separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapturedBindingSet {
    pub program: u32,
    pub active_texture: u32,
    pub texture_2d: u32,
    pub vertex_array: u32,
    pub array_buffer: u32,
    pub blend_src_rgb: u32,
    pub blend_dst_rgb: u32,
    pub blend_src_alpha: u32,
    pub blend_dst_alpha: u32,
    pub blend_enabled: bool,
}

impl CapturedBindingSet {
    /// Read the current bindings from `gl`.
    ///
    /// Leaves the context as it found it.
    pub fn capture<B: GraphicsBackend + ?Sized>(gl: &B) -> Self {
        let name = |parameter| gl.get_integer(parameter) as u32;

        let active_texture = name(glow::ACTIVE_TEXTURE);
        if active_texture != glow::TEXTURE0 {
            gl.active_texture(glow::TEXTURE0);
        }
        let texture_2d = name(glow::TEXTURE_BINDING_2D);
        if active_texture != glow::TEXTURE0 {
            gl.active_texture(active_texture);
        }

        Self {
            program: name(glow::CURRENT_PROGRAM),
            active_texture,
            texture_2d,
            vertex_array: name(glow::VERTEX_ARRAY_BINDING),
            array_buffer: name(glow::ARRAY_BUFFER_BINDING),
            blend_src_rgb: name(glow::BLEND_SRC_RGB),
            blend_dst_rgb: name(glow::BLEND_DST_RGB),
            blend_src_alpha: name(glow::BLEND_SRC_ALPHA),
            blend_dst_alpha: name(glow::BLEND_DST_ALPHA),
            blend_enabled: gl.is_enabled(glow::BLEND),
        }
    }

    /// Write every captured value back into `gl`, whether or not it changed.
    pub fn restore<B: GraphicsBackend + ?Sized>(&self, gl: &B) {
        gl.use_program(self.program);
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture_2d(self.texture_2d);
        gl.active_texture(self.active_texture);
        // The array buffer binding is global state; the element buffer lives
        // in the vertex array, so rebind the vertex array first.
        gl.bind_vertex_array(self.vertex_array);
        gl.bind_array_buffer(self.array_buffer);
        gl.blend_func_separate(
            self.blend_src_rgb,
            self.blend_dst_rgb,
            self.blend_src_alpha,
            self.blend_dst_alpha,
        );
        gl.set_enabled(glow::BLEND, self.blend_enabled);
    }
}
