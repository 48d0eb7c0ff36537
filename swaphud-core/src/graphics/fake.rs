// Recording GraphicsBackend for tests.
//
// Models the binding state of a single GL context closely enough to check
// that overlay work leaves it untouched, and records every draw call.
use super::backend::{GraphicsBackend, QuadBuffer};
use crate::error::{BootstrapError, ShaderStage};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

/// Observable binding state of the fake context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeGlState {
    pub program: u32,
    pub active_unit: u32,
    pub unit_textures: BTreeMap<u32, u32>,
    pub vertex_array: u32,
    pub array_buffer: u32,
    pub blend: [u32; 4],
    pub enabled: BTreeSet<u32>,
}

impl Default for FakeGlState {
    fn default() -> Self {
        Self {
            program: 0,
            active_unit: 0,
            unit_textures: BTreeMap::new(),
            vertex_array: 0,
            array_buffer: 0,
            blend: [glow::ONE, glow::ZERO, glow::ONE, glow::ZERO],
            enabled: BTreeSet::new(),
        }
    }
}

impl FakeGlState {
    fn texture_on(&self, unit: u32) -> u32 {
        self.unit_textures.get(&unit).copied().unwrap_or(0)
    }
}

/// One `draw_triangles` call and the state it ran under.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub state: FakeGlState,
    pub count: i32,
    /// Contents of the last upload, as `(x, y, u, v)` vertices.
    pub vertices: Vec<[f32; 4]>,
}

#[derive(Default)]
struct Inner {
    state: RefCell<FakeGlState>,
    next_name: Cell<u32>,
    viewport: Cell<(u32, u32)>,
    fail_compile: Cell<Option<ShaderStage>>,
    fail_link: Cell<bool>,
    textures: RefCell<Vec<(u32, u32, usize)>>,
    uniform_names: RefCell<Vec<String>>,
    uniforms: RefCell<HashMap<u32, Vec<f32>>>,
    last_upload: RefCell<Vec<u8>>,
    draws: RefCell<Vec<DrawRecord>>,
}

/// Cloning shares the same fake context.
#[derive(Clone)]
pub struct FakeBackend {
    inner: Rc<Inner>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let inner = Inner::default();
        inner.next_name.set(1000);
        inner.viewport.set((800, 600));
        Self {
            inner: Rc::new(inner),
        }
    }

    pub fn with_viewport(width: u32, height: u32) -> Self {
        let gl = Self::new();
        gl.inner.viewport.set((width, height));
        gl
    }

    pub fn fail_compile(&self, stage: ShaderStage) {
        self.inner.fail_compile.set(Some(stage));
    }

    pub fn fail_link(&self) {
        self.inner.fail_link.set(true);
    }

    pub fn snapshot(&self) -> FakeGlState {
        self.inner.state.borrow().clone()
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.inner.draws.borrow().clone()
    }

    pub fn textures(&self) -> Vec<(u32, u32, usize)> {
        self.inner.textures.borrow().clone()
    }

    pub fn uniform(&self, name: &str) -> Option<Vec<f32>> {
        let position = self
            .inner
            .uniform_names
            .borrow()
            .iter()
            .position(|n| n == name)?;
        self.inner
            .uniforms
            .borrow()
            .get(&(position as u32 + 1))
            .cloned()
    }

    fn allocate(&self) -> u32 {
        let name = self.inner.next_name.get();
        self.inner.next_name.set(name + 1);
        name
    }

    fn with_state(&self, f: impl FnOnce(&mut FakeGlState)) {
        f(&mut self.inner.state.borrow_mut());
    }
}

impl GraphicsBackend for FakeBackend {
    fn get_integer(&self, parameter: u32) -> i32 {
        let state = self.inner.state.borrow();
        let value = match parameter {
            glow::CURRENT_PROGRAM => state.program,
            glow::ACTIVE_TEXTURE => glow::TEXTURE0 + state.active_unit,
            glow::TEXTURE_BINDING_2D => state.texture_on(state.active_unit),
            glow::VERTEX_ARRAY_BINDING => state.vertex_array,
            glow::ARRAY_BUFFER_BINDING => state.array_buffer,
            glow::BLEND_SRC_RGB => state.blend[0],
            glow::BLEND_DST_RGB => state.blend[1],
            glow::BLEND_SRC_ALPHA => state.blend[2],
            glow::BLEND_DST_ALPHA => state.blend[3],
            _ => 0,
        };
        value as i32
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.inner.viewport.get()
    }

    fn is_enabled(&self, capability: u32) -> bool {
        self.inner.state.borrow().enabled.contains(&capability)
    }

    fn set_enabled(&self, capability: u32, enabled: bool) {
        self.with_state(|s| {
            if enabled {
                s.enabled.insert(capability);
            } else {
                s.enabled.remove(&capability);
            }
        });
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        self.with_state(|s| s.blend = [src_rgb, dst_rgb, src_alpha, dst_alpha]);
    }

    fn active_texture(&self, unit: u32) {
        self.with_state(|s| s.active_unit = unit - glow::TEXTURE0);
    }

    fn use_program(&self, program: u32) {
        self.with_state(|s| s.program = program);
    }

    fn bind_texture_2d(&self, texture: u32) {
        self.with_state(|s| {
            if texture == 0 {
                s.unit_textures.remove(&s.active_unit);
            } else {
                s.unit_textures.insert(s.active_unit, texture);
            }
        });
    }

    fn bind_vertex_array(&self, vertex_array: u32) {
        self.with_state(|s| s.vertex_array = vertex_array);
    }

    fn bind_array_buffer(&self, buffer: u32) {
        self.with_state(|s| s.array_buffer = buffer);
    }

    fn create_coverage_texture(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<u32, BootstrapError> {
        let name = self.allocate();
        self.bind_texture_2d(name);
        self.inner
            .textures
            .borrow_mut()
            .push((width, height, pixels.len()));
        Ok(name)
    }

    fn compile_shader(&self, stage: ShaderStage, _source: &str) -> Result<u32, BootstrapError> {
        if self.inner.fail_compile.get() == Some(stage) {
            return Err(BootstrapError::ShaderCompile {
                stage,
                log: "0:1(1): error: scripted failure".to_string(),
            });
        }
        Ok(self.allocate())
    }

    fn link_program(&self, _vertex: u32, _fragment: u32) -> Result<u32, BootstrapError> {
        if self.inner.fail_link.get() {
            return Err(BootstrapError::ProgramLink {
                log: "scripted failure".to_string(),
            });
        }
        Ok(self.allocate())
    }

    fn create_quad_buffer(
        &self,
        _capacity: usize,
        _stride: i32,
    ) -> Result<QuadBuffer, BootstrapError> {
        let quad = QuadBuffer {
            vertex_array: self.allocate(),
            buffer: self.allocate(),
        };
        self.bind_vertex_array(quad.vertex_array);
        self.bind_array_buffer(quad.buffer);
        Ok(quad)
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<u32> {
        let mut names = self.inner.uniform_names.borrow_mut();
        let index = match names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                names.push(name.to_string());
                names.len() - 1
            }
        };
        Some(index as u32 + 1)
    }

    fn uniform_mat4(&self, location: u32, matrix: &[f32; 16]) {
        self.inner
            .uniforms
            .borrow_mut()
            .insert(location, matrix.to_vec());
    }

    fn uniform_vec3(&self, location: u32, value: [f32; 3]) {
        self.inner
            .uniforms
            .borrow_mut()
            .insert(location, value.to_vec());
    }

    fn uniform_int(&self, location: u32, value: i32) {
        self.inner
            .uniforms
            .borrow_mut()
            .insert(location, vec![value as f32]);
    }

    fn upload_array_buffer(&self, _offset: i32, data: &[u8]) {
        *self.inner.last_upload.borrow_mut() = data.to_vec();
    }

    fn draw_triangles(&self, _first: i32, count: i32) {
        let vertices = self
            .inner
            .last_upload
            .borrow()
            .chunks_exact(16)
            .map(bytemuck::pod_read_unaligned::<[f32; 4]>)
            .collect();
        let record = DrawRecord {
            state: self.snapshot(),
            count,
            vertices,
        };
        self.inner.draws.borrow_mut().push(record);
    }
}
