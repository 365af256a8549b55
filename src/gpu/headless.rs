//=========================================================================
// Headless Device
//=========================================================================
//
// In-memory `GraphicsDevice` that allocates handles, tracks object
// lifetimes and records every call it receives.
//
// The recording double for the native device: tests attach it to observe
// exactly which calls resources and the frame loop make.
//
// Validation performed:
// - compile fails if the source has no `main` entry point
// - link fails unless one compiled vertex and one compiled fragment
//   shader are attached, or if a link failure was injected
// - draws of unknown vertex arrays are recorded but counted as ignored
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;

use log::trace;

//=== Internal Dependencies ===============================================

use super::device::{
    GraphicsDevice, Handle, PixelFormat, ShaderStage, TextureDesc, UniformLocation, UniformValue,
    VertexArrayDesc, NULL_HANDLE,
};

//=== DeviceCall ==========================================================

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateShader(ShaderStage, Handle),
    CompileShader(Handle),
    DeleteShader(Handle),
    CreateProgram(Handle),
    AttachShader { program: Handle, shader: Handle },
    DetachShader { program: Handle, shader: Handle },
    LinkProgram(Handle),
    UseProgram(Handle),
    DeleteProgram(Handle),
    UniformLocation { program: Handle, name: String },
    Uniform { location: UniformLocation, value: UniformValue },
    CreateTexture { texture: Handle, width: u32, height: u32, format: PixelFormat },
    BindTexture(Handle),
    DeleteTexture(Handle),
    CreateVertexArray { vertex_array: Handle, vertices: usize, indices: usize },
    DeleteVertexArray(Handle),
    /// Records the program and texture current at the time of the draw.
    DrawIndexed { vertex_array: Handle, program: Handle, texture: Handle },
    Clear([f32; 4]),
}

//=== Internal State ======================================================

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    compiled: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<Handle>,
    uniforms: HashMap<String, UniformLocation>,
}

#[derive(Debug, Default)]
struct DeviceState {
    next_handle: Handle,
    shaders: HashMap<Handle, ShaderObject>,
    programs: HashMap<Handle, ProgramObject>,
    textures: HashMap<Handle, (u32, u32, PixelFormat)>,
    vertex_arrays: HashMap<Handle, usize>,
    current_program: Handle,
    current_texture: Handle,
    link_failure: Option<String>,
    calls: Vec<DeviceCall>,
}

impl DeviceState {
    fn allocate(&mut self) -> Handle {
        self.next_handle += 1;
        self.next_handle
    }

    fn record(&mut self, call: DeviceCall) {
        trace!(target: "gpu", "{:?}", call);
        self.calls.push(call);
    }
}

//=== HeadlessDevice ======================================================

/// Graphics device without a GPU behind it.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    state: RefCell<DeviceState>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent link fail with `log`.
    pub fn with_link_failure(self, log: impl Into<String>) -> Self {
        self.state.borrow_mut().link_failure = Some(log.into());
        self
    }

    //--- Inspection -------------------------------------------------------

    /// Snapshot of every call received so far.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Forgets recorded calls; object state is kept.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    /// Draw calls received since the last clear of the call log.
    pub fn draws(&self) -> Vec<DeviceCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::DrawIndexed { .. }))
            .cloned()
            .collect()
    }

    /// Program currently in use ([`NULL_HANDLE`] if none).
    pub fn current_program(&self) -> Handle {
        self.state.borrow().current_program
    }

    /// Texture currently bound ([`NULL_HANDLE`] if none).
    pub fn current_texture(&self) -> Handle {
        self.state.borrow().current_texture
    }
}

//=== GraphicsDevice Implementation =======================================

impl GraphicsDevice for HeadlessDevice {
    //--- Shader Objects ---------------------------------------------------

    fn create_shader(&self, stage: ShaderStage) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.shaders.insert(handle, ShaderObject { stage, compiled: false });
        state.record(DeviceCall::CreateShader(stage, handle));
        handle
    }

    fn compile_shader(&self, shader: Handle, source: &str) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        state.record(DeviceCall::CompileShader(shader));

        let Some(object) = state.shaders.get_mut(&shader) else {
            return Err(format!("invalid shader handle {shader}"));
        };

        if !source.contains("main") {
            return Err(format!("0:1: error: {} shader has no entry point 'main'", object.stage));
        }

        object.compiled = true;
        Ok(())
    }

    fn delete_shader(&self, shader: Handle) {
        let mut state = self.state.borrow_mut();
        state.shaders.remove(&shader);
        state.record(DeviceCall::DeleteShader(shader));
    }

    //--- Program Objects --------------------------------------------------

    fn create_program(&self) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.programs.insert(handle, ProgramObject::default());
        state.record(DeviceCall::CreateProgram(handle));
        handle
    }

    fn attach_shader(&self, program: Handle, shader: Handle) {
        let mut state = self.state.borrow_mut();
        if let Some(object) = state.programs.get_mut(&program) {
            object.attached.push(shader);
        }
        state.record(DeviceCall::AttachShader { program, shader });
    }

    fn detach_shader(&self, program: Handle, shader: Handle) {
        let mut state = self.state.borrow_mut();
        if let Some(object) = state.programs.get_mut(&program) {
            object.attached.retain(|s| *s != shader);
        }
        state.record(DeviceCall::DetachShader { program, shader });
    }

    fn link_program(&self, program: Handle) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        state.record(DeviceCall::LinkProgram(program));

        if let Some(log) = &state.link_failure {
            return Err(log.clone());
        }

        let Some(object) = state.programs.get(&program) else {
            return Err(format!("invalid program handle {program}"));
        };

        let has_stage = |stage: ShaderStage| {
            object.attached.iter().any(|s| {
                state
                    .shaders
                    .get(s)
                    .is_some_and(|o| o.stage == stage && o.compiled)
            })
        };

        if !has_stage(ShaderStage::Vertex) || !has_stage(ShaderStage::Fragment) {
            return Err("error: program needs a compiled vertex and fragment shader".to_owned());
        }

        Ok(())
    }

    fn use_program(&self, program: Handle) {
        let mut state = self.state.borrow_mut();
        state.current_program = program;
        state.record(DeviceCall::UseProgram(program));
    }

    fn delete_program(&self, program: Handle) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current_program == program {
            state.current_program = NULL_HANDLE;
        }
        state.record(DeviceCall::DeleteProgram(program));
    }

    //--- Uniforms ---------------------------------------------------------

    fn uniform_location(&self, program: Handle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        state.record(DeviceCall::UniformLocation {
            program,
            name: name.to_owned(),
        });

        let object = state.programs.get_mut(&program)?;
        let next = UniformLocation(object.uniforms.len() as i32);
        Some(*object.uniforms.entry(name.to_owned()).or_insert(next))
    }

    fn upload_uniform(&self, location: UniformLocation, value: UniformValue) {
        self.state
            .borrow_mut()
            .record(DeviceCall::Uniform { location, value });
    }

    //--- Textures ---------------------------------------------------------

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state
            .textures
            .insert(handle, (desc.width, desc.height, desc.format));
        state.record(DeviceCall::CreateTexture {
            texture: handle,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        });
        handle
    }

    fn bind_texture(&self, texture: Handle) {
        let mut state = self.state.borrow_mut();
        state.current_texture = texture;
        state.record(DeviceCall::BindTexture(texture));
    }

    fn delete_texture(&self, texture: Handle) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        if state.current_texture == texture {
            state.current_texture = NULL_HANDLE;
        }
        state.record(DeviceCall::DeleteTexture(texture));
    }

    //--- Vertex Arrays ----------------------------------------------------

    fn create_vertex_array(&self, desc: &VertexArrayDesc<'_>) -> Handle {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.vertex_arrays.insert(handle, desc.indices.len());
        state.record(DeviceCall::CreateVertexArray {
            vertex_array: handle,
            vertices: desc.vertex_count(),
            indices: desc.indices.len(),
        });
        handle
    }

    fn delete_vertex_array(&self, vertex_array: Handle) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vertex_array);
        state.record(DeviceCall::DeleteVertexArray(vertex_array));
    }

    fn draw_indexed(&self, vertex_array: Handle) {
        let mut state = self.state.borrow_mut();
        if !state.vertex_arrays.contains_key(&vertex_array) {
            trace!(target: "gpu", "Draw of unknown vertex array {} ignored", vertex_array);
        }
        let (program, texture) = (state.current_program, state.current_texture);
        state.record(DeviceCall::DrawIndexed {
            vertex_array,
            program,
            texture,
        });
    }

    //--- Frame Buffer -----------------------------------------------------

    fn clear(&self, rgba: [f32; 4]) {
        self.state.borrow_mut().record(DeviceCall::Clear(rgba));
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn linked_program(device: &HeadlessDevice) -> Result<Handle, String> {
        let program = device.create_program();
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            let shader = device.create_shader(stage);
            device.compile_shader(shader, "void main() {}")?;
            device.attach_shader(program, shader);
        }
        device.link_program(program)?;
        Ok(program)
    }

    #[test]
    fn handles_are_nonzero_and_unique() {
        let device = HeadlessDevice::new();
        let a = device.create_program();
        let b = device.create_shader(ShaderStage::Vertex);
        assert_ne!(a, NULL_HANDLE);
        assert_ne!(a, b);
    }

    #[test]
    fn compile_requires_entry_point() {
        let device = HeadlessDevice::new();
        let shader = device.create_shader(ShaderStage::Fragment);
        let log = device.compile_shader(shader, "out vec4 color;").unwrap_err();
        assert!(log.contains("fragment"));
        assert!(device.compile_shader(shader, "void main() {}").is_ok());
    }

    #[test]
    fn link_requires_both_stages() {
        let device = HeadlessDevice::new();
        let program = device.create_program();
        let vertex = device.create_shader(ShaderStage::Vertex);
        device.compile_shader(vertex, "void main() {}").unwrap();
        device.attach_shader(program, vertex);
        assert!(device.link_program(program).is_err());

        assert!(linked_program(&device).is_ok());
    }

    #[test]
    fn injected_link_failure() {
        let device = HeadlessDevice::new().with_link_failure("boom");
        assert_eq!(linked_program(&device), Err("boom".to_owned()));
    }

    #[test]
    fn uniform_locations_are_stable_per_program() {
        let device = HeadlessDevice::new();
        let program = linked_program(&device).unwrap();
        let a = device.uniform_location(program, "uView");
        let b = device.uniform_location(program, "uProjection");
        assert_eq!(a, device.uniform_location(program, "uView"));
        assert_ne!(a, b);
        assert_eq!(device.uniform_location(999, "uView"), None);
    }

    #[test]
    fn tracks_bindings_and_lifetimes() {
        let device = HeadlessDevice::new();
        let texture = device.create_texture(&TextureDesc {
            width: 1,
            height: 1,
            format: PixelFormat::Rgba8,
            pixels: &[0, 0, 0, 255],
        });
        device.bind_texture(texture);
        assert_eq!(device.current_texture(), texture);
        assert_eq!(device.live_textures(), 1);

        device.delete_texture(texture);
        assert_eq!(device.current_texture(), NULL_HANDLE);
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn draws_capture_current_bindings() {
        let device = HeadlessDevice::new();
        let program = linked_program(&device).unwrap();
        let vertices = [0.0; 9];
        let vertex_array = device.create_vertex_array(&VertexArrayDesc {
            vertices: &vertices,
            indices: &[0, 1, 2],
            attributes: &[3],
        });
        assert_eq!(device.live_vertex_arrays(), 1);

        device.use_program(program);
        device.draw_indexed(vertex_array);

        assert_eq!(
            device.draws(),
            vec![DeviceCall::DrawIndexed { vertex_array, program, texture: NULL_HANDLE }]
        );

        device.delete_vertex_array(vertex_array);
        assert_eq!(device.live_vertex_arrays(), 0);
    }

    #[test]
    fn records_and_clears_calls() {
        let device = HeadlessDevice::new();
        device.clear([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(device.calls(), vec![DeviceCall::Clear([1.0, 0.0, 0.0, 1.0])]);
        assert_eq!(device.count(|c| matches!(c, DeviceCall::Clear(_))), 1);

        device.clear_calls();
        assert!(device.calls().is_empty());
    }
}
