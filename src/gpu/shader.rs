//=========================================================================
// Shader Program
//=========================================================================
//
// Linked vertex+fragment program with idempotent binding and uniform
// uploads.
//
// Construction:
//   parse (#type sections) → create program → compile each stage →
//   attach → link → detach + delete stage objects
//
// Any compile or link failure is logged with the driver's info log and
// leaves a zero-handle shader. Every object created along the way is
// detached and deleted first.
//
// Sources are GLSL 450. Uniforms other than textures live in one block at
// `set = 0, binding = 0`; a texture and its sampler at `set = 1`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::io::Read;

use glam::{Mat2, Mat3, Mat4};
use log::{debug, error, trace};

//=== Internal Dependencies ===============================================

use crate::core::Clock;
use crate::error::ResourceError;
use super::camera::Camera;
use super::device::{GraphicsDevice, Handle, ShaderStage, UniformValue, NULL_HANDLE};
use super::shader_source::ShaderSource;
use super::{DeviceLink, Gfx, GpuResource};

//=== Built-in Program ====================================================

const DEFAULT_VERTEX: &str = r#"
#version 450

layout(location = 0) in vec3 aPos;
layout(location = 1) in vec4 aColor;

layout(set = 0, binding = 0) uniform Globals {
    mat4  uProjection;
    mat4  uView;
    float uTime;
};

layout(location = 0) out vec4  fColor;
layout(location = 1) out float fTime;

void main()
{
    fColor = aColor;
    fTime  = uTime;
    gl_Position = uProjection * uView * vec4(aPos, 1.0);
}
"#;

const DEFAULT_FRAGMENT: &str = r#"
#version 450

layout(location = 0) in vec4  fColor;
layout(location = 1) in float fTime;

layout(location = 0) out vec4 color;

void main()
{
    float noise = fract(sin(dot(fColor.xy, vec2(12.9898, 78.233))) * 43758.5453);
    color = fColor * noise;
}
"#;

/// Uniform receiving engine time on every bind.
pub const TIME_UNIFORM: &str = "uTime";

/// Uniform receiving the camera projection matrix.
pub const PROJECTION_UNIFORM: &str = "uProjection";

/// Uniform receiving the camera view matrix.
pub const VIEW_UNIFORM: &str = "uView";

//=== Shader ==============================================================

/// A linked shader program.
pub struct Shader {
    link: DeviceLink,
    clock: Clock,
    program: Handle,
}

impl Shader {
    //--- Construction -----------------------------------------------------

    /// Builds a program from a combined `#type`-sectioned source.
    ///
    /// Format errors are returned whether or not a device is attached.
    /// Compile/link failures are logged and produce a zero-handle shader.
    pub fn new(gfx: &Gfx, source: &str) -> Result<Self, ResourceError> {
        let parsed = ShaderSource::parse(source)?;
        Ok(Self::from_source(gfx, &parsed))
    }

    /// Reads a combined source from `reader`, then behaves like [`Shader::new`].
    pub fn from_reader(gfx: &Gfx, mut reader: impl Read) -> Result<Self, ResourceError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::new(gfx, &text)
    }

    /// The engine's built-in colored-vertex program.
    pub fn default_program(gfx: &Gfx) -> Self {
        Self::from_source(gfx, &ShaderSource::new(DEFAULT_VERTEX, DEFAULT_FRAGMENT))
    }

    /// Builds a program from already separated stage sources.
    pub fn from_source(gfx: &Gfx, source: &ShaderSource) -> Self {
        let program = match gfx.session() {
            Some(session) => compile_program(session.device(), source).unwrap_or(NULL_HANDLE),
            None => {
                debug!(target: "gpu", "No device attached, shader left unallocated");
                NULL_HANDLE
            }
        };

        Self {
            link: gfx.link(),
            clock: gfx.clock(),
            program,
        }
    }

    //--- Binding ----------------------------------------------------------

    /// Binds the program and uploads the camera's projection and view.
    pub fn begin_with_camera(&mut self, camera: &Camera) {
        self.begin_with_matrices(camera.projection(), camera.view());
    }

    pub(crate) fn begin_with_matrices(&mut self, projection: Mat4, view: Mat4) {
        self.begin();
        self.upload_mat4(PROJECTION_UNIFORM, projection);
        self.upload_mat4(VIEW_UNIFORM, view);
    }

    //=====================================================================
    // Uniform Uploads
    //=====================================================================

    /// Binds the program, then uploads `value` to the uniform `name`.
    ///
    /// Unknown uniform names are skipped.
    pub fn upload(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.begin();

        if self.program == NULL_HANDLE {
            return;
        }
        let Some(session) = self.link.session() else {
            return;
        };

        let device = session.device();
        match device.uniform_location(self.program, name) {
            Some(location) => device.upload_uniform(location, value.into()),
            None => trace!(target: "gpu", "Uniform '{}' not active in program {}", name, self.program),
        }
    }

    pub fn upload_bool(&mut self, name: &str, value: bool) {
        self.upload(name, value);
    }

    pub fn upload_int(&mut self, name: &str, value: i32) {
        self.upload(name, value);
    }

    pub fn upload_uint(&mut self, name: &str, value: u32) {
        self.upload(name, value);
    }

    pub fn upload_float(&mut self, name: &str, value: f32) {
        self.upload(name, value);
    }

    pub fn upload_mat2(&mut self, name: &str, value: Mat2) {
        self.upload(name, value);
    }

    pub fn upload_mat3(&mut self, name: &str, value: Mat3) {
        self.upload(name, value);
    }

    pub fn upload_mat4(&mut self, name: &str, value: Mat4) {
        self.upload(name, value);
    }
}

//=== GpuResource Implementation ==========================================

impl GpuResource for Shader {
    fn handle(&self) -> Handle {
        self.program
    }

    fn begin(&mut self) {
        if self.program == NULL_HANDLE {
            return;
        }
        let Some(session) = self.link.session() else {
            return;
        };
        if session.current_program() == self.program {
            return;
        }

        session.use_program(self.program);
        self.upload_float(TIME_UNIFORM, self.clock.seconds());
    }

    fn end(&mut self) {
        if self.program == NULL_HANDLE {
            return;
        }
        if let Some(session) = self.link.session() {
            session.use_program(NULL_HANDLE);
        }
    }

    fn is_bound(&self) -> bool {
        self.program != NULL_HANDLE
            && self
                .link
                .session()
                .is_some_and(|session| session.current_program() == self.program)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        if self.program == NULL_HANDLE {
            return;
        }
        let Some(session) = self.link.session() else {
            return;
        };
        if session.current_program() == self.program {
            session.use_program(NULL_HANDLE);
        }
        session.device().delete_program(self.program);
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("program", &self.program)
            .field("bound", &self.is_bound())
            .finish()
    }
}

//=== Program Compilation =================================================

/// Compiles and links `source`. `None` after logging on any failure.
fn compile_program(device: &dyn GraphicsDevice, source: &ShaderSource) -> Option<Handle> {
    let program = device.create_program();
    let mut created = Vec::with_capacity(2);
    let mut attached = Vec::with_capacity(2);

    for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
        let shader = device.create_shader(stage);
        created.push(shader);

        if let Err(log) = device.compile_shader(shader, source.stage(stage)) {
            error!(
                target: "gpu",
                "'{}' shader compilation failed\n\t{}",
                stage,
                indent(&log)
            );
            discard(device, program, &created, &attached);
            return None;
        }

        device.attach_shader(program, shader);
        attached.push(shader);
    }

    if let Err(log) = device.link_program(program) {
        error!(target: "gpu", "shader program linking failed\n\t{}", indent(&log));
        discard(device, program, &created, &attached);
        return None;
    }

    // Stage objects are no longer needed once linked
    for shader in &attached {
        device.detach_shader(program, *shader);
    }
    for shader in &created {
        device.delete_shader(*shader);
    }

    debug!(target: "gpu", "Linked shader program {}", program);
    Some(program)
}

/// Releases every object created for a failed program.
fn discard(device: &dyn GraphicsDevice, program: Handle, created: &[Handle], attached: &[Handle]) {
    for shader in attached {
        device.detach_shader(program, *shader);
    }
    for shader in created {
        device.delete_shader(*shader);
    }
    device.delete_program(program);
}

fn indent(log: &str) -> String {
    log.trim_end().replace('\n', "\n\t")
}

//=========================================================================
// Unit Tests
//=========================================================================
