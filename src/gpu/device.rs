//=========================================================================
// Graphics Device Interface
//=========================================================================
//
// The opaque graphics driver the engine talks to.
//
// The engine never depends on a concrete graphics API. Everything it needs
// from the driver is expressed here: shader and program objects, uniform
// uploads, 2D textures, indexed vertex arrays, draws and clearing the frame
// buffer. Handles are plain integers where 0 means "none" (binding 0
// unbinds).
//
// Implementations use `&self` receivers and manage their own interior
// state, so a single device can be shared by every resource through an
// `Rc`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

//=== Handles =============================================================

/// Native object handle. `0` is the null handle.
pub type Handle = u32;

/// The null handle: unallocated when stored, unbind when bound.
pub const NULL_HANDLE: Handle = 0;

/// Location of a uniform within a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

//=== ShaderStage =========================================================

/// Programmable pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

//=== PixelFormat =========================================================

/// Pixel layout of texture data handed to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 3 bytes per pixel.
    Rgb8,

    /// 4 bytes per pixel.
    Rgba8,
}

impl PixelFormat {
    /// Maps a decoder channel count to an uploadable format.
    ///
    /// Only 3 and 4 channels can be uploaded.
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            3 => Some(Self::Rgb8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

//=== TextureDesc =========================================================

/// Everything the device needs to allocate a 2D texture.
///
/// Textures are sampled with nearest filtering and repeat wrapping, without
/// mipmaps.
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: &'a [u8],
}

//=== VertexArrayDesc =====================================================

/// Interleaved `f32` vertex data plus `u32` indices, drawn as a triangle
/// list.
///
/// `attributes[i]` is the component count (1 to 4) of the attribute fed to
/// shader location `i`.
#[derive(Debug, Clone, Copy)]
pub struct VertexArrayDesc<'a> {
    pub vertices: &'a [f32],
    pub indices: &'a [u32],
    pub attributes: &'a [u32],
}

impl VertexArrayDesc<'_> {
    /// Floats per vertex.
    pub fn stride(&self) -> usize {
        self.attributes.iter().sum::<u32>() as usize
    }

    pub fn vertex_count(&self) -> usize {
        match self.stride() {
            0 => 0,
            stride => self.vertices.len() / stride,
        }
    }
}

//=== UniformValue ========================================================

/// A value uploadable to a shader uniform.
///
/// Booleans are uploaded as integers (`true` → 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    UInt(u32),
    UVec2(UVec2),
    UVec3(UVec3),
    UVec4(UVec4),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

macro_rules! uniform_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

uniform_from! {
    i32 => Int, IVec2 => IVec2, IVec3 => IVec3, IVec4 => IVec4,
    u32 => UInt, UVec2 => UVec2, UVec3 => UVec3, UVec4 => UVec4,
    f32 => Float, Vec2 => Vec2, Vec3 => Vec3, Vec4 => Vec4,
    Mat2 => Mat2, Mat3 => Mat3, Mat4 => Mat4,
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Int(i32::from(value))
    }
}

impl From<[bool; 2]> for UniformValue {
    fn from([x, y]: [bool; 2]) -> Self {
        Self::IVec2(IVec2::new(x.into(), y.into()))
    }
}

impl From<[bool; 3]> for UniformValue {
    fn from([x, y, z]: [bool; 3]) -> Self {
        Self::IVec3(IVec3::new(x.into(), y.into(), z.into()))
    }
}

impl From<[bool; 4]> for UniformValue {
    fn from([x, y, z, w]: [bool; 4]) -> Self {
        Self::IVec4(IVec4::new(x.into(), y.into(), z.into(), w.into()))
    }
}

//=== GraphicsDevice ======================================================

/// Opaque graphics driver.
///
/// Compile and link report failures with the driver's info log. All other
/// calls are fire-and-forget, the way immediate-mode graphics APIs work.
pub trait GraphicsDevice {
    //--- Shader Objects ---------------------------------------------------

    fn create_shader(&self, stage: ShaderStage) -> Handle;

    /// Compiles `source` into `shader`. `Err` carries the info log.
    fn compile_shader(&self, shader: Handle, source: &str) -> Result<(), String>;

    fn delete_shader(&self, shader: Handle);

    //--- Program Objects --------------------------------------------------

    fn create_program(&self) -> Handle;

    fn attach_shader(&self, program: Handle, shader: Handle);

    fn detach_shader(&self, program: Handle, shader: Handle);

    /// Links `program`. `Err` carries the info log.
    fn link_program(&self, program: Handle) -> Result<(), String>;

    /// Makes `program` current. [`NULL_HANDLE`] unbinds.
    fn use_program(&self, program: Handle);

    fn delete_program(&self, program: Handle);

    //--- Uniforms ---------------------------------------------------------

    /// `None` if the program has no active uniform with that name.
    fn uniform_location(&self, program: Handle, name: &str) -> Option<UniformLocation>;

    /// Uploads to the currently used program.
    fn upload_uniform(&self, location: UniformLocation, value: UniformValue);

    //--- Textures ---------------------------------------------------------

    fn create_texture(&self, desc: &TextureDesc<'_>) -> Handle;

    /// Binds `texture` to the 2D target. [`NULL_HANDLE`] unbinds.
    fn bind_texture(&self, texture: Handle);

    fn delete_texture(&self, texture: Handle);

    //--- Vertex Arrays ----------------------------------------------------

    /// Uploads vertex and index data. The layout is fixed at creation.
    fn create_vertex_array(&self, desc: &VertexArrayDesc<'_>) -> Handle;

    fn delete_vertex_array(&self, vertex_array: Handle);

    /// Draws every index of `vertex_array` with the current program and
    /// texture.
    fn draw_indexed(&self, vertex_array: Handle);

    //--- Frame Buffer -----------------------------------------------------

    /// Clears the color buffer to `rgba`. Starts a new frame.
    fn clear(&self, rgba: [f32; 4]);
}

//=========================================================================
// Unit Tests
//=========================================================================
