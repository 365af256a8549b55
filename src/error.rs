//=========================================================================
// Error Types
//=========================================================================
//
// Error taxonomy:
// - EngineError: window/loop lifecycle (platform failures are fatal)
// - ShaderSourceError: malformed `#type`-sectioned shader text
// - ResourceError: construction-time failures of GPU resources
//
// Compile and link failures are NOT errors here: they are logged with the
// driver's info log and leave a zero-handle shader behind.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::platform_bridge::PlatformError;

//=== EngineError =========================================================

/// Window and frame-loop lifecycle errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The native windowing layer or surface could not be created.
    #[error("platform failure: {0}")]
    Platform(#[from] PlatformError),

    /// `init` was called on a window that was already initialized or freed.
    #[error("window has already been initialized")]
    AlreadyInitialized,

    /// The loop was started before `init` succeeded.
    #[error("window is not initialized")]
    NotInitialized,
}

//=== ShaderSourceError ===================================================

/// Format errors in a combined shader source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderSourceError {
    /// A `#type` marker named something other than `vertex` or `fragment`.
    #[error("unexpected token '{0}' after #type")]
    UnexpectedToken(String),

    /// The source did not contain exactly two `#type` markers.
    #[error("expected exactly 2 #type markers, found {0}")]
    MarkerCount(usize),

    /// Both markers named the same stage.
    #[error("duplicate '{0}' section")]
    DuplicateSection(String),

    /// Non-blank text appeared before the first marker.
    #[error("source text before the first #type marker")]
    UnmarkedPreamble,
}

//=== ResourceError =======================================================

/// Construction-time failures of shaders, textures and meshes.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("malformed shader source: {0}")]
    ShaderSource(#[from] ShaderSourceError),

    #[error("failed to read resource: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Texture upload supports 3 (RGB) and 4 (RGBA) channels only.
    #[error("unsupported texture channel count {0}")]
    UnsupportedChannels(u8),

    /// Pixel buffer is shorter than `width * height * channels`.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    PixelData { expected: usize, actual: usize },

    /// Every vertex attribute needs 1 to 4 float components.
    #[error("invalid vertex layout {0:?}")]
    VertexLayout(Vec<u32>),

    #[error("{len} vertex floats do not divide into a stride of {stride}")]
    VertexData { len: usize, stride: usize },

    #[error("index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_is_error_trait() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<EngineError>();
        assert_error::<ResourceError>();
        assert_error::<ShaderSourceError>();
    }

    #[test]
    fn display_formats() {
        assert_eq!(
            ShaderSourceError::UnexpectedToken("geometry".into()).to_string(),
            "unexpected token 'geometry' after #type"
        );
        assert_eq!(
            ResourceError::UnsupportedChannels(2).to_string(),
            "unsupported texture channel count 2"
        );
        assert_eq!(
            EngineError::from(PlatformError::NoSurface).to_string(),
            "platform failure: no surface has been created"
        );
    }

    #[test]
    fn shader_source_error_converts() {
        let err: ResourceError = ShaderSourceError::MarkerCount(1).into();
        assert!(matches!(err, ResourceError::ShaderSource(ShaderSourceError::MarkerCount(1))));
    }
}
