//=========================================================================
// Window Configuration
//=========================================================================
//
// Plain data handed to the surface backend at `Window::init` and read by
// the frame loop. Built through `WindowBuilder` (see `window.rs`).
//
//=========================================================================

//=== ClearColor ==========================================================

/// RGBA clear color, each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Whether every channel lies in `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        self.to_array().iter().all(|c| (0.0..=1.0).contains(c))
    }

    /// Clamps every channel into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self::rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for ClearColor {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::rgba(r, g, b, a)
    }
}

impl From<[f32; 3]> for ClearColor {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self::rgb(r, g, b)
    }
}

//=== WindowConfig ========================================================

/// Window parameters.
///
/// # Default Values
///
/// - **Title**: "Ember"
/// - **Size**: 1920 x 1080
/// - **Clear color**: white
/// - **VSync**: on
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: ClearColor,
    pub vsync: bool,
}

impl WindowConfig {
    pub const DEFAULT_TITLE: &'static str = "Ember";
    pub const DEFAULT_WIDTH: u32 = 1920;
    pub const DEFAULT_HEIGHT: u32 = 1080;
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_string(),
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            clear_color: ClearColor::default(),
            vsync: true,
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = WindowConfig::default();
        assert_eq!(config.title, "Ember");
        assert_eq!((config.width, config.height), (1920, 1080));
        assert_eq!(config.clear_color, ClearColor::WHITE);
        assert!(config.vsync);
    }

    #[test]
    fn clear_color_conversions() {
        assert_eq!(ClearColor::from([0.1, 0.2, 0.3]).a, 1.0);
        assert_eq!(
            ClearColor::from([0.1, 0.2, 0.3, 0.4]).to_array(),
            [0.1, 0.2, 0.3, 0.4]
        );
    }

    #[test]
    fn clear_color_normalization() {
        let color = ClearColor::rgba(1.5, -0.5, 0.5, 1.0);
        assert!(!color.is_normalized());

        let clamped = color.clamped();
        assert!(clamped.is_normalized());
        assert_eq!(clamped.to_array(), [1.0, 0.0, 0.5, 1.0]);
    }
}
