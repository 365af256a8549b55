//=========================================================================
// Texture
//=========================================================================
//
// 2D texture decoded by the image codec and uploaded once.
//
// Construction:
//   bytes → image::load_from_memory → flip vertically → DecodedImage
//         → channel check (3 = RGB, 4 = RGBA) → device.create_texture
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::Path;

use image::DynamicImage;
use log::debug;

//=== Internal Dependencies ===============================================

use crate::error::ResourceError;
use super::device::{Handle, PixelFormat, TextureDesc, NULL_HANDLE};
use super::{DeviceLink, Gfx, GpuResource};

//=== DecodedImage ========================================================

/// Raw pixels as returned by the image codec.
///
/// Channel semantics: 1 = grey, 2 = grey+alpha, 3 = RGB, 4 = RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl DecodedImage {
    /// Decodes an encoded image, flipped so row 0 is the bottom row.
    pub fn decode(bytes: &[u8]) -> Result<Self, ResourceError> {
        let image = image::load_from_memory(bytes)?.flipv();
        Ok(Self::from_dynamic(image))
    }

    fn from_dynamic(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let channels = image.color().channel_count();

        // Normalize to 8 bits per channel, keeping the channel count
        let pixels = match channels {
            4 => image.into_rgba8().into_raw(),
            3 => image.into_rgb8().into_raw(),
            2 => image.into_luma_alpha8().into_raw(),
            _ => image.into_luma8().into_raw(),
        };

        Self {
            pixels,
            width,
            height,
            channels,
        }
    }
}

//=== Texture =============================================================

/// An uploaded 2D texture.
pub struct Texture {
    link: DeviceLink,
    handle: Handle,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Texture {
    //--- Construction -----------------------------------------------------

    /// Decodes and uploads an image file.
    pub fn from_file(gfx: &Gfx, path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(gfx, &bytes)
    }

    /// Decodes and uploads an encoded image.
    pub fn from_bytes(gfx: &Gfx, bytes: &[u8]) -> Result<Self, ResourceError> {
        Self::from_image(gfx, DecodedImage::decode(bytes)?)
    }

    /// Uploads already decoded pixels.
    ///
    /// The channel count is validated even when no device is attached.
    /// Empty images yield a zero-handle texture.
    pub fn from_image(gfx: &Gfx, image: DecodedImage) -> Result<Self, ResourceError> {
        let format = PixelFormat::from_channels(image.channels)
            .ok_or(ResourceError::UnsupportedChannels(image.channels))?;

        let expected = image.width as usize * image.height as usize * format.bytes_per_pixel();
        if image.pixels.len() < expected {
            return Err(ResourceError::PixelData {
                expected,
                actual: image.pixels.len(),
            });
        }

        let handle = match gfx.session() {
            Some(_) if image.width == 0 || image.height == 0 => NULL_HANDLE,
            Some(session) => {
                let handle = session.device().create_texture(&TextureDesc {
                    width: image.width,
                    height: image.height,
                    format,
                    pixels: &image.pixels[..expected],
                });
                debug!(
                    target: "gpu",
                    "Uploaded texture {} ({}x{} {:?})",
                    handle, image.width, image.height, format
                );
                handle
            }
            None => NULL_HANDLE,
        };

        Ok(Self {
            link: gfx.link(),
            handle,
            width: image.width,
            height: image.height,
            format,
        })
    }

    //--- Accessors --------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

//=== GpuResource Implementation ==========================================

impl GpuResource for Texture {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn begin(&mut self) {
        if self.handle == NULL_HANDLE {
            return;
        }
        if let Some(session) = self.link.session() {
            if session.current_texture() != self.handle {
                session.bind_texture(self.handle);
            }
        }
    }

    fn end(&mut self) {
        if self.handle == NULL_HANDLE {
            return;
        }
        if let Some(session) = self.link.session() {
            session.bind_texture(NULL_HANDLE);
        }
    }

    fn is_bound(&self) -> bool {
        self.handle != NULL_HANDLE
            && self
                .link
                .session()
                .is_some_and(|session| session.current_texture() == self.handle)
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.handle == NULL_HANDLE {
            return;
        }
        let Some(session) = self.link.session() else {
            return;
        };
        if session.current_texture() == self.handle {
            session.bind_texture(NULL_HANDLE);
        }
        session.device().delete_texture(self.handle);
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle)
            .field("bound", &self.is_bound())
            .field("size", &(self.width, self.height))
            .field("format", &self.format)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Clock;
    use crate::gpu::{DeviceCall, HeadlessDevice};
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::rc::Rc;

    //--- Test Helpers -----------------------------------------------------

    fn attached() -> (Rc<HeadlessDevice>, Gfx) {
        let device = Rc::new(HeadlessDevice::new());
        let gfx = Gfx::attached(device.clone(), Clock::start());
        (device, gfx)
    }

    fn image(channels: u8) -> DecodedImage {
        DecodedImage {
            pixels: vec![0x7f; 2 * 2 * channels as usize],
            width: 2,
            height: 2,
            channels,
        }
    }

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    //=====================================================================
    // Channel Validation
    //=====================================================================

    #[test]
    fn rgb_and_rgba_are_accepted() {
        let (device, gfx) = attached();

        let rgb = Texture::from_image(&gfx, image(3)).unwrap();
        let rgba = Texture::from_image(&gfx, image(4)).unwrap();

        assert_eq!(rgb.format(), PixelFormat::Rgb8);
        assert_eq!(rgba.format(), PixelFormat::Rgba8);
        assert!(rgb.is_valid() && rgba.is_valid());
        assert_eq!(device.live_textures(), 2);
    }

    #[test]
    fn other_channel_counts_are_rejected() {
        let (device, gfx) = attached();
        for channels in [0, 1, 2, 5] {
            let err = Texture::from_image(&gfx, image(channels)).unwrap_err();
            assert!(
                matches!(err, ResourceError::UnsupportedChannels(c) if c == channels),
                "channel count {channels} should be rejected"
            );
        }
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn channels_validated_without_device() {
        let gfx = Gfx::detached(Clock::start());
        assert!(Texture::from_image(&gfx, image(1)).is_err());

        let texture = Texture::from_image(&gfx, image(4)).unwrap();
        assert!(!texture.is_valid());
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let (_device, gfx) = attached();
        let mut img = image(4);
        img.pixels.truncate(5);
        let err = Texture::from_image(&gfx, img).unwrap_err();
        assert!(matches!(err, ResourceError::PixelData { expected: 16, actual: 5 }));
    }

    #[test]
    fn empty_image_is_unallocated() {
        let (device, gfx) = attached();
        let texture = Texture::from_image(
            &gfx,
            DecodedImage { pixels: Vec::new(), width: 0, height: 0, channels: 4 },
        )
        .unwrap();
        assert!(!texture.is_valid());
        assert!(device.calls().is_empty());
    }

    //=====================================================================
    // Decoding
    //=====================================================================

    #[test]
    fn decodes_png_with_vertical_flip() {
        let mut rgba = RgbaImage::new(1, 2);
        rgba.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        rgba.put_pixel(0, 1, Rgba([0, 0, 255, 255]));

        let decoded = DecodedImage::decode(&encode_png(DynamicImage::ImageRgba8(rgba))).unwrap();
        assert_eq!(decoded.channels, 4);
        assert_eq!((decoded.width, decoded.height), (1, 2));
        assert_eq!(&decoded.pixels[..4], &[0, 0, 255, 255], "bottom row comes first");
    }

    #[test]
    fn from_bytes_uploads_rgb() {
        let (device, gfx) = attached();
        let png = encode_png(DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 1, Rgb([1, 2, 3]))));

        let texture = Texture::from_bytes(&gfx, &png).unwrap();
        assert_eq!((texture.width(), texture.height()), (3, 1));
        assert!(device.calls().contains(&DeviceCall::CreateTexture {
            texture: texture.handle(),
            width: 3,
            height: 1,
            format: PixelFormat::Rgb8,
        }));
    }

    #[test]
    fn grey_png_is_rejected() {
        let (_device, gfx) = attached();
        let png = encode_png(DynamicImage::ImageLuma8(image::GrayImage::new(2, 2)));
        let err = Texture::from_bytes(&gfx, &png).unwrap_err();
        assert!(matches!(err, ResourceError::UnsupportedChannels(1)));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let (_device, gfx) = attached();
        let err = Texture::from_bytes(&gfx, b"not an image").unwrap_err();
        assert!(matches!(err, ResourceError::Decode(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let (_device, gfx) = attached();
        let err = Texture::from_file(&gfx, "definitely/not/here.png").unwrap_err();
        assert!(matches!(err, ResourceError::Io(_)));
    }

    //=====================================================================
    // Bind Protocol
    //=====================================================================

    #[test]
    fn begin_is_idempotent() {
        let (device, gfx) = attached();
        let mut texture = Texture::from_image(&gfx, image(4)).unwrap();
        let handle = texture.handle();
        let binds = || device.count(|c| *c == DeviceCall::BindTexture(handle));

        texture.begin();
        texture.begin();
        assert_eq!(binds(), 1);

        texture.end();
        assert_eq!(device.current_texture(), NULL_HANDLE);
        assert!(!texture.is_bound());

        texture.begin();
        assert_eq!(binds(), 2);
    }

    #[test]
    fn binding_another_texture_takes_the_slot() {
        let (device, gfx) = attached();
        let mut a = Texture::from_image(&gfx, image(4)).unwrap();
        let mut b = Texture::from_image(&gfx, image(3)).unwrap();

        a.begin();
        b.begin();
        assert!(!a.is_bound());
        assert!(b.is_bound());

        device.clear_calls();
        a.begin();
        assert_eq!(device.calls(), vec![DeviceCall::BindTexture(a.handle())]);
        assert_eq!(device.current_texture(), a.handle());
    }

    #[test]
    fn drop_deletes_texture() {
        let (device, gfx) = attached();
        let texture = Texture::from_image(&gfx, image(3)).unwrap();
        drop(texture);
        assert_eq!(device.live_textures(), 0);
    }

    #[test]
    fn drop_while_bound_unbinds_first() {
        let (device, gfx) = attached();
        let mut texture = Texture::from_image(&gfx, image(4)).unwrap();
        let handle = texture.handle();
        texture.begin();
        device.clear_calls();

        drop(texture);
        assert_eq!(
            device.calls(),
            vec![DeviceCall::BindTexture(NULL_HANDLE), DeviceCall::DeleteTexture(handle)]
        );
        assert_eq!(device.current_texture(), NULL_HANDLE);
    }

    #[test]
    fn drop_leaves_another_binding_alone() {
        let (device, gfx) = attached();
        let a = Texture::from_image(&gfx, image(4)).unwrap();
        let mut b = Texture::from_image(&gfx, image(4)).unwrap();
        b.begin();
        let a_handle = a.handle();
        device.clear_calls();

        drop(a);
        assert_eq!(device.calls(), vec![DeviceCall::DeleteTexture(a_handle)]);
        assert!(b.is_bound());
    }

    #[test]
    fn detached_session_silences_texture() {
        let (device, gfx) = attached();
        let mut texture = Texture::from_image(&gfx, image(4)).unwrap();
        gfx.detach();
        device.clear_calls();

        texture.begin();
        assert!(!texture.is_bound());
        texture.end();
        drop(texture);

        assert!(device.calls().is_empty());
        assert_eq!(device.live_textures(), 1);
    }
}
