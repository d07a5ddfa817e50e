//! Image buffer wrapper for captured window pixels
//!
//! This module provides an `ImageBuffer` wrapper around `image::DynamicImage`.
//! Platform code fills it from raw device-independent bitmap rows; callers
//! inspect it, encode it, or save it to disk.
//!
//! # Examples
//!
//! ```
//! use window_snapshot::capture::ImageBuffer;
//!
//! let img = ImageBuffer::from_test_pattern(200, 150);
//! assert_eq!(img.dimensions(), (200, 150));
//!
//! let png = img.encode_png().unwrap();
//! assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
//! ```

use std::{io::Cursor, path::Path};

use image::GenericImageView;

use crate::error::{SnapshotError, SnapshotResult};

/// Wrapper around `image::DynamicImage` holding one captured snapshot
///
/// Each capture produces a fresh buffer that the caller owns exclusively.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    inner: image::DynamicImage,
}

impl ImageBuffer {
    /// Creates a new ImageBuffer from a DynamicImage
    ///
    /// # Examples
    ///
    /// ```
    /// use image::DynamicImage;
    /// use window_snapshot::capture::ImageBuffer;
    ///
    /// let dynamic = DynamicImage::new_rgb8(100, 100);
    /// let buffer = ImageBuffer::new(dynamic);
    /// ```
    pub fn new(image: image::DynamicImage) -> Self {
        Self { inner: image }
    }

    /// Builds an image from top-down 32-bit BGRA rows
    ///
    /// This is the layout `GetDIBits` produces for a `BI_RGB` 32bpp bitmap
    /// with a negative height. GDI leaves the alpha byte undefined (usually
    /// zero), so alpha is forced to opaque.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::ImageError`] if `bgra` does not hold exactly
    /// `width * height * 4` bytes.
    pub fn from_bgra(width: u32, height: u32, bgra: &[u8]) -> SnapshotResult<Self> {
        let expected = width as usize * height as usize * 4;
        if bgra.len() != expected {
            return Err(SnapshotError::ImageError(format!(
                "pixel buffer holds {} bytes, expected {} for {}x{}",
                bgra.len(),
                expected,
                width,
                height
            )));
        }

        let mut rgba = Vec::with_capacity(expected);
        for pixel in bgra.chunks_exact(4) {
            rgba.extend_from_slice(&[pixel[2], pixel[1], pixel[0], 255]);
        }

        image::RgbaImage::from_raw(width, height, rgba)
            .map(|img| Self::new(image::DynamicImage::ImageRgba8(img)))
            .ok_or_else(|| {
                SnapshotError::ImageError(format!("cannot build {}x{} image", width, height))
            })
    }

    /// Returns the dimensions of the image as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    /// Returns the image width in pixels
    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    /// Returns the image height in pixels
    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    /// Encodes the image as PNG
    pub fn encode_png(&self) -> SnapshotResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.inner
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Saves the image, picking the format from the file extension
    ///
    /// JPEG has no alpha channel, so the image is flattened to RGB first.
    pub fn save(&self, path: impl AsRef<Path>) -> SnapshotResult<()> {
        let path = path.as_ref();
        let format = image::ImageFormat::from_path(path)?;

        match format {
            image::ImageFormat::Jpeg => {
                image::DynamicImage::ImageRgb8(self.inner.to_rgb8()).save_with_format(path, format)?
            }
            _ => self.inner.save_with_format(path, format)?,
        }

        tracing::debug!("Saved {}x{} snapshot to {}", self.width(), self.height(), path.display());
        Ok(())
    }

    /// Creates a test pattern image with the specified dimensions
    ///
    /// Generates a vertical gradient from blue (top) to cyan (bottom). Used by
    /// the mock window system in place of real window pixels.
    pub fn from_test_pattern(width: u32, height: u32) -> Self {
        use image::{ImageBuffer as ImgBuf, Rgba};

        let start_color = Rgba([0u8, 0u8, 255u8, 255u8]);
        let end_color = Rgba([0u8, 255u8, 255u8, 255u8]);

        let img = ImgBuf::from_fn(width, height, |_x, y| {
            let ratio = y as f32 / height.max(1) as f32;
            Rgba([
                (start_color[0] as f32 * (1.0 - ratio) + end_color[0] as f32 * ratio) as u8,
                (start_color[1] as f32 * (1.0 - ratio) + end_color[1] as f32 * ratio) as u8,
                (start_color[2] as f32 * (1.0 - ratio) + end_color[2] as f32 * ratio) as u8,
                255,
            ])
        });

        Self::new(image::DynamicImage::ImageRgba8(img))
    }

    /// Consumes self and returns the inner DynamicImage for pixel access
    pub fn into_inner(self) -> image::DynamicImage {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_from_dynamic_image() {
        let dynamic = image::DynamicImage::new_rgb8(100, 100);
        let buffer = ImageBuffer::new(dynamic);
        assert_eq!(buffer.dimensions(), (100, 100));
    }

    #[test]
    fn test_from_bgra_swaps_channels_and_forces_alpha() {
        // Two pixels: pure blue then pure red, in BGRA with zero alpha
        let bgra = [255u8, 0, 0, 0, 0, 0, 255, 0];
        let img = ImageBuffer::from_bgra(2, 1, &bgra).unwrap();

        let rgba = img.into_inner().to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(rgba.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_from_bgra_rejects_wrong_length() {
        let result = ImageBuffer::from_bgra(4, 4, &[0u8; 10]);
        assert!(matches!(result, Err(SnapshotError::ImageError(_))));
    }

    #[test]
    fn test_from_test_pattern() {
        let img = ImageBuffer::from_test_pattern(100, 50);
        assert_eq!(img.dimensions(), (100, 50));
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);

        let non_zero = img.into_inner().as_bytes().iter().any(|&b| b != 0);
        assert!(non_zero, "Test pattern should contain non-zero pixels");
    }

    #[test]
    fn test_encode_png_signature() {
        let img = ImageBuffer::from_test_pattern(16, 16);
        let png = img.encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_save_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let img = ImageBuffer::from_test_pattern(32, 24);

        let png_path = dir.path().join("shot.png");
        img.save(&png_path).unwrap();
        let reloaded = image::open(&png_path).unwrap();
        assert_eq!(reloaded.dimensions(), (32, 24));

        let jpg_path = dir.path().join("shot.jpg");
        img.save(&jpg_path).unwrap();
        assert!(jpg_path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn test_save_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let img = ImageBuffer::from_test_pattern(8, 8);

        let result = img.save(dir.path().join("shot.unknown"));
        assert!(matches!(result, Err(SnapshotError::ImageError(_))));
    }

    #[test]
    fn test_into_inner() {
        let img = ImageBuffer::from_test_pattern(10, 10);
        let dynamic = img.into_inner();
        assert_eq!(dynamic.dimensions(), (10, 10));
    }
}
