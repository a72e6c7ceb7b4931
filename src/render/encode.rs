//! PNG, JPEG and GIF output of the result canvas.

use std::io::Write;

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, Frame, ImageEncoder};

use super::Renderer;
use crate::error::RenderError;

/// JPEG encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegOptions {
    /// 1..=100
    pub quality: u8,
}

impl Default for JpegOptions {
    fn default() -> Self {
        JpegOptions { quality: 75 }
    }
}

/// GIF encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifOptions {
    /// Palette quantisation speed, 1 (best palette) to 30 (fastest).
    pub speed: i32,
}

impl Default for GifOptions {
    fn default() -> Self {
        GifOptions { speed: 10 }
    }
}

impl Renderer<'_> {
    /// Encode the canvas as PNG.
    pub fn save_as_png<W: Write>(&self, w: W) -> Result<(), RenderError> {
        let img = self.result();
        PngEncoder::new(w).write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }

    /// Encode the canvas as JPEG. Alpha is dropped.
    pub fn save_as_jpeg<W: Write>(&self, w: W, options: &JpegOptions) -> Result<(), RenderError> {
        let rgb = DynamicImage::ImageRgba8(self.result().clone()).to_rgb8();
        let mut encoder = JpegEncoder::new_with_quality(w, options.quality.clamp(1, 100));
        encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
        Ok(())
    }

    /// Encode the canvas as a single-frame GIF.
    pub fn save_as_gif<W: Write>(&self, w: W, options: &GifOptions) -> Result<(), RenderError> {
        let mut encoder = GifEncoder::new_with_speed(w, options.speed.clamp(1, 30));
        encoder.encode_frame(Frame::new(self.result().clone()))?;
        Ok(())
    }
}
