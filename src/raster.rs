//! Pixel-level work on rendered pages: color inversion and image encoding

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// Output formats for page images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(Error::General(format!("Unsupported image format: {}", other))),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Invert the RGB channels in place, leaving alpha untouched
pub fn invert_colors(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        pixel.0 = [255 - r, 255 - g, 255 - b, a];
    }
}

/// Composite an RGBA image over a white background
pub fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode an RGB image as JPEG at the given quality (1-100)
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

/// Encode a rendered page in the requested format
///
/// JPEG has no alpha channel, so the page is flattened onto white first.
/// WebP output is lossless and ignores `quality`.
pub fn encode_image(image: &RgbaImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    match format {
        ImageFormat::Png => {
            let mut buf = Vec::new();
            PngEncoder::new(Cursor::new(&mut buf)).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?;
            Ok(buf)
        }
        ImageFormat::Jpeg => encode_jpeg(&flatten_on_white(image), quality),
        ImageFormat::Webp => {
            let mut buf = Vec::new();
            WebPEncoder::new_lossless(Cursor::new(&mut buf)).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?;
            Ok(buf)
        }
    }
}
