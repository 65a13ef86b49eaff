//! Image export: PNG (always), JPEG/TIFF behind their cargo features.

use super::PixelImage;
use crate::error::{PixelError, PixelResult};

/// Encodes the normalized view of `image` as a PNG, preserving alpha.
pub fn png(image: &PixelImage) -> PixelResult<Vec<u8>> {
    let normalized = image.normalized();
    let (width, height) = (normalized.width(), normalized.height());
    let raw = normalized.raw();

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(|_| PixelError::InvalidSize)?;
        writer.write_image_data(&raw).map_err(|_| PixelError::InvalidSize)?;
    }
    Ok(out)
}

/// Encodes the normalized view of `image` as a JPEG at `quality` (`0.0..=1.0`).
#[cfg(feature = "jpeg")]
pub fn jpeg(image: &PixelImage, quality: f32) -> PixelResult<Vec<u8>> {
    use image::codecs::jpeg::JpegEncoder;
    use image::{ColorType, ImageEncoder};

    if !(0.0..=1.0).contains(&quality) {
        return Err(PixelError::InvalidSize);
    }

    let normalized = image.normalized();
    let (width, height) = (normalized.width(), normalized.height());
    let raw = normalized.raw();

    let mut out = Vec::new();
    let jpeg_quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality);
    encoder
        .write_image(&raw, width, height, ColorType::Rgba8.into())
        .map_err(|_| PixelError::InvalidSize)?;
    Ok(out)
}

/// Encodes the normalized view of `image` as a TIFF.
#[cfg(feature = "tiff")]
pub fn tiff(image: &PixelImage) -> PixelResult<Vec<u8>> {
    use image::codecs::tiff::TiffEncoder;
    use image::{ColorType, ImageEncoder};

    let normalized = image.normalized();
    let (width, height) = (normalized.width(), normalized.height());
    let raw = normalized.raw();

    let mut out = Vec::new();
    let encoder = TiffEncoder::new(&mut out);
    encoder
        .write_image(&raw, width, height, ColorType::Rgba8.into())
        .map_err(|_| PixelError::InvalidSize)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_through_the_png_crate_header() {
        let img = PixelImage::new(2, 2).unwrap();
        let bytes = png(&img).unwrap();
        assert_eq!(&bytes[0..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
