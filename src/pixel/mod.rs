//! Oriented, 32-bit-per-pixel pixel image engine.
//!
//! `PixelImage` owns a contiguous RGBA32 buffer and a declared
//! [`Orientation`]. All the pixel-level accessors and transforms operate in
//! *oriented* coordinates — the way a user looking at the device in its
//! current orientation would address a pixel — and remap internally to
//! *storage* coordinates (the raw row-major buffer). See [`orientation`] for
//! the remapping rules and [`blend`] for alpha compositing.

mod blend;
mod orientation;
mod serialize;

use crate::error::{PixelError, PixelResult};

/// Orientation of the device relative to the stored buffer.
///
/// Ordinals are load-bearing: they match the wire representation used by the
/// capture pipeline and the original implementation's `JST_ORIENTATION` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    /// No change: oriented coordinates equal storage coordinates.
    HomeBottom = 0,
    /// Turned left, counter-clockwise 90 degrees.
    HomeRight = 1,
    /// Turned right, clockwise 90 degrees.
    HomeLeft = 2,
    /// Rotated 180 degrees.
    HomeTop = 3,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::HomeBottom
    }
}

/// A reflection axis for [`PixelImage::reflect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionAxis {
    /// Reflect left-right.
    X,
    /// Reflect top-bottom.
    Y,
    /// Reflect both axes (equivalent to a 180 degree rotation of pixel data).
    Both,
}

/// A single RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel.
    pub alpha: u8,
}

impl Pixel {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self { red: 0, green: 0, blue: 0, alpha: 0 };

    /// Packs this pixel into the 32-bit word used by the backing buffer.
    #[must_use]
    pub fn to_u32(self) -> u32 {
        u32::from_le_bytes([self.red, self.green, self.blue, self.alpha])
    }

    /// Unpacks a pixel from the 32-bit word used by the backing buffer.
    #[must_use]
    pub fn from_u32(word: u32) -> Self {
        let [red, green, blue, alpha] = word.to_le_bytes();
        Self { red, green, blue, alpha }
    }

    /// Formats this pixel as an uppercase `#RRGGBBAA` hex string.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.red, self.green, self.blue, self.alpha)
    }
}

/// An axis-aligned rectangle, in either oriented or storage coordinates
/// depending on the caller's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: i64,
    /// Y coordinate of the top-left corner.
    pub y: i64,
    /// Width in pixels.
    pub width: i64,
    /// Height in pixels.
    pub height: i64,
}

impl Rect {
    /// Constructs a rectangle from its top-left corner and size.
    #[must_use]
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self { x, y, width, height }
    }

    /// The exclusive right edge (`x + width`).
    #[must_use]
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    /// The exclusive bottom edge (`y + height`).
    #[must_use]
    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    /// Whether this rectangle is fully contained within `(0, 0, w, h)`.
    #[must_use]
    pub fn within_bounds(&self, w: i64, h: i64) -> bool {
        self.width > 0
            && self.height > 0
            && self.x >= 0
            && self.y >= 0
            && self.right() <= w
            && self.bottom() <= h
    }

    /// Whether `self` and `other` overlap.
    #[must_use]
    pub fn intersects(&self, other: Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    /// Whether `point` falls within this rectangle.
    #[must_use]
    pub fn contains_point(&self, x: i64, y: i64) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }
}

/// An owned, oriented 32-bit-per-pixel image buffer.
///
/// # Invariants
///
/// `aligned_width >= width`; the backing buffer holds exactly
/// `aligned_width * height` pixels; the image is *normalized* iff
/// `orientation == Orientation::HomeBottom && aligned_width == width`.
#[derive(Debug, Clone)]
pub struct PixelImage {
    width: u32,
    height: u32,
    aligned_width: u32,
    orientation: Orientation,
    pixels: Vec<u32>,
}

impl PixelImage {
    /// Creates a new, zeroed image of the given size with `aligned_width == width`.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if `width` or `height` is zero.
    pub fn new(width: u32, height: u32) -> PixelResult<Self> {
        Self::with_aligned_width(width, height, width)
    }

    /// Creates a new, zeroed image with an explicit row stride.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if `width` or `height` is zero, or
    /// if `aligned_width < width`.
    pub fn with_aligned_width(width: u32, height: u32, aligned_width: u32) -> PixelResult<Self> {
        if width == 0 || height == 0 || aligned_width < width {
            return Err(PixelError::InvalidSize);
        }
        let len = (aligned_width as usize) * (height as usize);
        Ok(Self { width, height, aligned_width, orientation: Orientation::HomeBottom, pixels: vec![0; len] })
    }

    /// Creates an image from an external RGBA8 bitmap (row-major, no padding).
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if `data.len() != width * height * 4`.
    pub fn from_bitmap(width: u32, height: u32, data: &[u8]) -> PixelResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(PixelError::InvalidSize);
        }
        let pixels = data
            .chunks_exact(4)
            .map(|c| Pixel { red: c[0], green: c[1], blue: c[2], alpha: c[3] }.to_u32())
            .collect();
        Ok(Self { width, height, aligned_width: width, orientation: Orientation::HomeBottom, pixels })
    }

    /// Wraps caller-owned pixel memory as a zero-copy view described by a
    /// stride (`aligned_width`), without validating or copying the contents.
    /// Used by the capture pipeline to wrap a surface's raw memory.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if the dimensions are invalid or
    /// `words.len() != aligned_width * height`.
    pub fn from_words(width: u32, height: u32, aligned_width: u32, words: Vec<u32>) -> PixelResult<Self> {
        if width == 0 || height == 0 || aligned_width < width {
            return Err(PixelError::InvalidSize);
        }
        if words.len() != (aligned_width as usize) * (height as usize) {
            return Err(PixelError::InvalidSize);
        }
        Ok(Self { width, height, aligned_width, orientation: Orientation::HomeBottom, pixels: words })
    }

    /// Storage width (not the oriented width).
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Storage height (not the oriented height).
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride, in pixels.
    #[must_use]
    pub fn aligned_width(&self) -> u32 {
        self.aligned_width
    }

    /// Current orientation.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Sets the orientation directly, without resampling or touching the buffer.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Applies a rotation on top of the current orientation (composing them),
    /// again without resampling — this only changes how oriented coordinates
    /// are interpreted.
    pub fn rotate(&mut self, applied: Orientation) {
        self.orientation = orientation::compose(self.orientation, applied);
    }

    /// The size as seen at the current orientation: `(width, height)` for
    /// `HomeBottom`/`HomeTop`, `(height, width)` for `HomeRight`/`HomeLeft`.
    #[must_use]
    pub fn oriented_size(&self) -> (u32, u32) {
        match self.orientation {
            Orientation::HomeBottom | Orientation::HomeTop => (self.width, self.height),
            Orientation::HomeRight | Orientation::HomeLeft => (self.height, self.width),
        }
    }

    /// The oriented bounds, as a rect at `(0, 0)`.
    #[must_use]
    pub fn oriented_bounds(&self) -> Rect {
        let (w, h) = self.oriented_size();
        Rect::new(0, 0, i64::from(w), i64::from(h))
    }

    /// `orientation == HomeBottom && aligned_width == width`.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.orientation == Orientation::HomeBottom && self.aligned_width == self.width
    }

    /// Whether `point` (in oriented coordinates) lies within the oriented bounds.
    #[must_use]
    pub fn contains_oriented_point(&self, x: i64, y: i64) -> bool {
        self.oriented_bounds().contains_point(x, y)
    }

    /// Whether `rect` (in oriented coordinates) intersects the oriented bounds.
    #[must_use]
    pub fn intersects_oriented_rect(&self, rect: Rect) -> bool {
        self.oriented_bounds().intersects(rect)
    }

    fn storage_index(&self, ox: i64, oy: i64) -> Option<usize> {
        let (ow, oh) = self.oriented_size();
        if ox < 0 || oy < 0 || ox >= i64::from(ow) || oy >= i64::from(oh) {
            return None;
        }
        let (sx, sy) = orientation::shift_xy(ox, oy, i64::from(self.width), i64::from(self.height), self.orientation);
        Some((sy as usize) * (self.aligned_width as usize) + (sx as usize))
    }

    /// Gets the color at an oriented point, without bounds checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure `(x, y)` lies within [`Self::oriented_bounds`].
    #[must_use]
    pub unsafe fn get_unchecked(&self, x: i64, y: i64) -> Pixel {
        let (sx, sy) = orientation::shift_xy(x, y, i64::from(self.width), i64::from(self.height), self.orientation);
        let idx = (sy as usize) * (self.aligned_width as usize) + (sx as usize);
        Pixel::from_u32(self.pixels[idx])
    }

    /// Gets the color at an oriented point. Returns [`Pixel::TRANSPARENT`] if
    /// out of bounds.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> Pixel {
        self.storage_index(x, y).map_or(Pixel::TRANSPARENT, |idx| Pixel::from_u32(self.pixels[idx]))
    }

    /// Gets the color at an oriented point, formatted as `#RRGGBBAA`.
    #[must_use]
    pub fn get_color_hex(&self, x: i64, y: i64) -> String {
        self.get(x, y).to_hex()
    }

    /// Sets the color at an oriented point, without bounds checking.
    ///
    /// # Safety
    ///
    /// The caller must ensure `(x, y)` lies within [`Self::oriented_bounds`].
    pub unsafe fn set_unchecked(&mut self, x: i64, y: i64, color: Pixel) {
        let (sx, sy) = orientation::shift_xy(x, y, i64::from(self.width), i64::from(self.height), self.orientation);
        let idx = (sy as usize) * (self.aligned_width as usize) + (sx as usize);
        self.pixels[idx] = color.to_u32();
    }

    /// Sets the color at an oriented point. No-op if out of bounds.
    pub fn set(&mut self, x: i64, y: i64, color: Pixel) {
        if let Some(idx) = self.storage_index(x, y) {
            self.pixels[idx] = color.to_u32();
        }
    }

    /// Alpha-blends `color` over the existing pixel at an oriented point.
    /// No-op if out of bounds. See [`blend::blend`] for the compositing formula.
    pub fn blend(&mut self, x: i64, y: i64, color: Pixel, front_alpha: Option<u8>, back_alpha: Option<u8>) {
        if let Some(idx) = self.storage_index(x, y) {
            let back = Pixel::from_u32(self.pixels[idx]);
            self.pixels[idx] = blend::blend(back, color, front_alpha, back_alpha).to_u32();
        }
    }

    /// Rewrites the backing buffer so that `orientation == HomeBottom` and
    /// `aligned_width == width`, leaving every oriented pixel bit-identical.
    pub fn normalize(&mut self) {
        if self.is_normalized() {
            return;
        }
        let (ow, oh) = self.oriented_size();
        let mut buf = vec![0u32; (ow as usize) * (oh as usize)];
        for oy in 0..i64::from(oh) {
            for ox in 0..i64::from(ow) {
                // SAFETY: (ox, oy) ranges over the oriented bounds.
                let p = unsafe { self.get_unchecked(ox, oy) };
                buf[(oy as usize) * (ow as usize) + (ox as usize)] = p.to_u32();
            }
        }
        self.width = ow;
        self.height = oh;
        self.aligned_width = ow;
        self.orientation = Orientation::HomeBottom;
        self.pixels = buf;
    }

    /// Returns a normalized copy of this image, leaving `self` unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Builds a new, normalized buffer by resampling `rect` (in oriented
    /// coordinates, pre-transform) from this image's oriented view.
    fn resample(&self, rect: Rect) -> Vec<u32> {
        let w = rect.width as usize;
        let h = rect.height as usize;
        let mut buf = vec![0u32; w * h];
        for dy in 0..h {
            for dx in 0..w {
                // SAFETY: callers only pass rects already validated against oriented bounds.
                let p = unsafe { self.get_unchecked(rect.x + dx as i64, rect.y + dy as i64) };
                buf[dy * w + dx] = p.to_u32();
            }
        }
        buf
    }

    /// Crops to `rect` (oriented coordinates). Leaves the image normalized
    /// and returns the number of bytes now owned by the image.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::OutOfBounds`] if `rect` is not fully contained
    /// in the oriented bounds. The image is left unchanged on failure.
    pub fn crop(&mut self, rect: Rect) -> PixelResult<usize> {
        let (ow, oh) = self.oriented_size();
        if !rect.within_bounds(i64::from(ow), i64::from(oh)) {
            return Err(PixelError::OutOfBounds);
        }
        let buf = self.resample(rect);
        let bytes = buf.len() * 4;
        self.width = rect.width as u32;
        self.height = rect.height as u32;
        self.aligned_width = self.width;
        self.orientation = Orientation::HomeBottom;
        self.pixels = buf;
        Ok(bytes)
    }

    /// Returns a cropped copy, leaving `self` unchanged.
    ///
    /// # Errors
    ///
    /// See [`Self::crop`].
    pub fn cropped(&self, rect: Rect) -> PixelResult<Self> {
        let mut copy = self.clone();
        copy.crop(rect)?;
        Ok(copy)
    }

    /// Crops to `rect`, which MUST be in storage coordinates and this image
    /// MUST already be normalized. Used when a caller already has a
    /// normalized buffer and wants to avoid the oriented remap entirely.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if `self` isn't normalized, or
    /// [`PixelError::OutOfBounds`] if `rect` doesn't fit.
    pub fn restricted(&self, rect: Rect) -> PixelResult<Self> {
        if !self.is_normalized() {
            return Err(PixelError::InvalidSize);
        }
        self.cropped(rect)
    }

    /// Resizes to `(width, height)` via nearest-neighbor resampling of the
    /// oriented view. Leaves the image normalized and returns the number of
    /// bytes now owned by the image.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if `width` or `height` is zero.
    pub fn resize(&mut self, width: u32, height: u32) -> PixelResult<usize> {
        if width == 0 || height == 0 {
            return Err(PixelError::InvalidSize);
        }
        let (ow, oh) = self.oriented_size();
        let mut buf = vec![0u32; (width as usize) * (height as usize)];
        for dy in 0..height {
            for dx in 0..width {
                let src_x = (u64::from(dx) * u64::from(ow) / u64::from(width)) as i64;
                let src_y = (u64::from(dy) * u64::from(oh) / u64::from(height)) as i64;
                // SAFETY: src_x < ow, src_y < oh by construction.
                let p = unsafe { self.get_unchecked(src_x.min(i64::from(ow) - 1), src_y.min(i64::from(oh) - 1)) };
                buf[(dy as usize) * (width as usize) + (dx as usize)] = p.to_u32();
            }
        }
        let bytes = buf.len() * 4;
        self.width = width;
        self.height = height;
        self.aligned_width = width;
        self.orientation = Orientation::HomeBottom;
        self.pixels = buf;
        Ok(bytes)
    }

    /// Returns a resized copy, leaving `self` unchanged.
    ///
    /// # Errors
    ///
    /// See [`Self::resize`].
    pub fn resized(&self, width: u32, height: u32) -> PixelResult<Self> {
        let mut copy = self.clone();
        copy.resize(width, height)?;
        Ok(copy)
    }

    /// Reflects the oriented view along `axis`. Leaves the image normalized
    /// and returns the number of bytes now owned by the image.
    ///
    /// # Errors
    ///
    /// Never fails for a valid image; kept fallible to mirror the other
    /// transforms and to leave room for future size validation.
    pub fn reflect(&mut self, axis: ReflectionAxis) -> PixelResult<usize> {
        let (ow, oh) = self.oriented_size();
        let mut buf = vec![0u32; (ow as usize) * (oh as usize)];
        for dy in 0..oh {
            for dx in 0..ow {
                let (sx, sy) = match axis {
                    ReflectionAxis::X => (ow - 1 - dx, dy),
                    ReflectionAxis::Y => (dx, oh - 1 - dy),
                    ReflectionAxis::Both => (ow - 1 - dx, oh - 1 - dy),
                };
                // SAFETY: sx < ow, sy < oh by construction.
                let p = unsafe { self.get_unchecked(i64::from(sx), i64::from(sy)) };
                buf[(dy as usize) * (ow as usize) + (dx as usize)] = p.to_u32();
            }
        }
        let bytes = buf.len() * 4;
        self.width = ow;
        self.height = oh;
        self.aligned_width = ow;
        self.orientation = Orientation::HomeBottom;
        self.pixels = buf;
        Ok(bytes)
    }

    /// Returns a reflected copy, leaving `self` unchanged.
    ///
    /// # Errors
    ///
    /// See [`Self::reflect`].
    pub fn reflected(&self, axis: ReflectionAxis) -> PixelResult<Self> {
        let mut copy = self.clone();
        copy.reflect(axis)?;
        Ok(copy)
    }

    /// The row-major RGBA8 bytes of the normalized view (`width * height * 4`
    /// bytes). Normalizes a copy first if `self` isn't already normalized.
    #[must_use]
    pub fn raw(&self) -> Vec<u8> {
        let normalized;
        let image = if self.is_normalized() {
            self
        } else {
            normalized = self.normalized();
            &normalized
        };
        let mut out = Vec::with_capacity(image.pixels.len() * 4);
        for &word in &image.pixels {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Encodes the normalized view as a PNG, preserving alpha.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if PNG encoding fails.
    pub fn png(&self) -> PixelResult<Vec<u8>> {
        serialize::png(self)
    }

    /// Encodes the normalized view as a JPEG at the given quality (`0.0..=1.0`).
    ///
    /// Requires the `jpeg` feature.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if `quality` is out of range or
    /// encoding fails.
    #[cfg(feature = "jpeg")]
    pub fn jpeg(&self, quality: f32) -> PixelResult<Vec<u8>> {
        serialize::jpeg(self, quality)
    }

    /// Encodes the normalized view as a TIFF. Requires the `tiff` feature.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::InvalidSize`] if encoding fails.
    #[cfg(feature = "tiff")]
    pub fn tiff(&self) -> PixelResult<Vec<u8>> {
        serialize::tiff(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_size() {
        assert!(matches!(PixelImage::new(0, 4), Err(PixelError::InvalidSize)));
        assert!(matches!(PixelImage::new(4, 0), Err(PixelError::InvalidSize)));
    }

    #[test]
    fn get_set_round_trip_every_oriented_point() {
        for o in [Orientation::HomeBottom, Orientation::HomeRight, Orientation::HomeLeft, Orientation::HomeTop] {
            let mut img = PixelImage::new(5, 3).unwrap();
            img.set_orientation(o);
            let (ow, oh) = img.oriented_size();
            for y in 0..i64::from(oh) {
                for x in 0..i64::from(ow) {
                    let c = Pixel { red: (x as u8).wrapping_mul(7), green: (y as u8).wrapping_mul(3), blue: 9, alpha: 200 };
                    img.set(x, y, c);
                    assert_eq!(img.get(x, y), c, "orientation {o:?} at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn out_of_range_get_is_zero_and_set_is_noop() {
        let mut img = PixelImage::new(2, 2).unwrap();
        assert_eq!(img.get(-1, 0), Pixel::TRANSPARENT);
        assert_eq!(img.get(2, 0), Pixel::TRANSPARENT);
        img.set(5, 5, Pixel { red: 1, green: 2, blue: 3, alpha: 4 });
        assert_eq!(img.raw(), vec![0u8; 2 * 2 * 4]);
    }

    #[test]
    fn normalize_preserves_oriented_pixels() {
        let mut img = PixelImage::new(4, 2).unwrap();
        img.set_orientation(Orientation::HomeRight);
        let (ow, oh) = img.oriented_size();
        let mut expected = vec![];
        for y in 0..i64::from(oh) {
            for x in 0..i64::from(ow) {
                let c = Pixel { red: (x * 10 + y) as u8, green: 1, blue: 2, alpha: 255 };
                img.set(x, y, c);
                expected.push((x, y, c));
            }
        }
        img.normalize();
        assert!(img.is_normalized());
        for (x, y, c) in expected {
            assert_eq!(img.get(x, y), c);
        }
    }

    #[test]
    fn crop_rejects_out_of_bounds_rect_and_leaves_image_unchanged() {
        let mut img = PixelImage::new(4, 4).unwrap();
        img.set(0, 0, Pixel { red: 9, green: 9, blue: 9, alpha: 9 });
        let before = img.raw();
        let err = img.crop(Rect::new(2, 2, 10, 10)).unwrap_err();
        assert!(matches!(err, PixelError::OutOfBounds));
        assert_eq!(img.raw(), before);
    }

    #[test]
    fn crop_keeps_pixel_values_in_new_local_coordinates() {
        let mut img = PixelImage::new(4, 4).unwrap();
        let c = Pixel { red: 42, green: 1, blue: 2, alpha: 255 };
        img.set(2, 2, c);
        img.crop(Rect::new(2, 2, 2, 2)).unwrap();
        assert!(img.is_normalized());
        assert_eq!(img.get(0, 0), c);
    }

    #[test]
    fn reflect_x_twice_is_identity() {
        let mut img = PixelImage::new(3, 2).unwrap();
        for y in 0..2i64 {
            for x in 0..3i64 {
                img.set(x, y, Pixel { red: x as u8, green: y as u8, blue: 0, alpha: 255 });
            }
        }
        let before = img.raw();
        img.reflect(ReflectionAxis::X).unwrap();
        img.reflect(ReflectionAxis::X).unwrap();
        assert_eq!(img.raw(), before);
    }

    #[test]
    fn resize_then_resize_back_preserves_size() {
        let img = PixelImage::new(10, 10).unwrap();
        let resized = img.resized(5, 5).unwrap();
        let back = resized.resized(10, 10).unwrap();
        assert_eq!((back.width(), back.height()), (10, 10));
    }

    #[test]
    fn resize_rejects_zero_size() {
        let mut img = PixelImage::new(4, 4).unwrap();
        assert!(matches!(img.resize(0, 4), Err(PixelError::InvalidSize)));
    }

    #[test]
    fn restricted_requires_normalized_source() {
        let mut img = PixelImage::new(4, 4).unwrap();
        img.set_orientation(Orientation::HomeRight);
        assert!(matches!(img.restricted(Rect::new(0, 0, 1, 1)), Err(PixelError::InvalidSize)));
        img.normalize();
        assert!(img.restricted(Rect::new(0, 0, 1, 1)).is_ok());
    }

    #[test]
    fn from_bitmap_rejects_mismatched_length() {
        let err = PixelImage::from_bitmap(2, 2, &[0u8; 3]).unwrap_err();
        assert!(matches!(err, PixelError::InvalidSize));
    }
}
