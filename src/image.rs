//! Image buffers: packed RGB(A) and planar YUV.

use crate::limits;
use crate::types::{
    Clli, ColorPrimaries, Error, MatrixCoefficients, Result, TransferCharacteristics, YuvFormat,
    YuvRange,
};

/// Channel layout of a packed RGB image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RgbFormat {
    /// Interleaved R, G, B.
    Rgb,
    /// Interleaved R, G, B, A.
    #[default]
    Rgba,
}

impl RgbFormat {
    /// Number of channels per pixel.
    pub fn channel_count(self) -> u32 {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// A packed interleaved RGB(A) image.
///
/// Integer samples are stored little-endian in `depth` bits (8, 10, 12 or 16;
/// depths above 8 occupy two bytes per sample). Float samples are IEEE half
/// (`depth == 16`) or single (`depth == 32`) precision, little-endian.
#[derive(Debug, Clone, Default)]
pub struct RgbImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Channel layout.
    pub format: RgbFormat,
    /// Bits per sample.
    pub depth: u32,
    /// Whether samples are floating point.
    pub is_float: bool,
    /// Row stride in bytes.
    pub row_bytes: u32,
    /// Pixel data.
    pub data: Vec<u8>,
}

fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidArgument(format!(
            "invalid image dimensions: {}x{}",
            width, height
        )));
    }
    if width > limits::MAX_IMAGE_DIMENSION || height > limits::MAX_IMAGE_DIMENSION {
        return Err(Error::LimitExceeded(format!(
            "dimension {} exceeds maximum {}",
            width.max(height),
            limits::MAX_IMAGE_DIMENSION
        )));
    }
    if width as u64 * height as u64 > limits::MAX_TOTAL_PIXELS {
        return Err(Error::LimitExceeded(format!(
            "total pixels {} exceeds maximum {}",
            width as u64 * height as u64,
            limits::MAX_TOTAL_PIXELS
        )));
    }
    Ok(())
}

impl RgbImage {
    /// Create an image with allocated (zeroed) pixels.
    pub fn new(width: u32, height: u32, format: RgbFormat, depth: u32, is_float: bool) -> Result<Self> {
        let mut img = Self {
            width,
            height,
            format,
            depth,
            is_float,
            row_bytes: 0,
            data: Vec::new(),
        };
        img.allocate_pixels(width, height)?;
        Ok(img)
    }

    /// Bytes occupied by one sample.
    pub fn bytes_per_sample(&self) -> u32 {
        if self.is_float {
            self.depth / 8
        } else if self.depth > 8 {
            2
        } else {
            1
        }
    }

    /// Bytes occupied by one pixel.
    pub fn pixel_bytes(&self) -> u32 {
        self.format.channel_count() * self.bytes_per_sample()
    }

    /// (Re)allocate the pixel buffer for the given dimensions, updating
    /// `width`, `height` and `row_bytes`. Format, depth and floatness are
    /// taken from the image as already configured.
    pub fn allocate_pixels(&mut self, width: u32, height: u32) -> Result<()> {
        validate_dimensions(width, height)?;
        match (self.is_float, self.depth) {
            (false, 8 | 10 | 12 | 16) | (true, 16 | 32) => {}
            (is_float, depth) => {
                return Err(Error::UnsupportedLayout(format!(
                    "depth {} (float: {}) is not supported",
                    depth, is_float
                )));
            }
        }
        self.width = width;
        self.height = height;
        self.row_bytes = width
            .checked_mul(self.pixel_bytes())
            .ok_or_else(|| Error::LimitExceeded("row stride overflow".into()))?;
        let size = self.row_bytes as usize * height as usize;
        self.data = crate::types::try_vec(size)?;
        Ok(())
    }

    #[inline]
    fn sample_offset(&self, x: u32, y: u32) -> usize {
        (y * self.row_bytes + x * self.pixel_bytes()) as usize
    }

    /// Read the pixel at `(x, y)` as RGBA floats normalized to `[0, 1]` for
    /// integer samples. Float samples are returned as stored. Images without
    /// an alpha channel report an alpha of 1.
    pub fn get_rgba(&self, x: u32, y: u32) -> [f32; 4] {
        let channels = self.format.channel_count() as usize;
        let base = self.sample_offset(x, y);
        let mut rgba = [0.0, 0.0, 0.0, 1.0];
        for (c, v) in rgba.iter_mut().enumerate().take(channels) {
            *v = self.get_sample(base, c);
        }
        rgba
    }

    #[inline]
    fn get_sample(&self, pixel_offset: usize, channel: usize) -> f32 {
        let bps = self.bytes_per_sample() as usize;
        let at = pixel_offset + channel * bps;
        match (self.is_float, self.depth) {
            (false, 8) => self.data[at] as f32 / 255.0,
            (false, depth) => {
                let raw = u16::from_le_bytes([self.data[at], self.data[at + 1]]);
                raw as f32 / ((1u32 << depth) - 1) as f32
            }
            (true, 16) => {
                let bits = u16::from_le_bytes([self.data[at], self.data[at + 1]]);
                half::f16::from_bits(bits).to_f32()
            }
            _ => f32::from_le_bytes([
                self.data[at],
                self.data[at + 1],
                self.data[at + 2],
                self.data[at + 3],
            ]),
        }
    }

    /// Write the pixel at `(x, y)` from RGBA floats. Integer samples are
    /// scaled from `[0, 1]` and clamped; float samples are stored as given.
    pub fn set_rgba(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        let channels = self.format.channel_count() as usize;
        let base = self.sample_offset(x, y);
        for (c, &v) in rgba.iter().enumerate().take(channels) {
            self.set_sample(base, c, v);
        }
    }

    #[inline]
    fn set_sample(&mut self, pixel_offset: usize, channel: usize, value: f32) {
        let bps = self.bytes_per_sample() as usize;
        let at = pixel_offset + channel * bps;
        match (self.is_float, self.depth) {
            (false, 8) => {
                self.data[at] = (value * 255.0).round().clamp(0.0, 255.0) as u8;
            }
            (false, depth) => {
                let max = ((1u32 << depth) - 1) as f32;
                let raw = (value * max).round().clamp(0.0, max) as u16;
                self.data[at..at + 2].copy_from_slice(&raw.to_le_bytes());
            }
            (true, 16) => {
                let bits = half::f16::from_f32(value).to_bits();
                self.data[at..at + 2].copy_from_slice(&bits.to_le_bytes());
            }
            _ => {
                self.data[at..at + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
    }

    /// Whether two images share the same pixel layout (format, depth,
    /// int/float), making their buffers byte-compatible per pixel.
    pub fn same_layout(&self, other: &RgbImage) -> bool {
        self.format == other.format && self.depth == other.depth && self.is_float == other.is_float
    }
}

// ============================================================================
// Planar YUV
// ============================================================================

/// A planar YUV image with up to three planes of u16 samples.
///
/// Samples occupy the low `depth` bits of each u16. Chroma planes are sized
/// according to [`YuvFormat`]; a 4:0:0 image carries only the Y plane.
#[derive(Debug, Clone)]
pub struct YuvImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Bits per sample (8..=16).
    pub depth: u32,
    /// Chroma layout.
    pub format: YuvFormat,
    /// Sample range.
    pub range: YuvRange,
    /// Matrix coefficients relating the planes to RGB.
    pub matrix: MatrixCoefficients,
    /// Color primaries of the image.
    pub primaries: ColorPrimaries,
    /// Transfer characteristics of the image.
    pub transfer: TransferCharacteristics,
    /// Raw ICC profile bytes; empty when absent.
    pub icc: Vec<u8>,
    /// Content light level information.
    pub clli: Clli,
    /// Y, U, V planes. Unused planes are empty.
    pub planes: [Vec<u16>; 3],
}

impl Default for YuvImage {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            depth: 8,
            format: YuvFormat::default(),
            range: YuvRange::default(),
            matrix: MatrixCoefficients::default(),
            primaries: ColorPrimaries::default(),
            transfer: TransferCharacteristics::default(),
            icc: Vec::new(),
            clli: Clli::default(),
            planes: [Vec::new(), Vec::new(), Vec::new()],
        }
    }
}

impl YuvImage {
    /// Dimensions of the given plane index under the current format.
    pub fn plane_dimensions(&self, plane: usize) -> (u32, u32) {
        if plane == 0 {
            return (self.width, self.height);
        }
        match self.format.chroma_shift() {
            Some((sx, sy)) => (
                (self.width + (1 << sx) - 1) >> sx,
                (self.height + (1 << sy) - 1) >> sy,
            ),
            None => (0, 0),
        }
    }

    /// Allocate (zeroed) planes for the current dimensions and format,
    /// replacing any existing planes.
    pub fn allocate_planes(&mut self) -> Result<()> {
        validate_dimensions(self.width, self.height)?;
        if !(8..=16).contains(&self.depth) {
            return Err(Error::UnsupportedLayout(format!(
                "YUV depth {} is not supported",
                self.depth
            )));
        }
        let plane_count = self.format.plane_count() as usize;
        for plane in 0..3 {
            if plane < plane_count {
                let (w, h) = self.plane_dimensions(plane);
                self.planes[plane] = crate::types::try_vec(w as usize * h as usize)?;
            } else {
                self.planes[plane] = Vec::new();
            }
        }
        Ok(())
    }

    /// Release all plane memory.
    pub fn free_planes(&mut self) {
        for plane in &mut self.planes {
            *plane = Vec::new();
        }
    }

    /// Whether the image has allocated planes.
    pub fn has_planes(&self) -> bool {
        !self.planes[0].is_empty()
    }

    /// Maximum sample value at the current depth.
    #[inline]
    pub fn max_sample(&self) -> f32 {
        ((1u32 << self.depth) - 1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_image_dimension_limits() {
        assert!(RgbImage::new(1920, 1080, RgbFormat::Rgba, 8, false).is_ok());
        assert!(RgbImage::new(0, 100, RgbFormat::Rgba, 8, false).is_err());
        assert!(RgbImage::new(100, 0, RgbFormat::Rgba, 8, false).is_err());
        assert!(RgbImage::new(100_000, 100, RgbFormat::Rgba, 8, false).is_err());
    }

    #[test]
    fn test_rgb_image_rejects_bad_depth() {
        assert!(RgbImage::new(4, 4, RgbFormat::Rgb, 9, false).is_err());
        assert!(RgbImage::new(4, 4, RgbFormat::Rgb, 32, false).is_err());
        assert!(RgbImage::new(4, 4, RgbFormat::Rgb, 8, true).is_err());
        assert!(RgbImage::new(4, 4, RgbFormat::Rgb, 16, true).is_ok());
    }

    #[test]
    fn test_rgba8_pixel_roundtrip() {
        let mut img = RgbImage::new(4, 4, RgbFormat::Rgba, 8, false).unwrap();
        img.set_rgba(2, 1, [0.5, 0.25, 1.0, 1.0]);
        let px = img.get_rgba(2, 1);
        assert!((px[0] - 0.5).abs() < 1.0 / 255.0);
        assert!((px[1] - 0.25).abs() < 1.0 / 255.0);
        assert_eq!(px[2], 1.0);
        assert_eq!(px[3], 1.0);
    }

    #[test]
    fn test_rgb_no_alpha_reports_opaque() {
        let img = RgbImage::new(2, 2, RgbFormat::Rgb, 8, false).unwrap();
        assert_eq!(img.get_rgba(0, 0)[3], 1.0);
    }

    #[test]
    fn test_rgb_high_depth_roundtrip() {
        let mut img = RgbImage::new(2, 2, RgbFormat::Rgb, 12, false).unwrap();
        img.set_rgba(1, 1, [0.7, 0.1, 0.9, 1.0]);
        let px = img.get_rgba(1, 1);
        assert!((px[0] - 0.7).abs() < 1.0 / 4095.0);
        assert!((px[1] - 0.1).abs() < 1.0 / 4095.0);
    }

    #[test]
    fn test_rgb_float_roundtrip() {
        let mut img = RgbImage::new(2, 2, RgbFormat::Rgba, 32, true).unwrap();
        img.set_rgba(0, 0, [1.5, -0.25, 0.0, 1.0]);
        let px = img.get_rgba(0, 0);
        assert_eq!(px[0], 1.5);
        assert_eq!(px[1], -0.25);

        let mut img16 = RgbImage::new(2, 2, RgbFormat::Rgb, 16, true).unwrap();
        img16.set_rgba(0, 0, [0.5, 2.0, 0.125, 1.0]);
        let px = img16.get_rgba(0, 0);
        assert_eq!(px[0], 0.5);
        assert_eq!(px[1], 2.0);
    }

    #[test]
    fn test_yuv_plane_dimensions() {
        let img = YuvImage {
            width: 5,
            height: 5,
            format: YuvFormat::Yuv420,
            ..Default::default()
        };
        assert_eq!(img.plane_dimensions(0), (5, 5));
        assert_eq!(img.plane_dimensions(1), (3, 3));

        let mono = YuvImage {
            width: 5,
            height: 5,
            format: YuvFormat::Yuv400,
            ..Default::default()
        };
        assert_eq!(mono.plane_dimensions(1), (0, 0));
    }

    #[test]
    fn test_yuv_allocate_and_free() {
        let mut img = YuvImage {
            width: 4,
            height: 4,
            depth: 10,
            format: YuvFormat::Yuv420,
            ..Default::default()
        };
        img.allocate_planes().unwrap();
        assert!(img.has_planes());
        assert_eq!(img.planes[0].len(), 16);
        assert_eq!(img.planes[1].len(), 4);
        img.free_planes();
        assert!(!img.has_planes());
    }
}
