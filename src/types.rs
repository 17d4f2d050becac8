//! Core types: errors, fractions, color enums, content light level info.

use thiserror::Error;

/// Errors that can occur during gain map operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An input value is out of range or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Gain map metadata is invalid or malformed.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Base and alternate images have different dimensions.
    #[error("dimension mismatch: base is {base_w}x{base_h}, alternate is {alt_w}x{alt_h}")]
    DimensionMismatch {
        /// Base image width.
        base_w: u32,
        /// Base image height.
        base_h: u32,
        /// Alternate image width.
        alt_w: u32,
        /// Alternate image height.
        alt_h: u32,
    },

    /// No conversion matrix is available between these primaries.
    #[error("unsupported color conversion: {0:?} to {1:?}")]
    UnsupportedConversion(ColorPrimaries, ColorPrimaries),

    /// The pixel layout is not supported for this operation.
    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),

    /// Tone mapping images with ICC profiles is not supported.
    #[error("images with ICC profiles are not supported")]
    IccNotSupported,

    /// Allocation failed.
    #[error("allocation failed: requested {0} bytes")]
    OutOfMemory(usize),

    /// Input exceeds safety limits.
    #[error("input exceeds safety limit: {0}")]
    LimitExceeded(String),
}

/// Result type for gain map operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Allocate a zeroed `Vec`, reporting allocation failure instead of aborting.
pub(crate) fn try_vec<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory(len * core::mem::size_of::<T>()))?;
    v.resize(len, T::default());
    Ok(v)
}

/// RGB color primaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorPrimaries {
    /// Primaries not specified; math falls back to the base image's primaries.
    Unspecified,
    /// BT.709 / sRGB primaries
    #[default]
    Bt709,
    /// Display P3 primaries
    DisplayP3,
    /// BT.2020 / BT.2100 primaries (wide gamut for HDR)
    Bt2020,
}

/// Transfer characteristics (EOTF/OETF pairing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferCharacteristics {
    /// sRGB transfer function (gamma ~2.2)
    #[default]
    Srgb,
    /// Linear (gamma 1.0)
    Linear,
    /// Perceptual Quantizer (SMPTE ST 2084) - HDR
    Pq,
    /// Hybrid Log-Gamma (ITU-R BT.2100) - HDR
    Hlg,
}

/// YUV matrix coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixCoefficients {
    /// No matrix; planes carry G, B, R directly.
    Identity,
    /// BT.601 (legacy SD)
    Bt601,
    /// BT.709 (HD)
    #[default]
    Bt709,
    /// BT.2020 non-constant luminance (UHD/HDR)
    Bt2020Ncl,
}

/// YUV chroma subsampling layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YuvFormat {
    /// 4:4:4, no subsampling
    #[default]
    Yuv444,
    /// 4:2:2, chroma halved horizontally
    Yuv422,
    /// 4:2:0, chroma halved in both dimensions
    Yuv420,
    /// 4:0:0, single luma plane
    Yuv400,
}

impl YuvFormat {
    /// Chroma subsampling shift as (x, y). `None` for monochrome.
    pub fn chroma_shift(self) -> Option<(u32, u32)> {
        match self {
            Self::Yuv444 => Some((0, 0)),
            Self::Yuv422 => Some((1, 0)),
            Self::Yuv420 => Some((1, 1)),
            Self::Yuv400 => None,
        }
    }

    /// Number of planes carried by this layout.
    pub fn plane_count(self) -> u32 {
        match self {
            Self::Yuv400 => 1,
            _ => 3,
        }
    }
}

/// YUV sample range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YuvRange {
    /// Limited / video range (16..235 at 8 bits).
    Limited,
    /// Full range.
    #[default]
    Full,
}

/// Content light level information, in nits.
///
/// See ISO/IEC 23008-2 section D.3.35 for the exact value definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Clli {
    /// Maximum content light level (max single-pixel nits).
    pub max_cll: u16,
    /// Maximum picture average light level.
    pub max_pall: u16,
}

// ============================================================================
// Fractions
// ============================================================================

/// A rational number with the sign carried by the numerator.
///
/// Gain map metadata stores its log2-space values as fractions to preserve
/// precision without floating-point ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignedFraction {
    /// Numerator.
    pub n: i32,
    /// Denominator. Zero is invalid metadata; `to_f32` maps it to 0.
    pub d: u32,
}

/// A non-negative rational number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnsignedFraction {
    /// Numerator.
    pub n: u32,
    /// Denominator. Zero is invalid metadata; `to_f32` maps it to 0.
    pub d: u32,
}

/// Picks the largest denominator that keeps the rounded numerator within
/// `max_numerator`, maximizing precision. Returns `(numerator, denominator)`.
fn best_fraction(value: f64, max_numerator: f64) -> Option<(i64, u32)> {
    if !value.is_finite() {
        return None;
    }
    let magnitude = value.abs();
    if magnitude > max_numerator {
        return None;
    }
    if magnitude == 0.0 {
        return Some((0, 1));
    }
    let d = (max_numerator / magnitude).min(u32::MAX as f64).floor();
    let d = (d as u32).max(1);
    let n = (value * d as f64).round();
    if n.abs() > max_numerator {
        // Rounding pushed the numerator out of range; retry one step down.
        let d = d - 1;
        if d == 0 {
            return None;
        }
        return Some(((value * d as f64).round() as i64, d));
    }
    Some((n as i64, d))
}

impl SignedFraction {
    /// Create a new fraction.
    pub const fn new(n: i32, d: u32) -> Self {
        Self { n, d }
    }

    /// Best-effort conversion from a double. Fails for non-finite values and
    /// magnitudes that do not fit a 32-bit numerator.
    pub fn from_f64(value: f64) -> Option<Self> {
        let (n, d) = best_fraction(value, i32::MAX as f64)?;
        Some(Self { n: n as i32, d })
    }

    /// Fraction value as a float. A zero denominator yields 0.
    pub fn to_f32(self) -> f32 {
        if self.d == 0 {
            return 0.0;
        }
        self.n as f32 / self.d as f32
    }
}

impl UnsignedFraction {
    /// Create a new fraction.
    pub const fn new(n: u32, d: u32) -> Self {
        Self { n, d }
    }

    /// Best-effort conversion from a double. Fails for negative or non-finite
    /// values and magnitudes that do not fit a 32-bit numerator.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value < 0.0 {
            return None;
        }
        let (n, d) = best_fraction(value, u32::MAX as f64)?;
        Some(Self { n: n as u32, d })
    }

    /// Fraction value as a float. A zero denominator yields 0.
    pub fn to_f32(self) -> f32 {
        if self.d == 0 {
            return 0.0;
        }
        self.n as f32 / self.d as f32
    }
}
