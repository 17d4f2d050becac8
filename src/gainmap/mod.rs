//! Gain map representation, metadata and the tone-mapping engines.
//!
//! A gain map stores, per pixel and per channel, a gamma-encoded fraction of
//! the log2 ratio between an alternate (typically HDR) rendition and a base
//! (typically SDR) rendition. The metadata carries the log2-space range, the
//! encoding gamma, the offsets applied to both renditions, and the HDR
//! headrooms the two renditions were produced for.

pub mod apply;
pub mod compute;
pub mod range;

use crate::image::YuvImage;
use crate::types::{
    Clli, ColorPrimaries, Error, MatrixCoefficients, Result, SignedFraction,
    TransferCharacteristics, UnsignedFraction, YuvRange,
};

/// Gain map metadata, stored as exact rationals.
///
/// The stored min/max values are in log2 space and always encode the
/// HDR-over-SDR ratio, regardless of which rendition is the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GainMapMetadata {
    /// Per-channel log2-space minimum of the encoded values.
    pub gain_map_min: [SignedFraction; 3],
    /// Per-channel log2-space maximum of the encoded values.
    pub gain_map_max: [SignedFraction; 3],
    /// Per-channel encoding gamma. Decoding uses the reciprocal.
    pub gain_map_gamma: [UnsignedFraction; 3],
    /// Per-channel offset added to base values before taking the ratio.
    pub base_offset: [SignedFraction; 3],
    /// Per-channel offset added to alternate values before taking the ratio.
    pub alternate_offset: [SignedFraction; 3],
    /// HDR headroom of the base rendition (log2 of peak over SDR white).
    pub base_hdr_headroom: UnsignedFraction,
    /// HDR headroom of the alternate rendition.
    pub alternate_hdr_headroom: UnsignedFraction,
    /// Whether gain map math happens in the base image's color space.
    pub use_base_color_space: bool,
}

impl Default for GainMapMetadata {
    /// Encoding defaults: identity range, gamma 1, offsets 1/64, headrooms
    /// 0 and 1, base color space.
    fn default() -> Self {
        Self {
            gain_map_min: [SignedFraction::new(1, 1); 3],
            gain_map_max: [SignedFraction::new(1, 1); 3],
            gain_map_gamma: [UnsignedFraction::new(1, 1); 3],
            base_offset: [SignedFraction::new(1, 64); 3],
            alternate_offset: [SignedFraction::new(1, 64); 3],
            base_hdr_headroom: UnsignedFraction::new(0, 1),
            alternate_hdr_headroom: UnsignedFraction::new(1, 1),
            use_base_color_space: true,
        }
    }
}

impl GainMapMetadata {
    /// Validate the structural invariants of the metadata.
    ///
    /// Rejects zero denominators, a zero gamma numerator, and any channel
    /// whose max is below its min when compared as exact rationals.
    pub fn validate(&self) -> Result<()> {
        for c in 0..3 {
            if self.gain_map_min[c].d == 0
                || self.gain_map_max[c].d == 0
                || self.gain_map_gamma[c].d == 0
                || self.base_offset[c].d == 0
                || self.alternate_offset[c].d == 0
            {
                return Err(Error::InvalidMetadata(
                    "per-channel denominator is 0 in gain map metadata".into(),
                ));
            }
            // Cross-multiply in 64 bits; denominators are non-zero here.
            if (self.gain_map_max[c].n as i64) * (self.gain_map_min[c].d as i64)
                < (self.gain_map_min[c].n as i64) * (self.gain_map_max[c].d as i64)
            {
                return Err(Error::InvalidMetadata(
                    "per-channel max is less than per-channel min in gain map metadata".into(),
                ));
            }
            if self.gain_map_gamma[c].n == 0 {
                return Err(Error::InvalidMetadata(
                    "per-channel gamma is 0 in gain map metadata".into(),
                ));
            }
        }
        if self.base_hdr_headroom.d == 0 || self.alternate_hdr_headroom.d == 0 {
            return Err(Error::InvalidMetadata(
                "headroom denominator is 0 in gain map metadata".into(),
            ));
        }
        Ok(())
    }
}

/// A gain map: metadata, the encoded gain map image, and a description of
/// the alternate rendition it reproduces.
#[derive(Debug, Clone, Default)]
pub struct GainMap {
    /// The encoded gain map image. Its primaries and transfer are irrelevant
    /// to the math; only the sample values matter.
    pub image: YuvImage,
    /// Gain map metadata.
    pub metadata: GainMapMetadata,
    /// ICC profile of the alternate rendition; empty when absent.
    pub alt_icc: Vec<u8>,
    /// Color primaries of the alternate rendition.
    pub alt_color_primaries: ColorPrimaries,
    /// Transfer characteristics of the alternate rendition.
    pub alt_transfer_characteristics: TransferCharacteristics,
    /// Matrix coefficients of the alternate rendition.
    pub alt_matrix_coefficients: MatrixCoefficients,
    /// YUV range of the alternate rendition.
    pub alt_yuv_range: YuvRange,
    /// Bit depth of the alternate rendition.
    pub alt_depth: u32,
    /// Plane count of the alternate rendition.
    pub alt_plane_count: u32,
    /// Content light level of the alternate rendition.
    pub alt_clli: Clli,
}

impl GainMap {
    /// Whether two gain maps carry byte-identical tone-mapping metadata
    /// (headrooms and all per-channel fractions, compared as raw `(n, d)`
    /// pairs). Used by container writers to deduplicate records.
    pub fn same_metadata(&self, other: &GainMap) -> bool {
        self.metadata.base_hdr_headroom == other.metadata.base_hdr_headroom
            && self.metadata.alternate_hdr_headroom == other.metadata.alternate_hdr_headroom
            && self.metadata.gain_map_min == other.metadata.gain_map_min
            && self.metadata.gain_map_max == other.metadata.gain_map_max
            && self.metadata.gain_map_gamma == other.metadata.gain_map_gamma
            && self.metadata.base_offset == other.metadata.base_offset
            && self.metadata.alternate_offset == other.metadata.alternate_offset
    }

    /// Whether two gain maps describe byte-identical alternate renditions
    /// (ICC bytes, primaries, transfer, matrix, range, depth, plane count
    /// and content light level).
    pub fn same_alt_metadata(&self, other: &GainMap) -> bool {
        self.alt_icc == other.alt_icc
            && self.alt_color_primaries == other.alt_color_primaries
            && self.alt_transfer_characteristics == other.alt_transfer_characteristics
            && self.alt_matrix_coefficients == other.alt_matrix_coefficients
            && self.alt_yuv_range == other.alt_yuv_range
            && self.alt_depth == other.alt_depth
            && self.alt_plane_count == other.alt_plane_count
            && self.alt_clli == other.alt_clli
    }
}
