//! Gain map tone mapping for HDR image interchange.
//!
//! A gain map is a companion image whose pixels encode a per-channel log2
//! ratio between a base rendition (typically SDR) and an alternate rendition
//! (typically HDR). This crate provides the two halves of the pipeline:
//!
//! - **Apply**: reconstruct an output image for an arbitrary display HDR
//!   headroom, blending continuously between the base and the alternate.
//! - **Compute**: synthesize a gain map and its metadata from a base and an
//!   alternate image.
//!
//! Container parsing and codec work are out of scope; inputs and outputs are
//! raw [`RgbImage`] / [`YuvImage`] buffers.
//!
//! # Example
//!
//! ```ignore
//! use gainmap_core::{
//!     apply_image, compute_image, ComputeConfig, GainMap,
//!     ColorPrimaries, TransferCharacteristics,
//! };
//!
//! // Compute a gain map from an SDR base and an HDR alternate.
//! let mut map = GainMap::default();
//! map.image.width = 1024;
//! map.image.height = 768;
//! map.image.depth = 8;
//! let config = ComputeConfig::with_headrooms(0.0, 3.0);
//! compute_image(&sdr, &hdr, &mut map, &config)?;
//!
//! // Reconstruct for a display with 2 stops of headroom.
//! let mut out = RgbImage { depth: 8, ..Default::default() };
//! apply_image(&sdr, &map, 2.0, ColorPrimaries::Bt709,
//!             TransferCharacteristics::Srgb, &mut out, None)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod color;
pub mod gainmap;
mod image;
mod types;

pub use gainmap::apply::{apply_image, apply_rgb, gainmap_weight};
pub use gainmap::compute::{choose_math_color_space, compute_image, compute_rgb, ComputeConfig};
pub use gainmap::range::find_min_max_without_outliers;
pub use gainmap::{GainMap, GainMapMetadata};
pub use image::{RgbFormat, RgbImage, YuvImage};
pub use types::{
    Clli, ColorPrimaries, Error, MatrixCoefficients, Result, SignedFraction,
    TransferCharacteristics, UnsignedFraction, YuvFormat, YuvRange,
};

/// Safety limits for allocation.
pub mod limits {
    /// Maximum image dimension (width or height).
    pub const MAX_IMAGE_DIMENSION: u32 = 65535;

    /// Maximum total pixels (width * height).
    pub const MAX_TOTAL_PIXELS: u64 = 500_000_000; // 500 megapixels
}
