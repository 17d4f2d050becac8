//! Gain map computation from a base and an alternate rendition.

use crate::color::convert::{rgb_to_yuv, scale_image, yuv_to_rgb};
use crate::color::gamut::{luma_coefficients, rgb_to_rgb_matrix, Matrix3x3};
use crate::color::transfer::gamma_to_linear_function;
use crate::gainmap::range::find_min_max_without_outliers;
use crate::gainmap::{GainMap, GainMapMetadata};
use crate::image::{RgbFormat, RgbImage, YuvImage};
use crate::types::{
    try_vec, ColorPrimaries, Error, Result, SignedFraction, TransferCharacteristics,
    UnsignedFraction, YuvFormat,
};

/// Guard against log2 of zero or negative ratios.
const EPSILON: f32 = 1e-10;

/// Offsets above this cause visible artifacts when the gain map is applied
/// partially, so inflation is capped here (empirical value).
const MAX_OFFSET: f32 = 0.1;

/// Configuration for gain map computation.
///
/// The headrooms record what display capability each rendition was produced
/// for; they are written into the metadata verbatim. The defaults are the
/// unset sentinel `-1.0`: computing fails with an invalid-argument error
/// until both are set to finite non-negative values.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    /// HDR headroom of the base rendition (log2 of peak over SDR white).
    pub base_hdr_headroom: f64,
    /// HDR headroom of the alternate rendition.
    pub alternate_hdr_headroom: f64,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            base_hdr_headroom: -1.0,
            alternate_hdr_headroom: -1.0,
        }
    }
}

impl ComputeConfig {
    /// Config with both headrooms set.
    pub fn with_headrooms(base_hdr_headroom: f64, alternate_hdr_headroom: f64) -> Self {
        Self {
            base_hdr_headroom,
            alternate_hdr_headroom,
        }
    }
}

/// Decide which of the two primary sets gain map math should happen in.
///
/// A pixel outside the math color space converts to negative channel values,
/// which must be offset before the log2 — and large offsets cause artifacts
/// under partial application. Converting pure red, green and blue in both
/// directions, the primaries whose conversion stays least negative (the
/// larger color volume) win; ties go to the base primaries.
pub fn choose_math_color_space(
    base_primaries: ColorPrimaries,
    alt_primaries: ColorPrimaries,
) -> Result<ColorPrimaries> {
    if base_primaries == alt_primaries {
        return Ok(base_primaries);
    }
    let base_to_alt = rgb_to_rgb_matrix(base_primaries, alt_primaries)
        .ok_or(Error::UnsupportedConversion(base_primaries, alt_primaries))?;
    let alt_to_base = rgb_to_rgb_matrix(alt_primaries, base_primaries)
        .ok_or(Error::UnsupportedConversion(alt_primaries, base_primaries))?;

    let mut base_colorspace_channel_min = 0.0f32;
    let mut alt_colorspace_channel_min = 0.0f32;
    for c in 0..3 {
        let mut unit = [0.0f32; 3];
        unit[c] = 1.0;
        for v in alt_to_base.transform(unit) {
            base_colorspace_channel_min = base_colorspace_channel_min.min(v);
        }
        for v in base_to_alt.transform(unit) {
            alt_colorspace_channel_min = alt_colorspace_channel_min.min(v);
        }
    }
    if alt_colorspace_channel_min <= base_colorspace_channel_min {
        Ok(base_primaries)
    } else {
        Ok(alt_primaries)
    }
}

#[inline]
fn rotate(matrix: &Matrix3x3, rgba: &mut [f32; 4]) {
    let [r, g, b] = matrix.transform([rgba[0], rgba[1], rgba[2]]);
    rgba[0] = r;
    rgba[1] = g;
    rgba[2] = b;
}

fn fraction_error(what: &str, value: f64) -> Error {
    Error::InvalidArgument(format!("cannot express {} {} as a fraction", what, value))
}

/// Compute a gain map from a base and an alternate RGB image.
///
/// `map.image` must be preconfigured with the desired output dimensions,
/// depth and YUV layout; a 4:0:0 layout produces a single-channel gain map.
/// The computed metadata and the encoded gain map image are written into
/// `map`. On failure the gain map image's planes are released.
#[allow(clippy::too_many_arguments)]
pub fn compute_rgb(
    base: &RgbImage,
    base_primaries: ColorPrimaries,
    base_transfer: TransferCharacteristics,
    alt: &RgbImage,
    alt_primaries: ColorPrimaries,
    alt_transfer: TransferCharacteristics,
    map: &mut GainMap,
    config: &ComputeConfig,
) -> Result<()> {
    let res = compute_rgb_inner(
        base,
        base_primaries,
        base_transfer,
        alt,
        alt_primaries,
        alt_transfer,
        map,
        config,
    );
    if res.is_err() {
        map.image.free_planes();
    }
    res
}

#[allow(clippy::too_many_arguments)]
fn compute_rgb_inner(
    base: &RgbImage,
    base_primaries: ColorPrimaries,
    base_transfer: TransferCharacteristics,
    alt: &RgbImage,
    alt_primaries: ColorPrimaries,
    alt_transfer: TransferCharacteristics,
    map: &mut GainMap,
    config: &ComputeConfig,
) -> Result<()> {
    if base.width != alt.width || base.height != alt.height {
        return Err(Error::DimensionMismatch {
            base_w: base.width,
            base_h: base.height,
            alt_w: alt.width,
            alt_h: alt.height,
        });
    }
    if map.image.width == 0 || map.image.height == 0 || map.image.depth == 0 {
        return Err(Error::InvalidArgument(
            "gain map image should have the desired width, height and depth set".into(),
        ));
    }
    let requested_width = map.image.width;
    let requested_height = map.image.height;

    let color_spaces_differ = base_primaries != alt_primaries;
    let math_primaries = choose_math_color_space(base_primaries, alt_primaries)?;
    let width = base.width;
    let height = base.height;
    let num_pixels = width as usize * height as usize;

    let single_channel = map.image.format == YuvFormat::Yuv400;
    let num_gain_map_channels = if single_channel { 1 } else { 3 };
    let mut gainmap_f: Vec<Vec<f32>> = Vec::with_capacity(num_gain_map_channels);
    for _ in 0..num_gain_map_channels {
        gainmap_f.push(try_vec(num_pixels)?);
    }

    map.metadata = GainMapMetadata::default();
    map.metadata.use_base_color_space = math_primaries == base_primaries;
    let use_base_color_space = map.metadata.use_base_color_space;

    let base_to_linear = gamma_to_linear_function(base_transfer);
    let alt_to_linear = gamma_to_linear_function(alt_transfer);
    let y_coeffs = luma_coefficients(math_primaries);

    // The side that is not already in the math color space gets converted.
    let conversion = if color_spaces_differ {
        let (from, to) = if use_base_color_space {
            (alt_primaries, base_primaries)
        } else {
            (base_primaries, alt_primaries)
        };
        Some(rgb_to_rgb_matrix(from, to).ok_or(Error::UnsupportedConversion(from, to))?)
    } else {
        None
    };

    let mut base_offset: [f32; 3] = core::array::from_fn(|c| map.metadata.base_offset[c].to_f32());
    let mut alternate_offset: [f32; 3] =
        core::array::from_fn(|c| map.metadata.alternate_offset[c].to_f32());

    // Converting between color spaces can produce negative channel values.
    // Inflate the converted side's offset so the ratio numerator and
    // denominator stay positive (the color space choice above mostly avoids
    // this already).
    if let Some(matrix) = &conversion {
        let mut channel_min = [0.0f32; 3];
        let (converted, to_linear) = if use_base_color_space {
            (alt, alt_to_linear)
        } else {
            (base, base_to_linear)
        };
        for j in 0..height {
            for i in 0..width {
                let mut rgba = converted.get_rgba(i, j);
                for v in rgba.iter_mut().take(3) {
                    *v = to_linear(*v);
                }
                rotate(matrix, &mut rgba);
                for c in 0..3 {
                    channel_min[c] = channel_min[c].min(rgba[c]);
                }
            }
        }
        for c in 0..3 {
            if channel_min[c] < -EPSILON {
                if use_base_color_space {
                    alternate_offset[c] = (alternate_offset[c] - channel_min[c]).min(MAX_OFFSET);
                } else {
                    base_offset[c] = (base_offset[c] - channel_min[c]).min(MAX_OFFSET);
                }
            }
        }
    }

    // Raw gain map values: per-channel log2 ratio of alternate over base.
    for j in 0..height {
        for i in 0..width {
            let mut base_rgba = base.get_rgba(i, j);
            let mut alt_rgba = alt.get_rgba(i, j);
            for c in 0..3 {
                base_rgba[c] = base_to_linear(base_rgba[c]);
                alt_rgba[c] = alt_to_linear(alt_rgba[c]);
            }
            if let Some(matrix) = &conversion {
                if use_base_color_space {
                    rotate(matrix, &mut alt_rgba);
                } else {
                    rotate(matrix, &mut base_rgba);
                }
            }
            for (c, plane) in gainmap_f.iter_mut().enumerate() {
                let (base_v, alt_v) = if single_channel {
                    (
                        y_coeffs[0] * base_rgba[0]
                            + y_coeffs[1] * base_rgba[1]
                            + y_coeffs[2] * base_rgba[2],
                        y_coeffs[0] * alt_rgba[0]
                            + y_coeffs[1] * alt_rgba[1]
                            + y_coeffs[2] * alt_rgba[2],
                    )
                } else {
                    (base_rgba[c], alt_rgba[c])
                };
                let ratio = (alt_v + alternate_offset[c]) / (base_v + base_offset[c]);
                plane[(j * width + i) as usize] = ratio.max(EPSILON).log2();
            }
        }
    }

    // Record the headrooms the renditions were produced for.
    let base_headroom = config.base_hdr_headroom;
    let alternate_headroom = config.alternate_hdr_headroom;
    map.metadata.base_hdr_headroom = UnsignedFraction::from_f64(base_headroom)
        .ok_or_else(|| fraction_error("base HDR headroom", base_headroom))?;
    map.metadata.alternate_hdr_headroom = UnsignedFraction::from_f64(alternate_headroom)
        .ok_or_else(|| fraction_error("alternate HDR headroom", alternate_headroom))?;

    // Flip the sign when the alternate rendition is the darker one, so the
    // stored values always encode the log ratio of the HDR representation
    // to the SDR representation.
    if alternate_headroom < base_headroom {
        for plane in &mut gainmap_f {
            for v in plane.iter_mut() {
                *v *= -1.0;
            }
        }
    }

    // Approximate per-channel range, discarding outliers.
    let mut gain_map_min_log2 = [0.0f32; 3];
    let mut gain_map_max_log2 = [0.0f32; 3];
    for (c, plane) in gainmap_f.iter().enumerate() {
        (gain_map_min_log2[c], gain_map_max_log2[c]) = find_min_max_without_outliers(plane)?;
    }

    // A single-channel gain map still fills all three metadata slots.
    for c in 0..3 {
        let src = if single_channel { 0 } else { c };
        map.metadata.gain_map_min[c] = SignedFraction::from_f64(gain_map_min_log2[src] as f64)
            .ok_or_else(|| fraction_error("gain map min", gain_map_min_log2[src] as f64))?;
        map.metadata.gain_map_max[c] = SignedFraction::from_f64(gain_map_max_log2[src] as f64)
            .ok_or_else(|| fraction_error("gain map max", gain_map_max_log2[src] as f64))?;
        map.metadata.alternate_offset[c] = SignedFraction::from_f64(alternate_offset[c] as f64)
            .ok_or_else(|| fraction_error("alternate offset", alternate_offset[c] as f64))?;
        map.metadata.base_offset[c] = SignedFraction::from_f64(base_offset[c] as f64)
            .ok_or_else(|| fraction_error("base offset", base_offset[c] as f64))?;
    }

    // Remap each channel's [min, max] to [0, 1] and gamma encode.
    for (c, plane) in gainmap_f.iter_mut().enumerate() {
        let range = (gain_map_max_log2[c] - gain_map_min_log2[c]).max(0.0);
        if range == 0.0 {
            // The decoder multiplies by max - min == 0, so the values do not
            // matter, but they must still land in [0, 1].
            for v in plane.iter_mut() {
                *v = 0.0;
            }
        } else {
            let gain_map_gamma = map.metadata.gain_map_gamma[c].to_f32();
            for v in plane.iter_mut() {
                let clamped = v.clamp(gain_map_min_log2[c], gain_map_max_log2[c]);
                *v = ((clamped - gain_map_min_log2[c]) / range)
                    .powf(gain_map_gamma)
                    .clamp(0.0, 1.0);
            }
        }
    }

    // Materialize the gain map image at full resolution.
    map.image.width = width;
    map.image.height = height;
    map.image.free_planes();

    let mut gainmap_rgb = RgbImage::new(width, height, RgbFormat::Rgb, 32, true)?;
    for j in 0..height {
        for i in 0..width {
            let offset = (j * width + i) as usize;
            let r = gainmap_f[0][offset];
            let g = if single_channel { r } else { gainmap_f[1][offset] };
            let b = if single_channel { r } else { gainmap_f[2][offset] };
            gainmap_rgb.set_rgba(i, j, [r, g, b, 1.0]);
        }
    }
    rgb_to_yuv(&gainmap_rgb, &mut map.image)?;

    // Scale down the gain map if requested. Scaling the encoded map performs
    // better than scaling the source images.
    if requested_width != map.image.width || requested_height != map.image.height {
        map.image = scale_image(&map.image, requested_width, requested_height)?;
    }

    Ok(())
}

/// Compute a gain map from a base and an alternate YUV image.
///
/// Refuses inputs carrying ICC profiles, materializes both sides as RGB,
/// forwards to [`compute_rgb`], and records the alternate rendition's
/// descriptors (primaries, transfer, matrix, depth, plane count, content
/// light level) in the gain map.
pub fn compute_image(
    base: &YuvImage,
    alt: &YuvImage,
    map: &mut GainMap,
    config: &ComputeConfig,
) -> Result<()> {
    if !base.icc.is_empty() || !alt.icc.is_empty() {
        return Err(Error::IccNotSupported);
    }
    if base.width != alt.width || base.height != alt.height {
        return Err(Error::DimensionMismatch {
            base_w: base.width,
            base_h: base.height,
            alt_w: alt.width,
            alt_h: alt.height,
        });
    }

    let base_rgb = yuv_to_rgb(base)?;
    let alt_rgb = yuv_to_rgb(alt)?;
    compute_rgb(
        &base_rgb,
        base.primaries,
        base.transfer,
        &alt_rgb,
        alt.primaries,
        alt.transfer,
        map,
        config,
    )?;

    map.alt_icc = alt.icc.clone();
    map.alt_color_primaries = alt.primaries;
    map.alt_transfer_characteristics = alt.transfer;
    map.alt_matrix_coefficients = alt.matrix;
    map.alt_depth = alt.depth;
    map.alt_plane_count = alt.format.plane_count();
    map.alt_clli = alt.clli;
    Ok(())
}
