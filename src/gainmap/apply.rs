//! Gain map application: reconstruct an output rendition for a display's
//! HDR headroom.

use crate::color::convert::{scale_image, yuv_to_rgb};
use crate::color::gamut::{rgb_to_rgb_matrix, Matrix3x3};
use crate::color::transfer::{
    gamma_to_linear_function, linear_to_gamma_function, SDR_WHITE_NITS,
};
use crate::gainmap::{GainMap, GainMapMetadata};
use crate::image::{RgbImage, YuvImage};
use crate::types::{Clli, ColorPrimaries, Error, Result, TransferCharacteristics};

/// How much of the gain map to apply for a display headroom, in `[-1, 1]`.
///
/// Blends from 0 at the base rendition's headroom to ±1 at the alternate
/// rendition's headroom, negative when the alternate is darker than the
/// base. Equal headrooms yield 0: the ratio is undefined in that case and
/// the gain map is not applied.
pub fn gainmap_weight(hdr_headroom: f32, metadata: &GainMapMetadata) -> f32 {
    let base_hdr_headroom = metadata.base_hdr_headroom.to_f32();
    let alternate_hdr_headroom = metadata.alternate_hdr_headroom.to_f32();
    if base_hdr_headroom == alternate_hdr_headroom {
        return 0.0;
    }
    let w = ((hdr_headroom - base_hdr_headroom) / (alternate_hdr_headroom - base_hdr_headroom))
        .clamp(0.0, 1.0);
    if alternate_hdr_headroom < base_hdr_headroom {
        -w
    } else {
        w
    }
}

/// Linear interpolation (returns `a` at `w == 0`, `b` at `w == 1`).
#[inline]
fn lerp(a: f32, b: f32, w: f32) -> f32 {
    (1.0 - w) * a + w * b
}

#[inline]
fn rotate(matrix: Option<&Matrix3x3>, rgba: &mut [f32; 4]) {
    if let Some(m) = matrix {
        let [r, g, b] = m.transform([rgba[0], rgba[1], rgba[2]]);
        rgba[0] = r;
        rgba[1] = g;
        rgba[2] = b;
    }
}

fn conversion_matrix(from: ColorPrimaries, to: ColorPrimaries) -> Result<Matrix3x3> {
    rgb_to_rgb_matrix(from, to).ok_or(Error::UnsupportedConversion(from, to))
}

/// Apply a gain map to a base RGB image.
///
/// `out` must be configured with the desired pixel layout; its pixels are
/// (re)allocated at the base image's dimensions. When `clli` is given and the
/// gain map is actually applied, content light level statistics of the tone
/// mapped image are written to it, using 203 nits as SDR white.
#[allow(clippy::too_many_arguments)]
pub fn apply_rgb(
    base: &RgbImage,
    base_primaries: ColorPrimaries,
    base_transfer: TransferCharacteristics,
    map: &GainMap,
    hdr_headroom: f32,
    out_primaries: ColorPrimaries,
    out_transfer: TransferCharacteristics,
    out: &mut RgbImage,
    clli: Option<&mut Clli>,
) -> Result<()> {
    if hdr_headroom < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "hdrHeadroom should be >= 0, got {}",
            hdr_headroom
        )));
    }
    map.metadata.validate()?;

    let width = base.width;
    let height = base.height;
    out.allocate_pixels(width, height)?;

    let weight = gainmap_weight(hdr_headroom, &map.metadata);

    // The math color space defaults to the base image's primaries; the
    // alternate image's primaries are only used when they are known and the
    // metadata asks for them.
    let math_primaries = if map.metadata.use_base_color_space
        || map.alt_color_primaries == ColorPrimaries::Unspecified
    {
        base_primaries
    } else {
        map.alt_color_primaries
    };

    // No application and identical layout: plain copy.
    if weight == 0.0
        && out_transfer == base_transfer
        && out_primaries == base_primaries
        && out.same_layout(base)
    {
        if out.row_bytes == base.row_bytes {
            let len = out.data.len();
            out.data.copy_from_slice(&base.data[..len]);
        } else {
            let row = width as usize * base.pixel_bytes() as usize;
            for j in 0..height as usize {
                let src = j * base.row_bytes as usize;
                let dst = j * out.row_bytes as usize;
                out.data[dst..dst + row].copy_from_slice(&base.data[src..src + row]);
            }
        }
        return Ok(());
    }

    let gamma_to_linear = gamma_to_linear_function(base_transfer);
    let linear_to_gamma = linear_to_gamma_function(out_transfer);

    // No application: convert from one RGB format to another.
    if weight == 0.0 {
        let primaries_differ = base_primaries != out_primaries;
        let conversion = if primaries_differ {
            Some(conversion_matrix(base_primaries, out_primaries)?)
        } else {
            None
        };
        for j in 0..height {
            for i in 0..width {
                let mut rgba = base.get_rgba(i, j);
                if out_transfer != base_transfer || primaries_differ {
                    for v in rgba.iter_mut().take(3) {
                        *v = gamma_to_linear(*v);
                    }
                    rotate(conversion.as_ref(), &mut rgba);
                    for v in rgba.iter_mut().take(3) {
                        *v = linear_to_gamma(*v).clamp(0.0, 1.0);
                    }
                }
                out.set_rgba(i, j, rgba);
            }
        }
        return Ok(());
    }

    let input_conversion = if base_primaries != math_primaries {
        Some(conversion_matrix(base_primaries, math_primaries)?)
    } else {
        None
    };
    let output_conversion = if math_primaries != out_primaries {
        Some(conversion_matrix(math_primaries, out_primaries)?)
    } else {
        None
    };

    // Bring the gain map to the base image's dimensions and materialize it
    // as RGB.
    let rescaled: Option<YuvImage> =
        if map.image.width != width || map.image.height != height {
            Some(scale_image(&map.image, width, height)?)
        } else {
            None
        };
    let gainmap_rgb = yuv_to_rgb(rescaled.as_ref().unwrap_or(&map.image))?;

    let mut rgb_max_linear = 0.0f32; // Max tone mapped value across R, G and B.
    let mut rgb_sum_linear = 0.0f64; // Sum of max(r, g, b) over mapped pixels.

    // The metadata stores the encoding gamma; decoding uses the reciprocal.
    let gamma_inv: [f32; 3] =
        core::array::from_fn(|c| 1.0 / map.metadata.gain_map_gamma[c].to_f32());
    let gain_map_min: [f32; 3] = core::array::from_fn(|c| map.metadata.gain_map_min[c].to_f32());
    let gain_map_max: [f32; 3] = core::array::from_fn(|c| map.metadata.gain_map_max[c].to_f32());
    let base_offset: [f32; 3] = core::array::from_fn(|c| map.metadata.base_offset[c].to_f32());
    let alternate_offset: [f32; 3] =
        core::array::from_fn(|c| map.metadata.alternate_offset[c].to_f32());

    for j in 0..height {
        for i in 0..width {
            let mut base_rgba = base.get_rgba(i, j);
            let gainmap_rgba = gainmap_rgb.get_rgba(i, j);

            for v in base_rgba.iter_mut().take(3) {
                *v = gamma_to_linear(*v);
            }
            rotate(input_conversion.as_ref(), &mut base_rgba);

            let mut tone_mapped = [0.0f32; 4];
            let mut pixel_rgb_max_linear = 0.0f32;
            for c in 0..3 {
                // Undo gamma & affine transform; the result is in log2 space.
                let gainmap_log2 = lerp(
                    gain_map_min[c],
                    gain_map_max[c],
                    gainmap_rgba[c].powf(gamma_inv[c]),
                );
                let tone_mapped_linear =
                    (base_rgba[c] + base_offset[c]) * (gainmap_log2 * weight).exp2()
                        - alternate_offset[c];

                rgb_max_linear = rgb_max_linear.max(tone_mapped_linear);
                pixel_rgb_max_linear = pixel_rgb_max_linear.max(tone_mapped_linear);
                tone_mapped[c] = tone_mapped_linear;
            }

            rotate(output_conversion.as_ref(), &mut tone_mapped);
            for v in tone_mapped.iter_mut().take(3) {
                *v = linear_to_gamma(*v).clamp(0.0, 1.0);
            }

            tone_mapped[3] = base_rgba[3]; // Alpha is unaffected by tone mapping.
            rgb_sum_linear += pixel_rgb_max_linear as f64;
            out.set_rgba(i, j, tone_mapped);
        }
    }

    if let Some(clli) = clli {
        // For exact CLLI value definitions, see ISO/IEC 23008-2 section
        // D.3.35. Extended SDR linear (1.0 = SDR white) converts to nits by
        // scaling with the SDR white luminance.
        clli.max_cll =
            (rgb_max_linear * SDR_WHITE_NITS).round().clamp(0.0, u16::MAX as f32) as u16;
        let rgb_average_linear = rgb_sum_linear as f32 / (width * height) as f32;
        clli.max_pall =
            (rgb_average_linear * SDR_WHITE_NITS).round().clamp(0.0, u16::MAX as f32) as u16;
    }

    Ok(())
}

/// Apply a gain map to a base YUV image.
///
/// Refuses inputs carrying ICC profiles, materializes the base as RGB, and
/// forwards to [`apply_rgb`].
pub fn apply_image(
    base: &YuvImage,
    map: &GainMap,
    hdr_headroom: f32,
    out_primaries: ColorPrimaries,
    out_transfer: TransferCharacteristics,
    out: &mut RgbImage,
    clli: Option<&mut Clli>,
) -> Result<()> {
    if !base.icc.is_empty() || !map.alt_icc.is_empty() {
        return Err(Error::IccNotSupported);
    }
    let base_rgb = yuv_to_rgb(base)?;
    apply_rgb(
        &base_rgb,
        base.primaries,
        base.transfer,
        map,
        hdr_headroom,
        out_primaries,
        out_transfer,
        out,
        clli,
    )
}
