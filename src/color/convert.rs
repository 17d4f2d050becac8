//! YUV ↔ RGB materialization and image rescaling.
//!
//! Supports BT.601, BT.709 and BT.2020 non-constant-luminance matrices in
//! full and limited range, plus the identity matrix (planes carry G, B, R).
//! Chroma is upsampled nearest on YUV → RGB and box averaged on RGB → YUV.

use crate::image::{RgbFormat, RgbImage, YuvImage};
use crate::types::{Error, MatrixCoefficients, Result, YuvRange};

/// Kr/Kb matrix coefficients.
#[derive(Debug, Clone, Copy)]
struct YuvCoefficients {
    kr: f32,
    kb: f32,
}

impl YuvCoefficients {
    const BT601: Self = Self { kr: 0.299, kb: 0.114 };
    const BT709: Self = Self { kr: 0.2126, kb: 0.0722 };
    const BT2020: Self = Self { kr: 0.2627, kb: 0.0593 };

    #[inline]
    fn kg(&self) -> f32 {
        1.0 - self.kr - self.kb
    }

    /// Coefficients for a matrix, or `None` for the identity matrix.
    fn for_matrix(matrix: MatrixCoefficients) -> Option<Self> {
        match matrix {
            MatrixCoefficients::Identity => None,
            MatrixCoefficients::Bt601 => Some(Self::BT601),
            MatrixCoefficients::Bt709 => Some(Self::BT709),
            MatrixCoefficients::Bt2020Ncl => Some(Self::BT2020),
        }
    }
}

/// Limited-range scale factors for the given depth: (luma offset, luma range,
/// chroma range). Chroma is centered on `1 << (depth - 1)`.
#[inline]
fn limited_range_params(depth: u32) -> (f32, f32, f32) {
    let shift = depth - 8;
    (
        (16 << shift) as f32,
        (219 << shift) as f32,
        (224 << shift) as f32,
    )
}

#[inline]
fn luma_to_unorm(sample: u16, depth: u32, range: YuvRange, max: f32) -> f32 {
    match range {
        YuvRange::Full => sample as f32 / max,
        YuvRange::Limited => {
            let (offset, luma_range, _) = limited_range_params(depth);
            (sample as f32 - offset) / luma_range
        }
    }
}

#[inline]
fn chroma_to_centered(sample: u16, depth: u32, range: YuvRange, max: f32) -> f32 {
    match range {
        YuvRange::Full => (sample as f32 - (1 << (depth - 1)) as f32) / max,
        YuvRange::Limited => {
            let (_, _, chroma_range) = limited_range_params(depth);
            (sample as f32 - (1 << (depth - 1)) as f32) / chroma_range
        }
    }
}

#[inline]
fn unorm_to_luma(v: f32, depth: u32, range: YuvRange, max: f32) -> u16 {
    let raw = match range {
        YuvRange::Full => v * max,
        YuvRange::Limited => {
            let (offset, luma_range, _) = limited_range_params(depth);
            v * luma_range + offset
        }
    };
    raw.round().clamp(0.0, max) as u16
}

#[inline]
fn centered_to_chroma(c: f32, depth: u32, range: YuvRange, max: f32) -> u16 {
    let raw = match range {
        YuvRange::Full => c * max + (1 << (depth - 1)) as f32,
        YuvRange::Limited => {
            let (_, _, chroma_range) = limited_range_params(depth);
            c * chroma_range + (1 << (depth - 1)) as f32
        }
    };
    raw.round().clamp(0.0, max) as u16
}

/// Materialize a YUV image as a packed float RGB image with values clamped
/// to `[0, 1]`. Chroma planes are sampled nearest.
pub fn yuv_to_rgb(yuv: &YuvImage) -> Result<RgbImage> {
    if !yuv.has_planes() {
        return Err(Error::InvalidArgument("YUV image has no planes".into()));
    }
    let mut rgb = RgbImage::new(yuv.width, yuv.height, RgbFormat::Rgb, 32, true)?;
    let max = yuv.max_sample();
    let coeffs = YuvCoefficients::for_matrix(yuv.matrix);
    let chroma_shift = yuv.format.chroma_shift();
    let (chroma_w, _) = yuv.plane_dimensions(1);

    for j in 0..yuv.height {
        for i in 0..yuv.width {
            let y_raw = yuv.planes[0][(j * yuv.width + i) as usize];
            let pixel = if let Some((sx, sy)) = chroma_shift {
                let ci = (i >> sx).min(chroma_w.saturating_sub(1));
                let cj = j >> sy;
                let at = (cj * chroma_w + ci) as usize;
                let u_raw = yuv.planes[1][at];
                let v_raw = yuv.planes[2][at];
                match coeffs {
                    None => {
                        // Identity: planes carry G, B, R with luma scaling.
                        let g = luma_to_unorm(y_raw, yuv.depth, yuv.range, max);
                        let b = luma_to_unorm(u_raw, yuv.depth, yuv.range, max);
                        let r = luma_to_unorm(v_raw, yuv.depth, yuv.range, max);
                        [r, g, b]
                    }
                    Some(co) => {
                        let y = luma_to_unorm(y_raw, yuv.depth, yuv.range, max);
                        let cb = chroma_to_centered(u_raw, yuv.depth, yuv.range, max);
                        let cr = chroma_to_centered(v_raw, yuv.depth, yuv.range, max);
                        let r = y + cr * 2.0 * (1.0 - co.kr);
                        let b = y + cb * 2.0 * (1.0 - co.kb);
                        let g = (y - co.kr * r - co.kb * b) / co.kg();
                        [r, g, b]
                    }
                }
            } else {
                let y = luma_to_unorm(y_raw, yuv.depth, yuv.range, max);
                [y, y, y]
            };
            rgb.set_rgba(
                i,
                j,
                [
                    pixel[0].clamp(0.0, 1.0),
                    pixel[1].clamp(0.0, 1.0),
                    pixel[2].clamp(0.0, 1.0),
                    1.0,
                ],
            );
        }
    }
    Ok(rgb)
}

/// Convert a packed RGB image into the given YUV image, whose dimensions,
/// depth, format and range must already be configured. Planes are
/// (re)allocated. RGB values are clamped to `[0, 1]` before quantization.
pub fn rgb_to_yuv(rgb: &RgbImage, yuv: &mut YuvImage) -> Result<()> {
    if rgb.width != yuv.width || rgb.height != yuv.height {
        return Err(Error::DimensionMismatch {
            base_w: rgb.width,
            base_h: rgb.height,
            alt_w: yuv.width,
            alt_h: yuv.height,
        });
    }
    yuv.allocate_planes()?;
    let max = yuv.max_sample();
    let coeffs = YuvCoefficients::for_matrix(yuv.matrix);
    let mono = yuv.format.chroma_shift().is_none();

    let num_pixels = (yuv.width * yuv.height) as usize;
    let mut full_y = vec![0.0f32; num_pixels];
    let mut full_cb = vec![0.0f32; if mono { 0 } else { num_pixels }];
    let mut full_cr = vec![0.0f32; if mono { 0 } else { num_pixels }];

    for j in 0..yuv.height {
        for i in 0..yuv.width {
            let rgba = rgb.get_rgba(i, j);
            let r = rgba[0].clamp(0.0, 1.0);
            let g = rgba[1].clamp(0.0, 1.0);
            let b = rgba[2].clamp(0.0, 1.0);
            let at = (j * yuv.width + i) as usize;
            match (mono, coeffs) {
                (true, Some(co)) => {
                    full_y[at] = co.kr * r + co.kg() * g + co.kb * b;
                }
                (true, None) => {
                    full_y[at] = g;
                }
                (false, Some(co)) => {
                    let y = co.kr * r + co.kg() * g + co.kb * b;
                    full_y[at] = y;
                    full_cb[at] = (b - y) / (2.0 * (1.0 - co.kb));
                    full_cr[at] = (r - y) / (2.0 * (1.0 - co.kr));
                }
                (false, None) => {
                    full_y[at] = g;
                    full_cb[at] = b;
                    full_cr[at] = r;
                }
            }
        }
    }

    for (at, &y) in full_y.iter().enumerate() {
        yuv.planes[0][at] = unorm_to_luma(y, yuv.depth, yuv.range, max);
    }
    if let Some((sx, sy)) = yuv.format.chroma_shift() {
        let (chroma_w, chroma_h) = yuv.plane_dimensions(1);
        for cj in 0..chroma_h {
            for ci in 0..chroma_w {
                // Box average over the subsampling block.
                let mut sum_cb = 0.0f32;
                let mut sum_cr = 0.0f32;
                let mut count = 0.0f32;
                for dj in 0..(1u32 << sy) {
                    for di in 0..(1u32 << sx) {
                        let i = (ci << sx) + di;
                        let j = (cj << sy) + dj;
                        if i < yuv.width && j < yuv.height {
                            let at = (j * yuv.width + i) as usize;
                            sum_cb += full_cb[at];
                            sum_cr += full_cr[at];
                            count += 1.0;
                        }
                    }
                }
                let at = (cj * chroma_w + ci) as usize;
                if coeffs.is_some() {
                    yuv.planes[1][at] = centered_to_chroma(sum_cb / count, yuv.depth, yuv.range, max);
                    yuv.planes[2][at] = centered_to_chroma(sum_cr / count, yuv.depth, yuv.range, max);
                } else {
                    yuv.planes[1][at] = unorm_to_luma(sum_cb / count, yuv.depth, yuv.range, max);
                    yuv.planes[2][at] = unorm_to_luma(sum_cr / count, yuv.depth, yuv.range, max);
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Rescaling
// ============================================================================

/// Bilinear interpolation.
#[inline]
fn bilinear(v00: f32, v10: f32, v01: f32, v11: f32, fx: f32, fy: f32) -> f32 {
    let top = v00 * (1.0 - fx) + v10 * fx;
    let bottom = v01 * (1.0 - fx) + v11 * fx;
    top * (1.0 - fy) + bottom * fy
}

fn scale_plane(src: &[u16], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u16> {
    let mut dst = vec![0u16; dst_w as usize * dst_h as usize];
    for j in 0..dst_h {
        // Pixel-center mapping keeps edges aligned between scales.
        let sy = ((j as f32 + 0.5) * src_h as f32 / dst_h as f32 - 0.5).max(0.0);
        let y0 = (sy.floor() as u32).min(src_h - 1);
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = sy - sy.floor();
        for i in 0..dst_w {
            let sx = ((i as f32 + 0.5) * src_w as f32 / dst_w as f32 - 0.5).max(0.0);
            let x0 = (sx.floor() as u32).min(src_w - 1);
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = sx - sx.floor();
            let v = bilinear(
                src[(y0 * src_w + x0) as usize] as f32,
                src[(y0 * src_w + x1) as usize] as f32,
                src[(y1 * src_w + x0) as usize] as f32,
                src[(y1 * src_w + x1) as usize] as f32,
                fx,
                fy,
            );
            dst[(j * dst_w + i) as usize] = v.round() as u16;
        }
    }
    dst
}

/// Produce a bilinearly rescaled copy of a YUV image.
pub fn scale_image(src: &YuvImage, width: u32, height: u32) -> Result<YuvImage> {
    if !src.has_planes() {
        return Err(Error::InvalidArgument("YUV image has no planes".into()));
    }
    let mut dst = src.clone();
    dst.width = width;
    dst.height = height;
    dst.allocate_planes()?;
    for plane in 0..src.format.plane_count() as usize {
        let (sw, sh) = src.plane_dimensions(plane);
        let (dw, dh) = dst.plane_dimensions(plane);
        dst.planes[plane] = scale_plane(&src.planes[plane], sw, sh, dw, dh);
    }
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::YuvFormat;

    fn gray_yuv(width: u32, height: u32, format: YuvFormat, value: u16) -> YuvImage {
        let mut img = YuvImage {
            width,
            height,
            depth: 8,
            format,
            range: YuvRange::Full,
            matrix: MatrixCoefficients::Bt709,
            ..Default::default()
        };
        img.allocate_planes().unwrap();
        for v in &mut img.planes[0] {
            *v = value;
        }
        for plane in 1..format.plane_count() as usize {
            for v in &mut img.planes[plane] {
                *v = 128;
            }
        }
        img
    }

    #[test]
    fn test_yuv_gray_roundtrip() {
        let yuv = gray_yuv(4, 4, YuvFormat::Yuv444, 128);
        let rgb = yuv_to_rgb(&yuv).unwrap();
        let px = rgb.get_rgba(1, 1);
        for c in 0..3 {
            assert!((px[c] - 128.0 / 255.0).abs() < 0.01, "channel {}: {}", c, px[c]);
        }

        let mut back = gray_yuv(4, 4, YuvFormat::Yuv444, 0);
        rgb_to_yuv(&rgb, &mut back).unwrap();
        assert_eq!(back.planes[0][5], 128);
    }

    #[test]
    fn test_yuv400_materializes_gray() {
        let yuv = gray_yuv(4, 4, YuvFormat::Yuv400, 200);
        let rgb = yuv_to_rgb(&yuv).unwrap();
        let px = rgb.get_rgba(3, 3);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert!((px[0] - 200.0 / 255.0).abs() < 0.01);
    }

    #[test]
    fn test_identity_matrix_roundtrip() {
        let mut yuv = YuvImage {
            width: 2,
            height: 2,
            depth: 8,
            format: YuvFormat::Yuv444,
            range: YuvRange::Full,
            matrix: MatrixCoefficients::Identity,
            ..Default::default()
        };
        yuv.allocate_planes().unwrap();

        let mut rgb = RgbImage::new(2, 2, RgbFormat::Rgb, 8, false).unwrap();
        rgb.set_rgba(0, 0, [1.0, 0.5, 0.25, 1.0]);
        rgb_to_yuv(&rgb, &mut yuv).unwrap();
        let out = yuv_to_rgb(&yuv).unwrap();
        let px = out.get_rgba(0, 0);
        assert!((px[0] - 1.0).abs() < 0.01);
        assert!((px[1] - 0.5).abs() < 0.01);
        assert!((px[2] - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_limited_range_roundtrip() {
        let mut yuv = YuvImage {
            width: 2,
            height: 2,
            depth: 10,
            format: YuvFormat::Yuv444,
            range: YuvRange::Limited,
            matrix: MatrixCoefficients::Bt601,
            ..Default::default()
        };
        yuv.allocate_planes().unwrap();

        let mut rgb = RgbImage::new(2, 2, RgbFormat::Rgb, 32, true).unwrap();
        for j in 0..2 {
            for i in 0..2 {
                rgb.set_rgba(i, j, [0.75, 0.5, 0.125, 1.0]);
            }
        }
        rgb_to_yuv(&rgb, &mut yuv).unwrap();
        let out = yuv_to_rgb(&yuv).unwrap();
        let px = out.get_rgba(1, 0);
        assert!((px[0] - 0.75).abs() < 0.01, "r: {}", px[0]);
        assert!((px[1] - 0.5).abs() < 0.01, "g: {}", px[1]);
        assert!((px[2] - 0.125).abs() < 0.01, "b: {}", px[2]);
    }

    #[test]
    fn test_scale_constant_plane() {
        let yuv = gray_yuv(8, 8, YuvFormat::Yuv420, 77);
        let scaled = scale_image(&yuv, 16, 16).unwrap();
        assert_eq!(scaled.width, 16);
        assert!(scaled.planes[0].iter().all(|&v| v == 77));
        let down = scale_image(&yuv, 3, 3).unwrap();
        assert!(down.planes[0].iter().all(|&v| v == 77));
    }

    #[test]
    fn test_scale_preserves_gradient_endpoints() {
        let mut yuv = gray_yuv(4, 1, YuvFormat::Yuv400, 0);
        yuv.planes[0] = vec![0, 85, 170, 255];
        let up = scale_image(&yuv, 8, 1).unwrap();
        assert_eq!(up.planes[0][0], 0);
        assert_eq!(*up.planes[0].last().unwrap(), 255);
        // Monotonic along the row.
        for w in up.planes[0].windows(2) {
            assert!(w[0] <= w[1]);
        }
    }
}
