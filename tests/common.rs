//! Common test utilities for synthetic image generation.
//!
//! These helpers create test images programmatically, avoiding the need to
//! include binary test files in the repository.

#![allow(dead_code)]

use gainmap_core::{
    ColorPrimaries, GainMap, MatrixCoefficients, RgbFormat, RgbImage, TransferCharacteristics,
    YuvFormat, YuvImage, YuvRange,
};

/// Create a solid float RGBA image.
pub fn solid_rgb(width: u32, height: u32, rgb: [f32; 3]) -> RgbImage {
    let mut img = RgbImage::new(width, height, RgbFormat::Rgba, 32, true).unwrap();
    for j in 0..height {
        for i in 0..width {
            img.set_rgba(i, j, [rgb[0], rgb[1], rgb[2], 1.0]);
        }
    }
    img
}

/// Create a float RGBA image with a horizontal gradient from black to `peak`.
pub fn gradient_rgb(width: u32, height: u32, peak: f32) -> RgbImage {
    let mut img = RgbImage::new(width, height, RgbFormat::Rgba, 32, true).unwrap();
    for j in 0..height {
        for i in 0..width {
            let t = i as f32 / (width - 1).max(1) as f32;
            let v = t * peak;
            img.set_rgba(i, j, [v, v, v, 1.0]);
        }
    }
    img
}

/// Create a solid gray YUV image using the identity matrix, so plane values
/// map to RGB without chroma error.
pub fn solid_yuv(width: u32, height: u32, value: u16) -> YuvImage {
    let mut img = YuvImage {
        width,
        height,
        depth: 8,
        format: YuvFormat::Yuv444,
        range: YuvRange::Full,
        matrix: MatrixCoefficients::Identity,
        primaries: ColorPrimaries::Bt709,
        transfer: TransferCharacteristics::Srgb,
        ..Default::default()
    };
    img.allocate_planes().unwrap();
    for plane in 0..3 {
        for v in &mut img.planes[plane] {
            *v = value;
        }
    }
    img
}

/// A gain map whose target image is configured for computation at the given
/// size (identity matrix, full range, 8-bit).
pub fn gainmap_target(width: u32, height: u32, format: YuvFormat) -> GainMap {
    GainMap {
        image: YuvImage {
            width,
            height,
            depth: 8,
            format,
            range: YuvRange::Full,
            matrix: MatrixCoefficients::Identity,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// An output image shell with the given layout; pixels are allocated by the
/// apply engine.
pub fn output_shell(format: RgbFormat, depth: u32, is_float: bool) -> RgbImage {
    RgbImage {
        format,
        depth,
        is_float,
        ..Default::default()
    }
}

/// Max absolute channel difference between two images of the same size.
pub fn max_channel_diff(a: &RgbImage, b: &RgbImage) -> f32 {
    assert_eq!(a.width, b.width);
    assert_eq!(a.height, b.height);
    let mut max_diff = 0.0f32;
    for j in 0..a.height {
        for i in 0..a.width {
            let pa = a.get_rgba(i, j);
            let pb = b.get_rgba(i, j);
            for c in 0..4 {
                max_diff = max_diff.max((pa[c] - pb[c]).abs());
            }
        }
    }
    max_diff
}
