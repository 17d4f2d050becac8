//! Color primaries: conversion matrices and luma coefficients.
//!
//! Reference primaries (all D65):
//! - BT.709 / sRGB
//! - Display P3
//! - BT.2020 / BT.2100

// Full precision for color matrices - these values come from standards
#![allow(clippy::excessive_precision)]

use crate::types::ColorPrimaries;

/// 3x3 matrix for linear RGB transformations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3x3(pub [[f32; 3]; 3]);

impl Matrix3x3 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Multiply matrix by RGB vector: `[R', G', B'] = M * [R, G, B]`
    #[inline]
    pub fn transform(&self, rgb: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [
            m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
            m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
            m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
        ]
    }

    /// Matrix multiplication: `self * other`
    pub fn multiply(&self, other: &Self) -> Self {
        let a = &self.0;
        let b = &other.0;
        let mut result = [[0.0f32; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Self(result)
    }
}

// ============================================================================
// RGB to XYZ matrices (D65 illuminant)
// ============================================================================

/// BT.709 / sRGB RGB to XYZ (D65) - IEC 61966-2-1
const BT709_TO_XYZ: Matrix3x3 = Matrix3x3([
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
]);

/// XYZ to BT.709 / sRGB RGB (D65)
const XYZ_TO_BT709: Matrix3x3 = Matrix3x3([
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
]);

/// Display P3 RGB to XYZ (D65)
const P3_TO_XYZ: Matrix3x3 = Matrix3x3([
    [0.4865709, 0.2656677, 0.1982173],
    [0.2289746, 0.6917385, 0.0792869],
    [0.0000000, 0.0451134, 1.0439444],
]);

/// XYZ to Display P3 RGB (D65)
const XYZ_TO_P3: Matrix3x3 = Matrix3x3([
    [2.4934969, -0.9313836, -0.4027108],
    [-0.8294890, 1.7626641, 0.0236247],
    [0.0358458, -0.0761724, 0.9568845],
]);

/// BT.2020 RGB to XYZ (D65)
const BT2020_TO_XYZ: Matrix3x3 = Matrix3x3([
    [0.6369580, 0.1446169, 0.1688810],
    [0.2627002, 0.6779981, 0.0593017],
    [0.0000000, 0.0280727, 1.0609851],
]);

/// XYZ to BT.2020 RGB (D65)
const XYZ_TO_BT2020: Matrix3x3 = Matrix3x3([
    [1.7166512, -0.3556708, -0.2533663],
    [-0.6666844, 1.6164812, 0.0157685],
    [0.0176399, -0.0427706, 0.9421031],
]);

fn to_xyz(primaries: ColorPrimaries) -> Option<Matrix3x3> {
    match primaries {
        ColorPrimaries::Bt709 => Some(BT709_TO_XYZ),
        ColorPrimaries::DisplayP3 => Some(P3_TO_XYZ),
        ColorPrimaries::Bt2020 => Some(BT2020_TO_XYZ),
        ColorPrimaries::Unspecified => None,
    }
}

fn from_xyz(primaries: ColorPrimaries) -> Option<Matrix3x3> {
    match primaries {
        ColorPrimaries::Bt709 => Some(XYZ_TO_BT709),
        ColorPrimaries::DisplayP3 => Some(XYZ_TO_P3),
        ColorPrimaries::Bt2020 => Some(XYZ_TO_BT2020),
        ColorPrimaries::Unspecified => None,
    }
}

/// Compute the matrix converting linear RGB between two primary sets,
/// composed through XYZ. Returns `None` when either set is unspecified.
pub fn rgb_to_rgb_matrix(from: ColorPrimaries, to: ColorPrimaries) -> Option<Matrix3x3> {
    if from == to {
        return Some(Matrix3x3::IDENTITY);
    }
    Some(from_xyz(to)?.multiply(&to_xyz(from)?))
}

// ============================================================================
// Luma coefficients
// ============================================================================

/// Luminance coefficients for BT.709 (Y = 0.2126R + 0.7152G + 0.0722B)
const BT709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Luminance coefficients for Display P3
const P3_LUMA: [f32; 3] = [0.2289746, 0.6917385, 0.0792869];

/// Luminance coefficients for BT.2020
const BT2020_LUMA: [f32; 3] = [0.2627, 0.6780, 0.0593];

/// Y coefficients for the given primaries. Unspecified primaries fall back
/// to BT.709.
pub fn luma_coefficients(primaries: ColorPrimaries) -> [f32; 3] {
    match primaries {
        ColorPrimaries::Bt709 | ColorPrimaries::Unspecified => BT709_LUMA,
        ColorPrimaries::DisplayP3 => P3_LUMA,
        ColorPrimaries::Bt2020 => BT2020_LUMA,
    }
}
