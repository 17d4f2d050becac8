//! Transfer functions (gamma ↔ linear).
//!
//! Linear values throughout the crate are *extended SDR*: 1.0 is SDR
//! reference white (203 nits), and HDR transfer functions produce values
//! above 1.0. Encoded (gamma) values are always in `[0, 1]`.
//!
//! Reference standards:
//! - sRGB: IEC 61966-2-1
//! - PQ: SMPTE ST 2084, ITU-R BT.2100
//! - HLG: ITU-R BT.2100, ARIB STD-B67

#![allow(clippy::excessive_precision)]

use crate::types::TransferCharacteristics;

/// SDR reference white (diffuse white), in nits.
pub const SDR_WHITE_NITS: f32 = 203.0;

/// PQ peak luminance, in nits.
pub const PQ_PEAK_NITS: f32 = 10000.0;

/// HLG nominal display peak, in nits.
pub const HLG_PEAK_NITS: f32 = 1000.0;

/// A scalar transfer function.
pub type TransferFn = fn(f32) -> f32;

// ============================================================================
// sRGB (IEC 61966-2-1)
// ============================================================================

/// sRGB OETF: linear `[0,1]` → encoded `[0,1]`
#[inline]
pub fn srgb_from_linear(linear: f32) -> f32 {
    if linear <= 0.0031308 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// sRGB EOTF: encoded `[0,1]` → linear `[0,1]`
#[inline]
pub fn srgb_to_linear(encoded: f32) -> f32 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

// ============================================================================
// PQ (SMPTE ST 2084 / ITU-R BT.2100)
// ============================================================================

const PQ_M1: f32 = 2610.0 / 16384.0; // 0.1593017578125
const PQ_M2: f32 = 2523.0 / 4096.0 * 128.0; // 78.84375
const PQ_C1: f32 = 3424.0 / 4096.0; // 0.8359375
const PQ_C2: f32 = 2413.0 / 4096.0 * 32.0; // 18.8515625
const PQ_C3: f32 = 2392.0 / 4096.0 * 32.0; // 18.6875

/// PQ OETF over its own normalization (1.0 = 10000 nits).
#[inline]
fn pq_oetf(linear: f32) -> f32 {
    if linear <= 0.0 {
        return 0.0;
    }
    let y_m1 = linear.powf(PQ_M1);
    let numerator = PQ_C1 + PQ_C2 * y_m1;
    let denominator = 1.0 + PQ_C3 * y_m1;
    (numerator / denominator).powf(PQ_M2)
}

/// PQ EOTF over its own normalization (1.0 = 10000 nits).
#[inline]
fn pq_eotf(encoded: f32) -> f32 {
    if encoded <= 0.0 {
        return 0.0;
    }
    let e_inv_m2 = encoded.powf(1.0 / PQ_M2);
    let numerator = (e_inv_m2 - PQ_C1).max(0.0);
    let denominator = PQ_C2 - PQ_C3 * e_inv_m2;
    if denominator <= 0.0 {
        return 0.0;
    }
    (numerator / denominator).powf(1.0 / PQ_M1)
}

/// PQ encoded `[0,1]` → extended SDR linear (1.0 = 203 nits).
#[inline]
pub fn pq_to_linear(encoded: f32) -> f32 {
    pq_eotf(encoded) * (PQ_PEAK_NITS / SDR_WHITE_NITS)
}

/// Extended SDR linear → PQ encoded `[0,1]`.
#[inline]
pub fn pq_from_linear(linear: f32) -> f32 {
    pq_oetf(linear.max(0.0) * (SDR_WHITE_NITS / PQ_PEAK_NITS))
}

// ============================================================================
// HLG (ITU-R BT.2100 / ARIB STD-B67)
// ============================================================================

const HLG_A: f32 = 0.17883277;
const HLG_B: f32 = 0.28466892; // 1 - 4*a
const HLG_C: f32 = 0.55991073; // 0.5 - a*ln(4*a)

/// HLG OETF: scene linear `[0,1]` → encoded `[0,1]`
#[inline]
fn hlg_oetf(linear: f32) -> f32 {
    if linear <= 0.0 {
        return 0.0;
    }
    if linear <= 1.0 / 12.0 {
        (3.0 * linear).sqrt()
    } else {
        HLG_A * (12.0 * linear - HLG_B).ln() + HLG_C
    }
}

/// HLG inverse OETF: encoded `[0,1]` → scene linear `[0,1]`
#[inline]
fn hlg_oetf_inv(encoded: f32) -> f32 {
    if encoded <= 0.0 {
        return 0.0;
    }
    if encoded <= 0.5 {
        encoded * encoded / 3.0
    } else {
        ((encoded - HLG_C) / HLG_A).exp() / 12.0 + HLG_B / 12.0
    }
}

/// System gamma for a display peak, per ITU-R BT.2100.
#[inline]
fn hlg_system_gamma(display_peak_nits: f32) -> f32 {
    (1.2 + 0.42 * (display_peak_nits / 1000.0).log10()).clamp(1.0, 1.5)
}

/// HLG encoded `[0,1]` → extended SDR linear, assuming a nominal 1000 nit
/// display for the OOTF.
#[inline]
pub fn hlg_to_linear(encoded: f32) -> f32 {
    let scene = hlg_oetf_inv(encoded);
    let gamma = hlg_system_gamma(HLG_PEAK_NITS);
    scene.powf(gamma) * HLG_PEAK_NITS / SDR_WHITE_NITS
}

/// Extended SDR linear → HLG encoded `[0,1]`, inverting the nominal OOTF.
#[inline]
pub fn hlg_from_linear(linear: f32) -> f32 {
    if linear <= 0.0 {
        return 0.0;
    }
    let gamma = hlg_system_gamma(HLG_PEAK_NITS);
    let scene = (linear * SDR_WHITE_NITS / HLG_PEAK_NITS).powf(1.0 / gamma);
    hlg_oetf(scene)
}

// ============================================================================
// Dispatch
// ============================================================================

#[inline]
fn identity(v: f32) -> f32 {
    v
}

/// Gamma → linear function for the given transfer characteristics.
pub fn gamma_to_linear_function(tc: TransferCharacteristics) -> TransferFn {
    match tc {
        TransferCharacteristics::Srgb => srgb_to_linear,
        TransferCharacteristics::Linear => identity,
        TransferCharacteristics::Pq => pq_to_linear,
        TransferCharacteristics::Hlg => hlg_to_linear,
    }
}

/// Linear → gamma function for the given transfer characteristics.
pub fn linear_to_gamma_function(tc: TransferCharacteristics) -> TransferFn {
    match tc {
        TransferCharacteristics::Srgb => srgb_from_linear,
        TransferCharacteristics::Linear => identity,
        TransferCharacteristics::Pq => pq_from_linear,
        TransferCharacteristics::Hlg => hlg_from_linear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON || (a - b).abs() / a.abs().max(b.abs()).max(1e-10) < EPSILON
    }

    #[test]
    fn test_srgb_roundtrip() {
        for i in 0..=100 {
            let linear = i as f32 / 100.0;
            let decoded = srgb_to_linear(srgb_from_linear(linear));
            assert!(
                approx_eq(linear, decoded),
                "sRGB roundtrip failed for {}: got {}",
                linear,
                decoded
            );
        }
    }

    #[test]
    fn test_srgb_known_values() {
        assert!(approx_eq(srgb_from_linear(0.0), 0.0));
        assert!(approx_eq(srgb_from_linear(1.0), 1.0));
        assert!(approx_eq(srgb_to_linear(0.04045), 0.04045 / 12.92));

        // Mid-gray (linear 0.18 → encoded ~0.46)
        let mid = srgb_from_linear(0.18);
        assert!(mid > 0.4 && mid < 0.5, "got {}", mid);
    }

    #[test]
    fn test_pq_roundtrip() {
        // Extended SDR values from 0 up to the PQ peak (~49.26).
        for i in 0..=100 {
            let linear = i as f32 / 100.0 * (PQ_PEAK_NITS / SDR_WHITE_NITS);
            let decoded = pq_to_linear(pq_from_linear(linear));
            assert!(
                approx_eq(linear, decoded) || (linear - decoded).abs() < 1e-2,
                "PQ roundtrip failed for {}: got {}",
                linear,
                decoded
            );
        }
    }

    #[test]
    fn test_pq_sdr_white() {
        // 203 nits is extended SDR 1.0 and encodes to PQ ~0.58.
        let encoded = pq_from_linear(1.0);
        assert!(encoded > 0.5 && encoded < 0.65, "got {}", encoded);
        assert!(approx_eq(pq_to_linear(encoded), 1.0));
        // PQ peak maps to 10000/203 in extended SDR.
        assert!(approx_eq(pq_to_linear(1.0), PQ_PEAK_NITS / SDR_WHITE_NITS));
    }

    #[test]
    fn test_hlg_roundtrip() {
        for i in 1..=100 {
            let encoded = i as f32 / 100.0;
            let back = hlg_from_linear(hlg_to_linear(encoded));
            assert!(
                approx_eq(encoded, back),
                "HLG roundtrip failed for {}: got {}",
                encoded,
                back
            );
        }
    }

    #[test]
    fn test_hlg_peak() {
        // Full HLG signal reaches the nominal display peak.
        assert!(approx_eq(hlg_to_linear(1.0), HLG_PEAK_NITS / SDR_WHITE_NITS));
        assert!(approx_eq(hlg_to_linear(0.0), 0.0));
    }

    #[test]
    fn test_dispatch_linear_is_identity() {
        let f = gamma_to_linear_function(TransferCharacteristics::Linear);
        let g = linear_to_gamma_function(TransferCharacteristics::Linear);
        assert_eq!(f(0.42), 0.42);
        assert_eq!(g(1.7), 1.7);
    }
}
