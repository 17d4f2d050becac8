//! Benchmarks for gain map apply and compute.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gainmap_core::{
    apply_rgb, compute_rgb, ColorPrimaries, ComputeConfig, GainMap, MatrixCoefficients, RgbFormat,
    RgbImage, SignedFraction, TransferCharacteristics, UnsignedFraction, YuvFormat, YuvImage,
    YuvRange,
};
use std::hint::black_box;

/// Create a gradient base image.
fn create_base(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::new(width, height, RgbFormat::Rgba, 8, false).unwrap();
    for j in 0..height {
        for i in 0..width {
            let t = i as f32 / width.max(1) as f32;
            let s = j as f32 / height.max(1) as f32;
            img.set_rgba(i, j, [t, s, 0.5, 1.0]);
        }
    }
    img
}

/// Create a brighter alternate image.
fn create_alt(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::new(width, height, RgbFormat::Rgba, 16, true).unwrap();
    for j in 0..height {
        for i in 0..width {
            let t = i as f32 / width.max(1) as f32;
            img.set_rgba(i, j, [t * 4.0, t * 3.0, 2.0, 1.0]);
        }
    }
    img
}

/// Create a mid-gain gain map covering two stops.
fn create_gainmap(width: u32, height: u32) -> GainMap {
    let mut map = GainMap {
        image: YuvImage {
            width,
            height,
            depth: 8,
            format: YuvFormat::Yuv444,
            range: YuvRange::Full,
            matrix: MatrixCoefficients::Identity,
            ..Default::default()
        },
        ..Default::default()
    };
    map.metadata.base_hdr_headroom = UnsignedFraction::new(0, 1);
    map.metadata.alternate_hdr_headroom = UnsignedFraction::new(2, 1);
    map.metadata.gain_map_min = [SignedFraction::new(0, 1); 3];
    map.metadata.gain_map_max = [SignedFraction::new(2, 1); 3];
    map.image.allocate_planes().unwrap();
    for plane in 0..3 {
        for v in &mut map.image.planes[plane] {
            *v = 180;
        }
    }
    map
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_rgb");
    for (width, height) in [(256, 256), (512, 512), (1024, 1024)] {
        group.throughput(Throughput::Elements(width as u64 * height as u64));
        let base = create_base(width, height);
        let map = create_gainmap(width, height);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &(base, map),
            |b, (base, map)| {
                b.iter(|| {
                    let mut out = RgbImage {
                        format: RgbFormat::Rgba,
                        depth: 8,
                        is_float: false,
                        ..Default::default()
                    };
                    apply_rgb(
                        black_box(base),
                        ColorPrimaries::Bt709,
                        TransferCharacteristics::Srgb,
                        black_box(map),
                        1.5,
                        ColorPrimaries::Bt709,
                        TransferCharacteristics::Srgb,
                        &mut out,
                        None,
                    )
                    .unwrap();
                    out
                })
            },
        );
    }
    group.finish();
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_rgb");
    group.sample_size(20);
    for (width, height) in [(256, 256), (512, 512)] {
        group.throughput(Throughput::Elements(width as u64 * height as u64));
        let base = create_base(width, height);
        let alt = create_alt(width, height);
        let config = ComputeConfig::with_headrooms(0.0, 2.0);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &(base, alt),
            |b, (base, alt)| {
                b.iter(|| {
                    let mut map = GainMap {
                        image: YuvImage {
                            width: width / 2,
                            height: height / 2,
                            depth: 8,
                            format: YuvFormat::Yuv420,
                            range: YuvRange::Full,
                            matrix: MatrixCoefficients::Bt709,
                            ..Default::default()
                        },
                        ..Default::default()
                    };
                    compute_rgb(
                        black_box(base),
                        ColorPrimaries::Bt709,
                        TransferCharacteristics::Srgb,
                        black_box(alt),
                        ColorPrimaries::Bt709,
                        TransferCharacteristics::Linear,
                        &mut map,
                        &config,
                    )
                    .unwrap();
                    map
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_apply, bench_compute);
criterion_main!(benches);
