use criterion::{criterion_group, criterion_main, Criterion};
use rasterlab::edge::{canny, CannyConfig};
use rasterlab::filter::{gaussian_blur, median_blur};
use rasterlab::matching::match_template;
use rasterlab::segment::{segment, WatershedConfig};
use rasterlab::{find_contours, MatchMethod, RasterU8, RetrievalMode};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> RasterU8 {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    RasterU8::gray(data, width, height).unwrap()
}

fn make_blobs(width: usize, height: usize) -> RasterU8 {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (cx, cy) = ((x % 64) as f32 - 32.0, (y % 64) as f32 - 32.0);
            data.push(if cx * cx + cy * cy <= 400.0 { 30 } else { 220 });
        }
    }
    RasterU8::gray(data, width, height).unwrap()
}

fn crop(src: &RasterU8, x0: usize, y0: usize, width: usize, height: usize) -> RasterU8 {
    let mut data = Vec::with_capacity(width * height);
    for y in y0..y0 + height {
        data.extend_from_slice(&src.row(y).unwrap()[x0..x0 + width]);
    }
    RasterU8::gray(data, width, height).unwrap()
}

fn bench_filters(c: &mut Criterion) {
    let image = make_image(512, 512);
    c.bench_function("gaussian_blur_512_k5", |b| {
        b.iter(|| black_box(gaussian_blur(black_box(&image), 5, None).unwrap()))
    });
    c.bench_function("median_blur_512_k5", |b| {
        b.iter(|| black_box(median_blur(black_box(&image), 5).unwrap()))
    });
    c.bench_function("canny_512", |b| {
        let cfg = CannyConfig::default();
        b.iter(|| black_box(canny(black_box(&image), &cfg).unwrap()))
    });
}

fn bench_matching(c: &mut Criterion) {
    let image = make_image(256, 256);
    let template = crop(&image, 120, 100, 32, 32);
    for method in [MatchMethod::SqDiff, MatchMethod::CCoeffNormed] {
        c.bench_function(&format!("match_template_256_t32_{method}"), |b| {
            b.iter(|| black_box(match_template(black_box(&image), &template, method).unwrap()))
        });
    }
}

fn bench_segmentation(c: &mut Criterion) {
    let blobs = make_blobs(512, 512);
    c.bench_function("watershed_512", |b| {
        let cfg = WatershedConfig::default();
        b.iter(|| black_box(segment(black_box(&blobs), &cfg).unwrap()))
    });
    let binary = blobs.map(|v| if v < 128 { 255u8 } else { 0 });
    c.bench_function("find_contours_512", |b| {
        b.iter(|| black_box(find_contours(black_box(&binary), RetrievalMode::Tree).unwrap()))
    });
}

criterion_group!(benches, bench_filters, bench_matching, bench_segmentation);
criterion_main!(benches);
