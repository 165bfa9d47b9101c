use criterion::{criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use orb::Orb;

/// A 640x480 checkerboard with smooth shading, corners at every tile crossing.
fn load_image() -> orb::image::GrayFloatImage {
    let image = RgbImage::from_fn(640, 480, |x, y| {
        let tile = ((x / 40) + (y / 40)) % 2;
        let shade = ((x + 2 * y) % 64) as u8;
        let value = if tile == 0 { 40 + shade } else { 180 + shade };
        Rgb([value, value, value])
    });
    orb::image::GrayFloatImage::from_color(&DynamicImage::ImageRgb8(image)).unwrap()
}

fn extract(c: &mut Criterion) {
    let image = load_image();
    let orb = Orb::default();
    c.bench_function("extract", |b| {
        b.iter(|| orb.extract_from_gray_float_image(&image))
    });
}

fn detect(c: &mut Criterion) {
    let image = load_image();
    let orb = Orb::default();
    let pyramid = orb.build_pyramid(&image).unwrap();
    c.bench_function("build_pyramid", |b| b.iter(|| orb.build_pyramid(&image)));
    c.bench_function("detect_keypoints", |b| {
        b.iter(|| orb.detect_keypoints(&pyramid))
    });
    let keypoints = orb.detect_keypoints(&pyramid).unwrap();
    c.bench_function("extract_descriptors", |b| {
        b.iter(|| orb.extract_descriptors(&pyramid, &keypoints))
    });
}

criterion_group!(
    name = orb_pipeline;
    config = Criterion::default().sample_size(10);
    targets = extract, detect
);

fn bench_separable_filter(c: &mut Criterion) {
    let image = load_image();
    let kernel = orb::image::gaussian_kernel(2.0, 7);
    c.bench_function("horizontal_filter", |b| {
        b.iter(|| orb::image::horizontal_filter(&image.0, &kernel))
    });
    c.bench_function("vertical_filter", |b| {
        b.iter(|| orb::image::vertical_filter(&image.0, &kernel))
    });
}

criterion_group!(
    name = orb_image;
    config = Criterion::default().sample_size(10);
    targets = bench_separable_filter
);

criterion_main!(orb_pipeline, orb_image);
