use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rasterlab::filter::{
    box_blur, convolve, gaussian_blur, gaussian_weights, gradients, median_blur, GradientKernel,
    Kernel,
};
use rasterlab::{RasterError, RasterU8};

fn random_image(seed: u64, width: usize, height: usize, rgb: bool) -> RasterU8 {
    let mut rng = StdRng::seed_from_u64(seed);
    let cn = if rgb { 3 } else { 1 };
    let data = (0..width * height * cn)
        .map(|_| rng.random_range(0..=255))
        .collect();
    if rgb {
        RasterU8::rgb(data, width, height).unwrap()
    } else {
        RasterU8::gray(data, width, height).unwrap()
    }
}

#[test]
fn size_one_blurs_are_identities() {
    for (seed, rgb) in [(1, false), (2, true)] {
        let img = random_image(seed, 17, 11, rgb);
        assert_eq!(box_blur(&img, 1).unwrap(), img);
        assert_eq!(gaussian_blur(&img, 1, None).unwrap(), img);
        assert_eq!(gaussian_blur(&img, 1, Some(3.0)).unwrap(), img);
        assert_eq!(median_blur(&img, 1).unwrap(), img);
    }
}

#[test]
fn even_or_oversized_kernels_are_rejected() {
    let img = random_image(3, 8, 8, false);
    for size in [0, 2, 4, 33] {
        assert!(matches!(
            box_blur(&img, size).unwrap_err(),
            RasterError::UnsupportedParameter { .. }
        ));
        assert!(gaussian_blur(&img, size, None).is_err());
        assert!(median_blur(&img, size).is_err());
    }
    assert!(gaussian_blur(&img, 5, Some(-1.0)).is_err());
}

#[test]
fn constant_images_survive_smoothing() {
    let img = RasterU8::gray(vec![77; 12 * 9], 12, 9).unwrap();
    for size in [3, 5, 9] {
        assert_eq!(box_blur(&img, size).unwrap(), img);
        assert_eq!(gaussian_blur(&img, size, None).unwrap(), img);
        assert_eq!(median_blur(&img, size).unwrap(), img);
    }
}

#[test]
fn median_removes_isolated_outlier() {
    let mut data = vec![100u8; 7 * 7];
    data[3 * 7 + 3] = 255;
    data[0] = 0;
    let img = RasterU8::gray(data, 7, 7).unwrap();
    let out = median_blur(&img, 3).unwrap();
    assert!(out.data().iter().all(|&v| v == 100));
}

#[test]
fn gaussian_weights_are_normalized_and_symmetric() {
    for size in [3, 5, 7, 15] {
        let w = gaussian_weights(size, None).unwrap();
        assert_eq!(w.len(), size);
        let sum: f32 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..size / 2 {
            assert!((w[i] - w[size - 1 - i]).abs() < 1e-7);
            assert!(w[i] < w[i + 1]);
        }
    }
}

#[test]
fn sobel_measures_a_horizontal_ramp() {
    let (w, h) = (9, 5);
    let data = (0..w * h).map(|i| ((i % w) * 10) as u8).collect();
    let img = RasterU8::gray(data, w, h).unwrap();
    let (gx, gy) = gradients(&img, GradientKernel::Sobel).unwrap();
    for y in 0..h {
        for x in 1..w - 1 {
            assert!((gx.get(x, y, 0).unwrap() - 80.0).abs() < 1e-4);
            assert!(gy.get(x, y, 0).unwrap().abs() < 1e-4);
        }
    }
    assert!(gradients(&img, GradientKernel::Laplacian).is_err());
}

#[test]
fn custom_kernel_shifts_with_replicated_borders() {
    // Picks the right-hand neighbor.
    let kernel = Kernel::new(3, vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
    let img = RasterU8::gray(vec![1, 2, 3, 4], 4, 1).unwrap();
    let out = convolve(&img, &kernel);
    assert_eq!(out.data(), &[2.0, 3.0, 4.0, 4.0]);
    assert!(Kernel::new(3, vec![0.0; 8]).is_err());
}
