#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rasterlab::filter::{gaussian_blur, gaussian_weights, median_blur};
use rasterlab::matching::match_template;
use rasterlab::{MatchMethod, RasterU8};

fn make_image(seed: u64, width: usize, height: usize) -> RasterU8 {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height)
        .map(|_| rng.random_range(0..=255))
        .collect();
    RasterU8::gray(data, width, height).unwrap()
}

fn clamp(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

#[test]
fn parallel_gaussian_matches_direct_sum() {
    let img = make_image(1, 67, 45);
    let (w, h) = (img.width(), img.height());
    let g = gaussian_weights(7, None).unwrap();
    let out = gaussian_blur(&img, 7, None).unwrap();
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f64;
            for (ky, wy) in g.iter().enumerate() {
                for (kx, wx) in g.iter().enumerate() {
                    let sx = clamp(x as isize + kx as isize - 3, w);
                    let sy = clamp(y as isize + ky as isize - 3, h);
                    acc += f64::from(*wy) * f64::from(*wx) * f64::from(img.data()[sy * w + sx]);
                }
            }
            let got = out.data()[y * w + x];
            assert!(
                (f64::from(got) - acc).abs() <= 1.0,
                "({x}, {y}): {got} vs {acc}"
            );
        }
    }
}

#[test]
fn parallel_median_matches_sorted_windows() {
    let img = make_image(2, 41, 29);
    let (w, h) = (img.width(), img.height());
    let out = median_blur(&img, 5).unwrap();
    for y in 0..h {
        for x in 0..w {
            let mut window = Vec::with_capacity(25);
            for dy in -2..=2isize {
                for dx in -2..=2isize {
                    let sx = clamp(x as isize + dx, w);
                    let sy = clamp(y as isize + dy, h);
                    window.push(img.data()[sy * w + sx]);
                }
            }
            window.sort_unstable();
            assert_eq!(out.data()[y * w + x], window[12], "({x}, {y})");
        }
    }
}

#[test]
fn parallel_scores_match_direct_sums() {
    let src = make_image(3, 60, 44);
    let tpl = make_image(4, 9, 7);
    let scores = match_template(&src, &tpl, MatchMethod::SqDiff).unwrap();
    let cross = match_template(&src, &tpl, MatchMethod::CCorr).unwrap();
    for y in 0..scores.height() {
        for x in 0..scores.width() {
            let mut sq = 0.0f64;
            let mut cc = 0.0f64;
            for ty in 0..tpl.height() {
                for tx in 0..tpl.width() {
                    let i = f64::from(src.data()[(y + ty) * src.width() + x + tx]);
                    let t = f64::from(tpl.data()[ty * tpl.width() + tx]);
                    sq += (t - i) * (t - i);
                    cc += t * i;
                }
            }
            let got_sq = f64::from(scores.get(x, y, 0).unwrap());
            let got_cc = f64::from(cross.get(x, y, 0).unwrap());
            assert!((got_sq - sq).abs() <= 1e-6 * sq.max(1.0), "({x}, {y})");
            assert!((got_cc - cc).abs() <= 1e-6 * cc.max(1.0), "({x}, {y})");
        }
    }
}
