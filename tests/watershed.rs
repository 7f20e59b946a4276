use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rasterlab::segment::{
    dilate, distance_transform, erode, flood, label_components, open, segment, Elevation,
    MarkerMap, Warning, WatershedConfig,
};
use rasterlab::RasterU8;

fn discs(width: usize, height: usize, centers: &[(f32, f32, f32)]) -> RasterU8 {
    let data = (0..width * height)
        .map(|i| {
            let (x, y) = ((i % width) as f32, (i / width) as f32);
            let inside = centers
                .iter()
                .any(|&(cx, cy, r)| (x - cx).powi(2) + (y - cy).powi(2) <= r * r);
            if inside {
                25
            } else {
                230
            }
        })
        .collect();
    RasterU8::gray(data, width, height).unwrap()
}

fn assert_marker_invariants(markers: &MarkerMap) {
    let (w, h) = (markers.width(), markers.height());
    assert!(markers.labels().iter().all(|&l| l >= -1));
    for y in 0..h {
        for x in 0..w {
            if markers.get(x, y) != Some(MarkerMap::BOUNDARY) {
                continue;
            }
            for ny in y.saturating_sub(1)..(y + 2).min(h) {
                for nx in x.saturating_sub(1)..(x + 2).min(w) {
                    assert_ne!(
                        markers.get(nx, ny),
                        Some(MarkerMap::UNKNOWN),
                        "boundary at ({x}, {y}) touches unknown ({nx}, {ny})"
                    );
                }
            }
        }
    }
}

#[test]
fn touching_discs_are_split_by_a_boundary() {
    let src = discs(44, 26, &[(13.0, 13.0, 8.0), (29.0, 13.0, 8.0)]);
    let out = segment(&src, &WatershedConfig::default()).unwrap();
    assert!(out.warning.is_none());
    let markers = out.markers.expect("markers");
    assert_marker_invariants(&markers);

    let left = markers.get(13, 13).unwrap();
    let right = markers.get(29, 13).unwrap();
    assert!(left >= 2 && right >= 2);
    assert_ne!(left, right);
    assert!(markers.region_count() >= 3);
    assert!(markers.boundary_count() > 0);

    // Boundary pixels are painted, everything else keeps its gray value.
    let painted = out.processed;
    assert_eq!(painted.channels().count(), 3);
    for (idx, &label) in markers.labels().iter().enumerate() {
        let px = &painted.data()[idx * 3..idx * 3 + 3];
        if label == MarkerMap::BOUNDARY {
            assert_eq!(px, &[255, 0, 0]);
        } else {
            let g = src.data()[idx];
            assert_eq!(px, &[g, g, g]);
        }
    }
}

#[test]
fn stages_are_exposed() {
    let src = discs(30, 30, &[(15.0, 15.0, 9.0)]);
    let out = segment(&src, &WatershedConfig::default()).unwrap();
    let stages = &out.stages;
    assert!((25..230).contains(&stages.otsu_level));
    assert_eq!(stages.binary.get(15, 15, 0), Some(255));
    assert_eq!(stages.binary.get(0, 0, 0), Some(0));
    assert_eq!(stages.sure_foreground.get(15, 15, 0), Some(255));
    for ((&bg, &fg), &unknown) in stages
        .sure_background
        .data()
        .iter()
        .zip(stages.sure_foreground.data())
        .zip(stages.unknown.data())
    {
        assert_eq!(unknown == 255, bg != 0 && fg == 0);
    }
}

#[test]
fn uniform_image_reports_no_regions() {
    for value in [0u8, 128, 255] {
        let src = RasterU8::gray(vec![value; 20 * 20], 20, 20).unwrap();
        let out = segment(&src, &WatershedConfig::default()).unwrap();
        assert_eq!(out.warning, Some(Warning::NoSeparableRegions));
        assert!(out.markers.is_none());
        assert_eq!(out.processed, src);
    }
}

#[test]
fn random_scenes_keep_marker_invariants() {
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..6 {
        let centers: Vec<(f32, f32, f32)> = (0..4)
            .map(|_| {
                (
                    rng.random_range(5.0..43.0),
                    rng.random_range(5.0..31.0),
                    rng.random_range(3.0..9.0),
                )
            })
            .collect();
        let src = discs(48, 36, &centers);
        for elevation in [Elevation::Gradient, Elevation::Intensity] {
            let cfg = WatershedConfig {
                elevation,
                ..WatershedConfig::default()
            };
            let out = segment(&src, &cfg).unwrap();
            if let Some(markers) = out.markers {
                assert_marker_invariants(&markers);
            }
        }
    }
}

#[test]
fn invalid_configs_are_rejected() {
    let src = discs(20, 20, &[(10.0, 10.0, 5.0)]);
    for cfg in [
        WatershedConfig {
            kernel_size: 4,
            ..WatershedConfig::default()
        },
        WatershedConfig {
            foreground_ratio: 0.0,
            ..WatershedConfig::default()
        },
        WatershedConfig {
            open_iterations: 65,
            ..WatershedConfig::default()
        },
    ] {
        assert!(segment(&src, &cfg).is_err());
    }
}

#[test]
fn flood_splits_two_seeds_at_the_ridge() {
    // Elevation rises toward the middle column.
    let (w, h): (usize, usize) = (9, 3);
    let elevation: Vec<u8> = (0..w * h)
        .map(|i| (40 - 10 * (i % w).abs_diff(4)) as u8)
        .collect();
    let elevation = RasterU8::gray(elevation, w, h).unwrap();
    let mut labels = vec![0i32; w * h];
    for y in 0..h {
        labels[y * w] = 1;
        labels[y * w + w - 1] = 2;
    }
    let mut markers = MarkerMap::new(labels, w, h).unwrap();
    flood(&mut markers, &elevation).unwrap();
    assert_marker_invariants(&markers);
    for y in 0..h {
        assert_eq!(markers.get(1, y), Some(1));
        assert_eq!(markers.get(7, y), Some(2));
        assert_eq!(markers.get(4, y), Some(MarkerMap::BOUNDARY));
    }
}

#[test]
fn marker_maps_validate_labels() {
    assert!(MarkerMap::new(vec![0, 1, -2, 3], 2, 2).is_err());
    assert!(MarkerMap::new(vec![0, 1, 2], 2, 2).is_err());
    let map = MarkerMap::new(vec![-1, 0, 1, 4], 2, 2).unwrap();
    assert_eq!(map.region_count(), 4);
    assert_eq!(map.boundary_count(), 1);
}

#[test]
fn morphology_and_distance_building_blocks() {
    let mut data = vec![0u8; 11 * 11];
    for y in 2..9 {
        for x in 2..9 {
            data[y * 11 + x] = 255;
        }
    }
    data[0] = 255; // speck removed by opening
    let img = RasterU8::gray(data, 11, 11).unwrap();

    let eroded = erode(&img, 3, 1).unwrap();
    assert_eq!(eroded.get(2, 2, 0), Some(0));
    assert_eq!(eroded.get(3, 3, 0), Some(255));
    let dilated = dilate(&img, 3, 1).unwrap();
    assert_eq!(dilated.get(1, 1, 0), Some(255));
    assert_eq!(dilated.get(10, 10, 0), Some(0));

    let opened = open(&img, 3, 1).unwrap();
    assert_eq!(opened.get(0, 0, 0), Some(0));
    assert_eq!(opened.get(2, 2, 0), Some(255));

    let dist = distance_transform(&opened).unwrap();
    assert_eq!(dist.get(0, 0, 0), Some(0.0));
    assert!((dist.get(5, 5, 0).unwrap() - 4.0).abs() < 1e-4);
    assert!((dist.get(2, 5, 0).unwrap() - 1.0).abs() < 1e-4);

    let (labels, count) = label_components(&img).unwrap();
    assert_eq!(count, 2);
    assert_eq!(labels[0], 1);
    assert_eq!(labels[5 * 11 + 5], 2);
    assert_eq!(labels[11 + 1], 0);
}
