//! Exact Euclidean distance transform.
//!
//! Separable lower-envelope algorithm (Felzenszwalb–Huttenlocher): a 1-D
//! squared-distance pass over columns, then over rows. Linear in the number
//! of pixels.

use crate::image::{Channels, RasterF32, RasterU8};
use crate::util::RasterResult;

const FAR: f64 = 1e20;

/// Distance from every non-zero pixel to the nearest zero pixel.
///
/// Zero pixels map to 0. When the map has no zero pixel at all, every
/// distance is `f32::INFINITY`.
pub fn distance_transform(binary: &RasterU8) -> RasterResult<RasterF32> {
    binary.ensure_gray("input")?;
    let w = binary.width();
    let h = binary.height();
    if binary.data().iter().all(|&v| v != 0) {
        return RasterF32::filled(w, h, Channels::Gray, f32::INFINITY);
    }

    let mut sq: Vec<f64> = binary
        .data()
        .iter()
        .map(|&v| if v == 0 { 0.0 } else { FAR })
        .collect();

    let n = w.max(h);
    let mut line = vec![0.0f64; n];
    let mut out = vec![0.0f64; n];
    let mut env = Envelope::with_capacity(n);

    for x in 0..w {
        for y in 0..h {
            line[y] = sq[y * w + x];
        }
        env.transform(&line[..h], &mut out[..h]);
        for y in 0..h {
            sq[y * w + x] = out[y];
        }
    }
    for y in 0..h {
        let row = &mut sq[y * w..(y + 1) * w];
        line[..w].copy_from_slice(row);
        env.transform(&line[..w], &mut out[..w]);
        row.copy_from_slice(&out[..w]);
    }

    let data = sq.into_iter().map(|d| d.sqrt() as f32).collect();
    Ok(RasterF32::from_parts(data, w, h, Channels::Gray))
}

/// Scratch buffers for the 1-D lower envelope of parabolas.
struct Envelope {
    vertices: Vec<usize>,
    bounds: Vec<f64>,
}

impl Envelope {
    fn with_capacity(n: usize) -> Self {
        Self {
            vertices: vec![0; n],
            bounds: vec![0.0; n + 1],
        }
    }

    /// `d[q] = min_p (q - p)^2 + f[p]`.
    fn transform(&mut self, f: &[f64], d: &mut [f64]) {
        let n = f.len();
        let v = &mut self.vertices;
        let z = &mut self.bounds;
        let mut k = 0usize;
        v[0] = 0;
        z[0] = f64::NEG_INFINITY;
        z[1] = f64::INFINITY;

        for q in 1..n {
            let mut s = intersection(f, v[k], q);
            while s <= z[k] {
                k -= 1;
                s = intersection(f, v[k], q);
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
        }

        k = 0;
        for (q, out) in d.iter_mut().enumerate() {
            let qf = q as f64;
            while z[k + 1] < qf {
                k += 1;
            }
            let p = v[k];
            let dp = qf - p as f64;
            *out = dp * dp + f[p];
        }
    }
}

/// Abscissa where the parabolas rooted at `p < q` intersect.
#[inline]
fn intersection(f: &[f64], p: usize, q: usize) -> f64 {
    let (pf, qf) = (p as f64, q as f64);
    ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
}
