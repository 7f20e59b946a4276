//! Grayscale erosion and dilation with a square structuring element.
//!
//! Samples outside the raster are ignored rather than padded, so borders are
//! neither eroded nor grown by the frame. A square element is separable: a
//! horizontal pass followed by a vertical pass gives the exact result.

use crate::image::{Channels, RasterU8};
use crate::util::par::fill_rows;
use crate::util::RasterResult;

#[derive(Clone, Copy)]
enum Op {
    Min,
    Max,
}

impl Op {
    #[inline]
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Op::Min => a.min(b),
            Op::Max => a.max(b),
        }
    }

    fn identity(self) -> u8 {
        match self {
            Op::Min => u8::MAX,
            Op::Max => 0,
        }
    }
}

/// Minimum filter over a `size x size` square, applied `iterations` times.
pub fn erode(src: &RasterU8, size: usize, iterations: usize) -> RasterResult<RasterU8> {
    apply(src, size, iterations, Op::Min)
}

/// Maximum filter over a `size x size` square, applied `iterations` times.
pub fn dilate(src: &RasterU8, size: usize, iterations: usize) -> RasterResult<RasterU8> {
    apply(src, size, iterations, Op::Max)
}

/// Morphological opening: `iterations` erosions, then as many dilations.
pub fn open(src: &RasterU8, size: usize, iterations: usize) -> RasterResult<RasterU8> {
    let eroded = erode(src, size, iterations)?;
    dilate(&eroded, size, iterations)
}

fn apply(src: &RasterU8, size: usize, iterations: usize, op: Op) -> RasterResult<RasterU8> {
    src.ensure_gray("input")?;
    crate::filter::kernel::validate_size(size)?;
    let mut current = src.clone();
    if size == 1 {
        return Ok(current);
    }
    for _ in 0..iterations {
        current = pass(&current, size / 2, op);
    }
    Ok(current)
}

fn pass(src: &RasterU8, radius: usize, op: Op) -> RasterU8 {
    let w = src.width();
    let h = src.height();
    let data = src.data();

    let mut horizontal = vec![0u8; w * h];
    fill_rows(&mut horizontal, w, |y, row| {
        let line = &data[y * w..(y + 1) * w];
        for (x, out) in row.iter_mut().enumerate() {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(w - 1);
            *out = line[lo..=hi].iter().fold(op.identity(), |acc, &v| op.pick(acc, v));
        }
    });

    let mut out = vec![0u8; w * h];
    fill_rows(&mut out, w, |y, row| {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(h - 1);
        for (x, v) in row.iter_mut().enumerate() {
            *v = (lo..=hi).fold(op.identity(), |acc, yy| op.pick(acc, horizontal[yy * w + x]));
        }
    });

    RasterU8::from_parts(out, w, h, Channels::Gray)
}
