//! Overlay rendering onto RGB copies of an input.

use crate::color::gray_to_rgb;
use crate::contour::ContourSet;
use crate::image::{Channels, RasterU8, Rect};
use crate::segment::MarkerMap;
use crate::util::{RasterError, RasterResult};

/// Mutable RGB buffer with square-brush drawing.
struct Canvas {
    data: Vec<u8>,
    width: usize,
    height: usize,
    color: [u8; 3],
    lo: isize,
    hi: isize,
}

impl Canvas {
    /// The brush spans exactly `thickness` pixels per axis; even widths
    /// extend one pixel further right and down.
    fn new(src: &RasterU8, color: [u8; 3], thickness: usize) -> Self {
        let rgb = gray_to_rgb(src);
        let t = thickness.max(1) as isize;
        Self {
            width: rgb.width(),
            height: rgb.height(),
            data: rgb.into_data(),
            color,
            lo: -(t - 1) / 2,
            hi: t / 2,
        }
    }

    fn stamp(&mut self, x: isize, y: isize) {
        for py in y + self.lo..=y + self.hi {
            for px in x + self.lo..=x + self.hi {
                if px < 0 || py < 0 || px >= self.width as isize || py >= self.height as isize {
                    continue;
                }
                let i = (py as usize * self.width + px as usize) * 3;
                self.data[i..i + 3].copy_from_slice(&self.color);
            }
        }
    }

    /// Bresenham segment, both ends inclusive.
    fn line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize)) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;
        loop {
            self.stamp(x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn finish(self) -> RasterU8 {
        RasterU8::from_parts(self.data, self.width, self.height, Channels::Rgb)
    }
}

/// Draws every contour as a closed polyline on an RGB copy of `src`.
pub fn draw_contours(
    src: &RasterU8,
    contours: &ContourSet,
    color: [u8; 3],
    thickness: usize,
) -> RasterU8 {
    let mut canvas = Canvas::new(src, color, thickness);
    for contour in contours.iter() {
        let pts = &contour.points;
        for (i, p) in pts.iter().enumerate() {
            let q = pts[(i + 1) % pts.len()];
            canvas.line(
                (p.x as isize, p.y as isize),
                (q.x as isize, q.y as isize),
            );
        }
    }
    canvas.finish()
}

/// Outlines `rect` on an RGB copy of `src`.
pub fn draw_rect(src: &RasterU8, rect: Rect, color: [u8; 3], thickness: usize) -> RasterU8 {
    let mut canvas = Canvas::new(src, color, thickness);
    if rect.width > 0 && rect.height > 0 {
        let x0 = rect.x as isize;
        let y0 = rect.y as isize;
        let x1 = x0 + rect.width as isize - 1;
        let y1 = y0 + rect.height as isize - 1;
        canvas.line((x0, y0), (x1, y0));
        canvas.line((x1, y0), (x1, y1));
        canvas.line((x1, y1), (x0, y1));
        canvas.line((x0, y1), (x0, y0));
    }
    canvas.finish()
}

/// Recolors boundary pixels of `markers` on an RGB copy of `src`.
pub fn paint_boundaries(src: &RasterU8, markers: &MarkerMap, color: [u8; 3]) -> RasterResult<RasterU8> {
    if src.width() != markers.width() || src.height() != markers.height() {
        return Err(RasterError::InvalidInput {
            reason: "markers and raster differ in shape",
        });
    }
    let mut canvas = Canvas::new(src, color, 1);
    for (idx, &label) in markers.labels().iter().enumerate() {
        if label == MarkerMap::BOUNDARY {
            canvas.stamp((idx % canvas.width) as isize, (idx / canvas.width) as isize);
        }
    }
    Ok(canvas.finish())
}
