//! Border following over binary rasters with nesting hierarchy.
//!
//! Implements Suzuki–Abe topological border following. The binary map is
//! surrounded by a virtual one-pixel background frame, so foreground touching
//! the raster edge still gets a closed outer border. Borders are traced with
//! 8-connectivity; each contour starts at its first pixel in raster order
//! and keeps one orientation throughout.

use std::str::FromStr;

use crate::image::{RasterU8, Rect};
use crate::trace::{trace_event, trace_span};
use crate::util::{RasterError, RasterResult};

/// Integer pixel coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Whether a border separates a component from its surrounding background
/// or surrounds a hole inside a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderKind {
    Outer,
    Hole,
}

/// A traced closed boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    /// Boundary pixels in tracing order.
    pub points: Vec<Point>,
    pub kind: BorderKind,
    /// Index of the enclosing contour in the same set; `None` at top level.
    pub parent: Option<usize>,
}

impl Contour {
    /// Returns true for hole borders.
    pub fn is_hole(&self) -> bool {
        self.kind == BorderKind::Hole
    }

    /// Area enclosed by the polygon through the pixel centers (shoelace).
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0f64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
        }
        twice.abs() * 0.5
    }

    /// Smallest rectangle containing every boundary pixel.
    pub fn bounding_box(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::default();
        };
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Rect {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        }
    }
}

/// Contours in discovery order plus their parent table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContourSet {
    contours: Vec<Contour>,
}

impl ContourSet {
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Contour> {
        self.contours.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.contours.iter()
    }

    pub fn as_slice(&self) -> &[Contour] {
        &self.contours
    }

    /// Parent index of every contour, `None` for top-level contours.
    pub fn parents(&self) -> Vec<Option<usize>> {
        self.contours.iter().map(|c| c.parent).collect()
    }

    /// Indices of the direct children of `index`.
    pub fn children(&self, index: usize) -> Vec<usize> {
        self.contours
            .iter()
            .enumerate()
            .filter(|(_, c)| c.parent == Some(index))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Which contours to keep and how to link them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Only outermost outer borders; no hierarchy.
    External,
    /// Every border, flattened (no parents).
    List,
    /// Every border with full nesting.
    #[default]
    Tree,
}

impl FromStr for RetrievalMode {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "external" => Ok(RetrievalMode::External),
            "list" => Ok(RetrievalMode::List),
            "tree" => Ok(RetrievalMode::Tree),
            _ => Err(RasterError::unsupported(
                "retrieval",
                "expected external, list or tree",
            )),
        }
    }
}

// Clockwise neighbor offsets (y grows downward), starting west.
const OFFSETS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];
const EAST: usize = 4;
// Index into OFFSETS for `(dy + 1) * 3 + (dx + 1)`; the center is unused.
const OFFSET_INDEX: [usize; 9] = [1, 2, 3, 0, 0, 4, 7, 6, 5];

fn offset_index(dx: isize, dy: isize) -> usize {
    OFFSET_INDEX[((dy + 1) * 3 + (dx + 1)) as usize]
}

/// Traces every border of the binary map (non-zero = foreground).
///
/// Input with no background or no foreground pixels yields an empty set.
pub fn find_contours(binary: &RasterU8, mode: RetrievalMode) -> RasterResult<ContourSet> {
    binary.ensure_gray("input")?;
    let _span = trace_span!("find_contours", width = binary.width(), height = binary.height())
        .entered();

    let any_fg = binary.data().iter().any(|&v| v != 0);
    let any_bg = binary.data().iter().any(|&v| v == 0);
    if !any_fg || !any_bg {
        return Ok(ContourSet::default());
    }

    let traced = trace_borders(binary);
    let contours = match mode {
        RetrievalMode::Tree => traced,
        RetrievalMode::List => traced
            .into_iter()
            .map(|c| Contour { parent: None, ..c })
            .collect(),
        RetrievalMode::External => traced
            .into_iter()
            .filter(|c| c.kind == BorderKind::Outer && c.parent.is_none())
            .collect(),
    };

    trace_event!("contours_found", count = contours.len());
    Ok(ContourSet { contours })
}

fn trace_borders(binary: &RasterU8) -> Vec<Contour> {
    let w = binary.width();
    let h = binary.height();
    let pw = w + 2;
    let ph = h + 2;
    let mut f = vec![0i32; pw * ph];
    for y in 0..h {
        for x in 0..w {
            if binary.data()[y * w + x] != 0 {
                f[(y + 1) * pw + x + 1] = 1;
            }
        }
    }

    let mut contours: Vec<Contour> = Vec::new();
    // Border number 1 is the virtual frame; contour `k` has number `k + 2`.
    let mut nbd = 1i32;

    for y in 1..ph - 1 {
        let mut lnbd = 1i32;
        for x in 1..pw - 1 {
            let idx = y * pw + x;
            let v = f[idx];
            if v == 0 {
                continue;
            }

            let start = if v == 1 && f[idx - 1] == 0 {
                Some((x - 1, BorderKind::Outer))
            } else if v >= 1 && f[idx + 1] == 0 {
                if v > 1 {
                    lnbd = v;
                }
                Some((x + 1, BorderKind::Hole))
            } else {
                None
            };

            if let Some((adj_x, kind)) = start {
                nbd += 1;
                let parent = parent_of(&contours, lnbd, kind);
                let points = follow(&mut f, pw, (x, y), (adj_x, y), nbd);
                contours.push(Contour {
                    points,
                    kind,
                    parent,
                });
            }

            let v = f[idx];
            if v != 1 {
                lnbd = v.abs();
            }
        }
    }
    contours
}

fn parent_of(contours: &[Contour], lnbd: i32, kind: BorderKind) -> Option<usize> {
    if lnbd <= 1 {
        // The frame behaves as a hole border with no parent.
        return None;
    }
    let prev = (lnbd - 2) as usize;
    let prev_contour = contours.get(prev)?;
    if kind != prev_contour.kind {
        Some(prev)
    } else {
        prev_contour.parent
    }
}

/// Follows one border starting at `start`, with `adj` the background
/// neighbor that triggered it. Marks visited pixels with `±nbd` and returns
/// the boundary in unpadded coordinates.
fn follow(
    f: &mut [i32],
    pw: usize,
    start: (usize, usize),
    adj: (usize, usize),
    nbd: i32,
) -> Vec<Point> {
    let at = |p: (usize, usize)| p.1 * pw + p.0;
    let step = |p: (usize, usize), k: usize| {
        let (dx, dy) = OFFSETS[k];
        ((p.0 as isize + dx) as usize, (p.1 as isize + dy) as usize)
    };
    let dir = |from: (usize, usize), to: (usize, usize)| {
        offset_index(
            to.0 as isize - from.0 as isize,
            to.1 as isize - from.1 as isize,
        )
    };

    let unpad = |p: (usize, usize)| Point::new(p.0 - 1, p.1 - 1);

    // Clockwise search around the start for the first foreground neighbor.
    let s = dir(start, adj);
    let first = (0..8)
        .map(|k| step(start, (s + k) % 8))
        .find(|&p| f[at(p)] != 0);
    let Some(pos1) = first else {
        f[at(start)] = -nbd;
        return vec![unpad(start)];
    };

    let mut points = Vec::new();
    let mut pos2 = pos1;
    let mut pos3 = start;
    loop {
        points.push(unpad(pos3));

        // Counter-clockwise search starting just after pos2.
        let d = dir(pos3, pos2);
        let mut east_examined = false;
        let mut pos4 = pos2;
        for k in 1..=8 {
            let kk = (d + 8 - k) % 8;
            let p = step(pos3, kk);
            if f[at(p)] != 0 {
                pos4 = p;
                break;
            }
            if kk == EAST {
                east_examined = true;
            }
        }

        let i3 = at(pos3);
        if east_examined {
            f[i3] = -nbd;
        } else if f[i3] == 1 {
            f[i3] = nbd;
        }

        if pos4 == start && pos3 == pos1 {
            break;
        }
        pos2 = pos3;
        pos3 = pos4;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::{find_contours, BorderKind, Point, RetrievalMode};
    use crate::image::{RasterU8, Rect};

    fn canvas(width: usize, height: usize, fill: &[(usize, usize, usize, usize, u8)]) -> RasterU8 {
        let mut data = vec![0u8; width * height];
        for &(x0, y0, w, h, v) in fill {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    data[y * width + x] = v;
                }
            }
        }
        RasterU8::gray(data, width, height).unwrap()
    }

    #[test]
    fn filled_square_has_one_outer_border() {
        let img = canvas(10, 10, &[(2, 2, 5, 5, 255)]);
        let set = find_contours(&img, RetrievalMode::Tree).unwrap();
        assert_eq!(set.len(), 1);
        let c = set.get(0).unwrap();
        assert_eq!(c.kind, BorderKind::Outer);
        assert_eq!(c.parent, None);
        assert_eq!(c.points.len(), 16);
        assert_eq!(c.points[0], Point::new(2, 2));
        assert_eq!(
            c.bounding_box(),
            Rect {
                x: 2,
                y: 2,
                width: 5,
                height: 5
            }
        );
        assert!((c.area() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn single_pixel_is_a_one_point_contour() {
        let img = canvas(5, 5, &[(2, 2, 1, 1, 1)]);
        let set = find_contours(&img, RetrievalMode::Tree).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().points, vec![Point::new(2, 2)]);
    }

    #[test]
    fn nested_ring_builds_three_levels() {
        // 9x9 block, 5x5 hole, one pixel island in the middle of the hole.
        let img = canvas(13, 13, &[(2, 2, 9, 9, 255), (4, 4, 5, 5, 0), (6, 6, 1, 1, 255)]);
        let set = find_contours(&img, RetrievalMode::Tree).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.parents(), vec![None, Some(0), Some(1)]);
        assert_eq!(set.get(1).unwrap().kind, BorderKind::Hole);
        assert_eq!(set.children(0), vec![1]);

        let external = find_contours(&img, RetrievalMode::External).unwrap();
        assert_eq!(external.len(), 1);
        let list = find_contours(&img, RetrievalMode::List).unwrap();
        assert!(list.parents().iter().all(Option::is_none));
    }

    #[test]
    fn foreground_touching_the_edge_is_closed() {
        let img = canvas(6, 4, &[(0, 0, 3, 4, 255)]);
        let set = find_contours(&img, RetrievalMode::Tree).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().bounding_box().height, 4);
    }

    #[test]
    fn uniform_inputs_yield_nothing() {
        let empty = canvas(4, 4, &[]);
        let full = canvas(4, 4, &[(0, 0, 4, 4, 255)]);
        assert!(find_contours(&empty, RetrievalMode::Tree).unwrap().is_empty());
        assert!(find_contours(&full, RetrievalMode::Tree).unwrap().is_empty());
    }
}
