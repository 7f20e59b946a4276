//! Marker-based flooding.

use std::collections::VecDeque;

use crate::image::RasterU8;
use crate::util::{RasterError, RasterResult};

/// Per-pixel region labels produced by the flood.
///
/// [`MarkerMap::UNKNOWN`] marks pixels not yet assigned,
/// [`MarkerMap::BOUNDARY`] marks pixels where regions meet, and labels
/// `>= 1` identify regions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerMap {
    labels: Vec<i32>,
    width: usize,
    height: usize,
}

impl MarkerMap {
    pub const UNKNOWN: i32 = 0;
    pub const BOUNDARY: i32 = -1;

    /// Wraps a label buffer; labels below -1 are rejected.
    pub fn new(labels: Vec<i32>, width: usize, height: usize) -> RasterResult<Self> {
        if width == 0 || height == 0 || width.checked_mul(height) != Some(labels.len()) {
            return Err(RasterError::InvalidInput {
                reason: "marker buffer length does not match width * height",
            });
        }
        if labels.iter().any(|&l| l < Self::BOUNDARY) {
            return Err(RasterError::InvalidInput {
                reason: "marker labels must be >= -1",
            });
        }
        Ok(Self {
            labels,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<i32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.labels.get(y * self.width + x).copied()
    }

    /// Largest region label present.
    pub fn region_count(&self) -> usize {
        self.labels.iter().copied().max().unwrap_or(0).max(0) as usize
    }

    pub fn boundary_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == Self::BOUNDARY).count()
    }
}

const LEVELS: usize = 256;

/// Grows the seeded labels over unknown pixels in order of elevation.
///
/// Pixels are taken from 256 FIFO buckets, lowest elevation first. A pixel
/// whose labeled 4-neighbors all agree takes that label and enqueues its
/// unknown neighbors; a pixel touching two labels becomes a boundary. Unknown
/// pixels stranded next to a boundary are absorbed into it, so no boundary
/// pixel remains adjacent to an unknown one.
pub fn flood(markers: &mut MarkerMap, elevation: &RasterU8) -> RasterResult<()> {
    elevation.ensure_gray("elevation")?;
    if elevation.width() != markers.width || elevation.height() != markers.height {
        return Err(RasterError::InvalidInput {
            reason: "elevation and markers differ in shape",
        });
    }
    let w = markers.width;
    let h = markers.height;
    let level = elevation.data();
    let labels = &mut markers.labels;

    let mut buckets = Buckets::new(w * h);
    for idx in 0..w * h {
        if labels[idx] > 0 {
            buckets.push_unknown_neighbors(idx, labels, level, w, h);
        }
    }

    while let Some(idx) = buckets.pop() {
        let mut found = MarkerMap::UNKNOWN;
        for n in neighbors4(idx, w, h).into_iter().flatten() {
            let l = labels[n];
            if l <= 0 {
                continue;
            }
            if found == MarkerMap::UNKNOWN {
                found = l;
            } else if found != l {
                found = MarkerMap::BOUNDARY;
                break;
            }
        }
        labels[idx] = found;
        if found > 0 {
            buckets.push_unknown_neighbors(idx, labels, level, w, h);
        }
    }

    absorb_stranded(labels, w, h);
    Ok(())
}

/// One FIFO queue per elevation level.
struct Buckets {
    queues: Vec<VecDeque<usize>>,
    queued: Vec<bool>,
    current: usize,
}

impl Buckets {
    fn new(len: usize) -> Self {
        Self {
            queues: (0..LEVELS).map(|_| VecDeque::new()).collect(),
            queued: vec![false; len],
            current: LEVELS,
        }
    }

    fn push_unknown_neighbors(&mut self, idx: usize, labels: &[i32], level: &[u8], w: usize, h: usize) {
        for n in neighbors4(idx, w, h).into_iter().flatten() {
            if labels[n] == MarkerMap::UNKNOWN && !self.queued[n] {
                self.queued[n] = true;
                let l = usize::from(level[n]);
                self.queues[l].push_back(n);
                self.current = self.current.min(l);
            }
        }
    }

    fn pop(&mut self) -> Option<usize> {
        while self.current < LEVELS {
            if let Some(idx) = self.queues[self.current].pop_front() {
                return Some(idx);
            }
            self.current += 1;
        }
        None
    }
}

fn neighbors4(idx: usize, w: usize, h: usize) -> [Option<usize>; 4] {
    let (x, y) = (idx % w, idx / w);
    [
        (y > 0).then(|| idx - w),
        (x > 0).then(|| idx - 1),
        (x + 1 < w).then(|| idx + 1),
        (y + 1 < h).then(|| idx + w),
    ]
}

fn absorb_stranded(labels: &mut [i32], w: usize, h: usize) {
    let touches_boundary = |labels: &[i32], idx: usize| {
        let (x, y) = (idx % w, idx / w);
        (y.saturating_sub(1)..(y + 2).min(h)).any(|ny| {
            (x.saturating_sub(1)..(x + 2).min(w))
                .any(|nx| labels[ny * w + nx] == MarkerMap::BOUNDARY)
        })
    };

    let mut queue: VecDeque<usize> = (0..w * h)
        .filter(|&i| labels[i] == MarkerMap::UNKNOWN && touches_boundary(labels, i))
        .collect();
    for &i in &queue {
        labels[i] = MarkerMap::BOUNDARY;
    }
    while let Some(idx) = queue.pop_front() {
        let (x, y) = (idx % w, idx / w);
        for ny in y.saturating_sub(1)..(y + 2).min(h) {
            for nx in x.saturating_sub(1)..(x + 2).min(w) {
                let n = ny * w + nx;
                if labels[n] == MarkerMap::UNKNOWN {
                    labels[n] = MarkerMap::BOUNDARY;
                    queue.push_back(n);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{flood, MarkerMap};
    use crate::image::RasterU8;

    #[test]
    fn two_seeds_meet_at_a_ridge() {
        // Seeds at both ends of a row; the ridge at x = 3 is the highest level.
        let elevation = RasterU8::gray(vec![0, 10, 20, 90, 20, 10, 0], 7, 1).unwrap();
        let mut markers = MarkerMap::new(vec![1, 0, 0, 0, 0, 0, 2], 7, 1).unwrap();
        flood(&mut markers, &elevation).unwrap();
        assert_eq!(markers.labels(), &[1, 1, 1, -1, 2, 2, 2]);
        assert_eq!(markers.region_count(), 2);
        assert_eq!(markers.boundary_count(), 1);
    }

    #[test]
    fn single_seed_fills_everything() {
        let elevation = RasterU8::gray(vec![5; 12], 4, 3).unwrap();
        let mut labels = vec![0; 12];
        labels[5] = 1;
        let mut markers = MarkerMap::new(labels, 4, 3).unwrap();
        flood(&mut markers, &elevation).unwrap();
        assert!(markers.labels().iter().all(|&l| l == 1));
    }

    #[test]
    fn rejects_labels_below_boundary() {
        assert!(MarkerMap::new(vec![0, -2], 2, 1).is_err());
    }
}
