//! Ranked candidate collection and spatial suppression for score maps.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Score-map position with its raw score and a higher-is-better rank key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Peak {
    pub x: usize,
    pub y: usize,
    pub score: f32,
    pub key: f32,
}

/// Best first: key descending, then row, then column.
fn peak_cmp_desc(a: &Peak, b: &Peak) -> Ordering {
    b.key
        .total_cmp(&a.key)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

fn sort_peaks_desc(peaks: &mut [Peak]) {
    peaks.sort_by(peak_cmp_desc);
}

// Heap entry whose maximum is the worst kept peak.
struct Worst(Peak);

impl PartialEq for Worst {
    fn eq(&self, other: &Self) -> bool {
        peak_cmp_desc(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for Worst {}

impl PartialOrd for Worst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Worst {
    fn cmp(&self, other: &Self) -> Ordering {
        peak_cmp_desc(&self.0, &other.0)
    }
}

/// Keeps the `k` best peaks seen so far.
pub(crate) struct TopK {
    k: usize,
    heap: BinaryHeap<Worst>,
}

impl TopK {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::new(),
        }
    }

    /// Pushes a peak, evicting the worst one when at capacity.
    pub(crate) fn push(&mut self, peak: Peak) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(Worst(peak));
            return;
        }
        let better = self
            .heap
            .peek()
            .is_some_and(|worst| peak_cmp_desc(&peak, &worst.0) == Ordering::Less);
        if better {
            self.heap.pop();
            self.heap.push(Worst(peak));
        }
    }

    pub(crate) fn into_sorted_desc(self) -> Vec<Peak> {
        let mut items: Vec<Peak> = self.heap.into_iter().map(|w| w.0).collect();
        sort_peaks_desc(&mut items);
        items
    }
}

/// Greedy non-maximum suppression with Chebyshev distance.
///
/// Peaks are visited best first and kept when farther than `radius` from
/// every previously kept peak. Stops after `limit` peaks are kept.
pub(crate) fn nms_2d(peaks: &mut [Peak], radius: usize, limit: usize) -> Vec<Peak> {
    sort_peaks_desc(peaks);
    let mut kept: Vec<Peak> = Vec::new();

    'outer: for peak in peaks.iter().copied() {
        if kept.len() == limit {
            break;
        }
        for other in &kept {
            let dx = peak.x.abs_diff(other.x);
            let dy = peak.y.abs_diff(other.y);
            if dx.max(dy) <= radius {
                continue 'outer;
            }
        }
        kept.push(peak);
    }
    kept
}
