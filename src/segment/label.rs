//! Connected-component labeling.

use crate::image::RasterU8;
use crate::util::RasterResult;

/// Labels the 8-connected components of the non-zero pixels.
///
/// Background pixels get 0; components get `1..=count` in the raster order
/// of their first pixel. Returns the label buffer and the component count.
pub fn label_components(binary: &RasterU8) -> RasterResult<(Vec<i32>, usize)> {
    binary.ensure_gray("input")?;
    let w = binary.width();
    let h = binary.height();
    let data = binary.data();
    let mut labels = vec![0i32; w * h];
    let mut next = 0i32;
    let mut stack = Vec::new();

    for start in 0..w * h {
        if data[start] == 0 || labels[start] != 0 {
            continue;
        }
        next += 1;
        labels[start] = next;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            for ny in y.saturating_sub(1)..(y + 2).min(h) {
                for nx in x.saturating_sub(1)..(x + 2).min(w) {
                    let n = ny * w + nx;
                    if data[n] != 0 && labels[n] == 0 {
                        labels[n] = next;
                        stack.push(n);
                    }
                }
            }
        }
    }
    Ok((labels, next as usize))
}
