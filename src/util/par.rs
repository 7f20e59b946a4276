//! Row-wise output filling, parallel when the `rayon` feature is enabled.
//!
//! Each closure call receives a row index and the exclusive output slice for
//! that row, so every output element is written exactly once and the result
//! does not depend on scheduling.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Fills `out` row by row, `row_len` elements per row.
pub(crate) fn fill_rows<T, F>(out: &mut [T], row_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if row_len == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    out.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));

    #[cfg(not(feature = "rayon"))]
    out.chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}
