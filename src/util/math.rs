//! Numeric helpers shared by the filters and converters.

/// Rounds to the nearest integer and saturates into `[0, 255]`.
///
/// NaN maps to 0.
#[inline]
pub(crate) fn saturate_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Clamps a signed coordinate into `[0, len - 1]` (replicate border).
#[inline]
pub(crate) fn clamp_index(idx: isize, len: usize) -> usize {
    if idx <= 0 {
        0
    } else if idx as usize >= len {
        len - 1
    } else {
        idx as usize
    }
}

/// Checks that a kernel or block size is odd and within `[min, max]`.
pub(crate) fn is_odd_in_range(size: usize, min: usize, max: usize) -> bool {
    size % 2 == 1 && size >= min && size <= max
}
