//! Probes the bytes around a candidate table for axis breakpoint vectors.

use crate::byte_image::ByteImage;

/// A vector is monotonic if every adjacent pair is non-decreasing, or every
/// adjacent pair is non-increasing (equality satisfies both directions).
fn is_monotonic(values: &[f64]) -> bool {
    if values.len() < 2 {
        return true;
    }
    let non_decreasing = values.windows(2).all(|w| w[0] <= w[1]);
    let non_increasing = values.windows(2).all(|w| w[0] >= w[1]);
    non_decreasing || non_increasing
}

/// Read `length` little-endian u16 values at `offset` and return them as an
/// axis vector if they form a monotonic sequence. Out-of-bounds trials are
/// treated as a miss, not an error.
fn try_axis(image: &ByteImage, offset: usize, length: usize) -> Option<Vec<f64>> {
    let raw = image.read_u16_le_array(offset, length).ok()?;
    let values: Vec<f64> = raw.iter().map(|&v| v as f64).collect();
    if is_monotonic(&values) {
        Some(values)
    } else {
        None
    }
}

/// The first y-axis trial offset per spec §4.3: `max(0, offset - rows*2) -
/// max(0, rows*2)`. When `offset` is small this can be algebraically
/// negative; that is treated as an out-of-bounds trial (no hit), preserving
/// the original tool's quirky but specified behavior rather than silently
/// re-clamping it to zero.
fn y_trial_primary(offset: usize, rows: usize) -> Option<usize> {
    let step = (rows as i64) * 2;
    let clamped = (offset as i64 - step).max(0);
    let result = clamped - step;
    if result < 0 {
        None
    } else {
        Some(result as usize)
    }
}

fn y_trial_secondary(offset: usize, rows: usize) -> usize {
    let step = (rows as i64) * 2;
    (offset as i64 - step).max(0) as usize
}

/// Probe for X and Y axis breakpoint vectors around a candidate table.
///
/// X-axis trials (first monotonic hit wins): immediately after the table
/// body, then one further column-width past that. Y-axis trials: a
/// deliberately quirky primary offset (see `y_trial_primary`), then simply
/// before the table body.
pub fn sniff_axes(
    image: &ByteImage,
    offset: usize,
    rows: usize,
    cols: usize,
) -> (Option<Vec<f64>>, Option<Vec<f64>>) {
    let body_bytes = rows * cols * 2;

    let axis_x = try_axis(image, offset + body_bytes, cols)
        .or_else(|| try_axis(image, offset + body_bytes + cols * 2, cols));

    let axis_y = y_trial_primary(offset, rows)
        .and_then(|trial| try_axis(image, trial, rows))
        .or_else(|| try_axis(image, y_trial_secondary(offset, rows), rows));

    (axis_x, axis_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_u16_bytes(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn monotonic_non_decreasing_is_detected() {
        assert!(is_monotonic(&[1.0, 1.0, 2.0, 5.0]));
    }

    #[test]
    fn monotonic_non_increasing_is_detected() {
        assert!(is_monotonic(&[5.0, 5.0, 2.0, 1.0]));
    }

    #[test]
    fn non_monotonic_is_rejected() {
        assert!(!is_monotonic(&[1.0, 5.0, 2.0]));
    }

    #[test]
    fn single_and_empty_vectors_are_trivially_monotonic() {
        assert!(is_monotonic(&[]));
        assert!(is_monotonic(&[42.0]));
    }

    #[test]
    fn x_axis_is_found_immediately_after_table_body() {
        let mut bytes = le_u16_bytes(&[10, 20, 11, 21, 12, 22]); // 3x2 table
        bytes.extend(le_u16_bytes(&[100, 200])); // x axis
        let image = ByteImage::new(bytes);
        let (axis_x, axis_y) = sniff_axes(&image, 0, 3, 2);
        assert_eq!(axis_x, Some(vec![100.0, 200.0]));
        assert_eq!(axis_y, None);
    }

    #[test]
    fn x_axis_falls_back_to_secondary_trial() {
        let mut bytes = le_u16_bytes(&[10, 20, 11, 21, 12, 22]); // 3x2 table
        bytes.extend(le_u16_bytes(&[5, 1])); // non-monotonic primary trial
        bytes.extend(le_u16_bytes(&[100, 200])); // monotonic secondary trial
        let image = ByteImage::new(bytes);
        let (axis_x, _) = sniff_axes(&image, 0, 3, 2);
        assert_eq!(axis_x, Some(vec![100.0, 200.0]));
    }

    #[test]
    fn out_of_bounds_trials_are_treated_as_misses() {
        let bytes = le_u16_bytes(&[10, 20, 11, 21, 12, 22]);
        let image = ByteImage::new(bytes);
        let (axis_x, axis_y) = sniff_axes(&image, 0, 3, 2);
        assert_eq!(axis_x, None);
        assert_eq!(axis_y, None);
    }

    #[test]
    fn y_trial_primary_negative_for_small_offsets_is_no_hit() {
        assert_eq!(y_trial_primary(4, 3), None);
    }

    #[test]
    fn y_trial_secondary_clamps_to_zero() {
        assert_eq!(y_trial_secondary(4, 3), 0);
    }
}
