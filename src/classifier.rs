//! Coarse rule-based labelling of a candidate table's physical meaning.

use crate::correlation::{mean, min_max};
use crate::types::{DisassemblerHints, MapType};

/// Below this cell count a low-value table is too small to tell a real
/// fuel map apart from an ordinary small-sample lookup table; at exactly
/// `minRows * 2` cells (the smallest shape the scanner ever emits) the
/// low-mean/low-max rule is not enough signal on its own.
const MIN_FUEL_CELLS: usize = 8;

fn is_hint_adjacent(hints: &DisassemblerHints, offset: usize) -> bool {
    let offset = offset as u32;
    let near_function = hints.functions.iter().any(|f| {
        f.data_refs.contains(&offset) || (f.start_address..=f.end_address).contains(&offset)
    });
    let near_label = hints.labels.values().any(|&addr| addr == offset);
    near_function || near_label
}

/// Classify a candidate table. Rules are evaluated top-to-bottom; the first
/// match wins. Pure function: identical inputs always produce the same
/// label.
pub fn classify(
    values: &[u16],
    axis_x: Option<&[f64]>,
    hints: Option<&DisassemblerHints>,
    offset: usize,
) -> MapType {
    let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    let (_, max_value) = min_max(&as_f64);
    let mean_value = mean(&as_f64);

    if max_value > 15000.0 {
        return MapType::Ignition;
    }

    if values.len() >= MIN_FUEL_CELLS && mean_value < 50.0 && max_value < 3000.0 {
        return MapType::Fuel;
    }

    if let Some(axis) = axis_x {
        if let Some(&first) = axis.first() {
            if first > 1000.0 {
                return MapType::Maf;
            }
        }
    }

    if let Some(hints) = hints {
        if is_hint_adjacent(hints, offset) {
            return MapType::Unknown;
        }
    }

    MapType::Unknown
}
