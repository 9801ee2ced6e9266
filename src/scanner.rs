//! Parallel brute-force offset × column search over a firmware image.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::axis::sniff_axes;
use crate::byte_image::ByteImage;
use crate::classifier::classify;
use crate::correlation::pearson;
use crate::progress::{tick, ProgressCounter};
use crate::types::{DetectedMap, DisassemblerHints, MapKey};

const ELEMENT_SIZE: usize = 2;
const CORRELATION_THRESHOLD: f64 = 0.85;
const PROGRESS_GRANULARITY: u64 = 10_000;

/// Configuration for the brute-force scan. Defaults match §4.5/§6.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub min_rows: usize,
    pub max_cols: usize,
    /// Worker count; `None` means "use available parallelism".
    pub workers: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_rows: 3,
            max_cols: 128,
            workers: None,
        }
    }
}

/// Parallel sliding-window enumerator of candidate tables.
pub struct BruteScanner {
    config: ScanConfig,
}

impl BruteScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    fn worker_count(&self) -> usize {
        self.config.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Run the scan, returning a deduplicated (but unordered) set of
    /// candidates. Callers that want the §4.5 "score descending" display
    /// order should hand the result to
    /// [`crate::store::CandidateStore`].
    pub fn scan(
        &self,
        image: &ByteImage,
        hints: Option<&DisassemblerHints>,
        progress: Option<&ProgressCounter>,
    ) -> Vec<DetectedMap> {
        let min_rows = self.config.min_rows;
        let max_cols = self.config.max_cols;

        // The smallest image that can hold even a single (cols=2) table is
        // `elementSize*minRows*2` bytes; `limit` generously over-estimates
        // how far the outer offset loop needs to run; offsets near the tail
        // simply fail every `cols` in the inner loop and cost nothing.
        let limit = image.size().saturating_sub(ELEMENT_SIZE * min_rows);
        if limit == 0 {
            info!(size = image.size(), "image too small to hold a single row pair, skipping scan");
            return Vec::new();
        }

        let workers = self.worker_count().max(1);
        let chunk_size = (limit / workers).max(1);
        let overlap = (max_cols * min_rows * ELEMENT_SIZE).min(4096);

        let mut ranges = Vec::with_capacity(workers);
        for i in 0..workers {
            let start = i * chunk_size;
            if start >= limit {
                break;
            }
            let end = if i + 1 == workers {
                limit
            } else {
                limit.min(start + chunk_size + overlap)
            };
            if end > start {
                ranges.push((start, end));
            }
        }

        info!(
            workers,
            chunk_size,
            overlap,
            ranges = ranges.len(),
            limit,
            "starting brute-force scan"
        );

        let all: Vec<DetectedMap> = ranges
            .par_iter()
            .flat_map(|&(start, end)| scan_range(image, start, end, min_rows, max_cols, hints, progress))
            .collect();

        dedup_by_key(all)
    }
}

fn scan_range(
    image: &ByteImage,
    start: usize,
    end: usize,
    min_rows: usize,
    max_cols: usize,
    hints: Option<&DisassemblerHints>,
    progress: Option<&ProgressCounter>,
) -> Vec<DetectedMap> {
    let mut local = Vec::new();
    let mut visited_since_tick = 0u64;

    for offset in start..end {
        for cols in 2..=max_cols {
            if offset + cols * min_rows * ELEMENT_SIZE > image.size() {
                break;
            }

            let arr = match image.read_u16_le_array(offset, cols * min_rows) {
                Ok(arr) => arr,
                Err(_) => continue,
            };

            if !rows_are_correlated(&arr, min_rows, cols) {
                continue;
            }

            let (axis_x, axis_y) = sniff_axes(image, offset, min_rows, cols);
            let map_type = classify(&arr, axis_x.as_deref(), hints, offset);

            debug!(offset, cols, ?map_type, "accepted candidate");
            local.push(DetectedMap::new_auto_detect(
                offset, min_rows, cols, arr, axis_x, axis_y, map_type,
            ));
        }

        visited_since_tick += 1;
        if visited_since_tick >= PROGRESS_GRANULARITY {
            if let Some(progress) = progress {
                tick(progress, visited_since_tick);
            }
            visited_since_tick = 0;
        }
    }

    if let Some(progress) = progress {
        if visited_since_tick > 0 {
            tick(progress, visited_since_tick);
        }
    }

    local
}

fn rows_are_correlated(arr: &[u16], min_rows: usize, cols: usize) -> bool {
    let as_f64: Vec<f64> = arr.iter().map(|&v| v as f64).collect();
    for r in 0..min_rows.saturating_sub(1) {
        let row_a = &as_f64[r * cols..(r + 1) * cols];
        let row_b = &as_f64[(r + 1) * cols..(r + 2) * cols];
        if pearson(row_a, row_b).abs() < CORRELATION_THRESHOLD {
            return false;
        }
    }
    true
}

/// Deduplicate by `(offset, rows, cols)`, keeping one representative per key.
pub fn dedup_by_key(maps: Vec<DetectedMap>) -> Vec<DetectedMap> {
    let mut seen = std::collections::HashSet::<MapKey>::new();
    let mut out = Vec::with_capacity(maps.len());
    for map in maps {
        if seen.insert(map.key()) {
            out.push(map);
        }
    }
    out
}
