//! Shared atomic progress counter for the parallel brute-force scan.
//!
//! Workers increment the counter as they visit offsets; a consumer (the CLI)
//! polls it on a timer to drive a progress bar without coupling the scanner
//! to any particular UI. Purely advisory: nothing in the core reads it back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type ProgressCounter = Arc<AtomicU64>;

pub fn new_counter() -> ProgressCounter {
    Arc::new(AtomicU64::new(0))
}

#[inline]
pub fn tick(counter: &ProgressCounter, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

#[inline]
pub fn load(counter: &ProgressCounter) -> u64 {
    counter.load(Ordering::Relaxed)
}
