//! mapscout: locates calibration tables in ECU firmware images.
//!
//! Data flow: [`byte_image::ByteImage`] feeds both [`scanner::BruteScanner`]
//! and [`template_rescan`], whose results are merged and ordered by
//! [`store::CandidateStore`]. Everything here is a library; the CLI in
//! `main.rs` is the only consumer.

pub mod axis;
pub mod byte_image;
pub mod classifier;
pub mod correlation;
pub mod error;
pub mod io;
pub mod progress;
pub mod scanner;
pub mod store;
pub mod template_rescan;
pub mod types;
pub mod xdf;

pub use byte_image::ByteImage;
pub use error::{Error, Result};
pub use scanner::{BruteScanner, ScanConfig};
pub use store::CandidateStore;
pub use types::{DetectedMap, DisassemblerHints, MapType, Template};
