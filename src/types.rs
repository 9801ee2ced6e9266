//! The canonical data model: candidate maps, templates, and hints.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse physical classification assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    Unknown,
    Fuel,
    Ignition,
    Boost,
    Maf,
    Injector,
}

/// Element datatype, relevant only to the template-rescan path where
/// element width and signedness vary (1/2/4 bytes, signed/unsigned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    Signed,
    Unsigned,
}

/// A candidate calibration table found by the brute-force scanner or
/// enriched by a template-rescan hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedMap {
    pub id: Uuid,
    pub name: String,
    pub offset: usize,
    pub rows: usize,
    pub cols: usize,
    pub element_size: u8,
    pub values: Vec<u16>,
    pub axis_x: Option<Vec<f64>>,
    pub axis_y: Option<Vec<f64>>,
    pub score: f64,
    #[serde(rename = "type")]
    pub map_type: MapType,
    pub accepted: bool,

    // Template-enriched fields; only `Some` once a TemplateRescanner hit
    // has been attached to this candidate by the CandidateStore.
    pub datatype: Option<Datatype>,
    pub decimal_places: Option<u32>,
    pub units: Option<String>,
    pub raw_embedded_xml: Option<String>,
}

impl DetectedMap {
    /// Construct a brute-force candidate: fixed 16-bit unsigned elements,
    /// unaccepted, with no template enrichment.
    pub fn new_auto_detect(
        offset: usize,
        rows: usize,
        cols: usize,
        values: Vec<u16>,
        axis_x: Option<Vec<f64>>,
        axis_y: Option<Vec<f64>>,
        map_type: MapType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "AutoDetect".to_string(),
            offset,
            rows,
            cols,
            element_size: 2,
            values,
            axis_x,
            axis_y,
            score: 1.0,
            map_type,
            accepted: false,
            datatype: None,
            decimal_places: None,
            units: None,
            raw_embedded_xml: None,
        }
    }

    pub fn key(&self) -> MapKey {
        MapKey {
            offset: self.offset,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// Deduplication key: two candidates at the same (offset, rows, cols) are
/// the same detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapKey {
    pub offset: usize,
    pub rows: usize,
    pub cols: usize,
}

/// A known-map template harvested from a prior XDF definition. Only
/// `raw_xml` is consulted by the TemplateRescanner; the rest is metadata
/// for downstream consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub rows: Option<String>,
    #[serde(default)]
    pub cols: Option<String>,
    #[serde(default)]
    pub element_size_bits: Option<u32>,
    #[serde(default)]
    pub datatype: Option<Datatype>,
    pub raw_xml: String,
}

/// A disassembler's view of one function: its address range, the data it
/// references, and any labels local to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub start_address: u32,
    pub end_address: u32,
    #[serde(default)]
    pub data_refs: HashSet<u32>,
    #[serde(default)]
    pub labels: HashMap<String, u32>,
}

/// Optional symbolic hints used by the classifier as a negative signal:
/// an offset inside a function's body or data references is code- or
/// label-adjacent, not a calibration table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisassemblerHints {
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
    #[serde(default)]
    pub labels: HashMap<String, u32>,
}
