//! The canonical post-processing step: deduplicate, enrich with template
//! hits, and present candidates in a stable, user-facing order.

use regex::Regex;
use tracing::debug;

use crate::scanner::dedup_by_key;
use crate::types::{Datatype, DetectedMap};

/// Holds a scan's candidates and applies the merge/ordering contract before
/// handing results to a consumer (CLI, viewer, tests).
#[derive(Debug, Default)]
pub struct CandidateStore {
    maps: Vec<DetectedMap>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self { maps: Vec::new() }
    }

    /// Seed the store from a scanner's raw (already deduplicated) output.
    pub fn from_maps(maps: Vec<DetectedMap>) -> Self {
        Self {
            maps: dedup_by_key(maps),
        }
    }

    pub fn maps(&self) -> &[DetectedMap] {
        &self.maps
    }

    /// Attach rescanned template XML to any candidate at a matching offset
    /// whose dimensions agree with the template's declared `colcount`/
    /// `rowcount`. Hits that match no existing candidate are dropped by this
    /// step but are still present in `hits` for the caller to inspect.
    pub fn attach_template_hits(&mut self, hits: &std::collections::HashMap<usize, String>) {
        for (&offset, xml) in hits {
            let Some((cols, rows)) = embedded_dims(xml) else {
                continue;
            };
            for map in self
                .maps
                .iter_mut()
                .filter(|m| m.offset == offset && m.cols == cols && m.rows == rows)
            {
                debug!(offset, "attaching template hit to candidate");
                map.datatype = embedded_datatype(xml).or(map.datatype);
                map.decimal_places = embedded_decimal_places(xml).or(map.decimal_places);
                map.units = embedded_units(xml).or(map.units.clone());
                map.raw_embedded_xml = Some(xml.clone());
            }
        }
    }

    /// Stable sort by score descending, ties broken by offset ascending
    /// then cols ascending. Repeated calls on the same input always produce
    /// the same visible order.
    pub fn into_sorted_vec(mut self) -> Vec<DetectedMap> {
        self.maps.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.offset.cmp(&b.offset))
                .then(a.cols.cmp(&b.cols))
        });
        self.maps
    }
}

fn attr(xml: &str, names: &[&str]) -> Option<String> {
    let alt = names.join("|");
    let re = Regex::new(&format!(r#"(?i)\b(?:{alt})\s*=\s*["']([^"']+)["']"#)).ok()?;
    re.captures(xml).map(|c| c[1].to_string())
}

fn embedded_dims(xml: &str) -> Option<(usize, usize)> {
    let cols = attr(xml, &["colcount", "mmedcolcount"])?.parse().ok()?;
    let rows = attr(xml, &["rowcount", "mmedrowcount"])?.parse().ok()?;
    Some((cols, rows))
}

fn embedded_datatype(xml: &str) -> Option<Datatype> {
    let raw = attr(xml, &["datatype", "mmedtypeflags"])?;
    if raw.eq_ignore_ascii_case("signed") {
        Some(Datatype::Signed)
    } else if raw.eq_ignore_ascii_case("unsigned") {
        Some(Datatype::Unsigned)
    } else {
        None
    }
}

fn embedded_decimal_places(xml: &str) -> Option<u32> {
    attr(xml, &["decimalplaces", "decpl"])?.parse().ok()
}

fn embedded_units(xml: &str) -> Option<String> {
    attr(xml, &["units"])
}
