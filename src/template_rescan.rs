//! Re-locates known calibration tables whose recorded address has drifted.
//!
//! Consumes XDF `EMBEDDEDDATA` fragments harvested from a prior tuning
//! session and sweeps a small window around each template's recorded
//! address for a byte region that still looks plausible at the template's
//! declared dimensions. A single regex, not a full XML parser, extracts the
//! handful of attributes this needs; the rest of the fragment is carried
//! through untouched except for the address rewrite itself.

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, warn};

use crate::byte_image::ByteImage;
use crate::correlation::{mean, min_max};
use crate::types::{Datatype, Template};

const DEFAULT_SEARCH_RANGE: usize = 4096;
const DEFAULT_STRIDE: usize = 2;
const MAX_ABS_MEAN: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy)]
pub struct RescanConfig {
    pub search_range: usize,
    pub stride: usize,
}

impl Default for RescanConfig {
    fn default() -> Self {
        Self {
            search_range: DEFAULT_SEARCH_RANGE,
            stride: DEFAULT_STRIDE,
        }
    }
}

/// Attributes pulled out of one `EMBEDDEDDATA` element.
struct EmbeddedData {
    orig_address: usize,
    rows: usize,
    cols: usize,
    element_size_bits: u32,
}

fn attr_regex(names: &[&str]) -> Regex {
    let alt = names.join("|");
    Regex::new(&format!(r#"(?i)\b(?:{alt})\s*=\s*["']([^"']+)["']"#)).expect("static pattern")
}

fn parse_address(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else {
        raw.parse::<usize>().ok()
    }
}

fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&v| v > 0)
}

/// Find every `EMBEDDEDDATA` element in `xml` and decode its address and
/// dimension attributes. Elements missing a required attribute, or whose
/// attributes don't parse as positive integers, are skipped rather than
/// aborting the whole template.
fn find_embedded_data(xml: &str) -> Vec<EmbeddedData> {
    let element_re = Regex::new(r"(?is)<embeddeddata\b[^>]*>").expect("static pattern");
    let address_re = attr_regex(&["mmedaddress"]);
    let cols_re = attr_regex(&["colcount", "mmedcolcount"]);
    let rows_re = attr_regex(&["rowcount", "mmedrowcount"]);
    let size_re = attr_regex(&["mmedelementsizebits", "mmedelementsize"]);

    let mut found = Vec::new();
    for m in element_re.find_iter(xml) {
        let tag = m.as_str();

        let orig_address = match address_re
            .captures(tag)
            .and_then(|c| parse_address(&c[1]))
        {
            Some(v) => v,
            None => continue,
        };
        let cols = match cols_re.captures(tag).and_then(|c| parse_positive(&c[1])) {
            Some(v) => v,
            None => continue,
        };
        let rows = match rows_re.captures(tag).and_then(|c| parse_positive(&c[1])) {
            Some(v) => v,
            None => continue,
        };
        let element_size_bits = match size_re
            .captures(tag)
            .and_then(|c| parse_positive(&c[1]))
        {
            Some(v) => v as u32,
            None => continue,
        };

        found.push(EmbeddedData {
            orig_address,
            rows,
            cols,
            element_size_bits,
        });
    }
    found
}

fn is_plausible(values: &[f64]) -> bool {
    if values.is_empty() {
        return false;
    }
    let (lo, hi) = min_max(values);
    if hi - lo <= 0.0 {
        return false;
    }
    mean(values).abs() <= MAX_ABS_MEAN
}

fn overlaps_known(off: usize, bytes_needed: usize, known: &HashMap<usize, String>) -> bool {
    let end = off + bytes_needed;
    known.keys().any(|&koff| {
        let kend = koff + bytes_needed;
        off < kend && koff < end
    })
}

/// Textually rewrite every occurrence of `orig`'s hex and decimal forms in
/// `xml` to `new`'s. Case-insensitive on the hex form; all occurrences.
fn rewrite_address(xml: &str, orig: usize, new: usize) -> String {
    let hex_re = Regex::new(&format!(
        r"(?i)0x0*{:X}\b",
        orig
    ))
    .expect("static pattern");
    let new_hex = format!("0x{new:06X}");
    let after_hex = hex_re.replace_all(xml, new_hex.as_str());

    let dec_re = Regex::new(&format!(r"\b{orig}\b")).expect("static pattern");
    let new_dec = new.to_string();
    dec_re.replace_all(&after_hex, new_dec.as_str()).into_owned()
}

fn datatype_signed(datatype: Option<Datatype>) -> bool {
    matches!(datatype, Some(Datatype::Signed))
}

/// Sweep a window around one template's recorded address for a plausible
/// relocation. Returns `None` if the template has no usable `EMBEDDEDDATA`
/// or nothing in the window passes the plausibility predicate.
fn rescan_one(
    image: &ByteImage,
    template: &Template,
    known: &HashMap<usize, String>,
    config: RescanConfig,
) -> Option<(usize, String)> {
    let candidates = find_embedded_data(&template.raw_xml);
    if candidates.is_empty() {
        warn!("template has no usable EMBEDDEDDATA element, skipping");
        return None;
    }

    let signed = datatype_signed(template.datatype);

    for data in candidates {
        let element_size_bytes = (data.element_size_bits / 8) as u8;
        if !matches!(element_size_bytes, 1 | 2 | 4) {
            continue;
        }
        let bytes_needed = data.rows * data.cols * element_size_bytes as usize;
        if bytes_needed == 0 {
            continue;
        }

        let lo = data.orig_address.saturating_sub(config.search_range);
        let hi = image
            .size()
            .saturating_sub(bytes_needed)
            .min(data.orig_address + config.search_range);
        if lo > hi {
            continue;
        }

        let mut off = lo;
        while off <= hi {
            if known.contains_key(&off) || overlaps_known(off, bytes_needed, known) {
                off += config.stride;
                continue;
            }

            let mut values = Vec::with_capacity(data.rows * data.cols);
            let mut ok = true;
            for i in 0..data.rows * data.cols {
                match image.read_int_le(off + i * element_size_bytes as usize, element_size_bytes, signed)
                {
                    Ok(v) => values.push(v as f64),
                    Err(_) => {
                        ok = false;
                        break;
                    }
                }
            }

            if ok && is_plausible(&values) {
                let rewritten = rewrite_address(&template.raw_xml, data.orig_address, off);
                debug!(orig = data.orig_address, new = off, "template rescan hit");
                return Some((off, rewritten));
            }

            off += config.stride;
        }
    }

    None
}

/// Rescan every template in `catalog`, returning the newly located ones
/// keyed by their new offset. Templates whose address has not drifted are
/// still re-found at their original offset (a `searchRange=0` sweep is a
/// no-op verification). A regex or bounds failure on one template skips
/// that template only; the rescan as a whole never aborts.
pub fn rescan_templates(
    image: &ByteImage,
    catalog: &[Template],
    known: &HashMap<usize, String>,
    config: RescanConfig,
) -> HashMap<usize, String> {
    let mut found = HashMap::new();
    for template in catalog {
        if let Some((off, xml)) = rescan_one(image, template, known, config) {
            found.insert(off, xml);
        }
    }
    found
}
