//! End-to-end scenario tests against synthetic in-memory images, covering
//! the scan -> store -> template-rescan -> xdf pipeline as a whole rather
//! than any one module in isolation.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use mapscout::store::CandidateStore;
use mapscout::template_rescan::{rescan_templates, RescanConfig};
use mapscout::types::{MapType, Template};
use mapscout::xdf::write_xdf;
use mapscout::{BruteScanner, ByteImage, ScanConfig};

fn le_u16_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn default_scanner() -> BruteScanner {
    BruteScanner::new(ScanConfig {
        min_rows: 3,
        max_cols: 4,
        workers: Some(1),
    })
}

#[test]
fn scenario_a_constant_region_is_rejected() {
    let image = ByteImage::new(vec![0u8; 8]);
    let found = default_scanner().scan(&image, None, None);
    assert!(found.is_empty());
}

#[test]
fn scenario_b_ideal_table_is_detected_at_offset_zero() {
    let image = ByteImage::new(le_u16_bytes(&[10, 20, 11, 21, 12, 22]));
    let found = default_scanner().scan(&image, None, None);
    assert_eq!(found.len(), 1);
    let map = &found[0];
    assert_eq!((map.offset, map.rows, map.cols), (0, 3, 2));
    assert_eq!(map.values, vec![10, 20, 11, 21, 12, 22]);
    assert_eq!(map.map_type, MapType::Unknown);
    assert!(map.axis_x.is_none());
}

#[test]
fn scenario_c_table_with_x_axis_is_detected() {
    let mut bytes = le_u16_bytes(&[10, 20, 11, 21, 12, 22]);
    bytes.extend(le_u16_bytes(&[100, 200]));
    let image = ByteImage::new(bytes);
    let found = default_scanner().scan(&image, None, None);
    let map = found.iter().find(|m| m.offset == 0 && m.cols == 2).unwrap();
    assert_eq!(map.axis_x, Some(vec![100.0, 200.0]));
}

#[test]
fn scenario_d_high_values_classify_as_ignition() {
    let image = ByteImage::new(le_u16_bytes(&[20000, 20010, 20001, 20011, 20002, 20012]));
    let found = default_scanner().scan(&image, None, None);
    let map = found.iter().find(|m| m.offset == 0 && m.cols == 2).unwrap();
    assert_eq!(map.map_type, MapType::Ignition);
}

#[test]
fn scenario_e_template_rescan_hit_rewrites_the_address() {
    let mut bytes = vec![0u8; 64];
    let table = le_u16_bytes(&[10, 20, 11, 21, 12, 22]);
    bytes[16..16 + table.len()].copy_from_slice(&table);
    let image = ByteImage::new(bytes);

    let template = Template {
        title: None,
        offset: None,
        rows: None,
        cols: None,
        element_size_bits: None,
        datatype: None,
        raw_xml: r#"<EMBEDDEDDATA mmedaddress="0x00000020" colcount="2" rowcount="3" mmedelementsizebits="16"/>"#
            .to_string(),
    };

    let hits = rescan_templates(
        &image,
        &[template],
        &HashMap::new(),
        RescanConfig {
            search_range: 32,
            stride: 2,
        },
    );
    assert_eq!(hits.len(), 1);
    let xml = hits.get(&16).expect("hit relocated to offset 16");
    assert!(xml.contains("0x000010"));
}

#[test]
fn scenario_f_table_straddling_worker_boundary_is_still_found() {
    let min_rows = 3;
    let max_cols = 4;
    let element_size = 2;
    let body_bytes = 2 * min_rows * element_size;
    let total_len = 4096usize;
    let mut bytes = vec![0u8; total_len];

    let limit = total_len - element_size * min_rows;
    let workers = 2;
    let chunk_size = (limit / workers).max(1);
    let table_offset = chunk_size - 1;

    let table = le_u16_bytes(&[10, 20, 11, 21, 12, 22]);
    bytes[table_offset..table_offset + body_bytes].copy_from_slice(&table);

    let image = ByteImage::new(bytes);
    let scanner = BruteScanner::new(ScanConfig {
        min_rows,
        max_cols,
        workers: Some(workers),
    });
    let found = scanner.scan(&image, None, None);
    assert!(found.iter().any(|m| m.offset == table_offset && m.cols == 2));
}

#[test]
fn full_pipeline_scan_store_rescan_and_export_xdf() {
    let mut bytes = le_u16_bytes(&[10, 20, 11, 21, 12, 22]);
    bytes.extend(vec![0u8; 32]);
    let image = ByteImage::new(bytes);

    let found = default_scanner().scan(&image, None, None);
    let mut store = CandidateStore::from_maps(found);
    assert!(!store.maps().is_empty());

    let template = Template {
        title: Some("Fuel Table".to_string()),
        offset: Some(0),
        rows: Some("3".to_string()),
        cols: Some("2".to_string()),
        element_size_bits: Some(16),
        datatype: None,
        raw_xml: r#"<EMBEDDEDDATA mmedaddress="0x0" colcount="2" rowcount="3" mmedelementsizebits="16" units="ms" decimalplaces="2"/>"#
            .to_string(),
    };
    let known: HashMap<usize, String> = HashMap::new();
    let hits = rescan_templates(&image, &[template], &known, RescanConfig::default());
    store.attach_template_hits(&hits);

    let sorted = store.into_sorted_vec();
    let enriched = sorted.iter().find(|m| m.offset == 0).unwrap();
    assert_eq!(enriched.units.as_deref(), Some("ms"));

    let generated = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let xdf = write_xdf(&sorted, "mapscout", generated).unwrap();
    assert!(xdf.contains("<XDF>"));
    assert!(xdf.contains(r#"offset="0x0""#));
}
