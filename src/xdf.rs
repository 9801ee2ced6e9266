//! XDF document export: renders a sorted candidate list as the small XML
//! dialect described in §6 — a `<Header>`, then one `<Map>` per candidate
//! with optional axis vectors and the row-major value grid.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::error::{Error, Result};
use crate::types::DetectedMap;

/// Render `maps` as a complete XDF document. `generated` is the UTC instant
/// stamped into `<Generated>`; callers pass the real time so this function
/// stays pure and reproducible in tests.
pub fn write_xdf(maps: &[DetectedMap], tool_name: &str, generated: DateTime<Utc>) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);
        write_document(&mut writer, maps, tool_name, generated)
            .map_err(|source| Error::WriteFailure {
                path: "<xdf buffer>".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, source.to_string()),
            })?;
    }
    String::from_utf8(buf).map_err(|source| Error::WriteFailure {
        path: "<xdf buffer>".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, source.to_string()),
    })
}

fn write_document<W: Write>(
    writer: &mut Writer<W>,
    maps: &[DetectedMap],
    tool_name: &str,
    generated: DateTime<Utc>,
) -> std::result::Result<(), quick_xml::Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    writer.write_event(Event::Start(BytesStart::new("XDF")))?;

    writer.write_event(Event::Start(BytesStart::new("Header")))?;
    write_text_element(writer, "Tool", tool_name)?;
    write_text_element(writer, "Generated", &generated.to_rfc3339_opts(SecondsFormat::Secs, true))?;
    writer.write_event(Event::End(BytesEnd::new("Header")))?;

    writer.write_event(Event::Start(BytesStart::new("Maps")))?;
    for map in maps {
        write_map(writer, map)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Maps")))?;

    writer.write_event(Event::End(BytesEnd::new("XDF")))?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> std::result::Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_map<W: Write>(
    writer: &mut Writer<W>,
    map: &DetectedMap,
) -> std::result::Result<(), quick_xml::Error> {
    let mut start = BytesStart::new("Map");
    start.push_attribute(("name", map.name.as_str()));
    start.push_attribute(("offset", format!("0x{:x}", map.offset).as_str()));
    start.push_attribute(("rows", map.rows.to_string().as_str()));
    start.push_attribute(("cols", map.cols.to_string().as_str()));
    start.push_attribute(("elementSize", map.element_size.to_string().as_str()));
    writer.write_event(Event::Start(start))?;

    if let Some(axis) = &map.axis_x {
        write_axis(writer, "XAxis", axis)?;
    }
    if let Some(axis) = &map.axis_y {
        write_axis(writer, "YAxis", axis)?;
    }

    writer.write_event(Event::Start(BytesStart::new("Values")))?;
    for row in map.values.chunks(map.cols) {
        writer.write_event(Event::Start(BytesStart::new("Row")))?;
        for value in row {
            write_text_element(writer, "V", &value.to_string())?;
        }
        writer.write_event(Event::End(BytesEnd::new("Row")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Values")))?;

    writer.write_event(Event::End(BytesEnd::new("Map")))?;
    Ok(())
}

fn write_axis<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    values: &[f64],
) -> std::result::Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    for value in values {
        write_text_element(writer, "V", &value.to_string())?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
