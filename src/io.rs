//! Boundary I/O: reading the firmware image, the optional side-channel
//! JSON inputs, and writing the detected-maps/XDF outputs. Every error
//! crossing these boundaries is wrapped into the crate's `Error` so the
//! CLI can map it to an exit code via [`crate::error::Error::exit_code`].

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::byte_image::ByteImage;
use crate::error::{Error, Result};
use crate::types::{DetectedMap, DisassemblerHints, Template};

pub fn read_image(path: &Path) -> Result<ByteImage> {
    let data = fs::read(path).map_err(|source| Error::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    Ok(ByteImage::new(data))
}

pub fn read_templates(path: &Path) -> Result<Vec<Template>> {
    let raw = fs::read_to_string(path).map_err(|source| Error::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| Error::DecodeFailure {
        context: format!("templates catalog {}", path.display()),
        source,
    })
}

pub fn read_hints(path: &Path) -> Result<DisassemblerHints> {
    let raw = fs::read_to_string(path).map_err(|source| Error::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| Error::DecodeFailure {
        context: format!("disassembler hints {}", path.display()),
        source,
    })
}

pub fn read_maps(path: &Path) -> Result<Vec<DetectedMap>> {
    let raw = fs::read_to_string(path).map_err(|source| Error::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| Error::DecodeFailure {
        context: format!("detected maps {}", path.display()),
        source,
    })
}

/// Pretty-printed JSON array of DetectedMap, keys sorted, per §6.
pub fn write_maps(path: &Path, maps: &[DetectedMap]) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    maps.serialize(&mut ser).map_err(|source| Error::WriteFailure {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, source.to_string()),
    })?;
    fs::write(path, buf).map_err(|source| Error::WriteFailure {
        path: path.display().to_string(),
        source,
    })
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::WriteFailure {
        path: path.display().to_string(),
        source,
    })
}
