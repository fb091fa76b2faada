//! Mission package assembler.
//!
//! A mission package is a zip container with exactly two entries at the paths
//! the flight controller looks for.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use wayline_core::wpml::{encode_config, encode_route};
use wayline_core::{ConfigDocument, RouteDocument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{PackageError, Result};
use crate::staging;

/// Entry holding the executable route document.
pub const ROUTE_ENTRY: &str = "wpmz/waylines.wpml";
/// Entry holding the mission template / config document.
pub const CONFIG_ENTRY: &str = "wpmz/template.kml";

/// Serialized container bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionPackage {
    bytes: Vec<u8>,
}

impl MissionPackage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Load a package from disk without checking its entries.
    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self::from_bytes(std::fs::read(path)?))
    }

    /// Write atomically to `path`; a failed write leaves nothing behind.
    pub fn persist(&self, path: &Path) -> Result<()> {
        staging::write_atomic(path, &self.bytes)
    }
}

/// Encode both documents and pack them.
pub fn pack(route: &RouteDocument, config: &ConfigDocument) -> Result<MissionPackage> {
    let route_text = encode_route(route)?;
    let config_text = encode_config(config)?;
    pack_text(&route_text, &config_text)
}

/// Pack already-encoded document text.
pub fn pack_text(route_text: &str, config_text: &str) -> Result<MissionPackage> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (entry, text) in [(CONFIG_ENTRY, config_text), (ROUTE_ENTRY, route_text)] {
        writer
            .start_file(entry, options)
            .map_err(|err| PackageError::Packaging(format!("{}: {}", entry, err)))?;
        writer
            .write_all(text.as_bytes())
            .map_err(|err| PackageError::Packaging(format!("{}: {}", entry, err)))?;
    }

    let bytes = writer
        .finish()
        .map_err(|err| PackageError::Packaging(err.to_string()))?
        .into_inner();

    if bytes.is_empty() {
        return Err(PackageError::Packaging(
            "container is zero bytes".to_string(),
        ));
    }

    tracing::debug!(bytes = bytes.len(), "packed mission container");
    Ok(MissionPackage { bytes })
}

/// Extract `(route_text, config_text)`.
pub fn unpack(package: &MissionPackage) -> Result<(String, String)> {
    let mut archive = ZipArchive::new(Cursor::new(package.as_bytes()))
        .map_err(|err| PackageError::CorruptPackage(format!("cannot open container: {}", err)))?;

    let route = read_entry(&mut archive, ROUTE_ENTRY)?;
    let config = read_entry(&mut archive, CONFIG_ENTRY)?;
    Ok((route, config))
}

fn read_entry<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| PackageError::CorruptPackage(format!("missing entry {}", name)))?;

    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|err| PackageError::CorruptPackage(format!("{}: {}", name, err)))?;
    Ok(text)
}
