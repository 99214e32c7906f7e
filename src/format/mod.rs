//! Document files.
//!
//! A document file is a ZIP archive with a single `document.xml` entry
//! holding the settings, the default style and every page. Items are
//! written in paint order; connections are stored per level as
//! `(item index, point index)` pairs and re-established after all items of
//! that level exist.

pub mod reader;
pub mod writer;

use crate::document::Document;
use anyhow::{Context, Result};
use std::io::{Read, Seek, Write};
use thiserror::Error;
use tracing::debug;

/// Name of the XML entry inside the archive.
pub const DOCUMENT_ENTRY: &str = "document.xml";
/// Current format version.
pub const FORMAT_VERSION: u32 = 1;
/// Conventional file extension.
pub const EXTENSION: &str = "sbk";

/// Structural problems in `document.xml`.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("XML syntax error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("missing <Document> root element")]
    MissingRoot,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),
    #[error("<{element}> is missing attribute {attribute}")]
    MissingAttribute { element: String, attribute: String },
    #[error("invalid value {value:?} for attribute {attribute}")]
    InvalidValue { attribute: String, value: String },
    #[error("unknown item type {0:?}")]
    UnknownItemType(String),
    #[error("item of type {kind} has {found} points, needs at least {needed}")]
    TooFewPoints { kind: String, found: usize, needed: usize },
    #[error("connection {0:?} refers to a missing point")]
    BadConnection(String),
    #[error("document has no pages")]
    NoPages,
}

/// Write `document` as an archive to `writer`.
pub fn write_to<W: Write + Seek>(document: &Document, writer: W) -> Result<()> {
    let mut zip = zip::ZipWriter::new(writer);
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    zip.start_file(DOCUMENT_ENTRY, options)?;
    zip.write_all(writer::generate_document_xml(document).as_bytes())?;
    zip.finish()?;
    Ok(())
}

/// Read a document archive from `reader`.
pub fn read_from<R: Read + Seek>(reader: R) -> Result<Document> {
    let mut zip = zip::ZipArchive::new(reader).context("Failed to open document ZIP")?;
    let mut entry = zip
        .by_name(DOCUMENT_ENTRY)
        .with_context(|| format!("No {} entry in archive", DOCUMENT_ENTRY))?;
    let mut raw = Vec::new();
    entry.read_to_end(&mut raw)?;
    let text = String::from_utf8(raw)
        .with_context(|| format!("Non-UTF8 content in {}", DOCUMENT_ENTRY))?;
    let document = reader::parse_document_xml(&text)
        .with_context(|| format!("Failed to read {}", DOCUMENT_ENTRY))?;
    Ok(document)
}

/// Write `document` to a file on disk.
pub fn save(document: &Document, path: impl AsRef<std::path::Path>) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
    write_to(document, std::io::BufWriter::new(file))?;
    debug!(path = %path.as_ref().display(), "saved document");
    Ok(())
}

/// Read a document from a file on disk.
pub fn load(path: impl AsRef<std::path::Path>) -> Result<Document> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("Failed to open {}", path.as_ref().display()))?;
    let document = read_from(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to load {}", path.as_ref().display()))?;
    debug!(path = %path.as_ref().display(), pages = document.pages().len(), "loaded document");
    Ok(document)
}

impl Document {
    /// Save to `path` and mark the document clean.
    pub fn save_to(&mut self, path: impl AsRef<std::path::Path>) -> Result<()> {
        save(self, path)?;
        self.set_clean();
        Ok(())
    }

    /// Replace this document with the one stored at `path`. On error the
    /// document is left untouched.
    pub fn load_from(&mut self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let loaded = load(path)?;
        self.replace_with(loaded);
        Ok(())
    }
}
