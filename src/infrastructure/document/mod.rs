//! Docx template engine
//!
//! A docx file is a zip archive; the visible text lives in
//! `word/document.xml`. This module reads the archive, substitutes
//! `{placeholder}` occurrences inside the document part, and re-emits the
//! archive with every other part copied through unchanged.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::application::errors::DocumentError;

/// The zip entry carrying the document text
const DOCUMENT_PART: &str = "word/document.xml";

/// An opened docx with its document part decoded for editing
pub struct DocxTemplate {
    /// All parts except `word/document.xml`, in archive order
    parts: Vec<(String, Vec<u8>)>,
    document: String,
}

impl DocxTemplate {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocumentError::Container(e.to_string()))?;

        let mut parts = Vec::with_capacity(archive.len());
        let mut document = None;

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| DocumentError::Container(e.to_string()))?;
            let name = entry.name().to_string();

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;

            if name == DOCUMENT_PART {
                document = Some(String::from_utf8(data).map_err(|e| {
                    DocumentError::Container(format!("document part is not UTF-8: {}", e))
                })?);
            } else {
                parts.push((name, data));
            }
        }

        let document =
            document.ok_or_else(|| DocumentError::MissingPart(DOCUMENT_PART.to_string()))?;

        Ok(Self { parts, document })
    }

    /// Whether `{name}` still occurs in the document part
    pub fn contains_placeholder(&self, name: &str) -> bool {
        self.document.contains(&format!("{{{}}}", name))
    }

    /// Substitute every `{key}` occurrence; unknown placeholders stay as-is
    pub fn render(&mut self, values: &[(String, String)]) {
        for (key, value) in values {
            let needle = format!("{{{}}}", key);
            if self.document.contains(&needle) {
                self.document = self.document.replace(&needle, value);
            }
        }
    }

    /// Visible text of the document part with XML tags stripped
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.document.len());
        let mut in_tag = false;
        for c in self.document.chars() {
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                c if !in_tag => text.push(c),
                _ => {}
            }
        }
        text
    }

    /// Re-emit the archive with the edited document part
    pub fn into_bytes(self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        writer
            .start_file(DOCUMENT_PART, options)
            .map_err(|e| DocumentError::Container(e.to_string()))?;
        writer.write_all(self.document.as_bytes())?;

        for (name, data) in &self.parts {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| DocumentError::Container(e.to_string()))?;
            writer.write_all(data)?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| DocumentError::Container(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
