//! Packages every configured locale as `<locale>.json` inside a zip archive.

use crate::errors::SyncError;
use crate::index::RecordIndex;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const DEFAULT_ARCHIVE_NAME: &str = "locales";

#[derive(Debug)]
pub struct Archive {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Builds one key to text document per locale. `locales` maps locale tags to
/// table fields; keys without text for a locale are left out of its document.
pub fn locale_documents(
    index: &RecordIndex,
    locales: &IndexMap<String, String>,
) -> IndexMap<String, BTreeMap<String, String>> {
    locales
        .iter()
        .map(|(locale, field)| {
            let document = index
                .iter()
                .filter_map(|(key, record)| {
                    record
                        .text(field)
                        .map(|text| (key.to_string(), text.to_string()))
                })
                .collect();
            (locale.clone(), document)
        })
        .collect()
}

pub fn build_archive(
    documents: &IndexMap<String, BTreeMap<String, String>>,
) -> Result<Vec<u8>, SyncError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (locale, document) in documents {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|e| SyncError::Archive(e.to_string()))?;
        zip.start_file(format!("{locale}.json"), options)?;
        zip.write_all(&json)
            .map_err(|e| SyncError::Archive(e.to_string()))?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Turns a table title into a download name: every character that is not
/// ASCII alphanumeric becomes `_`.
pub fn archive_filename(title: &str) -> String {
    let title = title.trim();
    let stem: String = if title.is_empty() {
        DEFAULT_ARCHIVE_NAME.into()
    } else {
        title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    };
    format!("{stem}.zip")
}
