//! Empaquetado de los archivos limpios para su descarga.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::EngineConfig;
use crate::error::ExportError;
use crate::media::{OCTET_STREAM, ZIP_MEDIA_TYPE};

/// Resultado descargable: un archivo limpio suelto o un ZIP con varios.
#[derive(Clone, Debug, Serialize)]
pub struct ExportArtifact {
    pub filename: String,
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Cantidad de archivos limpios incluidos.
    pub entries: usize,
}

pub(crate) struct ExportItem<'a> {
    pub original_name: &'a str,
    pub bytes: &'a [u8],
    pub media_type: Option<&'a str>,
}

pub fn cleaned_name(original: &str) -> String {
    format!("cleaned_{original}")
}

pub(crate) fn bundle(
    items: &[ExportItem<'_>],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<ExportArtifact, ExportError> {
    match items {
        [] => Err(ExportError::NothingToExport),
        [item] => Ok(ExportArtifact {
            filename: cleaned_name(item.original_name),
            bytes: item.bytes.to_vec(),
            mime_type: item.media_type.unwrap_or(OCTET_STREAM).to_string(),
            entries: 1,
        }),
        _ => {
            let bytes = write_archive(items, config.archive_compression_level)?;
            Ok(ExportArtifact {
                filename: format!("cleaned_files_{}.zip", now.timestamp_millis()),
                bytes,
                mime_type: ZIP_MEDIA_TYPE.to_string(),
                entries: items.len(),
            })
        }
    }
}

fn write_archive(items: &[ExportItem<'_>], level: u8) -> Result<Vec<u8>, ExportError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<'_, ()>::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(i64::from(level)));

    let mut used = HashSet::new();
    for item in items {
        let name = unique_entry_name(&cleaned_name(item.original_name), &mut used);
        writer.start_file(name, options)?;
        writer.write_all(item.bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Dos archivos con el mismo nombre no pueden compartir entrada: el segundo pasa a `nombre (2).ext`.
fn unique_entry_name(candidate: &str, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.to_string()) {
        return candidate.to_string();
    }

    let path = Path::new(candidate);
    let stem = path
        .file_stem()
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_else(|| candidate.to_string());
    let extension = path
        .extension()
        .map(|value| format!(".{}", value.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 2;
    loop {
        let name = format!("{stem} ({counter}){extension}");
        if used.insert(name.clone()) {
            return name;
        }
        counter += 1;
    }
}
