//! Fragmentos de texto de PNG (tEXt, zTXt, iTXt).

use std::io::Cursor;

use crate::config::EngineConfig;
use crate::error::ExtractionError;
use crate::handlers::FileSnapshot;
use crate::metadata::{MetadataEntry, Namespace};

/// Pares `(palabra clave, texto)` declarados antes de los datos de imagen.
pub(crate) fn read_png_text(bytes: &[u8]) -> Result<Vec<(String, String)>, png::DecodingError> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let reader = decoder.read_info()?;
    let info = reader.info();

    let mut chunks = Vec::new();
    for chunk in &info.uncompressed_latin1_text {
        chunks.push((chunk.keyword.clone(), chunk.text.clone()));
    }
    for chunk in &info.compressed_latin1_text {
        chunks.push((chunk.keyword.clone(), chunk.get_text()?));
    }
    for chunk in &info.utf8_text {
        chunks.push((chunk.keyword.clone(), chunk.get_text()?));
    }

    Ok(chunks)
}

pub fn extract_png_text_metadata(
    file: &FileSnapshot,
    _config: &EngineConfig,
) -> Result<Vec<MetadataEntry>, ExtractionError> {
    if file.media_type.as_deref() != Some("image/png") {
        return Ok(Vec::new());
    }

    Ok(read_png_text(&file.bytes)?
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(keyword, text)| MetadataEntry::new(Namespace::Png, &keyword, text.trim()))
        .collect())
}
