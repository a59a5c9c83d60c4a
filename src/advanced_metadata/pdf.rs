//! Extracción de metadata PDF mediante búsqueda acotada de claves del diccionario Info.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::EngineConfig;
use crate::error::ExtractionError;
use crate::handlers::FileSnapshot;
use crate::metadata::{MetadataEntry, Namespace};

const INFO_KEYS: [&str; 6] = [
    "Title",
    "Author",
    "Creator",
    "Producer",
    "CreationDate",
    "ModDate",
];

static INFO_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    INFO_KEYS
        .iter()
        .map(|key| {
            // El valor no cruza saltos de línea (`\r`, `\n`, U+2028, U+2029).
            let pattern = format!(r"/{key}\s*\(([^\r\n\u{{2028}}\u{{2029}}]*?)\)");
            (*key, Regex::new(&pattern).expect("patrón de clave PDF inválido"))
        })
        .collect()
});

/// Solo se examinan los primeros `pdf_scan_limit` bytes; gana la primera coincidencia.
pub fn extract_pdf_metadata(
    file: &FileSnapshot,
    config: &EngineConfig,
) -> Result<Vec<MetadataEntry>, ExtractionError> {
    let limit = config.pdf_scan_limit.min(file.bytes.len());
    Ok(scan_pdf_info(&file.bytes[..limit]))
}

/// Busca las claves de `/Info` en `bytes` con la sintaxis `/Clave (valor)`.
pub(crate) fn scan_pdf_info(bytes: &[u8]) -> Vec<MetadataEntry> {
    let text = String::from_utf8_lossy(bytes);

    INFO_PATTERNS
        .iter()
        .filter_map(|(key, pattern)| {
            let captures = pattern.captures(&text)?;
            Some(MetadataEntry::new(Namespace::Pdf, key, &captures[1]))
        })
        .collect()
}
