//! Extracción de etiquetas EXIF incrustadas en imágenes.

use exif::{Exif, Field, In, Value};
use std::collections::HashSet;
use std::io::Cursor;

use crate::config::EngineConfig;
use crate::error::ExtractionError;
use crate::handlers::FileSnapshot;
use crate::metadata::{MetadataEntry, Namespace};

const MAX_EXIF_VALUE_LEN: usize = 2048;

/// Cada etiqueta presente en la imagen principal se convierte en `EXIF:<Etiqueta>`.
///
/// Las etiquetas repetidas del IFD de miniatura se omiten.
pub fn extract_exif_metadata(
    file: &FileSnapshot,
    _config: &EngineConfig,
) -> Result<Vec<MetadataEntry>, ExtractionError> {
    let Some(exif) = read_exif(&file.bytes)? else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for field in exif.fields().filter(|field| field.ifd_num == In::PRIMARY) {
        let name = field.tag.to_string();
        if !seen.insert(name.clone()) {
            continue;
        }

        let value = field_value(field, &exif);
        if value.is_empty() {
            continue;
        }

        entries.push(MetadataEntry::new(Namespace::Exif, &name, value));
    }

    Ok(entries)
}

/// Lee el bloque EXIF del contenedor. `None` cuando la imagen no trae EXIF.
pub(crate) fn read_exif(bytes: &[u8]) -> Result<Option<Exif>, exif::Error> {
    let mut reader = Cursor::new(bytes);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) | Err(exif::Error::BlankValue(_)) => Ok(None),
        Err(error) => Err(error),
    }
}

fn field_value(field: &Field, exif: &Exif) -> String {
    let value = match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|part| {
                String::from_utf8_lossy(part)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => field.display_value().with_unit(exif).to_string(),
    };

    truncate_value(value.trim())
}

fn truncate_value(value: &str) -> String {
    if value.chars().count() <= MAX_EXIF_VALUE_LEN {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(MAX_EXIF_VALUE_LEN).collect();
    truncated.push('…');
    truncated
}
