use super::{Extractor, FileSnapshot, FormatHandler, Sanitized};
use crate::advanced_metadata::{extract_pdf_metadata, scan_pdf_info};
use crate::config::EngineConfig;
use crate::error::SanitizeError;
use crate::media::PDF_MEDIA_TYPE;
use crate::metadata::Namespace;
use crate::metadata_editor::strip_pdf_info;

static PDF_EXTRACTORS: [Extractor; 1] = [Extractor {
    name: "pdf-info",
    run: extract_pdf_metadata,
}];

/// Documentos PDF: quita del diccionario `/Info` exactamente las claves elegidas.
///
/// Las claves halladas fuera de `/Info` (marcadores, anotaciones) no se tocan y el
/// resultado se informa como parcial.
pub struct PdfHandler;

impl FormatHandler for PdfHandler {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn handles(&self, media_type: &str) -> bool {
        media_type == PDF_MEDIA_TYPE
    }

    fn extractors(&self) -> &[Extractor] {
        &PDF_EXTRACTORS
    }

    fn sanitize(
        &self,
        file: &FileSnapshot,
        removal: &[String],
        _config: &EngineConfig,
    ) -> Result<Sanitized, SanitizeError> {
        let keys: Vec<&str> = removal
            .iter()
            .filter_map(|key| match Namespace::split(key) {
                Some((Namespace::Pdf, name)) => Some(name),
                _ => None,
            })
            .collect();

        if keys.is_empty() {
            return Ok(Sanitized::PassThrough);
        }

        let Some(stripped) = strip_pdf_info(&file.bytes, &keys)? else {
            return Ok(Sanitized::Partial {
                bytes: None,
                remaining: keys.iter().map(|key| Namespace::Pdf.key(key)).collect(),
            });
        };

        // Una clave sigue presente si no estaba en `/Info` o si el texto del resultado aún la contiene.
        let still_found = scan_pdf_info(&stripped.bytes);
        let mut remaining = Vec::new();
        for name in &keys {
            let key = Namespace::Pdf.key(name);
            let removed = stripped.removed.iter().any(|done| done == name);
            if !removed || still_found.iter().any(|entry| entry.key == key) {
                remaining.push(key);
            }
        }

        Ok(if remaining.is_empty() {
            Sanitized::Rewritten {
                bytes: stripped.bytes,
                honors_selection: true,
            }
        } else {
            Sanitized::Partial {
                bytes: Some(stripped.bytes),
                remaining,
            }
        })
    }
}
