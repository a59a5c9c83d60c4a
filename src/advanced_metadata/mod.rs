//! Extracción de metadata: extractores por formato y el flujo que los combina.

mod attributes;
mod image;
mod pdf;
mod png;

pub use attributes::extract_file_attributes;
pub use self::image::extract_exif_metadata;
pub use pdf::extract_pdf_metadata;
pub use self::png::extract_png_text_metadata;

pub(crate) use self::image::read_exif;
pub(crate) use pdf::scan_pdf_info;
pub(crate) use self::png::read_png_text;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::handlers::{FileSnapshot, HandlerRegistry};
use crate::metadata::MetadataMap;

/// Ejecuta los extractores del formato y, al final, los atributos genéricos.
///
/// Un extractor que falla aporta cero entradas; el resultado siempre es un mapa válido.
pub fn extract_metadata(
    registry: &HandlerRegistry,
    file: &FileSnapshot,
    config: &EngineConfig,
) -> MetadataMap {
    let handler = registry.resolve(file.media_type.as_deref());
    let mut metadata = MetadataMap::new();

    for extractor in handler.extractors() {
        match (extractor.run)(file, config) {
            Ok(entries) => {
                debug!(
                    file = %file.name,
                    extractor = extractor.name,
                    entries = entries.len(),
                    "extractor completado"
                );
                metadata.extend(entries);
            }
            Err(error) => {
                warn!(
                    file = %file.name,
                    extractor = extractor.name,
                    %error,
                    "extractor omitido"
                );
            }
        }
    }

    metadata.extend(extract_file_attributes(file));
    metadata
}
