use tracing::debug;

use super::{Extractor, FileSnapshot, FormatHandler, Sanitized};
use crate::advanced_metadata::{extract_exif_metadata, extract_png_text_metadata};
use crate::config::EngineConfig;
use crate::error::SanitizeError;
use crate::media::image_format;
use crate::metadata_editor::{reencode_image, verify_image_metadata_clean};

static IMAGE_EXTRACTORS: [Extractor; 2] = [
    Extractor {
        name: "exif",
        run: extract_exif_metadata,
    },
    Extractor {
        name: "png-text",
        run: extract_png_text_metadata,
    },
];

/// Imágenes que el decodificador sabe reconstruir.
///
/// La limpieza recodifica los píxeles en un contenedor nuevo sin segmentos de
/// metadata, por lo que descarta todas las etiquetas sin importar la selección.
pub struct ImageHandler;

impl FormatHandler for ImageHandler {
    fn name(&self) -> &'static str {
        "image"
    }

    fn handles(&self, media_type: &str) -> bool {
        image_format(media_type).is_some()
    }

    fn extractors(&self) -> &[Extractor] {
        &IMAGE_EXTRACTORS
    }

    fn sanitize(
        &self,
        file: &FileSnapshot,
        _removal: &[String],
        config: &EngineConfig,
    ) -> Result<Sanitized, SanitizeError> {
        let Some(format) = file.media_type.as_deref().and_then(image_format) else {
            return Ok(Sanitized::PassThrough);
        };

        let bytes = reencode_image(&file.bytes, format, config)?;

        if config.verify_output && !verify_image_metadata_clean(&bytes, format) {
            return Err(SanitizeError::Verification);
        }

        debug!(file = %file.name, ?format, bytes = bytes.len(), "imagen recodificada");
        Ok(Sanitized::Rewritten {
            bytes,
            honors_selection: false,
        })
    }
}
