//! Resolución del tipo de contenido de cada archivo.

use image::ImageFormat;
use std::path::Path;
use tracing::debug;

use crate::config::EngineConfig;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const ZIP_MEDIA_TYPE: &str = "application/zip";
pub const OCTET_STREAM: &str = "application/octet-stream";

const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("pdf", PDF_MEDIA_TYPE),
    ("txt", "text/plain"),
];

/// Formato de imagen que el decodificador sabe reconstruir para este tipo.
pub fn image_format(media_type: &str) -> Option<ImageFormat> {
    if !media_type.starts_with("image/") {
        return None;
    }
    ImageFormat::from_mime_type(media_type)
}

/// Normaliza un tipo declarado: minúsculas, sin parámetros y con alias comunes resueltos.
pub fn normalize_media_type(declared: &str) -> Option<String> {
    let value = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match value.as_str() {
        "" | OCTET_STREAM => None,
        "image/jpg" | "image/pjpeg" => Some("image/jpeg".to_string()),
        "image/x-png" => Some("image/png".to_string()),
        _ => Some(value),
    }
}

/// Intenta detectar el tipo a partir del contenido.
pub fn sniff_media_type(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|kind| kind.mime_type().to_string())
}

pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

pub fn media_type_from_extension(filename: &str) -> Option<&'static str> {
    let ext = extension_of(filename)?;
    EXTENSION_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, media_type)| *media_type)
}

/// Tipo efectivo: el declarado, o el detectado en el contenido, o el de la extensión.
///
/// Si el contenido es una imagen decodificable distinta de la imagen declarada
/// (un `.png` renombrado a `.jpg`), manda el contenido.
pub fn resolve_media_type(declared: &str, filename: &str, bytes: &[u8]) -> Option<String> {
    let sniffed = sniff_media_type(bytes);

    match normalize_media_type(declared) {
        Some(declared) => match sniffed {
            Some(sniffed)
                if sniffed != declared
                    && image_format(&declared).is_some()
                    && image_format(&sniffed).is_some() =>
            {
                debug!(%declared, %sniffed, "el contenido no coincide con el tipo declarado");
                Some(sniffed)
            }
            _ => Some(declared),
        },
        None => sniffed.or_else(|| media_type_from_extension(filename).map(str::to_string)),
    }
}

/// Devuelve el tipo que motiva el rechazo, si el archivo pertenece a una familia vetada.
pub fn rejected_media_type(
    config: &EngineConfig,
    declared: &str,
    filename: &str,
    bytes: &[u8],
) -> Option<String> {
    let is_rejected_type = |media_type: &str| {
        config
            .rejected_media_types
            .iter()
            .any(|rejected| rejected.eq_ignore_ascii_case(media_type))
    };

    if let Some(media_type) = normalize_media_type(declared)
        && is_rejected_type(&media_type)
    {
        return Some(media_type);
    }

    if let Some(ext) = extension_of(filename)
        && config
            .rejected_extensions
            .iter()
            .any(|rejected| rejected.eq_ignore_ascii_case(&ext))
    {
        return Some(
            media_type_from_extension(filename)
                .map(str::to_string)
                .unwrap_or_else(|| format!(".{ext}")),
        );
    }

    sniff_media_type(bytes).filter(|media_type| is_rejected_type(media_type))
}
