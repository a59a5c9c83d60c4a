//! Recodificación de imágenes sin segmentos de metadata.

use exif::{Context, In, Tag};
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

use crate::advanced_metadata::{read_exif, read_png_text};
use crate::config::EngineConfig;
use crate::error::SanitizeError;

/// Etiquetas que el propio contenedor TIFF necesita para describir los píxeles.
const STRUCTURAL_TIFF_TAGS: &[Tag] = &[
    Tag::ImageWidth,
    Tag::ImageLength,
    Tag::BitsPerSample,
    Tag::Compression,
    Tag::PhotometricInterpretation,
    Tag::StripOffsets,
    Tag::SamplesPerPixel,
    Tag::RowsPerStrip,
    Tag::StripByteCounts,
    Tag::XResolution,
    Tag::YResolution,
    Tag::PlanarConfiguration,
    Tag::ResolutionUnit,
    // Predictor, ExtraSamples y SampleFormat no tienen constante propia.
    Tag(Context::Tiff, 317),
    Tag(Context::Tiff, 338),
    Tag(Context::Tiff, 339),
];

/// Decodifica los píxeles y los escribe en un contenedor nuevo del mismo formato.
pub fn reencode_image(
    bytes: &[u8],
    format: ImageFormat,
    config: &EngineConfig,
) -> Result<Vec<u8>, SanitizeError> {
    let mut image = ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(SanitizeError::Decode)?;

    if config.apply_orientation
        && let Some(orientation) = exif_orientation(bytes)
    {
        image.apply_orientation(orientation);
    }

    let mut output = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut output, config.jpeg_quality);
            rgb.write_with_encoder(encoder)
                .map_err(SanitizeError::Encode)?;
        }
        _ => image
            .write_to(&mut output, format)
            .map_err(SanitizeError::Encode)?,
    }

    Ok(output.into_inner())
}

/// Comprueba que una imagen carece de campos EXIF o textos PNG residuales tras limpiarla.
pub fn verify_image_metadata_clean(bytes: &[u8], format: ImageFormat) -> bool {
    let exif_clean = match read_exif(bytes) {
        Ok(None) => true,
        Ok(Some(exif)) => exif.fields().all(|field| {
            format == ImageFormat::Tiff && STRUCTURAL_TIFF_TAGS.contains(&field.tag)
        }),
        Err(exif::Error::InvalidFormat(_)) => true,
        Err(_) => false,
    };

    let text_clean = format != ImageFormat::Png
        || read_png_text(bytes).is_ok_and(|chunks| chunks.is_empty());

    exif_clean && text_clean
}

fn exif_orientation(bytes: &[u8]) -> Option<Orientation> {
    let exif = read_exif(bytes).ok()??;
    let value = exif
        .get_field(Tag::Orientation, In::PRIMARY)?
        .value
        .get_uint(0)?;
    Orientation::from_exif(u8::try_from(value).ok()?)
}
