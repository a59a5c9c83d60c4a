//! Generadores de archivos de prueba con metadata conocida.

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, dictionary};
use std::io::Cursor;
use std::sync::Arc;

use crate::handlers::FileSnapshot;

pub fn snapshot(name: &str, media_type: &str, bytes: Vec<u8>) -> FileSnapshot {
    FileSnapshot {
        name: name.to_string(),
        media_type: Some(media_type.to_string()),
        bytes: Arc::from(bytes),
        last_modified: None,
    }
}

pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    })
}

/// JPEG con un segmento APP1 `Exif` justo después de SOI.
pub fn jpeg_with_exif(width: u32, height: u32, fields: Vec<Field>) -> Vec<u8> {
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, 95);
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(encoder)
        .expect("codificar jpeg");

    if fields.is_empty() {
        return jpeg;
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, true).expect("escribir exif");
    let tiff = tiff.into_inner();

    let length = u16::try_from(2 + 6 + tiff.len()).expect("segmento APP1 demasiado grande");
    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&length.to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(&tiff);

    let mut output = Vec::with_capacity(jpeg.len() + segment.len());
    output.extend_from_slice(&jpeg[..2]);
    output.extend_from_slice(&segment);
    output.extend_from_slice(&jpeg[2..]);
    output
}

pub fn orientation_field(value: u16) -> Field {
    Field {
        tag: Tag::Orientation,
        ifd_num: In::PRIMARY,
        value: Value::Short(vec![value]),
    }
}

pub fn ascii_field(tag: Tag, value: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![value.as_bytes().to_vec()]),
    }
}

#[derive(Clone, Copy)]
pub enum TextChunk {
    Plain,
    Compressed,
    International,
}

/// PNG RGBA con fragmentos `tEXt`.
pub fn png_with_text(width: u32, height: u32, chunks: &[(&str, &str)]) -> Vec<u8> {
    let chunks: Vec<_> = chunks
        .iter()
        .map(|(keyword, text)| (TextChunk::Plain, *keyword, *text))
        .collect();
    png_with_chunks(width, height, &chunks)
}

pub fn png_with_chunks(width: u32, height: u32, chunks: &[(TextChunk, &str, &str)]) -> Vec<u8> {
    let mut output = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut output, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        for (kind, keyword, text) in chunks {
            let (keyword, text) = (keyword.to_string(), text.to_string());
            let added = match kind {
                TextChunk::Plain => encoder.add_text_chunk(keyword, text),
                TextChunk::Compressed => encoder.add_ztxt_chunk(keyword, text),
                TextChunk::International => encoder.add_itxt_chunk(keyword, text),
            };
            added.expect("fragmento de texto");
        }

        let mut writer = encoder.write_header().expect("cabecera png");
        let data: Vec<u8> = (0..width * height)
            .flat_map(|index| [(index % 256) as u8, 40, 200, 255])
            .collect();
        writer.write_image_data(&data).expect("datos png");
        writer.finish().expect("cerrar png");
    }
    output
}

/// PDF mínimo de una página con un diccionario `/Info` de cadenas literales.
pub fn pdf_with_info(entries: &[(&str, &str)]) -> Vec<u8> {
    build_pdf(entries, None)
}

/// Como [`pdf_with_info`], con un marcador cuyo `/Title` queda fuera de `/Info`.
pub fn pdf_with_outline(entries: &[(&str, &str)], outline_title: &str) -> Vec<u8> {
    build_pdf(entries, Some(outline_title))
}

fn build_pdf(entries: &[(&str, &str)], outline_title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if let Some(title) = outline_title {
        let outlines_id = doc.new_object_id();
        let item_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Parent" => outlines_id,
            "Dest" => vec![page_id.into(), "Fit".into()],
        });
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => item_id,
                "Last" => item_id,
                "Count" => 1,
            }),
        );
        catalog.set("Outlines", outlines_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut info = Dictionary::new();
    for (key, value) in entries {
        info.set(key.to_string(), Object::string_literal(*value));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("guardar pdf");
    output
}
