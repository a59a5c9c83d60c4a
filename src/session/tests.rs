use super::*;
use crate::error::SanitizeError;
use crate::handlers::{FileSnapshot, FormatHandler, Sanitized};
use crate::metadata::Namespace;
use crate::metadata_editor::SanitizeStatus;
use crate::test_support::{
    ascii_field, gradient, jpeg_with_exif, orientation_field, pdf_with_info, pdf_with_outline,
    png_with_text,
};
use chrono::{TimeZone, Utc};
use exif::Tag;
use image::GenericImageView;
use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use zip::ZipArchive;

fn session() -> Session {
    Session::new(EngineConfig::default())
}

fn png_input(name: &str) -> FileInput {
    FileInput::new(name, "image/png", png_with_text(6, 4, &[("Author", "Jane")]))
}

fn keys(metadata: &MetadataMap) -> Vec<String> {
    metadata.keys().map(str::to_string).collect()
}

#[test]
fn lifecycle_follows_state_order() -> Result<(), Box<dyn std::error::Error>> {
    let (sender, receiver) = mpsc::channel();
    let mut session = session().with_events(sender);

    let id = session.ingest(png_input("a.png"))?;
    assert_eq!(session.record(id).map(FileRecord::state), Some(FileState::Queued));

    session.extract(id)?;
    session.clean(id)?;

    let transitions: Vec<(FileState, FileState)> = receiver
        .try_iter()
        .filter_map(|event| match event {
            SessionEvent::StateChanged { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();

    assert_eq!(
        transitions,
        vec![
            (FileState::Queued, FileState::Analyzing),
            (FileState::Analyzing, FileState::Ready),
            (FileState::Ready, FileState::Cleaning),
            (FileState::Cleaning, FileState::Cleaned),
        ]
    );
    for (from, to) in transitions {
        assert!(from < to);
    }

    Ok(())
}

#[test]
fn clean_requires_extracted_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    let id = session.ingest(png_input("a.png"))?;

    assert!(matches!(
        session.clean(id),
        Err(SessionError::InvalidState {
            state: FileState::Queued,
            ..
        })
    ));
    assert!(matches!(
        session.set_retained(id, "File:Name", true),
        Err(SessionError::InvalidState { .. })
    ));

    Ok(())
}

#[test]
fn repeated_extraction_yields_equal_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    let id = session.ingest(png_input("a.png"))?;

    let first = session.extract(id)?.clone();
    session.set_retained(id, "PNG:Author", true)?;
    let second = session.extract(id)?.clone();

    assert_eq!(first, second);
    assert!(!session.record(id).unwrap().selection().is_retained("PNG:Author"));

    Ok(())
}

#[test]
fn removal_and_retained_sets_partition_the_keys() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    let id = session.add_file(png_input("a.png"))?;

    let all: BTreeSet<String> = keys(session.metadata(id)?).into_iter().collect();
    assert_eq!(
        session.removal_set(id)?.into_iter().collect::<BTreeSet<_>>(),
        all
    );

    session.set_retained(id, "File:Name", true)?;
    session.set_retained(id, "PNG:Author", true)?;
    session.set_retained(id, "PNG:Author", false)?;

    let removal: BTreeSet<String> = session.removal_set(id)?.into_iter().collect();
    let record = session.record(id).unwrap();
    let retained: BTreeSet<String> = record
        .selection()
        .retained_keys(session.metadata(id)?)
        .into_iter()
        .collect();

    assert!(removal.is_disjoint(&retained));
    assert_eq!(removal.union(&retained).cloned().collect::<BTreeSet<_>>(), all);
    assert_eq!(retained, BTreeSet::from(["File:Name".to_string()]));

    Ok(())
}

#[test]
fn unknown_keys_and_files_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    let id = session.add_file(png_input("a.png"))?;

    assert!(matches!(
        session.set_retained(id, "EXIF:Make", true),
        Err(SessionError::UnknownKey { .. })
    ));
    assert!(matches!(
        session.clean(FileId(999)),
        Err(SessionError::UnknownFile(_))
    ));

    Ok(())
}

#[test]
fn toggle_all_flips_between_everything_and_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    let id = session.add_file(png_input("a.png"))?;
    let total = session.metadata(id)?.len();

    session.toggle_all(id)?;
    assert!(session.removal_set(id)?.is_empty());

    session.toggle_all(id)?;
    assert_eq!(session.removal_set(id)?.len(), total);

    session.set_retained(id, "File:Name", true)?;
    session.toggle_all(id)?;
    assert_eq!(session.removal_set(id)?.len(), total);

    Ok(())
}

#[test]
fn jpeg_exif_is_listed_and_removed() -> Result<(), Box<dyn std::error::Error>> {
    let bytes = jpeg_with_exif(
        16,
        8,
        vec![
            orientation_field(1),
            ascii_field(Tag::DateTime, "2024:01:02 03:04:05"),
        ],
    );
    let modified = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let mut session = session();
    let id = session.add_file(
        FileInput::new("photo.jpg", "image/jpeg", bytes.clone()).with_last_modified(modified),
    )?;

    let metadata = session.metadata(id)?;
    assert!(metadata.contains_key("EXIF:Orientation"));
    assert_eq!(metadata.get("EXIF:DateTime"), Some("2024:01:02 03:04:05"));
    assert_eq!(metadata.in_namespace(Namespace::File).count(), 4);
    assert_eq!(metadata.get("File:Type"), Some("image/jpeg"));
    assert_eq!(metadata.get("File:LastModified"), Some("2024-03-01T12:00:00.000Z"));

    let report = session.clean(id)?;
    assert_eq!(report.removed_count, session.metadata(id)?.len());
    assert!(matches!(report.status, SanitizeStatus::Stripped { .. }));

    let cleaned = session.record(id).unwrap().sanitized_bytes().unwrap().to_vec();
    assert!(matches!(
        exif::Reader::new().read_from_container(&mut Cursor::new(&cleaned)),
        Err(exif::Error::NotFound(_))
    ));

    let before = image::load_from_memory(&bytes)?.to_rgb8();
    let after = image::load_from_memory(&cleaned)?;
    assert_eq!(after.dimensions(), (16, 8));

    let after = after.to_rgb8();
    let total_diff: u64 = before
        .as_raw()
        .iter()
        .zip(after.as_raw())
        .map(|(a, b)| u64::from(a.abs_diff(*b)))
        .sum();
    let mean_diff = total_diff / before.as_raw().len() as u64;
    assert!(mean_diff <= 8, "diferencia media {mean_diff}");

    Ok(())
}

#[test]
fn heic_files_are_rejected_at_ingest() {
    let (sender, receiver) = mpsc::channel();
    let mut session = session().with_events(sender);

    let result = session.ingest(FileInput::new("photo.heic", "image/heic", vec![0; 32]));

    assert!(matches!(
        result,
        Err(IngestError::UnsupportedFormat { ref filename, .. }) if filename == "photo.heic"
    ));
    assert!(session.is_empty());
    assert!(matches!(
        receiver.try_recv(),
        Ok(SessionEvent::Rejected { .. })
    ));
}

#[test]
fn heic_extension_is_rejected_without_declared_type() {
    let mut session = session();
    let result = session.ingest(FileInput::new("IMG_0001.HEIC", "", vec![1, 2, 3]));
    assert!(matches!(result, Err(IngestError::UnsupportedFormat { .. })));
    assert_eq!(session.len(), 0);
}

#[test]
fn pdf_info_keys_are_scanned_from_raw_text() -> Result<(), Box<dyn std::error::Error>> {
    let pdf = b"%PDF-1.4\n1 0 obj\n<< /Title (Report) /Author (Jane) >>\nendobj\n%%EOF\n".to_vec();

    let mut session = session();
    let id = session.add_file(FileInput::new("report.pdf", "application/pdf", pdf))?;

    let metadata = session.metadata(id)?;
    assert_eq!(
        keys(metadata),
        vec!["PDF:Title", "PDF:Author", "File:Name", "File:Size", "File:Type"]
    );
    assert_eq!(metadata.get("PDF:Title"), Some("Report"));
    assert_eq!(metadata.get("PDF:Author"), Some("Jane"));

    Ok(())
}

#[test]
fn pdf_cleaning_keeps_retained_info_keys() -> Result<(), Box<dyn std::error::Error>> {
    let bytes = pdf_with_info(&[("Title", "Report"), ("Author", "Jane")]);

    let mut session = session();
    let id = session.add_file(FileInput::new("report.pdf", "application/pdf", bytes))?;
    assert!(session.metadata(id)?.contains_key("PDF:Author"));

    session.set_retained(id, "PDF:Title", true)?;
    let report = session.clean(id)?;

    assert_eq!(
        report.status,
        SanitizeStatus::Stripped {
            honors_selection: true
        }
    );
    assert!(report.removed_keys.contains(&"PDF:Author".to_string()));
    assert!(!report.removed_keys.contains(&"PDF:Title".to_string()));

    let cleaned = String::from_utf8_lossy(&report.cleaned_bytes).into_owned();
    assert!(cleaned.contains("Report"));
    assert!(!cleaned.contains("Jane"));

    Ok(())
}

#[test]
fn batch_export_bundles_every_cleaned_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    for name in ["a.png", "b.png", "c.png"] {
        session.add_file(png_input(name))?;
    }

    let reports = session.clean_all();
    assert_eq!(reports.len(), 3);
    assert!(session.batch().iter().all(FileRecord::is_cleaned));

    let artifact = session.export_all()?;
    assert!(artifact.filename.starts_with("cleaned_files_"));
    assert!(artifact.filename.ends_with(".zip"));
    assert_eq!(artifact.entries, 3);

    let mut archive = ZipArchive::new(Cursor::new(&artifact.bytes[..]))?;
    assert_eq!(archive.len(), 3);
    for record in session.batch().iter() {
        let mut contents = Vec::new();
        archive
            .by_name(&format!("cleaned_{}", record.name()))?
            .read_to_end(&mut contents)?;
        assert_eq!(Some(&contents[..]), record.sanitized_bytes());
    }

    Ok(())
}

#[test]
fn clean_all_skips_files_already_clean() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    let first = session.add_file(png_input("a.png"))?;
    session.add_file(png_input("b.png"))?;
    session.clean(first)?;

    let reports = session.clean_all();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].filename, "b.png");

    assert!(session.clean_all().is_empty());

    Ok(())
}

#[test]
fn corrupt_image_is_cleaned_with_original_bytes() -> Result<(), Box<dyn std::error::Error>> {
    let bytes = b"\x89PNG\r\n\x1a\nbasura".to_vec();

    let mut session = session();
    let id = session.add_file(FileInput::new("broken.png", "image/png", bytes.clone()))?;
    let selected = session.removal_set(id)?.len();

    let report = session.clean(id)?;

    assert_eq!(session.record(id).map(FileRecord::state), Some(FileState::Cleaned));
    assert_eq!(report.removed_count, selected);
    assert_eq!(&report.cleaned_bytes[..], &bytes[..]);
    assert_eq!(report.original_sha256, report.cleaned_sha256);
    assert!(report.is_degraded());
    assert!(!report.status_text.contains("Limpio"));

    Ok(())
}

#[test]
fn cleaning_twice_returns_the_first_result() -> Result<(), Box<dyn std::error::Error>> {
    let (sender, receiver) = mpsc::channel();
    let mut session = session().with_events(sender);
    let id = session.add_file(png_input("a.png"))?;

    let first = session.clean(id)?;
    let second = session.clean(id)?;

    assert_eq!(first.cleaned_bytes, second.cleaned_bytes);
    assert_eq!(first.removed_keys, second.removed_keys);
    let cleaned_events = receiver
        .try_iter()
        .filter(|event| matches!(event, SessionEvent::Cleaned { .. }))
        .count();
    assert_eq!(cleaned_events, 1);

    Ok(())
}

#[test]
fn single_export_is_the_sanitized_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    let id = session.add_file(png_input("foto.png"))?;
    session.add_file(png_input("pendiente.png"))?;

    assert!(matches!(
        session.export_all(),
        Err(ExportError::NothingToExport)
    ));

    session.clean(id)?;
    let artifact = session.export_all()?;

    assert_eq!(artifact.filename, "cleaned_foto.png");
    assert_eq!(artifact.mime_type, "image/png");
    assert_eq!(
        Some(&artifact.bytes[..]),
        session.record(id).unwrap().sanitized_bytes()
    );

    Ok(())
}

#[test]
fn clean_all_and_export_processes_queued_files() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = session();
    session.ingest(png_input("a.png"))?;
    session.ingest(png_input("b.png"))?;

    let artifact = session.clean_all_and_export()?;

    assert_eq!(artifact.entries, 2);
    assert!(session.batch().iter().all(FileRecord::is_cleaned));

    Ok(())
}

#[test]
fn directory_ingest_reads_files_from_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("notas.txt"), b"hola")?;
    gradient(4, 4).save(dir.path().join("foto.png"))?;
    std::fs::write(dir.path().join("movil.heic"), b"ftypheic")?;
    std::fs::create_dir(dir.path().join("sub"))?;
    std::fs::write(dir.path().join("sub").join("otra.txt"), b"adios")?;

    let mut flat = session();
    let results = flat.ingest_directory(dir.path(), false);
    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 2);
    assert_eq!(flat.len(), 2);

    let foto = flat
        .batch()
        .iter()
        .find(|record| record.name() == "foto.png")
        .unwrap();
    assert_eq!(foto.media_type(), Some("image/png"));
    assert_eq!(foto.state(), FileState::Ready);
    assert!(foto.metadata().unwrap().contains_key("File:LastModified"));

    let mut deep = session();
    let results = deep.ingest_directory(dir.path(), true);
    assert_eq!(results.len(), 4);
    assert_eq!(deep.len(), 3);

    Ok(())
}

#[test]
fn remove_and_clear_discard_records() -> Result<(), Box<dyn std::error::Error>> {
    let (sender, receiver) = mpsc::channel();
    let mut session = session().with_events(sender);
    let a = session.add_file(png_input("a.png"))?;
    session.add_file(png_input("b.png"))?;
    session.ingest(png_input("c.png"))?;

    session.remove(a)?;
    assert_eq!(session.len(), 2);
    assert!(session.record(a).is_none());
    assert!(matches!(session.remove(a), Err(SessionError::UnknownFile(_))));

    assert_eq!(session.clear(), 2);
    assert!(session.is_empty());
    assert!(
        receiver
            .try_iter()
            .any(|event| event == SessionEvent::Cleared { count: 2 })
    );

    Ok(())
}

#[test]
fn pdf_keys_outside_info_are_reported_as_remaining() -> Result<(), Box<dyn std::error::Error>> {
    let bytes = pdf_with_outline(&[("Author", "Jane")], "Secreto");

    let mut session = session();
    let id = session.add_file(FileInput::new("informe.pdf", "application/pdf", bytes))?;
    assert_eq!(session.metadata(id)?.get("PDF:Title"), Some("Secreto"));

    let report = session.clean(id)?;

    assert_eq!(
        report.status,
        SanitizeStatus::Partial {
            remaining: vec!["PDF:Title".to_string()]
        }
    );
    assert!(!report.status_text.contains("Limpio"));
    assert!(report.status_text.contains("PDF:Title"));

    let cleaned = String::from_utf8_lossy(&report.cleaned_bytes).into_owned();
    assert!(!cleaned.contains("Jane"));

    Ok(())
}

#[test]
fn pdf_without_rewritable_info_is_not_reported_clean() -> Result<(), Box<dyn std::error::Error>> {
    let bytes = b"%PDF-1.4\n1 0 obj\n<< /Title (Report) >>\nendobj\n%%EOF\n".to_vec();

    let mut session = session();
    let id = session.add_file(FileInput::new("report.pdf", "application/pdf", bytes.clone()))?;
    let report = session.clean(id)?;

    assert_eq!(&report.cleaned_bytes[..], &bytes[..]);
    assert!(!report.status_text.contains("Limpio"));
    assert!(!matches!(report.status, SanitizeStatus::Stripped { .. }));

    Ok(())
}

#[test]
fn mislabelled_png_is_cleaned_by_its_content() -> Result<(), Box<dyn std::error::Error>> {
    let bytes = png_with_text(6, 4, &[("Author", "Jane")]);

    let mut session = session();
    let id = session.add_file(FileInput::new("foto.jpg", "image/jpeg", bytes))?;

    let record = session.record(id).unwrap();
    assert_eq!(record.declared_media_type(), "image/jpeg");
    assert_eq!(record.media_type(), Some("image/png"));
    assert_eq!(session.metadata(id)?.get("PNG:Author"), Some("Jane"));

    let report = session.clean(id)?;
    assert!(matches!(report.status, SanitizeStatus::Stripped { .. }));

    let cleaned = session.record(id).unwrap().sanitized_bytes().unwrap();
    assert!(!cleaned.windows(4).any(|window| window == b"Jane"));
    assert_eq!(image::load_from_memory(cleaned)?.dimensions(), (6, 4));

    Ok(())
}

struct SlowHandler;

impl FormatHandler for SlowHandler {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn handles(&self, media_type: &str) -> bool {
        media_type == "image/png"
    }

    fn sanitize(
        &self,
        _file: &FileSnapshot,
        _removal: &[String],
        _config: &EngineConfig,
    ) -> Result<Sanitized, SanitizeError> {
        thread::sleep(Duration::from_millis(500));
        Ok(Sanitized::Rewritten {
            bytes: b"tarde".to_vec(),
            honors_selection: false,
        })
    }
}

#[test]
fn sanitize_timeout_returns_original_bytes() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig {
        decode_timeout_ms: 20,
        ..EngineConfig::default()
    };
    let mut registry = HandlerRegistry::with_defaults();
    registry.register(std::sync::Arc::new(SlowHandler));

    let bytes = png_with_text(4, 4, &[("Author", "Jane")]);
    let mut session = Session::with_registry(config, registry);
    let id = session.add_file(FileInput::new("lenta.png", "image/png", bytes.clone()))?;

    let report = session.clean(id)?;

    assert_eq!(session.record(id).map(FileRecord::state), Some(FileState::Cleaned));
    assert!(matches!(
        &report.status,
        SanitizeStatus::Degraded { reason } if reason.contains("20 ms")
    ));
    assert_eq!(&report.cleaned_bytes[..], &bytes[..]);

    Ok(())
}
