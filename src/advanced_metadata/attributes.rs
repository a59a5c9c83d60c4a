//! Atributos genéricos presentes en cualquier archivo.

use crate::formatting::{format_byte_count, format_iso8601};
use crate::handlers::FileSnapshot;
use crate::metadata::{MetadataEntry, Namespace};

pub fn extract_file_attributes(file: &FileSnapshot) -> Vec<MetadataEntry> {
    let mut entries = vec![
        MetadataEntry::new(Namespace::File, "Name", file.name.clone()),
        MetadataEntry::new(
            Namespace::File,
            "Size",
            format_byte_count(file.bytes.len() as u64),
        ),
        MetadataEntry::new(
            Namespace::File,
            "Type",
            file.media_type.clone().unwrap_or_else(|| "unknown".to_string()),
        ),
    ];

    if let Some(modified) = file.last_modified {
        entries.push(MetadataEntry::new(
            Namespace::File,
            "LastModified",
            format_iso8601(modified),
        ));
    }

    entries
}
