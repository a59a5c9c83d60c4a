//! Resumen de la limpieza de un archivo para el colaborador externo.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::record::{CleanedOutput, FileId, FileRecord};
use crate::metadata_editor::SanitizeStatus;

#[derive(Clone, Debug, Serialize)]
pub struct CleanReport {
    pub id: FileId,
    pub filename: String,
    #[serde(skip_serializing)]
    pub cleaned_bytes: Arc<[u8]>,
    pub removed_count: usize,
    pub removed_keys: Vec<String>,
    pub status: SanitizeStatus,
    pub status_text: String,
    pub original_sha256: String,
    pub cleaned_sha256: String,
}

impl CleanReport {
    pub(crate) fn from_record(record: &FileRecord, output: &CleanedOutput) -> Self {
        Self {
            id: record.id,
            filename: record.name.clone(),
            cleaned_bytes: Arc::clone(&output.bytes),
            removed_count: output.removed_keys.len(),
            removed_keys: output.removed_keys.clone(),
            status: output.status.clone(),
            status_text: status_text(output),
            original_sha256: sha256_hex(&record.bytes),
            cleaned_sha256: sha256_hex(&output.bytes),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status.is_degraded()
    }
}

fn status_text(output: &CleanedOutput) -> String {
    let removed = output.removed_keys.len();
    match &output.status {
        SanitizeStatus::Stripped {
            honors_selection: true,
        } => format!("Limpio ✓ ({removed} elementos eliminados)"),
        SanitizeStatus::Stripped {
            honors_selection: false,
        } => {
            let retained = output.retained_keys.len();
            if retained == 0 {
                format!(
                    "Limpio ✓ ({removed} elementos eliminados; la imagen se recodificó sin metadata)"
                )
            } else {
                format!(
                    "Limpio ✓ ({removed} elementos eliminados; la imagen se recodificó sin metadata y también se descartaron {retained} entradas conservadas)"
                )
            }
        }
        SanitizeStatus::Partial { remaining } => format!(
            "Limpieza parcial ({} de {removed} elementos eliminados): siguen en el archivo {}",
            removed.saturating_sub(remaining.len()),
            remaining.join(", ")
        ),
        SanitizeStatus::Unchanged => format!(
            "Sin cambios ({removed} elementos seleccionados): este formato no admite eliminar metadata, se entrega la copia original"
        ),
        SanitizeStatus::Degraded { reason } => format!(
            "Limpieza fallida: se entrega el archivo original con su metadata ({reason})"
        ),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
