//! Sesión de limpieza: el lote de archivos y su ciclo de vida.
//!
//! `Session` es el contexto explícito de cada operación. Se crea vacía, se
//! vacía con [`Session::clear`] y no persiste nada al destruirse.

mod batch;
mod events;
mod record;
mod report;

pub use batch::Batch;
pub use events::SessionEvent;
pub use record::{FileId, FileInput, FileRecord, FileState};
pub use report::CleanReport;

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::advanced_metadata::extract_metadata;
use crate::config::EngineConfig;
use crate::error::{ExportError, IngestError, SessionError};
use crate::export::{ExportArtifact, ExportItem, bundle};
use crate::formatting::format_size;
use crate::handlers::HandlerRegistry;
use crate::media::{rejected_media_type, resolve_media_type};
use crate::metadata::MetadataMap;
use crate::metadata_editor::sanitize_file;
use crate::selection::SelectionState;
use record::CleanedOutput;

pub struct Session {
    config: EngineConfig,
    registry: HandlerRegistry,
    batch: Batch,
    next_id: u64,
    events: Option<Sender<SessionEvent>>,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, HandlerRegistry::with_defaults())
    }

    pub fn with_registry(config: EngineConfig, registry: HandlerRegistry) -> Self {
        Self {
            config,
            registry,
            batch: Batch::new(),
            next_id: 1,
            events: None,
        }
    }

    /// Envía cada cambio de estado por `sender`. Un receptor cerrado se ignora.
    pub fn with_events(mut self, sender: Sender<SessionEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn record(&self, id: FileId) -> Option<&FileRecord> {
        self.batch.get(id)
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Acepta un archivo en estado `Queued` o lo rechaza si su formato está vetado.
    pub fn ingest(&mut self, input: FileInput) -> Result<FileId, IngestError> {
        if let Some(media_type) =
            rejected_media_type(&self.config, &input.media_type, &input.name, &input.bytes)
        {
            let error = IngestError::UnsupportedFormat {
                filename: input.name.clone(),
                media_type,
            };
            warn!(file = %input.name, %error, "archivo rechazado");
            self.emit(SessionEvent::Rejected {
                filename: input.name,
                reason: error.to_string(),
            });
            return Err(error);
        }

        let id = FileId(self.next_id);
        self.next_id += 1;

        let media_type = resolve_media_type(&input.media_type, &input.name, &input.bytes);
        info!(
            %id,
            file = %input.name,
            size = %format_size(input.bytes.len() as u64),
            media_type = media_type.as_deref().unwrap_or("unknown"),
            "archivo aceptado"
        );

        self.batch.insert(FileRecord {
            id,
            name: input.name.clone(),
            declared_media_type: input.media_type,
            media_type,
            bytes: Arc::from(input.bytes),
            last_modified: input.last_modified,
            state: FileState::Queued,
            metadata: None,
            selection: SelectionState::new(),
            cleaned: None,
        });
        self.emit(SessionEvent::Accepted {
            id,
            filename: input.name,
        });

        Ok(id)
    }

    /// Ingresa y analiza de inmediato, como al soltar un archivo en la interfaz.
    pub fn add_file(&mut self, input: FileInput) -> Result<FileId, IngestError> {
        let id = self.ingest(input)?;
        self.run_extraction(id);
        Ok(id)
    }

    /// Ingresa cada archivo regular bajo `root`. Devuelve un resultado por archivo.
    pub fn ingest_directory(
        &mut self,
        root: &Path,
        recursive: bool,
    ) -> Vec<Result<FileId, IngestError>> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut paths: Vec<_> = WalkDir::new(root)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(%error, "entrada inválida al recorrer el directorio");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();

        paths
            .into_iter()
            .map(|path| FileInput::from_path(&path).and_then(|input| self.add_file(input)))
            .collect()
    }

    /// Extrae la metadata: `Queued → Analyzing → Ready`.
    ///
    /// También vale para reanalizar un archivo `Ready`; la selección vuelve a "eliminar todo".
    pub fn extract(&mut self, id: FileId) -> Result<&MetadataMap, SessionError> {
        let record = self.batch.get(id).ok_or(SessionError::UnknownFile(id))?;
        if !matches!(record.state, FileState::Queued | FileState::Ready) {
            return Err(SessionError::InvalidState {
                id,
                state: record.state,
                operation: "analizar",
            });
        }

        self.run_extraction(id);
        self.metadata(id)
    }

    pub fn metadata(&self, id: FileId) -> Result<&MetadataMap, SessionError> {
        let record = self.batch.get(id).ok_or(SessionError::UnknownFile(id))?;
        record.metadata.as_ref().ok_or(SessionError::InvalidState {
            id,
            state: record.state,
            operation: "inspeccionar",
        })
    }

    pub fn set_retained(
        &mut self,
        id: FileId,
        key: &str,
        retained: bool,
    ) -> Result<(), SessionError> {
        let record = self.selectable_record(id, "seleccionar entradas en")?;
        let Some(metadata) = record.metadata.as_ref() else {
            return Err(SessionError::UnknownKey {
                id,
                key: key.to_string(),
            });
        };

        if record.selection.set_retained(metadata, key, retained) {
            Ok(())
        } else {
            Err(SessionError::UnknownKey {
                id,
                key: key.to_string(),
            })
        }
    }

    pub fn toggle_all(&mut self, id: FileId) -> Result<(), SessionError> {
        let record = self.selectable_record(id, "seleccionar entradas en")?;
        if let Some(metadata) = record.metadata.as_ref() {
            record.selection.toggle_all(metadata);
        }
        Ok(())
    }

    /// Claves marcadas para eliminar, en el orden de la metadata.
    pub fn removal_set(&self, id: FileId) -> Result<Vec<String>, SessionError> {
        let record = self.batch.get(id).ok_or(SessionError::UnknownFile(id))?;
        let metadata = self.metadata(id)?;
        Ok(record.selection.removal_set(metadata))
    }

    /// Limpia un archivo: `Ready → Cleaning → Cleaned`.
    ///
    /// Si ya estaba limpio devuelve el resultado anterior sin repetir el trabajo.
    pub fn clean(&mut self, id: FileId) -> Result<CleanReport, SessionError> {
        let record = self.batch.get(id).ok_or(SessionError::UnknownFile(id))?;
        match record.state {
            FileState::Cleaned => {
                if let Some(output) = record.cleaned.as_ref() {
                    return Ok(CleanReport::from_record(record, output));
                }
            }
            FileState::Ready => {}
            state => {
                return Err(SessionError::InvalidState {
                    id,
                    state,
                    operation: "limpiar",
                });
            }
        }

        let (removed_keys, retained_keys) = match record.metadata.as_ref() {
            Some(metadata) => (
                record.selection.removal_set(metadata),
                record.selection.retained_keys(metadata),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let snapshot = record.snapshot();
        let handler = self.registry.resolve(snapshot.media_type.as_deref());

        self.transition(id, FileState::Cleaning);
        let outcome = sanitize_file(handler, snapshot, &removed_keys, &self.config);
        let status = outcome.status.clone();

        if let Some(record) = self.batch.get_mut(id) {
            record.cleaned = Some(CleanedOutput {
                bytes: outcome.bytes,
                removed_keys,
                retained_keys,
                status: outcome.status,
            });
        }
        self.transition(id, FileState::Cleaned);
        self.emit(SessionEvent::Cleaned { id, status });

        let record = self.batch.get(id).ok_or(SessionError::UnknownFile(id))?;
        let output = record.cleaned.as_ref().ok_or(SessionError::InvalidState {
            id,
            state: record.state,
            operation: "limpiar",
        })?;
        Ok(CleanReport::from_record(record, output))
    }

    /// Limpia, en orden y de uno en uno, todos los archivos que aún no están limpios.
    pub fn clean_all(&mut self) -> Vec<CleanReport> {
        let pending: Vec<FileId> = self
            .batch
            .iter()
            .filter(|record| !record.is_cleaned())
            .map(|record| record.id)
            .collect();

        if pending.is_empty() {
            info!("todos los archivos ya están limpios");
        }

        let mut reports = Vec::with_capacity(pending.len());
        for id in pending {
            if self
                .batch
                .get(id)
                .is_some_and(|record| record.state == FileState::Queued)
            {
                self.run_extraction(id);
            }
            match self.clean(id) {
                Ok(report) => reports.push(report),
                Err(error) => warn!(%id, %error, "archivo omitido en la limpieza por lote"),
            }
        }
        reports
    }

    /// Empaqueta los archivos limpios de `ids`; los que no están limpios se ignoran.
    pub fn export(&self, ids: &[FileId]) -> Result<ExportArtifact, ExportError> {
        let mut items = Vec::new();
        for &id in ids {
            let record = self.batch.get(id).ok_or(ExportError::UnknownFile(id))?;
            if let Some(output) = record.cleaned.as_ref() {
                items.push(ExportItem {
                    original_name: &record.name,
                    bytes: &output.bytes[..],
                    media_type: record.media_type.as_deref(),
                });
            }
        }

        let artifact = bundle(&items, &self.config, chrono::Utc::now())?;
        info!(
            file = %artifact.filename,
            entries = artifact.entries,
            size = %format_size(artifact.bytes.len() as u64),
            "exportación lista"
        );
        Ok(artifact)
    }

    /// Exporta todos los archivos limpios del lote.
    pub fn export_all(&self) -> Result<ExportArtifact, ExportError> {
        self.export(&self.batch.ids())
    }

    /// Limpia todo lo pendiente y entrega un único resultado con todos los archivos limpios.
    pub fn clean_all_and_export(&mut self) -> Result<ExportArtifact, ExportError> {
        self.clean_all();
        self.export_all()
    }

    /// Quita un archivo del lote en cualquier estado.
    pub fn remove(&mut self, id: FileId) -> Result<(), SessionError> {
        self.batch
            .remove(id)
            .ok_or(SessionError::UnknownFile(id))?;
        self.emit(SessionEvent::Removed { id });
        Ok(())
    }

    /// Vacía el lote. Devuelve cuántos archivos se descartaron.
    pub fn clear(&mut self) -> usize {
        let count = self.batch.clear();
        self.emit(SessionEvent::Cleared { count });
        count
    }

    fn run_extraction(&mut self, id: FileId) {
        let Some(record) = self.batch.get(id) else {
            return;
        };
        let snapshot = record.snapshot();

        self.transition(id, FileState::Analyzing);
        let metadata = extract_metadata(&self.registry, &snapshot, &self.config);
        info!(%id, file = %snapshot.name, entries = metadata.len(), "metadata extraída");

        if let Some(record) = self.batch.get_mut(id) {
            record.metadata = Some(metadata);
            record.selection = SelectionState::new();
        }
        self.transition(id, FileState::Ready);
    }

    fn selectable_record(
        &mut self,
        id: FileId,
        operation: &'static str,
    ) -> Result<&mut FileRecord, SessionError> {
        let record = self
            .batch
            .get_mut(id)
            .ok_or(SessionError::UnknownFile(id))?;
        if record.state != FileState::Ready {
            return Err(SessionError::InvalidState {
                id,
                state: record.state,
                operation,
            });
        }
        Ok(record)
    }

    fn transition(&mut self, id: FileId, to: FileState) {
        let Some(record) = self.batch.get_mut(id) else {
            return;
        };
        let from = record.state;
        record.state = to;
        self.emit(SessionEvent::StateChanged { id, from, to });
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests;
