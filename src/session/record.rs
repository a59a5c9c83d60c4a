use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::IngestError;
use crate::handlers::FileSnapshot;
use crate::metadata::MetadataMap;
use crate::metadata_editor::SanitizeStatus;
use crate::selection::SelectionState;

/// Identificador opaco de un archivo dentro de la sesión.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub(crate) u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Ciclo de vida: `Queued → Analyzing → Ready → Cleaning → Cleaned`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Queued,
    Analyzing,
    Ready,
    Cleaning,
    Cleaned,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileState::Queued => "en cola",
            FileState::Analyzing => "analizando",
            FileState::Ready => "listo para limpiar",
            FileState::Cleaning => "limpiando",
            FileState::Cleaned => "limpio",
        };
        f.write_str(label)
    }
}

/// Archivo entregado por el colaborador externo.
#[derive(Clone, Debug)]
pub struct FileInput {
    pub name: String,
    /// Tipo declarado; vacío si el colaborador no lo conoce.
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, time: DateTime<Utc>) -> Self {
        self.last_modified = Some(time);
        self
    }

    /// Lee un archivo del disco. El tipo se deduce después a partir del contenido.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let io_error = |source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        };

        let bytes = fs::read(path).map_err(io_error)?;
        let last_modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let name = path
            .file_name()
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            media_type: String::new(),
            bytes,
            last_modified,
        })
    }
}

/// Resultado de la limpieza. Bytes saneados y claves eliminadas existen siempre juntos.
#[derive(Clone, Debug)]
pub(crate) struct CleanedOutput {
    pub bytes: Arc<[u8]>,
    pub removed_keys: Vec<String>,
    pub retained_keys: Vec<String>,
    pub status: SanitizeStatus,
}

#[derive(Clone, Debug)]
pub struct FileRecord {
    pub(crate) id: FileId,
    pub(crate) name: String,
    pub(crate) declared_media_type: String,
    pub(crate) media_type: Option<String>,
    pub(crate) bytes: Arc<[u8]>,
    pub(crate) last_modified: Option<DateTime<Utc>>,
    pub(crate) state: FileState,
    pub(crate) metadata: Option<MetadataMap>,
    pub(crate) selection: SelectionState,
    pub(crate) cleaned: Option<CleanedOutput>,
}

impl FileRecord {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn declared_media_type(&self) -> &str {
        &self.declared_media_type
    }

    /// Tipo efectivo usado para elegir extractores y estrategia de limpieza.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    pub fn metadata(&self) -> Option<&MetadataMap> {
        self.metadata.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn sanitized_bytes(&self) -> Option<&[u8]> {
        self.cleaned.as_ref().map(|output| &output.bytes[..])
    }

    pub fn removed_keys(&self) -> Option<&[String]> {
        self.cleaned.as_ref().map(|output| output.removed_keys.as_slice())
    }

    pub fn is_cleaned(&self) -> bool {
        self.state == FileState::Cleaned
    }

    pub(crate) fn snapshot(&self) -> FileSnapshot {
        FileSnapshot {
            name: self.name.clone(),
            media_type: self.media_type.clone(),
            bytes: Arc::clone(&self.bytes),
            last_modified: self.last_modified,
        }
    }
}
