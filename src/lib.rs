//! Motor de limpieza de metadata para lotes de archivos.
//!
//! El flujo es: ingesta, extracción, selección de lo que se conserva,
//! limpieza y exportación. Todo ocurre en memoria dentro de una [`Session`].

pub mod advanced_metadata;
pub mod config;
pub mod error;
pub mod export;
pub mod formatting;
pub mod handlers;
pub mod media;
pub mod metadata;
pub mod metadata_editor;
pub mod selection;
pub mod session;

#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
pub use error::{ConfigError, ExportError, IngestError, SessionError};
pub use export::ExportArtifact;
pub use handlers::{FileSnapshot, FormatHandler, HandlerRegistry};
pub use metadata::{MetadataEntry, MetadataMap, Namespace};
pub use metadata_editor::SanitizeStatus;
pub use selection::SelectionState;
pub use session::{CleanReport, FileId, FileInput, FileRecord, FileState, Session, SessionEvent};
