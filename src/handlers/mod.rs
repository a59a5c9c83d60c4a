//! Tabla de despacho por tipo de contenido.
//!
//! Cada familia de formato aporta un [`FormatHandler`] con sus extractores y su
//! estrategia de limpieza. Registrar un formato nuevo no toca los existentes.

mod image;
mod pdf;

pub use self::image::ImageHandler;
pub use pdf::PdfHandler;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{ExtractionError, SanitizeError};
use crate::metadata::MetadataEntry;

/// Copia barata de los datos de un archivo para una única operación.
#[derive(Clone, Debug)]
pub struct FileSnapshot {
    pub name: String,
    pub media_type: Option<String>,
    pub bytes: Arc<[u8]>,
    pub last_modified: Option<DateTime<Utc>>,
}

pub type ExtractFn = fn(&FileSnapshot, &EngineConfig) -> Result<Vec<MetadataEntry>, ExtractionError>;

/// Extractor independiente y sin efectos laterales.
#[derive(Clone, Copy)]
pub struct Extractor {
    pub name: &'static str,
    pub run: ExtractFn,
}

/// Resultado de una estrategia de limpieza.
#[derive(Debug)]
pub enum Sanitized {
    /// Bytes nuevos. `honors_selection` indica si solo se quitaron las claves elegidas.
    Rewritten {
        bytes: Vec<u8>,
        honors_selection: bool,
    },
    /// Parte de las claves elegidas sigue en el archivo. `bytes` es `None` si no se reescribió nada.
    Partial {
        bytes: Option<Vec<u8>>,
        remaining: Vec<String>,
    },
    /// No hay nada que quitar o el formato no tiene estrategia: se devuelve el original.
    PassThrough,
}

pub trait FormatHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn handles(&self, media_type: &str) -> bool;

    /// Extractores propios del formato, en orden de ejecución.
    fn extractors(&self) -> &[Extractor] {
        &[]
    }

    fn sanitize(
        &self,
        _file: &FileSnapshot,
        _removal: &[String],
        _config: &EngineConfig,
    ) -> Result<Sanitized, SanitizeError> {
        Ok(Sanitized::PassThrough)
    }
}

/// Formatos sin extractor propio ni estrategia de limpieza.
pub struct GenericHandler;

impl FormatHandler for GenericHandler {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn handles(&self, _media_type: &str) -> bool {
        true
    }
}

pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn FormatHandler>>,
    fallback: Arc<dyn FormatHandler>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
            fallback: Arc::new(GenericHandler),
        }
    }

    /// Registro con los formatos conocidos: imágenes y PDF.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ImageHandler));
        registry.register(Arc::new(PdfHandler));
        registry
    }

    /// Añade un formato. Los registrados después tienen prioridad.
    pub fn register(&mut self, handler: Arc<dyn FormatHandler>) {
        self.handlers.insert(0, handler);
    }

    pub fn resolve(&self, media_type: Option<&str>) -> Arc<dyn FormatHandler> {
        let handler = media_type
            .and_then(|value| self.handlers.iter().find(|handler| handler.handles(value)))
            .unwrap_or(&self.fallback);
        debug!(media_type = ?media_type, handler = handler.name(), "formato resuelto");
        Arc::clone(handler)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
