//! Errores del motor de limpieza.
//!
//! Solo la ingesta, el ciclo de vida y la exportación devuelven errores al
//! llamador. Los fallos de extracción y de saneamiento se degradan localmente.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::{FileId, FileState};

/// Rechazos durante la ingesta de un archivo.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("El formato de `{filename}` ({media_type}) no está soportado. Conviértelo a JPEG o PNG primero.")]
    UnsupportedFormat {
        filename: String,
        media_type: String,
    },

    #[error("No se pudo leer `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    /// Nombre del archivo afectado, para que la interfaz pueda avisar al usuario.
    pub fn filename(&self) -> String {
        match self {
            IngestError::UnsupportedFormat { filename, .. } => filename.clone(),
            IngestError::Io { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Usos inválidos del lote o del modelo de selección.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No existe el archivo {0} en el lote")]
    UnknownFile(FileId),

    #[error("El archivo {id} no tiene la entrada de metadata `{key}`")]
    UnknownKey { id: FileId, key: String },

    #[error("No se puede {operation} el archivo {id} en estado {state}")]
    InvalidState {
        id: FileId,
        state: FileState,
        operation: &'static str,
    },
}

/// Fallos al empaquetar los archivos limpios.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No hay archivos limpios para descargar")]
    NothingToExport,

    #[error("No existe el archivo {0} en el lote")]
    UnknownFile(FileId),

    #[error("Error escribiendo el archivo ZIP: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Error escribiendo contenido: {0}")]
    Io(#[from] std::io::Error),
}

/// Fallos al cargar o validar la configuración.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No se pudo leer la configuración `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuración JSON inválida: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Valor de configuración inválido: {0}")]
    Invalid(String),
}

/// Fallo de un extractor individual. Nunca llega al llamador: el extractor aporta cero entradas.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("metadata EXIF ilegible: {0}")]
    Exif(#[from] exif::Error),

    #[error("fragmentos PNG ilegibles: {0}")]
    Png(#[from] png::DecodingError),
}

/// Motivo por el que el saneamiento devolvió la copia original.
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("no se pudo decodificar la imagen: {0}")]
    Decode(image::ImageError),

    #[error("no se pudo recodificar la imagen: {0}")]
    Encode(image::ImageError),

    /// El hilo de la tarea vencida no se cancela: sigue vivo, con su copia de los bytes,
    /// hasta que el decodificador termina por su cuenta.
    #[error("tiempo de espera excedido ({} ms)", .0.as_millis())]
    Timeout(Duration),

    #[error("la tarea de limpieza terminó sin resultado")]
    Disconnected,

    #[error("la verificación indicó que la metadata no se eliminó correctamente")]
    Verification,

    #[error("no se pudo reescribir el PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("no se pudo escribir el PDF limpio: {0}")]
    Io(#[from] std::io::Error),
}
