//! Motor de limpieza: produce la copia saneada de un archivo.
//!
//! Nunca devuelve error. Si la estrategia del formato falla o excede el tiempo
//! límite, el resultado es la copia original marcada como degradada.

mod image;
mod pdf;

pub use self::image::{reencode_image, verify_image_metadata_clean};
pub use pdf::{StrippedPdf, strip_pdf_info};

use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::SanitizeError;
use crate::handlers::{FileSnapshot, FormatHandler, Sanitized};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SanitizeStatus {
    /// Se escribieron bytes nuevos. Con `honors_selection == false` se descartó
    /// toda la metadata del formato, incluidas las entradas conservadas.
    Stripped { honors_selection: bool },
    /// Solo se quitó una parte: las claves de `remaining` siguen en el archivo.
    Partial { remaining: Vec<String> },
    /// El formato no tiene estrategia o no había nada que quitar.
    Unchanged,
    /// La limpieza falló y se devolvió el original: la metadata sigue presente.
    Degraded { reason: String },
}

impl SanitizeStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SanitizeStatus::Degraded { .. })
    }
}

#[derive(Clone, Debug)]
pub struct SanitizeOutcome {
    pub bytes: Arc<[u8]>,
    pub status: SanitizeStatus,
}

/// Aplica la estrategia del formato con el tiempo límite de la configuración.
pub fn sanitize_file(
    handler: Arc<dyn FormatHandler>,
    file: FileSnapshot,
    removal: &[String],
    config: &EngineConfig,
) -> SanitizeOutcome {
    let original = Arc::clone(&file.bytes);
    let name = file.name.clone();
    let removal = removal.to_vec();
    let task_config = config.clone();

    let result = run_with_timeout(config.decode_timeout(), move || {
        handler.sanitize(&file, &removal, &task_config)
    });

    let outcome = match result {
        Ok(Sanitized::Rewritten {
            bytes,
            honors_selection,
        }) => SanitizeOutcome {
            bytes: bytes.into(),
            status: SanitizeStatus::Stripped { honors_selection },
        },
        Ok(Sanitized::Partial { bytes, remaining }) => {
            warn!(file = %name, ?remaining, "limpieza parcial, quedan claves seleccionadas");
            SanitizeOutcome {
                bytes: bytes.map_or(original, Arc::from),
                status: SanitizeStatus::Partial { remaining },
            }
        }
        Ok(Sanitized::PassThrough) => SanitizeOutcome {
            bytes: original,
            status: SanitizeStatus::Unchanged,
        },
        Err(error) => {
            warn!(file = %name, %error, "limpieza degradada, se conserva el original");
            SanitizeOutcome {
                bytes: original,
                status: SanitizeStatus::Degraded {
                    reason: error.to_string(),
                },
            }
        }
    };

    info!(file = %name, status = ?outcome.status, "limpieza completada");
    outcome
}

/// Ejecuta `task` en un hilo aparte y deja de esperarla al vencer `timeout`.
///
/// Una tarea vencida sigue corriendo hasta terminar, pero su resultado se descarta.
/// Cada vencimiento deja un hilo ocupado y el `Arc` de la entrada retenido hasta
/// entonces; un lote de imágenes que superan el límite acumula esos hilos.
pub(crate) fn run_with_timeout<T, F>(timeout: Duration, task: F) -> Result<T, SanitizeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SanitizeError> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let _ = sender.send(task());
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(SanitizeError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(SanitizeError::Disconnected),
    }
}
