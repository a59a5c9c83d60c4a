use serde::{Deserialize, Serialize};

use super::record::{FileId, FileState};
use crate::metadata_editor::SanitizeStatus;

/// Avisos de progreso para que la interfaz pinte el estado de cada archivo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Accepted {
        id: FileId,
        filename: String,
    },
    Rejected {
        filename: String,
        reason: String,
    },
    StateChanged {
        id: FileId,
        from: FileState,
        to: FileState,
    },
    Cleaned {
        id: FileId,
        status: SanitizeStatus,
    },
    Removed {
        id: FileId,
    },
    Cleared {
        count: usize,
    },
}
