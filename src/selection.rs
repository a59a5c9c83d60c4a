//! Selección por archivo de las entradas que se conservan.
//!
//! Tras la extracción no se conserva nada: toda la metadata queda marcada para eliminar.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::metadata::MetadataMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    retained: BTreeSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_retained(&self, key: &str) -> bool {
        self.retained.contains(key)
    }

    /// Marca una clave para conservar o eliminar. Devuelve `false` si la clave no existe.
    pub fn set_retained(&mut self, metadata: &MetadataMap, key: &str, retained: bool) -> bool {
        if !metadata.contains_key(key) {
            return false;
        }
        if retained {
            self.retained.insert(key.to_string());
        } else {
            self.retained.remove(key);
        }
        true
    }

    /// Botón de seleccionar/deseleccionar todo.
    ///
    /// Si todas las entradas están marcadas para eliminar, pasan a conservarse todas;
    /// en cualquier otro caso vuelven a marcarse todas para eliminar.
    pub fn toggle_all(&mut self, metadata: &MetadataMap) {
        if self.all_marked_for_removal(metadata) {
            self.retained = metadata.keys().map(str::to_string).collect();
        } else {
            self.retained.clear();
        }
    }

    /// Claves marcadas para eliminar, en el orden de la metadata.
    pub fn removal_set(&self, metadata: &MetadataMap) -> Vec<String> {
        metadata
            .keys()
            .filter(|key| !self.is_retained(key))
            .map(str::to_string)
            .collect()
    }

    /// Claves conservadas, en el orden de la metadata.
    pub fn retained_keys(&self, metadata: &MetadataMap) -> Vec<String> {
        metadata
            .keys()
            .filter(|key| self.is_retained(key))
            .map(str::to_string)
            .collect()
    }

    pub fn all_marked_for_removal(&self, metadata: &MetadataMap) -> bool {
        metadata.keys().all(|key| !self.is_retained(key))
    }
}
