//! Configuración del motor, cargable desde JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Límite de espera para decodificar y recodificar una imagen.
    pub decode_timeout_ms: u64,
    /// Bytes iniciales de un PDF en los que se buscan claves del diccionario Info.
    pub pdf_scan_limit: usize,
    pub jpeg_quality: u8,
    /// Nivel deflate de los paquetes ZIP (0-9).
    pub archive_compression_level: u8,
    /// Aplica la orientación EXIF a los píxeles antes de descartar la etiqueta.
    pub apply_orientation: bool,
    /// Relee la imagen recodificada y degrada si sobrevive alguna etiqueta.
    pub verify_output: bool,
    pub rejected_media_types: Vec<String>,
    pub rejected_extensions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decode_timeout_ms: 10_000,
            pdf_scan_limit: 10_000,
            jpeg_quality: 92,
            archive_compression_level: 6,
            apply_orientation: true,
            verify_output: true,
            rejected_media_types: vec!["image/heic".to_string(), "image/heif".to_string()],
            rejected_extensions: vec!["heic".to_string(), "heif".to_string()],
        }
    }
}

impl EngineConfig {
    /// Interpreta un documento JSON; los campos ausentes toman su valor por defecto.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality debe estar entre 1 y 100 (recibido {})",
                self.jpeg_quality
            )));
        }
        if self.archive_compression_level > 9 {
            return Err(ConfigError::Invalid(format!(
                "archive_compression_level debe estar entre 0 y 9 (recibido {})",
                self.archive_compression_level
            )));
        }
        Ok(())
    }

    pub fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.decode_timeout_ms)
    }
}
