//! Modelo plano de metadata: entradas `clave con espacio de nombres → valor`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extractor responsable de una clave. Se antepone a la clave como `EXIF:`, `PDF:`, etc.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Exif,
    Png,
    Pdf,
    File,
}

impl Namespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Exif => "EXIF",
            Namespace::Png => "PNG",
            Namespace::Pdf => "PDF",
            Namespace::File => "File",
        }
    }

    pub fn key(self, name: &str) -> String {
        format!("{}:{}", self.prefix(), name)
    }

    /// Separa una clave completa en espacio de nombres y nombre.
    pub fn split(key: &str) -> Option<(Namespace, &str)> {
        let (prefix, name) = key.split_once(':')?;
        let namespace = match prefix {
            "EXIF" => Namespace::Exif,
            "PNG" => Namespace::Png,
            "PDF" => Namespace::Pdf,
            "File" => Namespace::File,
            _ => return None,
        };
        Some((namespace, name))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(namespace: Namespace, name: &str, value: impl Into<String>) -> Self {
        Self {
            key: namespace.key(name),
            value: value.into(),
        }
    }

    pub fn namespace(&self) -> Option<Namespace> {
        Namespace::split(&self.key).map(|(namespace, _)| namespace)
    }
}

/// Metadata de un archivo en el orden en que corrieron los extractores.
///
/// Las claves son únicas: si dos entradas comparten clave se conserva la primera.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataMap {
    entries: Vec<MetadataEntry>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta la entrada salvo que la clave ya exista. Devuelve si se insertó.
    pub fn insert(&mut self, entry: MetadataEntry) -> bool {
        if self.contains_key(&entry.key) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = MetadataEntry>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn in_namespace(&self, namespace: Namespace) -> impl Iterator<Item = &MetadataEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.namespace() == Some(namespace))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
