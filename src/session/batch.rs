use super::record::{FileId, FileRecord};

/// Colección ordenada de los archivos de la sesión. El orden solo sirve para mostrarlos.
#[derive(Debug, Default)]
pub struct Batch {
    records: Vec<FileRecord>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: FileId) -> Option<&mut FileRecord> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    pub(crate) fn remove(&mut self, id: FileId) -> Option<FileRecord> {
        let index = self.records.iter().position(|record| record.id == id)?;
        Some(self.records.remove(index))
    }

    pub(crate) fn clear(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<FileId> {
        self.records.iter().map(|record| record.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
