use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::file_record::{FileRecord, FileStatus};

/// Imported files in insertion order, addressed by id.
///
/// Ids are unique for the lifetime of the store. Updates against an id that
/// is no longer present are no-ops: an OCR completion may arrive after the
/// user removed its file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileStore {
    records: Vec<FileRecord>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn append(&mut self, record: FileRecord) -> Result<(), AppError> {
        if self.contains(&record.id) {
            return Err(AppError::General(format!(
                "duplicate file id: {}",
                record.id
            )));
        }
        self.records.push(record);
        Ok(())
    }

    /// Applies `mutation` to the record with `id`; `None` if it is gone.
    pub fn update_by_id<R>(
        &mut self,
        id: &str,
        mutation: impl FnOnce(&mut FileRecord) -> R,
    ) -> Option<R> {
        self.records.iter_mut().find(|r| r.id == id).map(mutation)
    }

    pub fn remove_by_id(&mut self, id: &str) -> Option<FileRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn count_with_status(&self, status: FileStatus) -> usize {
        self.records.iter().filter(|r| r.status() == status).count()
    }
}
