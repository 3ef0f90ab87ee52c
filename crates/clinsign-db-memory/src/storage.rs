use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use clinsign_core::ConsentDocument;
use clinsign_storage::{ConsentStore, StorageError};

/// In-memory consent store backed by a concurrent map.
///
/// `commit` takes the per-entry write lock, compares the stored version
/// against the version the writer read, and swaps the document only on a
/// match. Two writers racing from the same read version are serialized by
/// the entry lock; the second one observes the bumped version and gets a
/// `VersionConflict`.
#[derive(Debug, Default)]
pub struct MemoryConsentStore {
    documents: DashMap<String, ConsentDocument>,
}

impl MemoryConsentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl ConsentStore for MemoryConsentStore {
    async fn insert(&self, document: &ConsentDocument) -> Result<(), StorageError> {
        match self.documents.entry(document.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::already_exists(&document.id)),
            Entry::Vacant(slot) => {
                slot.insert(document.clone());
                Ok(())
            }
        }
    }

    async fn load(&self, id: &str) -> Result<Option<ConsentDocument>, StorageError> {
        Ok(self.documents.get(id).map(|entry| entry.value().clone()))
    }

    async fn commit(
        &self,
        document: &ConsentDocument,
        expected_version: u64,
    ) -> Result<(), StorageError> {
        // get_mut holds the entry's write lock for the whole
        // compare-and-swap.
        let mut entry = self
            .documents
            .get_mut(&document.id)
            .ok_or_else(|| StorageError::not_found(&document.id))?;

        if entry.version != expected_version {
            return Err(StorageError::version_conflict(
                expected_version,
                entry.version,
            ));
        }

        *entry = document.clone();
        Ok(())
    }

    async fn list_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<ConsentDocument>, StorageError> {
        Ok(self
            .documents
            .iter()
            .filter(|entry| entry.value().patient_id == patient_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
