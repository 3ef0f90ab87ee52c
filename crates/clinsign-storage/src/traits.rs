//! The repository trait all consent storage backends implement.

use async_trait::async_trait;
use clinsign_core::ConsentDocument;

use crate::error::StorageError;

/// Storage contract for consent documents.
///
/// Implementations must be thread-safe (`Send + Sync`). Each document is an
/// independent consistency boundary; there is no cross-document transaction
/// requirement.
///
/// # Example
///
/// ```ignore
/// use clinsign_storage::{ConsentStore, StorageError};
///
/// async fn load_or_fail(
///     store: &dyn ConsentStore,
///     id: &str,
/// ) -> Result<clinsign_core::ConsentDocument, StorageError> {
///     store
///         .load(id)
///         .await?
///         .ok_or_else(|| StorageError::not_found(id))
/// }
/// ```
#[async_trait]
pub trait ConsentStore: Send + Sync {
    /// Inserts a newly created document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a document with this id is
    /// already stored.
    async fn insert(&self, document: &ConsentDocument) -> Result<(), StorageError>;

    /// Loads a document by id.
    ///
    /// Returns `None` if the document does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// documents.
    async fn load(&self, id: &str) -> Result<Option<ConsentDocument>, StorageError>;

    /// Commits a mutated document.
    ///
    /// `expected_version` is the version the writer read before mutating;
    /// the document being committed carries the incremented version. The
    /// commit succeeds only if the stored version still equals
    /// `expected_version` — the compare-and-swap that makes concurrent
    /// writers race safely. A cancelled operation that never reaches commit
    /// leaves the stored aggregate untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist.
    /// Returns `StorageError::VersionConflict` if another writer committed
    /// first.
    async fn commit(
        &self,
        document: &ConsentDocument,
        expected_version: u64,
    ) -> Result<(), StorageError>;

    /// Lists all documents scoped to a patient.
    async fn list_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<ConsentDocument>, StorageError>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
