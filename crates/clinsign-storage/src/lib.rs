//! # clinsign-storage
//!
//! Repository abstraction for consent documents.
//!
//! This crate defines the trait and error types that all storage backends
//! must implement. It contains no implementations; those live in separate
//! crates (e.g. `clinsign-db-memory`).
//!
//! The contract is built around optimistic concurrency: a writer loads a
//! document, mutates it, and commits with the version it read. The backend
//! accepts the commit only if the stored version is unchanged, so two racing
//! writers cannot both win — the loser observes a `VersionConflict` and must
//! reload.

mod error;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use traits::ConsentStore;

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a boxed store trait object.
pub type DynConsentStore = std::sync::Arc<dyn ConsentStore>;
