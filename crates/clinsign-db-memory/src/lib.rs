//! # clinsign-db-memory
//!
//! In-memory implementation of the `ConsentStore` repository boundary,
//! used by tests and as the reference for the commit semantics every
//! backend must provide: commit is a compare-and-swap on the stored
//! version, performed under the map's per-entry lock so exactly one of two
//! racing writers succeeds.

mod storage;

pub use storage::MemoryConsentStore;
