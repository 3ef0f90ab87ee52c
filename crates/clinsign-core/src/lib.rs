pub mod audit;
pub mod consent;
pub mod error;
pub mod id;
pub mod time;
pub mod types;

pub use audit::{
    AccessEvent, AnnotationOp, AuditEvent, AuditOutcome, AuditTrail, ConsentEvent, ConsentEventKind,
};
pub use consent::{
    Annotation, ConsentDocument, ConsentStatus, Signature, SignatureProof, SignerType,
};
pub use error::{DomainError, ErrorCategory, Result};
pub use id::generate_id;
pub use time::now_utc;
pub use types::{Action, ResourceKind, Role, Verb};
