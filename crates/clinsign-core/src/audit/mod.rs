//! Audit event system for the consent lifecycle.
//!
//! Every access decision, accepted signature, state transition, annotation
//! mutation, and PDF regeneration is offered to the audit trail exactly once
//! as a structured record. Delivery is best-effort: the trail never blocks
//! the operation that produced the record, and a missing or slow subscriber
//! never fails the caller.

mod trail;
mod types;

pub use trail::AuditTrail;
pub use types::{
    AccessEvent, AnnotationOp, AuditEvent, AuditOutcome, ConsentEvent, ConsentEventKind,
};
