//! # clinsign-consent
//!
//! The consent document lifecycle: the state machine, the ordered
//! append-only signature subsystem, the annotation/regeneration gates, and
//! the `ConsentService` use-case layer that wires them to the policy engine,
//! the store, the renderer, and the audit trail.
//!
//! The state machine and the signature/annotation rules are pure functions
//! over the aggregate so they stay trivially testable; all I/O lives in
//! [`service::ConsentService`].

pub mod annotation;
pub mod lifecycle;
pub mod renderer;
pub mod service;
pub mod signing;

pub use annotation::{add_annotation, archive_annotation, update_annotation};
pub use lifecycle::{
    can_annotate, can_regenerate_pdf, is_immutable, validate_transition, TRANSITIONS,
};
pub use renderer::{DynPdfRenderer, FinalPdf, PdfRenderer, RenderError, RenderedPdf};
pub use service::ConsentService;
pub use signing::{
    record_signature, SignatureOutcome, SignerIdentity, SigningConfig, TiedRankRule,
};
