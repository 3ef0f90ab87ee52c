//! # clinsign-policy
//!
//! The cross-cutting authorization layer: resource identity resolution and
//! the access policy engine.
//!
//! Every inbound operation is resolved to a resource kind and id first, then
//! authorized against the subject's roles and patient relationships before
//! any state transition is allowed to occur. The engine is read-only and
//! side-effect-free apart from the best-effort audit record it offers per
//! decision.
//!
//! # Example
//!
//! ```ignore
//! use clinsign_policy::{PolicyEngine, ResourceResolver, Resolution, Subject};
//! use clinsign_core::{Action, Verb};
//!
//! let resolution = resolver.resolve("/patients/123/consultations/456", &params);
//! if let Resolution::Resolved { kind, id } = resolution {
//!     let decision = engine
//!         .authorize(&subject, kind, id.as_deref(), Action::from_verb(Verb::Get))
//!         .await?;
//!     if decision.is_allowed() {
//!         // Proceed to load the aggregate
//!     }
//! }
//! ```

mod engine;
mod resolver;
mod subject;

pub use engine::{
    Decision, DenyReason, DirectoryError, PatientDirectory, PolicyEngine,
};
pub use resolver::{Resolution, ResolverConfig, ResourceResolver, RouteRule, ID_PARAM_ALIASES};
pub use subject::Subject;
