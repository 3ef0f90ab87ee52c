//! Audit record types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::consent::{ConsentStatus, SignerType};
use crate::time::now_utc;
use crate::types::{Action, ResourceKind, Role};

/// Outcome of an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Allowed,
    Denied,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Allowed => "allowed",
            AuditOutcome::Denied => "denied",
        }
    }
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One access decision, allow or deny, as offered to the audit sink.
///
/// The `phi` flag marks decisions about resource kinds carrying protected
/// health information; sinks log those with heightened scrutiny.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEvent {
    pub subject_id: Uuid,
    pub roles: Vec<Role>,
    pub resource_kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub action: Action,
    pub outcome: AuditOutcome,
    pub reason: String,
    pub phi: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl AccessEvent {
    pub fn new(
        subject_id: Uuid,
        roles: Vec<Role>,
        resource_kind: ResourceKind,
        resource_id: Option<String>,
        action: Action,
        outcome: AuditOutcome,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            subject_id,
            roles,
            resource_kind,
            resource_id,
            action,
            outcome,
            reason: reason.into(),
            phi: resource_kind.is_phi(),
            timestamp: now_utc(),
        }
    }
}

/// The kind of annotation mutation that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationOp {
    Created,
    Updated,
    Archived,
}

/// What happened to a consent document. Only successful operations are
/// recorded here; rejected ones surface as denied `AccessEvent`s or as
/// domain errors to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsentEventKind {
    Created,
    StatusChanged {
        from: ConsentStatus,
        to: ConsentStatus,
    },
    SignatureRecorded {
        signer_type: SignerType,
    },
    AnnotationMutated {
        op: AnnotationOp,
    },
    PdfRegenerated,
}

/// One consent lifecycle event, scoped to a single document and patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentEvent {
    pub document_id: String,
    pub patient_id: String,
    pub subject_id: Uuid,
    #[serde(flatten)]
    pub kind: ConsentEventKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ConsentEvent {
    pub fn new(
        document_id: impl Into<String>,
        patient_id: impl Into<String>,
        subject_id: Uuid,
        kind: ConsentEventKind,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            patient_id: patient_id.into(),
            subject_id,
            kind,
            timestamp: now_utc(),
        }
    }
}

/// Unified audit event offered to the trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuditEvent {
    Access(AccessEvent),
    Consent(ConsentEvent),
}

impl AuditEvent {
    /// Returns `true` for events about protected health information.
    #[must_use]
    pub fn is_phi(&self) -> bool {
        match self {
            AuditEvent::Access(e) => e.phi,
            // Consent documents are always patient-scoped PHI.
            AuditEvent::Consent(_) => true,
        }
    }

    /// The document id this event concerns, if any.
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        match self {
            AuditEvent::Access(_) => None,
            AuditEvent::Consent(e) => Some(&e.document_id),
        }
    }
}
