//! The consent document aggregate and its owned children.
//!
//! `ConsentDocument` is the aggregate root for one patient's instance of a
//! legal consent form. Signatures are append-only children; annotations are
//! soft-deleted children. Lifecycle rules (which transitions are legal, when
//! signatures and annotations are accepted) live in the `clinsign-consent`
//! crate; this module is the data model plus its invariant-preserving
//! accessors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use time::OffsetDateTime;

use crate::id::generate_id;
use crate::time::now_utc;

/// Lifecycle status of a consent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    Draft,
    ReadyForSignature,
    PartiallySigned,
    Signed,
    Revoked,
    Archived,
}

impl ConsentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentStatus::Draft => "DRAFT",
            ConsentStatus::ReadyForSignature => "READY_FOR_SIGNATURE",
            ConsentStatus::PartiallySigned => "PARTIALLY_SIGNED",
            ConsentStatus::Signed => "SIGNED",
            ConsentStatus::Revoked => "REVOKED",
            ConsentStatus::Archived => "ARCHIVED",
        }
    }

    /// All statuses, for exhaustive table-driven tests.
    pub const ALL: [ConsentStatus; 6] = [
        ConsentStatus::Draft,
        ConsentStatus::ReadyForSignature,
        ConsentStatus::PartiallySigned,
        ConsentStatus::Signed,
        ConsentStatus::Revoked,
        ConsentStatus::Archived,
    ];
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The role-of-signature category. Distinct from the signer's system role:
/// a user with the `Doctor` role signs as `SignerType::Doctor`, but a
/// patient signer usually has no system role at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignerType {
    Patient,
    Guardian,
    Doctor,
    NurseWitness,
    Admin,
}

impl SignerType {
    /// Required signing rank. Every rank strictly below a signer's rank must
    /// be satisfied before that signer may sign.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            SignerType::Patient | SignerType::Guardian => 1,
            SignerType::Doctor => 2,
            SignerType::NurseWitness => 3,
            SignerType::Admin => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignerType::Patient => "PATIENT",
            SignerType::Guardian => "GUARDIAN",
            SignerType::Doctor => "DOCTOR",
            SignerType::NurseWitness => "NURSE_WITNESS",
            SignerType::Admin => "ADMIN",
        }
    }

    /// All signer types, for rank computations and tests.
    pub const ALL: [SignerType; 5] = [
        SignerType::Patient,
        SignerType::Guardian,
        SignerType::Doctor,
        SignerType::NurseWitness,
        SignerType::Admin,
    ];
}

impl fmt::Display for SignerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional provenance captured alongside a signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureProof {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// An accepted signature. Append-only: there is deliberately no mutator and
/// no removal path anywhere in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub id: String,
    pub signer_id: String,
    pub signer_name: String,
    pub signer_type: SignerType,
    #[serde(with = "time::serde::rfc3339")]
    pub signed_at: OffsetDateTime,
    #[serde(flatten)]
    pub proof: SignatureProof,
}

impl Signature {
    pub fn new(
        signer_id: impl Into<String>,
        signer_name: impl Into<String>,
        signer_type: SignerType,
        proof: SignatureProof,
    ) -> Self {
        Self {
            id: generate_id(),
            signer_id: signer_id.into(),
            signer_name: signer_name.into(),
            signer_type,
            signed_at: now_utc(),
            proof,
        }
    }
}

/// A positioned annotation on the rendered document. Deletion is soft: the
/// `archived` flag is set and the record stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub author_id: String,
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub content: String,
    pub archived: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Annotation {
    pub fn new(author_id: impl Into<String>, page: u32, x: f32, y: f32, content: impl Into<String>) -> Self {
        let now = now_utc();
        Self {
            id: generate_id(),
            author_id: author_id.into(),
            page,
            x,
            y,
            content: content.into(),
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate root for one patient's consent form instance.
///
/// The `version` counter implements optimistic concurrency: every mutation
/// supplies the version it read, and the store commits only if the stored
/// version still matches. Mutating helpers here bump `updated_at`; the
/// version bump happens exactly once per committed mutation, at the service
/// layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentDocument {
    pub id: String,
    pub patient_id: String,
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_id: Option<String>,
    pub status: ConsentStatus,
    #[serde(with = "time::serde::rfc3339::option", default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_pdf_hash: Option<String>,
    pub version: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ConsentDocument {
    /// Create a new document in `Draft` from a template, scoped to one
    /// patient. Documents are never deleted; terminal states are `Archived`
    /// and `Revoked`.
    pub fn from_template(patient_id: impl Into<String>, template_id: impl Into<String>) -> Self {
        let now = now_utc();
        Self {
            id: generate_id(),
            patient_id: patient_id.into(),
            template_id: template_id.into(),
            consultation_id: None,
            status: ConsentStatus::Draft,
            locked_at: None,
            generated_pdf_url: None,
            final_pdf_url: None,
            final_pdf_hash: None,
            version: 1,
            created_at: now,
            updated_at: now,
            signatures: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_consultation(mut self, consultation_id: impl Into<String>) -> Self {
        self.consultation_id = Some(consultation_id.into());
        self
    }

    /// Returns `true` if a signature of the given type already exists.
    #[must_use]
    pub fn has_signer(&self, signer_type: SignerType) -> bool {
        self.signatures.iter().any(|s| s.signer_type == signer_type)
    }

    /// Look up a signature by signer type. At most one exists per type.
    #[must_use]
    pub fn signature_of(&self, signer_type: SignerType) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.signer_type == signer_type)
    }

    /// Look up an annotation by id.
    #[must_use]
    pub fn annotation(&self, annotation_id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == annotation_id)
    }

    pub fn annotation_mut(&mut self, annotation_id: &str) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == annotation_id)
    }

    /// Stamp the modification time. Called by every mutating operation.
    pub fn touch(&mut self) {
        self.updated_at = now_utc();
    }

    /// Increment the optimistic-concurrency counter. Called exactly once per
    /// mutation, just before commit.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }
}
