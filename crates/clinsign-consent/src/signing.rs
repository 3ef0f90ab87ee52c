//! The signature subsystem.
//!
//! Signatures are append-only and strictly ordered by signer rank. Checks
//! run in a fixed order: immutability of the document, then duplicate signer
//! type, then rank ordering. Only after all three pass is the signature
//! appended and the document status recomputed, and recomputation always
//! flows through the transition validator.

use serde::{Deserialize, Serialize};

use clinsign_core::{
    now_utc, ConsentDocument, ConsentStatus, DomainError, Signature, SignatureProof, SignerType,
};

use crate::lifecycle::{is_immutable, validate_transition};

/// How signer types that share a rank are treated by the ordering check.
///
/// The rank table puts `Patient` and `Guardian` both at rank 1. Under
/// `AnyOfRank` a rank is satisfied once any one of its signer types has
/// signed ("OR within a rank, AND across ranks"); under `AllOfRank` every
/// signer type of the rank must have signed. `AnyOfRank` is the default: a
/// guardian signs in place of the patient, not in addition to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiedRankRule {
    #[default]
    AnyOfRank,
    AllOfRank,
}

/// Configuration for the signature subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningConfig {
    pub tied_rank_rule: TiedRankRule,
}

/// Who is signing, as asserted by the caller's identity context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerIdentity {
    pub signer_id: String,
    pub signer_name: String,
}

impl SignerIdentity {
    pub fn new(signer_id: impl Into<String>, signer_name: impl Into<String>) -> Self {
        Self {
            signer_id: signer_id.into(),
            signer_name: signer_name.into(),
        }
    }
}

/// Result of an accepted signature: the appended record plus the status
/// transition it caused, if any.
#[derive(Debug, Clone)]
pub struct SignatureOutcome {
    pub signature: Signature,
    pub status_change: Option<(ConsentStatus, ConsentStatus)>,
}

/// Record a signature on the document.
///
/// # Errors
///
/// `ImmutableDocument` if the document is in a terminal or signed state,
/// `DuplicateSignature` if this signer type already signed,
/// `SignatureOrderViolation` if a strictly lower rank is not yet satisfied
/// under the configured tied-rank rule.
pub fn record_signature(
    document: &mut ConsentDocument,
    signer_type: SignerType,
    identity: SignerIdentity,
    proof: SignatureProof,
    config: SigningConfig,
) -> Result<SignatureOutcome, DomainError> {
    if is_immutable(document.status) {
        return Err(DomainError::immutable_document(document.status));
    }

    // Duplicate check runs before the ordering check: a repeat signer gets
    // the duplicate error even when ordering would also have failed.
    if document.has_signer(signer_type) {
        return Err(DomainError::duplicate_signature(signer_type));
    }

    check_rank_order(document, signer_type, config.tied_rank_rule)?;

    let signature = Signature::new(identity.signer_id, identity.signer_name, signer_type, proof);
    document.signatures.push(signature.clone());

    let from = document.status;
    recompute_status(document)?;
    document.touch();

    let status_change = (document.status != from).then_some((from, document.status));
    if let Some((from, to)) = status_change {
        tracing::info!(
            document_id = %document.id,
            %signer_type,
            %from,
            %to,
            "signature recorded, status advanced"
        );
    }

    Ok(SignatureOutcome {
        signature,
        status_change,
    })
}

/// Every rank strictly below the signer's must be satisfied before the
/// signer may sign.
fn check_rank_order(
    document: &ConsentDocument,
    signer_type: SignerType,
    rule: TiedRankRule,
) -> Result<(), DomainError> {
    let mut unmet = Vec::new();

    for rank in 1..signer_type.rank() {
        let peers: Vec<SignerType> = SignerType::ALL
            .into_iter()
            .filter(|t| t.rank() == rank)
            .collect();

        let satisfied = match rule {
            TiedRankRule::AnyOfRank => peers.iter().any(|t| document.has_signer(*t)),
            TiedRankRule::AllOfRank => peers.iter().all(|t| document.has_signer(*t)),
        };
        if satisfied {
            continue;
        }

        let description = match rule {
            TiedRankRule::AnyOfRank => {
                let names: Vec<&str> = peers.iter().map(SignerType::as_str).collect();
                format!("no rank-{rank} signature ({}) present", names.join(" or "))
            }
            TiedRankRule::AllOfRank => {
                let missing: Vec<&str> = peers
                    .iter()
                    .filter(|t| !document.has_signer(**t))
                    .map(|t| t.as_str())
                    .collect();
                format!("missing rank-{rank} signatures: {}", missing.join(", "))
            }
        };
        unmet.push(description);
    }

    if unmet.is_empty() {
        Ok(())
    } else {
        Err(DomainError::order_violation(signer_type, unmet.join("; ")))
    }
}

/// Recompute the document status after an accepted signature, through the
/// transition validator only.
///
/// The table has no Draft -> PartiallySigned edge, so a first signature on a
/// draft advances through ReadyForSignature first, two validated hops.
fn recompute_status(document: &mut ConsentDocument) -> Result<(), DomainError> {
    match document.status {
        ConsentStatus::Draft => {
            advance(document, ConsentStatus::ReadyForSignature)?;
            advance(document, ConsentStatus::PartiallySigned)?;
        }
        ConsentStatus::ReadyForSignature => {
            advance(document, ConsentStatus::PartiallySigned)?;
        }
        ConsentStatus::PartiallySigned => {}
        // Unreachable past the immutability check, but surfaced as the same
        // error rather than a panic if that ever regresses.
        status @ (ConsentStatus::Signed | ConsentStatus::Revoked | ConsentStatus::Archived) => {
            return Err(DomainError::immutable_document(status));
        }
    }

    if signing_complete(document) {
        advance(document, ConsentStatus::Signed)?;
        document.locked_at = Some(now_utc());
    }

    Ok(())
}

/// Signed once at least one rank-1 signer (patient or guardian) and the
/// doctor have both signed.
fn signing_complete(document: &ConsentDocument) -> bool {
    let rank_one =
        document.has_signer(SignerType::Patient) || document.has_signer(SignerType::Guardian);
    rank_one && document.has_signer(SignerType::Doctor)
}

fn advance(document: &mut ConsentDocument, to: ConsentStatus) -> Result<(), DomainError> {
    validate_transition(document.status, to)?;
    document.status = to;
    Ok(())
}
