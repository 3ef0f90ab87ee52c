//! The consent state machine.
//!
//! A fixed transition table over `ConsentStatus`, with no privileged bypass:
//! an administrative role cannot force an illegal transition, because the
//! machine exists to make the document's history legally defensible and an
//! override would void exactly that guarantee. Status recomputation anywhere
//! in the workspace must flow through [`validate_transition`], never by
//! assigning `status` directly.

use clinsign_core::{ConsentStatus, DomainError};

/// The allowed transitions. `Archived` is terminal; `Draft` is initial.
pub const TRANSITIONS: &[(ConsentStatus, ConsentStatus)] = &[
    (ConsentStatus::Draft, ConsentStatus::ReadyForSignature),
    (ConsentStatus::Draft, ConsentStatus::Archived),
    (ConsentStatus::ReadyForSignature, ConsentStatus::PartiallySigned),
    (ConsentStatus::ReadyForSignature, ConsentStatus::Archived),
    (ConsentStatus::PartiallySigned, ConsentStatus::Signed),
    (ConsentStatus::PartiallySigned, ConsentStatus::Revoked),
    (ConsentStatus::Signed, ConsentStatus::Revoked),
    (ConsentStatus::Signed, ConsentStatus::Archived),
    (ConsentStatus::Revoked, ConsentStatus::Archived),
];

/// Validate a status transition against the table.
///
/// # Errors
///
/// Returns `DomainError::InvalidStateTransition` for any pair not in the
/// table, including self-transitions.
pub fn validate_transition(from: ConsentStatus, to: ConsentStatus) -> Result<(), DomainError> {
    if TRANSITIONS.contains(&(from, to)) {
        Ok(())
    } else {
        Err(DomainError::invalid_transition(from, to))
    }
}

/// Immutable statuses reject every document mutation: no signatures, no
/// annotation changes, no PDF regeneration.
#[must_use]
pub fn is_immutable(status: ConsentStatus) -> bool {
    matches!(
        status,
        ConsentStatus::Signed | ConsentStatus::Revoked | ConsentStatus::Archived
    )
}

/// Whether annotations may be created, updated, or archived.
#[must_use]
pub fn can_annotate(status: ConsentStatus) -> bool {
    matches!(
        status,
        ConsentStatus::Draft | ConsentStatus::ReadyForSignature | ConsentStatus::PartiallySigned
    )
}

/// Whether the draft PDF may be re-rendered. Once the document leaves
/// `Draft` the rendered bytes are frozen; corrections require a new
/// document.
#[must_use]
pub fn can_regenerate_pdf(status: ConsentStatus) -> bool {
    matches!(status, ConsentStatus::Draft)
}
