use thiserror::Error;

use crate::consent::{ConsentStatus, SignerType};

/// Domain error taxonomy shared by the consent lifecycle and the access
/// policy engine. Every variant except `Infrastructure` is a structured
/// rejection the caller is expected to handle; none of them should crash a
/// request.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Resource not found: {resource_type}/{id}")]
    NotFound { resource_type: String, id: String },

    #[error("Invalid consent transition: {from} -> {to}")]
    InvalidStateTransition {
        from: ConsentStatus,
        to: ConsentStatus,
    },

    #[error("Document is immutable in status {status}")]
    ImmutableDocument { status: ConsentStatus },

    #[error("Signatures are append-only and can never be updated or deleted")]
    ImmutableSignature,

    #[error("Signature order violation for {signer_type}: {missing}")]
    SignatureOrderViolation {
        signer_type: SignerType,
        missing: String,
    },

    #[error("Duplicate signature: {signer_type} has already signed this document")]
    DuplicateSignature { signer_type: SignerType },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Infrastructure error: {message}")]
    Infrastructure { message: String },
}

impl DomainError {
    /// Create a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: ConsentStatus, to: ConsentStatus) -> Self {
        Self::InvalidStateTransition { from, to }
    }

    /// Create a new `ImmutableDocument` error.
    #[must_use]
    pub fn immutable_document(status: ConsentStatus) -> Self {
        Self::ImmutableDocument { status }
    }

    /// Create a new `SignatureOrderViolation` error.
    #[must_use]
    pub fn order_violation(signer_type: SignerType, missing: impl Into<String>) -> Self {
        Self::SignatureOrderViolation {
            signer_type,
            missing: missing.into(),
        }
    }

    /// Create a new `DuplicateSignature` error.
    #[must_use]
    pub fn duplicate_signature(signer_type: SignerType) -> Self {
        Self::DuplicateSignature { signer_type }
    }

    /// Create a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }

    /// Create a new `VersionConflict` error.
    #[must_use]
    pub fn version_conflict(expected: u64, actual: u64) -> Self {
        Self::VersionConflict { expected, actual }
    }

    /// Create a new `Infrastructure` error.
    #[must_use]
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Check if this error is recoverable by the caller (a structured
    /// rejection rather than a collaborator failure).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Infrastructure { .. })
    }

    /// Get error category for logging/monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidStateTransition { .. } => ErrorCategory::Lifecycle,
            Self::ImmutableDocument { .. } | Self::ImmutableSignature => ErrorCategory::Immutable,
            Self::SignatureOrderViolation { .. } => ErrorCategory::Ordering,
            Self::DuplicateSignature { .. } | Self::VersionConflict { .. } => {
                ErrorCategory::Conflict
            }
            Self::AccessDenied { .. } => ErrorCategory::Forbidden,
            Self::Infrastructure { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Error categories for monitoring and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Lifecycle,
    Immutable,
    Ordering,
    Conflict,
    Forbidden,
    Infrastructure,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Lifecycle => write!(f, "lifecycle"),
            Self::Immutable => write!(f, "immutable"),
            Self::Ordering => write!(f, "ordering"),
            Self::Conflict => write!(f, "conflict"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// Convenience result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = DomainError::not_found("ConsentDocument", "123");
        assert_eq!(err.to_string(), "Resource not found: ConsentDocument/123");
        assert!(err.is_not_found());
        assert!(err.is_client_error());
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = DomainError::invalid_transition(ConsentStatus::Archived, ConsentStatus::Draft);
        assert_eq!(err.to_string(), "Invalid consent transition: ARCHIVED -> DRAFT");
        assert_eq!(err.category(), ErrorCategory::Lifecycle);
    }

    #[test]
    fn test_immutable_errors() {
        let err = DomainError::immutable_document(ConsentStatus::Signed);
        assert_eq!(err.to_string(), "Document is immutable in status SIGNED");
        assert_eq!(err.category(), ErrorCategory::Immutable);

        assert_eq!(
            DomainError::ImmutableSignature.category(),
            ErrorCategory::Immutable
        );
    }

    #[test]
    fn test_signature_order_violation() {
        let err = DomainError::order_violation(
            SignerType::Doctor,
            "no rank-1 signature (patient or guardian) present",
        );
        assert!(err.to_string().contains("DOCTOR"));
        assert!(err.to_string().contains("rank-1"));
        assert_eq!(err.category(), ErrorCategory::Ordering);
    }

    #[test]
    fn test_duplicate_signature() {
        let err = DomainError::duplicate_signature(SignerType::Patient);
        assert!(err.to_string().contains("PATIENT"));
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_version_conflict() {
        let err = DomainError::version_conflict(3, 4);
        assert_eq!(err.to_string(), "Version conflict: expected 3, found 4");
        assert!(err.is_version_conflict());
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_access_denied() {
        let err = DomainError::access_denied("no care relationship to patient");
        assert_eq!(
            err.to_string(),
            "Access denied: no care relationship to patient"
        );
        assert_eq!(err.category(), ErrorCategory::Forbidden);
    }

    #[test]
    fn test_infrastructure_is_not_client_error() {
        let err = DomainError::infrastructure("audit sink unreachable");
        assert!(!err.is_client_error());
        assert_eq!(err.category(), ErrorCategory::Infrastructure);

        // Every other variant is recoverable by the caller.
        assert!(DomainError::ImmutableSignature.is_client_error());
        assert!(DomainError::version_conflict(1, 2).is_client_error());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
        assert_eq!(ErrorCategory::Lifecycle.to_string(), "lifecycle");
        assert_eq!(ErrorCategory::Immutable.to_string(), "immutable");
        assert_eq!(ErrorCategory::Ordering.to_string(), "ordering");
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
        assert_eq!(ErrorCategory::Forbidden.to_string(), "forbidden");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
