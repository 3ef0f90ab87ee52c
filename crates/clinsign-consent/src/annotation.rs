//! Annotation mutations and the PDF regeneration gate.
//!
//! Both are gated on the document status: annotations may change while the
//! document is still collecting signatures, the draft PDF may be re-rendered
//! only while the document is in `Draft`. Annotation deletion is soft; the
//! record stays with `archived` set.

use clinsign_core::{Annotation, ConsentDocument, DomainError};

use crate::lifecycle::{can_annotate, can_regenerate_pdf};

/// Add an annotation to the document. Returns the created record.
///
/// # Errors
///
/// `ImmutableDocument` when the status no longer permits annotation.
pub fn add_annotation(
    document: &mut ConsentDocument,
    author_id: impl Into<String>,
    page: u32,
    x: f32,
    y: f32,
    content: impl Into<String>,
) -> Result<Annotation, DomainError> {
    ensure_annotatable(document)?;
    let annotation = Annotation::new(author_id, page, x, y, content);
    document.annotations.push(annotation.clone());
    document.touch();
    Ok(annotation)
}

/// Replace the content of an existing annotation.
///
/// # Errors
///
/// `ImmutableDocument` when the status no longer permits annotation;
/// `NotFound` when the annotation does not exist or is archived.
pub fn update_annotation(
    document: &mut ConsentDocument,
    annotation_id: &str,
    content: impl Into<String>,
) -> Result<(), DomainError> {
    ensure_annotatable(document)?;
    let annotation = document
        .annotation_mut(annotation_id)
        .filter(|a| !a.archived)
        .ok_or_else(|| DomainError::not_found("Annotation", annotation_id))?;
    annotation.content = content.into();
    annotation.updated_at = clinsign_core::now_utc();
    document.touch();
    Ok(())
}

/// Soft-delete an annotation. Idempotent: archiving an already archived
/// annotation is a no-op.
///
/// # Errors
///
/// `ImmutableDocument` when the status no longer permits annotation;
/// `NotFound` when the annotation does not exist.
pub fn archive_annotation(
    document: &mut ConsentDocument,
    annotation_id: &str,
) -> Result<(), DomainError> {
    ensure_annotatable(document)?;
    let annotation = document
        .annotation_mut(annotation_id)
        .ok_or_else(|| DomainError::not_found("Annotation", annotation_id))?;
    if !annotation.archived {
        annotation.archived = true;
        annotation.updated_at = clinsign_core::now_utc();
        document.touch();
    }
    Ok(())
}

/// Re-render the draft PDF: permitted strictly while in `Draft`.
///
/// The rendering itself happens at the collaborator boundary; this gate only
/// decides whether the document may accept a new rendered URL.
///
/// # Errors
///
/// `ImmutableDocument` when the document has left `Draft`.
pub fn ensure_regenerable(document: &ConsentDocument) -> Result<(), DomainError> {
    if can_regenerate_pdf(document.status) {
        Ok(())
    } else {
        Err(DomainError::immutable_document(document.status))
    }
}

fn ensure_annotatable(document: &ConsentDocument) -> Result<(), DomainError> {
    if can_annotate(document.status) {
        Ok(())
    } else {
        Err(DomainError::immutable_document(document.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinsign_core::ConsentStatus;

    fn draft() -> ConsentDocument {
        ConsentDocument::from_template("patient-1", "template-1")
    }

    #[test]
    fn test_add_and_update() {
        let mut doc = draft();
        let annotation = add_annotation(&mut doc, "author-1", 1, 5.0, 6.0, "initial here").unwrap();
        assert_eq!(doc.annotations.len(), 1);
        assert!(!annotation.archived);

        update_annotation(&mut doc, &annotation.id, "signature goes here").unwrap();
        assert_eq!(
            doc.annotation(&annotation.id).unwrap().content,
            "signature goes here"
        );
    }

    #[test]
    fn test_archive_is_soft_and_idempotent() {
        let mut doc = draft();
        let annotation = add_annotation(&mut doc, "author-1", 1, 0.0, 0.0, "x").unwrap();

        archive_annotation(&mut doc, &annotation.id).unwrap();
        archive_annotation(&mut doc, &annotation.id).unwrap();

        // Still present, never physically removed.
        assert_eq!(doc.annotations.len(), 1);
        assert!(doc.annotation(&annotation.id).unwrap().archived);
    }

    #[test]
    fn test_archived_annotation_cannot_be_updated() {
        let mut doc = draft();
        let annotation = add_annotation(&mut doc, "author-1", 1, 0.0, 0.0, "x").unwrap();
        archive_annotation(&mut doc, &annotation.id).unwrap();

        let err = update_annotation(&mut doc, &annotation.id, "y").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_annotation_is_not_found() {
        let mut doc = draft();
        assert!(update_annotation(&mut doc, "ghost", "y").unwrap_err().is_not_found());
        assert!(archive_annotation(&mut doc, "ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_gate_rejects_immutable_statuses() {
        for status in [
            ConsentStatus::Signed,
            ConsentStatus::Revoked,
            ConsentStatus::Archived,
        ] {
            let mut doc = draft();
            let annotation = add_annotation(&mut doc, "author-1", 1, 0.0, 0.0, "x").unwrap();
            doc.status = status;

            let err = add_annotation(&mut doc, "author-1", 1, 0.0, 0.0, "y").unwrap_err();
            assert!(matches!(err, DomainError::ImmutableDocument { .. }), "{status}");
            assert!(matches!(
                update_annotation(&mut doc, &annotation.id, "y").unwrap_err(),
                DomainError::ImmutableDocument { .. }
            ));
            assert!(matches!(
                archive_annotation(&mut doc, &annotation.id).unwrap_err(),
                DomainError::ImmutableDocument { .. }
            ));
        }
    }

    #[test]
    fn test_annotation_allowed_while_partially_signed() {
        let mut doc = draft();
        doc.status = ConsentStatus::PartiallySigned;
        assert!(add_annotation(&mut doc, "author-1", 1, 0.0, 0.0, "x").is_ok());
    }

    #[test]
    fn test_regeneration_gate() {
        let mut doc = draft();
        assert!(ensure_regenerable(&doc).is_ok());

        doc.status = ConsentStatus::ReadyForSignature;
        assert!(matches!(
            ensure_regenerable(&doc).unwrap_err(),
            DomainError::ImmutableDocument { .. }
        ));
    }
}
