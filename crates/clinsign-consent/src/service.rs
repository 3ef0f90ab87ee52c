//! The consent use-case layer.
//!
//! `ConsentService` wires the policy engine, the consent store, the renderer
//! and the audit trail behind one operation surface. Every operation follows
//! the same shape: authorize, load, mutate in memory, version-checked
//! commit, audit. The commit is the only write point, so a failed or
//! cancelled operation leaves the stored aggregate untouched; a losing
//! concurrent writer observes `VersionConflict` and is expected to reload
//! and retry.

use std::sync::Arc;

use clinsign_core::{
    Annotation, AnnotationOp, AuditTrail, ConsentDocument, ConsentEvent, ConsentEventKind,
    ConsentStatus, DomainError, ResourceKind, Action, SignatureProof, SignerType,
};
use clinsign_policy::{Decision, PatientDirectory, PolicyEngine, Subject};
use clinsign_storage::{DynConsentStore, StorageError};

use crate::annotation;
use crate::lifecycle::validate_transition;
use crate::renderer::{DynPdfRenderer, RenderError};
use crate::signing::{record_signature, SignerIdentity, SigningConfig};

/// Orchestrates the consent document lifecycle.
pub struct ConsentService {
    store: DynConsentStore,
    engine: PolicyEngine,
    renderer: DynPdfRenderer,
    audit: AuditTrail,
    signing: SigningConfig,
}

impl ConsentService {
    pub fn new(
        store: DynConsentStore,
        directory: Arc<dyn PatientDirectory>,
        renderer: DynPdfRenderer,
        audit: AuditTrail,
        signing: SigningConfig,
    ) -> Self {
        let engine = PolicyEngine::new(directory, audit.clone());
        Self {
            store,
            engine,
            renderer,
            audit,
            signing,
        }
    }

    /// Create a new draft document for a patient from a template and render
    /// its initial PDF.
    pub async fn create_from_template(
        &self,
        subject: &Subject,
        patient_id: &str,
        template_id: &str,
        consultation_id: Option<&str>,
    ) -> Result<ConsentDocument, DomainError> {
        // The document does not exist yet; what is being touched is the
        // patient's record.
        self.authorize(subject, ResourceKind::Patient, Some(patient_id), Action::Create)
            .await?;

        let mut document = ConsentDocument::from_template(patient_id, template_id);
        if let Some(consultation_id) = consultation_id {
            document = document.with_consultation(consultation_id);
        }

        let rendered = self
            .renderer
            .render_draft(&document)
            .await
            .map_err(map_render)?;
        document.generated_pdf_url = Some(rendered.url);

        self.store.insert(&document).await.map_err(map_storage)?;

        tracing::info!(
            document_id = %document.id,
            patient_id,
            template_id,
            "consent document created"
        );
        self.offer_event(subject, &document, ConsentEventKind::Created);
        Ok(document)
    }

    /// Load a single document.
    pub async fn get(&self, subject: &Subject, id: &str) -> Result<ConsentDocument, DomainError> {
        self.authorize(subject, ResourceKind::ConsentInstance, Some(id), Action::Read)
            .await?;
        self.load(id).await
    }

    /// List a patient's documents.
    pub async fn list_for_patient(
        &self,
        subject: &Subject,
        patient_id: &str,
    ) -> Result<Vec<ConsentDocument>, DomainError> {
        self.authorize(subject, ResourceKind::Patient, Some(patient_id), Action::Read)
            .await?;
        self.store
            .list_for_patient(patient_id)
            .await
            .map_err(map_storage)
    }

    /// Explicit status transition: mark ready for signature, revoke, or
    /// archive. Signature-driven transitions happen inside [`Self::sign`].
    pub async fn transition(
        &self,
        subject: &Subject,
        id: &str,
        to: ConsentStatus,
    ) -> Result<ConsentDocument, DomainError> {
        self.authorize(subject, ResourceKind::ConsentInstance, Some(id), Action::Write)
            .await?;

        let mut document = self.load(id).await?;
        let expected = document.version;
        let from = document.status;

        validate_transition(from, to)?;
        document.status = to;
        document.touch();
        self.commit(&mut document, expected).await?;

        tracing::info!(document_id = %document.id, %from, %to, "consent status changed");
        self.offer_event(subject, &document, ConsentEventKind::StatusChanged { from, to });
        Ok(document)
    }

    /// Record a signature; advances the status as a side effect and freezes
    /// the final PDF once signing completes.
    pub async fn sign(
        &self,
        subject: &Subject,
        id: &str,
        signer_type: SignerType,
        identity: SignerIdentity,
        proof: SignatureProof,
    ) -> Result<ConsentDocument, DomainError> {
        self.authorize(subject, ResourceKind::ConsentInstance, Some(id), Action::Write)
            .await?;

        let mut document = self.load(id).await?;
        let expected = document.version;

        let outcome = record_signature(&mut document, signer_type, identity, proof, self.signing)?;

        if matches!(outcome.status_change, Some((_, ConsentStatus::Signed))) {
            let merged = self
                .renderer
                .merge_final(&document)
                .await
                .map_err(map_render)?;
            document.final_pdf_url = Some(merged.url);
            document.final_pdf_hash = Some(merged.sha256);
        }

        self.commit(&mut document, expected).await?;

        self.offer_event(
            subject,
            &document,
            ConsentEventKind::SignatureRecorded { signer_type },
        );
        if let Some((from, to)) = outcome.status_change {
            self.offer_event(subject, &document, ConsentEventKind::StatusChanged { from, to });
        }
        Ok(document)
    }

    /// Add an annotation. The author is the calling subject.
    pub async fn add_annotation(
        &self,
        subject: &Subject,
        id: &str,
        page: u32,
        x: f32,
        y: f32,
        content: &str,
    ) -> Result<Annotation, DomainError> {
        self.authorize(subject, ResourceKind::ConsentInstance, Some(id), Action::Write)
            .await?;

        let mut document = self.load(id).await?;
        let expected = document.version;

        let created = annotation::add_annotation(
            &mut document,
            subject.user_id.to_string(),
            page,
            x,
            y,
            content,
        )?;
        self.commit(&mut document, expected).await?;

        self.offer_event(
            subject,
            &document,
            ConsentEventKind::AnnotationMutated {
                op: AnnotationOp::Created,
            },
        );
        Ok(created)
    }

    /// Replace an annotation's content.
    pub async fn update_annotation(
        &self,
        subject: &Subject,
        id: &str,
        annotation_id: &str,
        content: &str,
    ) -> Result<(), DomainError> {
        self.authorize(subject, ResourceKind::ConsentInstance, Some(id), Action::Write)
            .await?;

        let mut document = self.load(id).await?;
        let expected = document.version;

        annotation::update_annotation(&mut document, annotation_id, content)?;
        self.commit(&mut document, expected).await?;

        self.offer_event(
            subject,
            &document,
            ConsentEventKind::AnnotationMutated {
                op: AnnotationOp::Updated,
            },
        );
        Ok(())
    }

    /// Soft-delete an annotation.
    pub async fn archive_annotation(
        &self,
        subject: &Subject,
        id: &str,
        annotation_id: &str,
    ) -> Result<(), DomainError> {
        self.authorize(subject, ResourceKind::ConsentInstance, Some(id), Action::Write)
            .await?;

        let mut document = self.load(id).await?;
        let expected = document.version;

        annotation::archive_annotation(&mut document, annotation_id)?;
        self.commit(&mut document, expected).await?;

        self.offer_event(
            subject,
            &document,
            ConsentEventKind::AnnotationMutated {
                op: AnnotationOp::Archived,
            },
        );
        Ok(())
    }

    /// Re-render the draft PDF. Permitted strictly while in `Draft`.
    pub async fn regenerate_pdf(
        &self,
        subject: &Subject,
        id: &str,
    ) -> Result<ConsentDocument, DomainError> {
        self.authorize(subject, ResourceKind::PdfConsent, Some(id), Action::Write)
            .await?;

        let mut document = self.load(id).await?;
        let expected = document.version;

        annotation::ensure_regenerable(&document)?;
        let rendered = self
            .renderer
            .render_draft(&document)
            .await
            .map_err(map_render)?;
        document.generated_pdf_url = Some(rendered.url);
        document.touch();
        self.commit(&mut document, expected).await?;

        self.offer_event(subject, &document, ConsentEventKind::PdfRegenerated);
        Ok(document)
    }

    async fn authorize(
        &self,
        subject: &Subject,
        kind: ResourceKind,
        id: Option<&str>,
        action: Action,
    ) -> Result<(), DomainError> {
        match self.engine.authorize(subject, kind, id, action).await? {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(DomainError::access_denied(reason.message)),
        }
    }

    async fn load(&self, id: &str) -> Result<ConsentDocument, DomainError> {
        self.store
            .load(id)
            .await
            .map_err(map_storage)?
            .ok_or_else(|| DomainError::not_found("ConsentDocument", id))
    }

    /// Bump the version exactly once and commit against the version the
    /// operation read.
    async fn commit(
        &self,
        document: &mut ConsentDocument,
        expected: u64,
    ) -> Result<(), DomainError> {
        document.bump_version();
        self.store
            .commit(document, expected)
            .await
            .map_err(map_storage)
    }

    fn offer_event(&self, subject: &Subject, document: &ConsentDocument, kind: ConsentEventKind) {
        self.audit.offer_consent(ConsentEvent::new(
            &document.id,
            &document.patient_id,
            subject.user_id,
            kind,
        ));
    }
}

impl std::fmt::Debug for ConsentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentService")
            .field("signing", &self.signing)
            .finish_non_exhaustive()
    }
}

fn map_storage(err: StorageError) -> DomainError {
    match err {
        StorageError::NotFound { id } => DomainError::not_found("ConsentDocument", id),
        StorageError::VersionConflict { expected, actual } => {
            DomainError::version_conflict(expected, actual)
        }
        other => DomainError::infrastructure(other.to_string()),
    }
}

fn map_render(err: RenderError) -> DomainError {
    DomainError::infrastructure(err.to_string())
}
