//! The PDF rendering collaborator boundary.
//!
//! The consent core never touches PDF bytes; the renderer hands back opaque
//! URLs (and a content hash for the final merge) that are stored on the
//! aggregate. Rendering failures are infrastructure, not domain rejections.

use async_trait::async_trait;
use clinsign_core::ConsentDocument;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A rendered draft document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPdf {
    pub url: String,
}

/// The final merged document: signatures and annotations burned in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalPdf {
    pub url: String,
    pub sha256: String,
}

/// Errors from the rendering collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Renderer unavailable: {message}")]
    Unavailable { message: String },

    #[error("Rendering failed: {message}")]
    Failed { message: String },
}

impl RenderError {
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Renders consent documents to PDFs.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Render the draft PDF from the document's template and current
    /// annotations.
    async fn render_draft(&self, document: &ConsentDocument) -> Result<RenderedPdf, RenderError>;

    /// Merge signatures and annotations into the final, frozen PDF. Called
    /// once, when the document becomes signed.
    async fn merge_final(&self, document: &ConsentDocument) -> Result<FinalPdf, RenderError>;
}

/// Shareable renderer handle.
pub type DynPdfRenderer = Arc<dyn PdfRenderer>;

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test that PdfRenderer is object-safe
    fn _assert_renderer_object_safe(_: &dyn PdfRenderer) {}

    #[test]
    fn test_render_error_display() {
        assert_eq!(
            RenderError::unavailable("gateway timeout").to_string(),
            "Renderer unavailable: gateway timeout"
        );
        assert_eq!(
            RenderError::failed("bad template").to_string(),
            "Rendering failed: bad template"
        );
    }
}
