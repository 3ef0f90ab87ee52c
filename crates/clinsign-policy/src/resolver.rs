//! Resource identity resolution.
//!
//! Maps an inbound request's path and parameters to the domain resource kind
//! it targets and, where present, the specific resource id. The routing
//! table is an explicit, order-significant list of `(fragment, kind)` pairs
//! so the precedence rules are auditable and unit-testable in isolation —
//! first matching rule wins, no fallthrough once matched.
//!
//! Scope boundary: only single-resource endpoints are scoped here. When no
//! id parameter is present (collection/list endpoints), resolution reports
//! `id: None` and filtering is the data-query layer's job.

use std::collections::HashMap;

use clinsign_core::ResourceKind;

/// Resource-id parameter aliases, in priority order. The first alias present
/// in the request's parameters wins.
pub const ID_PARAM_ALIASES: &[&str] = &[
    "id",
    "patientId",
    "patient_id",
    "caseId",
    "case_id",
    "recordId",
    "record_id",
    "billId",
    "bill_id",
    "consentId",
    "consent_id",
    "itemId",
    "item_id",
    "intakeId",
    "intake_id",
    "appointmentId",
    "appointment_id",
];

/// One ordered routing rule: if the path contains `fragment`, the request
/// targets `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub fragment: String,
    pub kind: ResourceKind,
}

impl RouteRule {
    pub fn new(fragment: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            fragment: fragment.into(),
            kind,
        }
    }
}

/// Resolver configuration: the skip list and the routing table.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Path fragments that bypass resolution entirely. These routes serve
    /// non-patient, system-configuration resources and are authorized by
    /// role/permission checks alone.
    pub skip_fragments: Vec<String>,

    /// Order-significant routing table.
    pub routes: Vec<RouteRule>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            skip_fragments: vec![
                "consent-templates".to_string(),
                "public".to_string(),
            ],
            // Order matters: "pdf-consent" must precede "consent", and the
            // patient-scoped sub-resources precede "patient" only for
            // readability — they all resolve to Patient because their access
            // rule is identical to "can this caller see this patient".
            routes: vec![
                RouteRule::new("pdf-consent", ResourceKind::PdfConsent),
                RouteRule::new("consent", ResourceKind::ConsentInstance),
                RouteRule::new("intake", ResourceKind::Patient),
                RouteRule::new("consultation", ResourceKind::Patient),
                RouteRule::new("appointment", ResourceKind::Patient),
                RouteRule::new("emr", ResourceKind::Patient),
                RouteRule::new("lab-order", ResourceKind::Patient),
                RouteRule::new("prescription", ResourceKind::Patient),
                RouteRule::new("patient", ResourceKind::Patient),
                RouteRule::new("surgical-case", ResourceKind::SurgicalCase),
                RouteRule::new("medical-record", ResourceKind::MedicalRecord),
                RouteRule::new("bill", ResourceKind::Bill),
                RouteRule::new("inventory", ResourceKind::InventoryItem),
            ],
        }
    }
}

/// Outcome of resource identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path matched the skip list; the request is authorized by
    /// role/permission checks alone and never reaches the policy engine's
    /// patient predicates.
    Skipped,

    /// The request targets a resource of `kind`; `id` is `None` for
    /// collection endpoints.
    Resolved {
        kind: ResourceKind,
        id: Option<String>,
    },
}

impl Resolution {
    /// The resolved kind, if resolution was not skipped.
    #[must_use]
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Resolution::Skipped => None,
            Resolution::Resolved { kind, .. } => Some(*kind),
        }
    }
}

/// Infers resource identity from request paths and parameters.
#[derive(Debug, Clone, Default)]
pub struct ResourceResolver {
    config: ResolverConfig,
}

impl ResourceResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolve a request to the resource it targets.
    pub fn resolve(&self, path: &str, params: &HashMap<String, String>) -> Resolution {
        if self
            .config
            .skip_fragments
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
        {
            tracing::debug!(path, "resolution skipped: system-configuration route");
            return Resolution::Skipped;
        }

        let kind = self
            .config
            .routes
            .iter()
            .find(|rule| path.contains(rule.fragment.as_str()))
            .map(|rule| rule.kind)
            .unwrap_or(ResourceKind::Unknown);

        let id = Self::extract_id(params);
        tracing::debug!(path, %kind, id = id.as_deref(), "resolved resource identity");

        Resolution::Resolved { kind, id }
    }

    /// Extract the resource id from the first matching parameter alias.
    fn extract_id(params: &HashMap<String, String>) -> Option<String> {
        ID_PARAM_ALIASES
            .iter()
            .find_map(|alias| params.get(*alias))
            .cloned()
    }
}
