use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Staff roles known to the platform. A closed enumeration: role checks are
/// matched exhaustively so an unhandled role is a compile error, not a
/// runtime fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Receptionist,
    Billing,
    InventoryManager,
    LabTech,
}

impl Role {
    /// Elevated roles bypass the patient-relationship predicate.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Receptionist => "receptionist",
            Role::Billing => "billing",
            Role::InventoryManager => "inventory_manager",
            Role::LabTech => "lab_tech",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "receptionist" => Ok(Role::Receptionist),
            "billing" => Ok(Role::Billing),
            "inventory_manager" => Ok(Role::InventoryManager),
            "lab_tech" => Ok(Role::LabTech),
            other => Err(DomainError::access_denied(format!("unknown role: {other}"))),
        }
    }
}

/// Resource kinds the access policy engine knows how to gate.
///
/// `Unknown` exists so that a resource type introduced elsewhere in the
/// platform without an explicit predicate is rejected, never silently
/// allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Patient,
    SurgicalCase,
    MedicalRecord,
    ConsentInstance,
    PdfConsent,
    Bill,
    InventoryItem,
    Unknown,
}

impl ResourceKind {
    /// Whether resources of this kind carry protected health information.
    /// PHI access is logged with heightened scrutiny by the audit sink.
    #[must_use]
    pub fn is_phi(&self) -> bool {
        match self {
            ResourceKind::Patient
            | ResourceKind::MedicalRecord
            | ResourceKind::ConsentInstance
            | ResourceKind::PdfConsent
            | ResourceKind::Bill => true,
            ResourceKind::SurgicalCase | ResourceKind::InventoryItem | ResourceKind::Unknown => {
                false
            }
        }
    }

    /// Whether access to this kind is scoped to a single patient. Patient
    /// scoping requires resolving the owning patient before the relationship
    /// predicate can run.
    #[must_use]
    pub fn is_patient_scoped(&self) -> bool {
        match self {
            ResourceKind::Patient
            | ResourceKind::SurgicalCase
            | ResourceKind::MedicalRecord
            | ResourceKind::ConsentInstance
            | ResourceKind::PdfConsent
            | ResourceKind::Bill => true,
            ResourceKind::InventoryItem | ResourceKind::Unknown => false,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Patient => write!(f, "Patient"),
            ResourceKind::SurgicalCase => write!(f, "SurgicalCase"),
            ResourceKind::MedicalRecord => write!(f, "MedicalRecord"),
            ResourceKind::ConsentInstance => write!(f, "ConsentInstance"),
            ResourceKind::PdfConsent => write!(f, "PdfConsent"),
            ResourceKind::Bill => write!(f, "Bill"),
            ResourceKind::InventoryItem => write!(f, "InventoryItem"),
            ResourceKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// HTTP-like request verb, as seen at the routing boundary. The policy layer
/// never touches a real HTTP stack; callers translate their transport's verb
/// into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// The action a request performs, derived from its verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Write,
    Delete,
}

impl Action {
    /// Derive the action from an HTTP-like verb.
    #[must_use]
    pub fn from_verb(verb: Verb) -> Self {
        match verb {
            Verb::Get => Action::Read,
            Verb::Post => Action::Create,
            Verb::Put | Verb::Patch => Action::Write,
            Verb::Delete => Action::Delete,
        }
    }

    /// Returns `true` for actions that mutate the resource.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, Action::Create | Action::Write | Action::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Write => "write",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
