//! Account lifecycle vocabulary.

use serde::{Deserialize, Serialize};

/// Account lifecycle state.
///
/// Wire format: snake_case string. `PendingDelete` is reachable in the schema
/// but no current flow enters it; kept so stored rows from older deployments
/// still deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    DeleteRequested,
    PendingDelete,
    Deleted,
}

impl AccountStatus {
    /// Parse from the stored column value. Returns `None` for unknown values.
    pub fn from_str_value(v: &str) -> Option<Self> {
        match v {
            "active" => Some(Self::Active),
            "delete_requested" => Some(Self::DeleteRequested),
            "pending_delete" => Some(Self::PendingDelete),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Stored column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::DeleteRequested => "delete_requested",
            Self::PendingDelete => "pending_delete",
            Self::Deleted => "deleted",
        }
    }

    /// `Deleted` is terminal; nothing transitions out of it.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// What a verification credential was issued for.
///
/// The same issuance/verification machinery serves both flows; the purpose tag
/// keeps their records disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Register,
    Deletion,
}

impl Purpose {
    pub fn from_str_value(v: &str) -> Option<Self> {
        match v {
            "register" => Some(Self::Register),
            "deletion" => Some(Self::Deletion),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Deletion => "deletion",
        }
    }
}
