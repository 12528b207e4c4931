//! The record contract shared by every entity type.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::id::RecordId;
use crate::validate::ValidationError;

/// Loose field map used for partial updates (`{...existing, ...fields}`).
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// The five record types managed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Document,
    Factory,
    User,
    Inspection,
    Followup,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        Self::Document,
        Self::Factory,
        Self::User,
        Self::Inspection,
        Self::Followup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Factory => "factory",
            Self::User => "user",
            Self::Inspection => "inspection",
            Self::Followup => "followup",
        }
    }

    /// Fixed file name of the spreadsheet export for this kind.
    pub fn export_file(&self) -> &'static str {
        match self {
            Self::Document => "documents.csv",
            Self::Factory => "factories.csv",
            Self::User => "users.csv",
            Self::Inspection => "inspections.csv",
            Self::Followup => "followups.csv",
        }
    }

    /// Whether the list for this kind is served by a read endpoint.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Document | Self::Factory | Self::User)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "documents" | "doc" => Ok(Self::Document),
            "factory" | "factories" => Ok(Self::Factory),
            "user" | "users" => Ok(Self::User),
            "inspection" | "inspections" => Ok(Self::Inspection),
            "followup" | "followups" | "follow-up" => Ok(Self::Followup),
            other => Err(format!("unknown record type: {other}")),
        }
    }
}

/// A record body: everything except the identity and creation stamp.
pub trait Record: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned {
    const KIND: EntityKind;

    /// Fields an update never overwrites, in addition to `id` and `created_at`.
    const FROZEN: &'static [&'static str] = &[];

    /// Submit-time checks: required fields and value shapes.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A record as held in a collection: its body plus the identity and
/// creation stamp assigned on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: RecordId,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: RecordId, record: T) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            record,
        }
    }
}
