//! Dashboard configuration: read endpoints and list paging.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::record::EntityKind;

pub const DEFAULT_API_BASE: &str = "https://uat-api-office2.thithabirdnest.com";
pub const DEFAULT_PAGE_SIZE: usize = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// A read endpoint: path under the API base plus the response field that
/// holds the record array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub list_key: String,
}

impl Endpoint {
    pub fn new(path: &str, list_key: &str) -> Self {
        Self {
            path: path.to_string(),
            list_key: list_key.to_string(),
        }
    }

    /// Full URL of this endpoint under `base`.
    pub fn url(&self, base: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_base: String,
    pub documents: Endpoint,
    pub factories: Endpoint,
    pub users: Endpoint,
    pub page_size: PageSize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            // The document endpoint wraps its list in `date`, the others in `data`.
            documents: Endpoint::new("/doc", "date"),
            factories: Endpoint::new("/fac", "data"),
            users: Endpoint::new("/user", "data"),
            page_size: PageSize::default(),
        }
    }
}

impl DashboardConfig {
    /// Load a JSON config file. Missing keys fall back to the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        info!(path = %path.display(), api_base = %config.api_base, "loaded config");
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Read endpoint for `kind`; inspections and follow-ups have none.
    pub fn endpoint(&self, kind: EntityKind) -> Option<&Endpoint> {
        match kind {
            EntityKind::Document => Some(&self.documents),
            EntityKind::Factory => Some(&self.factories),
            EntityKind::User => Some(&self.users),
            EntityKind::Inspection | EntityKind::Followup => None,
        }
    }
}

/// How many rows a list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageSize", into = "String")]
pub enum PageSize {
    Rows(usize),
    All,
}

impl PageSize {
    /// The choices offered by the page-size selector.
    pub const CHOICES: [PageSize; 5] = [
        Self::Rows(15),
        Self::Rows(30),
        Self::Rows(60),
        Self::Rows(100),
        Self::All,
    ];

    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        match self {
            Self::Rows(n) => &items[..items.len().min(*n)],
            Self::All => items,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::Rows(DEFAULT_PAGE_SIZE)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows(n) => write!(f, "{n}"),
            Self::All => f.write_str("all"),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Self::Rows(n)),
            _ => Err(format!("invalid page size: {s}")),
        }
    }
}

impl From<PageSize> for String {
    fn from(p: PageSize) -> Self {
        p.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPageSize {
    Rows(usize),
    Text(String),
}

impl TryFrom<RawPageSize> for PageSize {
    type Error = String;

    fn try_from(raw: RawPageSize) -> Result<Self, Self::Error> {
        match raw {
            RawPageSize::Rows(0) => Err("page size must be positive".to_string()),
            RawPageSize::Rows(n) => Ok(Self::Rows(n)),
            RawPageSize::Text(s) => s.parse(),
        }
    }
}
