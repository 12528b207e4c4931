//! Dashboard user accounts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::record::{EntityKind, Record, Stored};
use crate::validate::{self, ValidationError};
use crate::view::{DetailSection, DetailView, Tabular};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Officer,
    #[default]
    Unassigned,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Officer => "officer",
            Self::Unassigned => "",
            Self::Other(s) => s,
        }
    }

    /// Label shown in lists and exports.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Admin => "អ្នកគ្រប់គ្រង",
            Self::Officer => "មន្ត្រី",
            other => other.as_str(),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.trim() {
            "admin" => Self::Admin,
            "officer" => Self::Officer,
            "" => Self::Unassigned,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub password: String,
    #[serde(default, deserialize_with = "role")]
    pub role: Role,
    #[serde(default, deserialize_with = "lenient::string")]
    pub function: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub sangkat: String,
}

fn role<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Role, D::Error> {
    lenient::string(deserializer).map(Role::from)
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;

    fn validate(&self) -> Result<(), ValidationError> {
        validate::require(&[
            ("name", self.name.as_str()),
            ("phone", self.phone.as_str()),
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
            ("role", self.role.as_str()),
        ])?;
        if !validate::is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if !validate::is_valid_phone(&self.phone) {
            return Err(ValidationError::InvalidPhone(self.phone.clone()));
        }
        Ok(())
    }
}

impl Tabular for User {
    const COLUMNS: &'static [&'static str] =
        &["name", "phone", "email", "role", "function", "sangkat"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.role.display_name().to_string(),
            self.function.clone(),
            self.sangkat.clone(),
        ]
    }

    // Never shows the password.
    fn detail(stored: &Stored<Self>) -> DetailView {
        let u = &stored.record;
        DetailView {
            title: u.name.clone(),
            sections: vec![DetailSection::new(
                "User",
                Self::COLUMNS.iter().copied().zip(u.cells()).collect(),
            )],
        }
    }
}
