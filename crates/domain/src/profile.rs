//! Authenticated user profile

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};

/// Access level of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// Full administration rights.
    Admin,
    /// Regular user.
    User,
}

impl FromStr for AccessLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(DomainError::UnknownAccessLevel(other.to_string())),
        }
    }
}

/// The authenticated user as returned by `/user/me`.
///
/// Fields this client does not model are kept in `extra` so the cached copy
/// round-trips the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionProfile {
    /// Backend user id
    #[serde(rename = "ID", default)]
    pub id: u64,
    /// Login name
    #[serde(default)]
    pub username: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Raw access level (`admin` or `user`)
    #[serde(default)]
    pub access_level: String,
    /// Remaining profile fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SessionProfile {
    /// Parsed access level.
    ///
    /// # Errors
    /// Returns an error if the backend sent a level this client does not know.
    pub fn access_level(&self) -> DomainResult<AccessLevel> {
        self.access_level.parse()
    }

    /// True only for a recognised `admin` level.
    #[must_use]
    pub fn is_administrator(&self) -> bool {
        matches!(self.access_level(), Ok(AccessLevel::Admin))
    }

    /// "First Last", falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}
