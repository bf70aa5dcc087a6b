//! User domain types and auth payloads

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Problems, Validate};

/// Maximum length for display names
const MAX_NAME_LEN: usize = 100;

/// Maximum length for email addresses (RFC 5321 path limit)
const MAX_EMAIL_LEN: usize = 254;

/// Deliberately loose: one `@`, no whitespace, a dot in the domain.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex")
});

/// Primary key of a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Normalized email address: trimmed and lowercased.
///
/// The unique key of the users table; normalization makes it case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalize and check the format. The problem message is suitable for
    /// a field-level problem map.
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err("must not be empty");
        }
        if normalized.len() > MAX_EMAIL_LEN {
            return Err("must be at most 254 characters");
        }
        if !EMAIL_RE.is_match(&normalized) {
            return Err("must be a valid email address");
        }

        Ok(Self(normalized))
    }

    /// Wrap a value read back from storage, where it was stored normalized.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// User record as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the user store. The secret is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
}

/// Public view of a user, safe to return to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.0,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user: UserProfile,
    pub authenticated_at: DateTime<Utc>,
}

/// POST /api/v1/auth/register body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterInput {
    fn validate(&self) -> Problems {
        let mut problems = Problems::new();

        let name = self.name.trim();
        if name.is_empty() {
            problems.insert("name", "must not be empty");
        } else if name.chars().count() > MAX_NAME_LEN {
            problems.insert("name", "must be at most 100 characters");
        }

        if let Err(reason) = Email::parse(&self.email) {
            problems.insert("email", reason);
        }

        if self.password.is_empty() {
            problems.insert("password", "must not be empty");
        }

        problems
    }
}

/// POST /api/v1/auth/login body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl Validate for LoginInput {
    fn validate(&self) -> Problems {
        let mut problems = Problems::new();
        if self.email.trim().is_empty() {
            problems.insert("email", "must not be empty");
        }
        if self.password.is_empty() {
            problems.insert("password", "must not be empty");
        }
        problems
    }
}
