//! Caller authorization.
//!
//! The pipeline never inspects credentials itself. An [`Authorizer`]
//! answers yes/no for an opaque [`CallerIdentity`] and, on yes, hands out an
//! [`Authorized`] token. Write operations take that token as a parameter.

use std::collections::{BTreeMap, HashMap};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use crate::error::ValidationError;

// ---

/// Credentials presented by a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    // ---
    pub username: String,
    pub secret: String,
}

impl std::fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerIdentity")
            .field("username", &self.username)
            .field("secret", &"****")
            .finish()
    }
}

impl CallerIdentity {
    // ---
    /// Decode an HTTP `Authorization: Basic ...` header value.
    pub fn from_basic_header(value: &str) -> Option<Self> {
        // ---
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, secret) = decoded.split_once(':')?;

        Some(Self {
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }
}

/// Proof that a caller was authorized. Only an [`Authorizer`] can mint one.
#[derive(Debug, Clone)]
pub struct Authorized {
    username: String,
}

impl Authorized {
    // ---
    pub fn username(&self) -> &str {
        &self.username
    }

    #[cfg(test)]
    pub fn for_tests(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }
}

pub trait Authorizer: Send + Sync {
    /// `Some` when the caller may use the service.
    fn authorize(&self, caller: &CallerIdentity) -> Option<Authorized>;
}

/// Authorizer backed by a fixed user table from configuration.
#[derive(Debug, Default)]
pub struct StaticAuthorizer {
    users: HashMap<String, String>,
}

impl StaticAuthorizer {
    // ---
    pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }
}

impl Authorizer for StaticAuthorizer {
    fn authorize(&self, caller: &CallerIdentity) -> Option<Authorized> {
        // ---
        match self.users.get(&caller.username) {
            Some(secret) if *secret == caller.secret => Some(Authorized {
                username: caller.username.clone(),
            }),
            _ => None,
        }
    }
}

/// Body of a login request. Fields are optional so that absence can be
/// reported per field instead of as a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    // ---
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    // ---
    /// Check required fields; the username is trimmed, the password is not.
    pub fn validate(&self) -> Result<CallerIdentity, ValidationError> {
        // ---
        let username = self.username.as_deref().unwrap_or("").trim();
        let password = self.password.as_deref().unwrap_or("");

        let mut errors = BTreeMap::new();
        if username.is_empty() {
            errors.insert("username", "Username is required".to_string());
        }
        if password.is_empty() {
            errors.insert("password", "Password is required".to_string());
        }

        if !errors.is_empty() {
            return Err(ValidationError { errors });
        }

        Ok(CallerIdentity {
            username: username.to_string(),
            secret: password.to_string(),
        })
    }
}
