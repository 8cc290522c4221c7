//! Participant identities supplied by the external identity collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dto::validation::validate_phone_number;
use validator::ValidationError;

/// Stable participant identity (a phone-number-shaped string such as `+15551234567`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap a raw identity without validating it (remote documents are trusted as-is).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build an identity from user-entered text, rejecting anything that is not a full phone number.
    pub fn from_phone_input(raw: &str) -> Result<Self, ValidationError> {
        let sanitized = sanitize_phone_input(raw);
        validate_phone_number(&sanitized)?;
        Ok(Self(sanitized))
    }

    /// Raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The signed-in (or self-declared) user for the current client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Identity used to key decisions.
    pub id: Identity,
    /// Optional display name.
    pub name: Option<String>,
    /// Account subject for authenticated users; session owners are recorded by subject.
    pub subject: Option<String>,
}

impl UserIdentity {
    /// Identity for a player who only typed their phone number.
    pub fn guest(id: Identity) -> Self {
        Self {
            id,
            name: None,
            subject: None,
        }
    }

    /// Attach the account subject of an authenticated user.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Whether this user created the session owned by `owner`.
    pub fn owns(&self, owner: &str) -> bool {
        match &self.subject {
            Some(subject) => subject == owner,
            None => self.id.as_str() == owner,
        }
    }
}

/// Normalise free-form phone input into the `+1XXXXXXXXXX` shape, truncated to 12 characters.
///
/// Non-digits are dropped. When the digits look like a North American number (optionally led by
/// the country code `1`) the `+1` prefix is added; otherwise the digits are kept as typed.
pub fn sanitize_phone_input(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    fn national(digits: &str) -> Option<&str> {
        let bytes = digits.as_bytes();
        (bytes.len() >= 2 && (b'2'..=b'9').contains(&bytes[0])).then_some(digits)
    }

    let formatted = match digits
        .strip_prefix('1')
        .and_then(national)
        .or_else(|| national(&digits))
    {
        Some(number) => format!("+1{number}"),
        None => digits.clone(),
    };

    formatted.chars().take(12).collect()
}
