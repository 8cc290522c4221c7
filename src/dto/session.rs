//! Wire representation of the shared session document and its creation payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::dto::{
    decisions::{Categories, Decisions},
    identity::Identity,
    validation::{validate_bounds, validate_time_limit_step},
};

/// Fewest players a session accepts.
pub const MIN_USER_COUNT: u32 = 2;
/// Most players a session accepts.
pub const MAX_USER_COUNT: u32 = 5;
/// Fewest rounds a session accepts.
pub const MIN_ROUNDS: u32 = 1;
/// Most rounds a session accepts.
pub const MAX_ROUNDS: u32 = 5;
/// Shortest round time limit, in seconds.
pub const MIN_TIME_LIMIT: u32 = 30;
/// Longest round time limit, in seconds.
pub const MAX_TIME_LIMIT: u32 = 300;

/// Phase of a session as reported by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Players are typing responses.
    #[default]
    Playing,
    /// Players are reviewing each other's responses.
    Pointing,
    /// Final results are available.
    Winner,
    /// The session is gone; observed locally when a fetch fails.
    Expired,
    /// Any status value this client does not understand.
    #[serde(other)]
    Unknown,
}

/// Settings sent when creating a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    /// Number of letters to play.
    pub rounds: u32,
    /// Seconds per category.
    pub time_limit: u32,
    /// Players expected to join, owner included.
    pub user_count: u32,
    /// Whether participants receive text message updates.
    pub text_updates: bool,
}

impl Default for NewSession {
    fn default() -> Self {
        Self {
            rounds: 3,
            time_limit: 75,
            user_count: MIN_USER_COUNT,
            text_updates: true,
        }
    }
}

impl Validate for NewSession {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_bounds("rounds_range", self.rounds, MIN_ROUNDS, MAX_ROUNDS) {
            errors.add("rounds", e);
        }
        if let Err(e) = validate_bounds(
            "time_limit_range",
            self.time_limit,
            MIN_TIME_LIMIT,
            MAX_TIME_LIMIT,
        ) {
            errors.add("timeLimit", e);
        } else if let Err(e) = validate_time_limit_step(self.time_limit) {
            errors.add("timeLimit", e);
        }
        if let Err(e) = validate_bounds(
            "user_count_range",
            self.user_count,
            MIN_USER_COUNT,
            MAX_USER_COUNT,
        ) {
            errors.add("userCount", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Response of the create-session call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    /// Id assigned by the service.
    pub session_id: String,
}

/// The shared game document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Number of letters in the session.
    pub rounds: u32,
    /// Seconds per letter.
    pub time_limit: u32,
    /// Players expected to take part.
    pub user_count: u32,
    /// Whether participants receive text message updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_updates: Option<bool>,
    /// Unix timestamp (seconds) after which the server discards the session.
    #[serde(default)]
    pub expiration: i64,
    /// Identity of the creating user.
    #[serde(default)]
    pub owner: String,
    /// Current phase.
    pub status: SessionStatus,
    /// Prompts per letter, assigned once on creation.
    #[serde(default)]
    pub categories: Categories,
    /// Every participant's decisions, keyed by identity.
    #[serde(default)]
    pub decisions: BTreeMap<Identity, Decisions>,
    /// Present once the status is `winner`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<String>>,
}

impl SessionData {
    /// Stand-in document used before the first fetch completes.
    pub fn placeholder() -> Self {
        Self {
            rounds: 0,
            time_limit: 0,
            user_count: MIN_USER_COUNT,
            text_updates: None,
            expiration: 0,
            owner: String::new(),
            status: SessionStatus::Playing,
            categories: Categories::default(),
            decisions: BTreeMap::new(),
            winners: None,
        }
    }

    /// Whether the server has assigned categories yet.
    pub fn has_categories(&self) -> bool {
        !self.categories.is_empty()
    }
}
