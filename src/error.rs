use thiserror::Error;
use validator::ValidationErrors;

use crate::{patch::PatchError, remote::ApiError, state::phase::InvalidTransition};

/// Sticky banner shown when pushing decisions fails.
pub const DECISIONS_SAVE_ERROR: &str =
    "Error saving categories. Please reload the page and try again.";
/// Sticky banner shown when pulling decisions fails.
pub const DECISIONS_FETCH_ERROR: &str =
    "Error fetching categories. Please reload the page and try again.";
/// Notice raised when the owner's settings update fails.
pub const SESSION_UPDATE_ERROR: &str = "Error updating game session";
/// Notice raised when session creation fails.
pub const SESSION_CREATE_ERROR: &str = "Error generating Scatter game. Please try again later.";

/// Errors that can occur in session-level operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The remote session service failed.
    #[error("session service unavailable")]
    Api(#[source] ApiError),
    /// Invalid input provided by the player.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A patch could not be applied.
    #[error("patch rejected")]
    Patch(#[source] PatchError),
    /// A document could not be turned into JSON for diffing.
    #[error("failed to encode document")]
    Encode(#[source] serde_json::Error),
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        SessionError::Api(err)
    }
}

impl From<PatchError> for SessionError {
    fn from(err: PatchError) -> Self {
        SessionError::Patch(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Encode(err)
    }
}

impl From<ValidationErrors> for SessionError {
    fn from(err: ValidationErrors) -> Self {
        SessionError::InvalidInput(format!("validation failed: {}", err))
    }
}

impl From<InvalidTransition> for SessionError {
    fn from(err: InvalidTransition) -> Self {
        SessionError::InvalidState(err.to_string())
    }
}
