//! Forward-only ordering of session statuses.

use thiserror::Error;

use crate::dto::session::SessionStatus;

/// Error returned when a fetched status would move the session backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: session cannot move from {from:?} to {to:?}")]
pub struct InvalidTransition {
    /// Status the client currently holds.
    pub from: SessionStatus,
    /// Status that was reported.
    pub to: SessionStatus,
}

/// Check a reported status against `reached`, the furthest phase the session has been seen in.
///
/// `expired` is reachable from anywhere and never left. An unknown status is accepted so it can be
/// surfaced as an error view, but it is not a phase: callers keep `reached` where it was, so a
/// later report is still compared with the last real phase.
pub fn check_transition(reached: SessionStatus, to: SessionStatus) -> Result<(), InvalidTransition> {
    use SessionStatus::*;

    match (reached, to) {
        (Expired, Expired) => Ok(()),
        (Expired, _) => Err(InvalidTransition { from: reached, to }),
        (_, Expired | Unknown) => Ok(()),
        (Playing, Playing | Pointing | Winner) => Ok(()),
        (Pointing, Pointing | Winner) => Ok(()),
        (Winner, Winner) => Ok(()),
        _ => Err(InvalidTransition { from: reached, to }),
    }
}

/// Whether `status` names a phase of the game, as opposed to an unrecognised value.
pub fn is_phase(status: SessionStatus) -> bool {
    status != SessionStatus::Unknown
}
