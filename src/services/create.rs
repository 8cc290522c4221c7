//! Creating a session and inviting the other players.

use futures::future::join_all;
use tracing::{error, info, warn};
use validator::Validate;

use crate::{
    dto::{identity::Identity, session::NewSession},
    error::SessionError,
    remote::SessionApi,
};

/// Outcome of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedGame {
    /// Id assigned by the service.
    pub session_id: String,
    /// Path of the session page, e.g. `/s/abc123`.
    pub path: String,
    /// Invitees whose text was accepted by the service.
    pub invited: Vec<Identity>,
}

/// Parse the invitee phone numbers typed next to the settings.
///
/// Blank entries are skipped; anything else must be a complete phone number, and at most
/// `user_count - 1` players may be invited.
pub fn parse_invitees(settings: &NewSession, invitees: &[String]) -> Result<Vec<Identity>, SessionError> {
    let parsed = invitees
        .iter()
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            Identity::from_phone_input(raw).map_err(|err| {
                SessionError::InvalidInput(
                    err.message
                        .map(|message| format!("{raw}: {message}"))
                        .unwrap_or_else(|| format!("{raw}: invalid phone number")),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let allowed = settings.user_count.saturating_sub(1) as usize;
    if parsed.len() > allowed {
        return Err(SessionError::InvalidInput(format!(
            "at most {allowed} players can be invited to a {}-player game",
            settings.user_count
        )));
    }
    Ok(parsed)
}

/// Validate the settings, create the session and text every invitee.
///
/// Invite failures are logged and do not fail the creation.
pub async fn create_game(
    api: &dyn SessionApi,
    settings: NewSession,
    invitees: &[String],
) -> Result<CreatedGame, SessionError> {
    settings.validate()?;
    let invitees = parse_invitees(&settings, invitees)?;

    let created = api.create_session(settings).await.map_err(|err| {
        error!(error = %err, "failed to create session");
        SessionError::from(err)
    })?;
    let session_id = created.session_id;
    info!(%session_id, invitees = invitees.len(), "created session");

    let results = join_all(
        invitees
            .iter()
            .map(|identity| api.send_invite(&session_id, identity)),
    )
    .await;

    let invited = invitees
        .into_iter()
        .zip(results)
        .filter_map(|(identity, result)| match result {
            Ok(()) => Some(identity),
            Err(err) => {
                warn!(%session_id, %identity, error = %err, "failed to send invite");
                None
            }
        })
        .collect();

    Ok(CreatedGame {
        path: format!("/s/{session_id}"),
        session_id,
        invited,
    })
}
