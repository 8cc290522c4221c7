//! Which screen to show, derived from the machine state on every render.

use crate::dto::{decisions::Letter, identity::UserIdentity, session::SessionStatus};

/// Heading of the expired-session screen.
pub const EXPIRED_TITLE: &str = "Game session expired";
/// Body of the expired-session screen.
pub const EXPIRED_MESSAGE: &str =
    "The Scatter game you are trying to access is missing or has expired.";
/// Action offered from the expired-session screen.
pub const START_NEW_GAME: &str = "Start new game";
/// Shown for statuses that have no dedicated screen.
pub const GENERIC_ERROR: &str = "An error has occurred. Please reload the page and try again.";
/// Backdrop heading while a status refresh runs.
pub const LOADING: &str = "Loading";
/// Backdrop heading once the local player finished a phase.
pub const ENTRY_COMPLETE: &str = "Entry complete";
/// Backdrop detail while other players are still going.
pub const WAITING_FOR_PLAYERS: &str = "Waiting for other players";
/// Backdrop detail after polling gave up.
pub const PLEASE_REFRESH: &str = "Please refresh the page";
/// Extra hint shown while waiting.
pub const BOOKMARK_HINT: &str =
    "If other players aren't actively playing, you can bookmark this page and come back later.";

/// Main content of the session page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// A sticky error banner replaces everything else.
    Error(String),
    /// The session could not be fetched.
    Expired,
    /// No identity yet; ask for one.
    IdentityPrompt,
    /// The local player is typing responses.
    Playing {
        /// Letter being played; `None` until the round starts.
        letter: Option<Letter>,
        /// Whether the owner settings panel is shown alongside.
        show_owner_panel: bool,
    },
    /// Playing, but nothing to show until categories arrive or the phase advances.
    Idle,
    /// Reviewing the other participants' responses.
    Pointing,
    /// Final results.
    Winner {
        /// Participants with the highest total; may be empty.
        winners: Vec<String>,
    },
    /// Status this client does not know how to render.
    GenericError,
}

/// Backdrop shown above the view while a status refresh is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// Nothing above the view.
    Hidden,
    /// A status fetch is in flight.
    Loading,
    /// The local player finished the phase and the others have not.
    Waiting {
        /// Polling gave up; the player has to reload.
        please_refresh: bool,
    },
}

impl Overlay {
    /// Heading and sub-message for the backdrop.
    pub fn messages(&self) -> Option<(&'static str, Option<&'static str>)> {
        match self {
            Overlay::Hidden => None,
            Overlay::Loading => Some((LOADING, None)),
            Overlay::Waiting {
                please_refresh: false,
            } => Some((ENTRY_COMPLETE, Some(WAITING_FOR_PLAYERS))),
            Overlay::Waiting {
                please_refresh: true,
            } => Some((ENTRY_COMPLETE, Some(PLEASE_REFRESH))),
        }
    }
}

/// Everything [`select_view`] looks at.
#[derive(Debug, Clone, Copy)]
pub struct ViewInput<'a> {
    /// Sticky sync error, shown instead of anything else.
    pub error_message: Option<&'a str>,
    /// Status of the adopted session.
    pub status: SessionStatus,
    /// Player this tab acts for.
    pub identity: Option<&'a UserIdentity>,
    /// Owner recorded on the session.
    pub owner: &'a str,
    /// Whether categories were assigned.
    pub has_categories: bool,
    /// Whether the player went through every category.
    pub playing_done: bool,
    /// Letter being played.
    pub current_letter: Option<&'a Letter>,
    /// Winners, once the server computed them.
    pub winners: Option<&'a [String]>,
}

/// Pick the view. Earlier rules win.
pub fn select_view(input: &ViewInput<'_>) -> View {
    if let Some(message) = input.error_message {
        return View::Error(message.to_string());
    }
    if input.status == SessionStatus::Expired {
        return View::Expired;
    }
    let Some(identity) = input.identity else {
        return View::IdentityPrompt;
    };

    match input.status {
        SessionStatus::Playing if input.has_categories && !input.playing_done => View::Playing {
            letter: input.current_letter.cloned(),
            show_owner_panel: identity.owns(input.owner),
        },
        SessionStatus::Playing => View::Idle,
        SessionStatus::Pointing => View::Pointing,
        SessionStatus::Winner => match input.winners {
            Some(winners) => View::Winner {
                winners: winners.to_vec(),
            },
            None => View::GenericError,
        },
        SessionStatus::Expired | SessionStatus::Unknown => View::GenericError,
    }
}

/// Pick the backdrop from the refresh flags.
pub fn select_overlay(loading: bool, waiting: bool, gave_up: bool) -> Overlay {
    match (loading, waiting) {
        (false, _) => Overlay::Hidden,
        (true, false) => Overlay::Loading,
        (true, true) => Overlay::Waiting {
            please_refresh: gave_up,
        },
    }
}

/// Heading and names for the winner screen.
pub fn winner_heading(winners: &[String]) -> (&'static str, String) {
    let heading = if winners.len() > 1 {
        "The winners are:"
    } else {
        "The winner is:"
    };
    (heading, winners.join(" & "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::identity::Identity;

    fn player() -> UserIdentity {
        UserIdentity::guest(Identity::from("+15550000001"))
    }

    fn input<'a>(status: SessionStatus, identity: Option<&'a UserIdentity>) -> ViewInput<'a> {
        ViewInput {
            error_message: None,
            status,
            identity,
            owner: "+15550000009",
            has_categories: true,
            playing_done: false,
            current_letter: None,
            winners: None,
        }
    }

    #[test]
    fn error_message_takes_precedence() {
        let player = player();
        let mut state = input(SessionStatus::Expired, Some(&player));
        state.error_message = Some("Error saving categories. Please reload the page and try again.");
        assert!(matches!(select_view(&state), View::Error(_)));
    }

    #[test]
    fn expired_beats_missing_identity() {
        assert_eq!(select_view(&input(SessionStatus::Expired, None)), View::Expired);
        assert_eq!(
            select_view(&input(SessionStatus::Playing, None)),
            View::IdentityPrompt
        );
    }

    #[test]
    fn owner_panel_is_shown_to_the_owner_only() {
        let player = player();
        let letter = "K".to_string();
        let mut state = input(SessionStatus::Playing, Some(&player));
        state.current_letter = Some(&letter);
        assert_eq!(
            select_view(&state),
            View::Playing {
                letter: Some("K".into()),
                show_owner_panel: false
            }
        );

        state.owner = "+15550000001";
        assert!(matches!(
            select_view(&state),
            View::Playing {
                show_owner_panel: true,
                ..
            }
        ));
    }

    #[test]
    fn playing_without_categories_or_after_finishing_is_idle() {
        let player = player();
        let mut state = input(SessionStatus::Playing, Some(&player));
        state.has_categories = false;
        assert_eq!(select_view(&state), View::Idle);

        state.has_categories = true;
        state.playing_done = true;
        assert_eq!(select_view(&state), View::Idle);
    }

    #[test]
    fn winner_view_follows_the_presence_of_winners() {
        let player = player();
        let winners = vec!["+15550000002".to_string()];
        let nobody: Vec<String> = Vec::new();
        let mut state = input(SessionStatus::Winner, Some(&player));
        assert_eq!(select_view(&state), View::GenericError);

        state.winners = Some(&winners);
        assert_eq!(
            select_view(&state),
            View::Winner {
                winners: winners.clone()
            }
        );

        state.winners = Some(nobody.as_slice());
        assert_eq!(select_view(&state), View::Winner { winners: vec![] });
    }

    #[test]
    fn unknown_status_renders_the_generic_error() {
        let player = player();
        assert_eq!(
            select_view(&input(SessionStatus::Unknown, Some(&player))),
            View::GenericError
        );
        assert_eq!(
            select_view(&input(SessionStatus::Pointing, Some(&player))),
            View::Pointing
        );
    }

    #[test]
    fn overlay_follows_refresh_flags() {
        assert_eq!(select_overlay(false, true, true), Overlay::Hidden);
        assert_eq!(select_overlay(true, false, false), Overlay::Loading);
        assert_eq!(
            select_overlay(true, true, false).messages(),
            Some((ENTRY_COMPLETE, Some(WAITING_FOR_PLAYERS)))
        );
        assert_eq!(
            select_overlay(true, true, true).messages(),
            Some((ENTRY_COMPLETE, Some(PLEASE_REFRESH)))
        );
    }

    #[test]
    fn winner_heading_pluralises() {
        let one = vec!["Alice".to_string()];
        let two = vec!["Alice".to_string(), "Bob".to_string()];
        assert_eq!(winner_heading(&one), ("The winner is:", "Alice".to_string()));
        assert_eq!(
            winner_heading(&two),
            ("The winners are:", "Alice & Bob".to_string())
        );
    }
}
