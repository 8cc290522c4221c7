//! Actions available to the session owner while a game is running.

use std::io;

use tracing::{error, info, warn};

use crate::{
    dto::{
        format_expiration,
        session::{MAX_USER_COUNT, MIN_USER_COUNT, SessionData},
        validation::validate_bounds,
    },
    error::{SESSION_UPDATE_ERROR, SessionError},
    patch::diff,
    remote::SessionApi,
};

/// Notice after a successful settings update.
pub const SESSION_UPDATED: &str = "Game session updated successfully";
/// Notice after the link reached the clipboard.
pub const LINK_COPIED: &str = "Link copied to clipboard";
/// Notice when the clipboard refused the link.
pub const LINK_COPY_FAILED: &str = "Could not copy link to clipboard";

/// Destination for the shareable session link.
pub trait Clipboard {
    /// Replace the clipboard contents with `text`.
    fn write_text(&mut self, text: &str) -> io::Result<()>;
}

/// Tone of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The action went through.
    Success,
    /// The action failed; the panel keeps its pending values.
    Error,
}

/// Transient, dismissible message shown on the owner panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Tone of the message.
    pub kind: NoticeKind,
    /// Copy shown to the owner.
    pub message: &'static str,
}

impl Notice {
    fn success(message: &'static str) -> Self {
        Self {
            kind: NoticeKind::Success,
            message,
        }
    }

    fn error(message: &'static str) -> Self {
        Self {
            kind: NoticeKind::Error,
            message,
        }
    }
}

/// Owner-side settings editor for one session.
#[derive(Debug, Clone)]
pub struct OwnerPanel {
    session_id: String,
    origin: String,
    pending_user_count: u32,
    notice: Option<Notice>,
    loading: bool,
}

impl OwnerPanel {
    /// Start editing from the session as currently known.
    pub fn new(session_id: impl Into<String>, origin: impl Into<String>, session: &SessionData) -> Self {
        Self {
            session_id: session_id.into(),
            origin: origin.into(),
            pending_user_count: session.user_count,
            notice: None,
            loading: false,
        }
    }

    /// Player count that the next submit will send.
    pub fn pending_user_count(&self) -> u32 {
        self.pending_user_count
    }

    /// Outcome of the last submit or copy, until dismissed.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Clear the current notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Whether an update request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Choose a new player count. Nothing is sent until [`submit`](Self::submit).
    pub fn set_user_count(&mut self, user_count: u32) -> Result<(), SessionError> {
        validate_bounds("user_count_range", user_count, MIN_USER_COUNT, MAX_USER_COUNT).map_err(
            |err| {
                SessionError::InvalidInput(
                    err.message
                        .map(|message| message.into_owned())
                        .unwrap_or_else(|| err.code.into_owned()),
                )
            },
        )?;
        self.pending_user_count = user_count;
        Ok(())
    }

    /// Patch the session with the pending settings and return the updated document.
    ///
    /// Only the fields the owner changed are diffed against `current`, so a status or decisions
    /// change made by other players in the meantime is not reverted.
    pub async fn submit(&mut self, api: &dyn SessionApi, current: &SessionData) -> Option<SessionData> {
        let mut desired = current.clone();
        desired.user_count = self.pending_user_count;

        let operations = match (serde_json::to_value(current), serde_json::to_value(&desired)) {
            (Ok(before), Ok(after)) => diff(&before, &after),
            (Err(err), _) | (_, Err(err)) => {
                error!(session_id = %self.session_id, error = %err, "failed to encode session");
                self.notice = Some(Notice::error(SESSION_UPDATE_ERROR));
                return None;
            }
        };
        if operations.is_empty() {
            return None;
        }

        self.loading = true;
        let result = api.update_session(&self.session_id, operations).await;
        self.loading = false;

        match result {
            Ok(updated) => {
                info!(
                    session_id = %self.session_id,
                    user_count = updated.user_count,
                    "updated session settings"
                );
                self.pending_user_count = updated.user_count;
                self.notice = Some(Notice::success(SESSION_UPDATED));
                Some(updated)
            }
            Err(err) => {
                error!(session_id = %self.session_id, error = %err, "failed to update session");
                self.notice = Some(Notice::error(SESSION_UPDATE_ERROR));
                None
            }
        }
    }

    /// Link other players can open to join.
    pub fn session_url(&self) -> String {
        format!("{}/s/{}", self.origin.trim_end_matches('/'), self.session_id)
    }

    /// Put the session link on `clipboard` and report the outcome as a notice.
    pub fn copy_session_url(&mut self, clipboard: &mut dyn Clipboard) {
        match clipboard.write_text(&self.session_url()) {
            Ok(()) => self.notice = Some(Notice::success(LINK_COPIED)),
            Err(err) => {
                warn!(error = %err, "failed to copy session link");
                self.notice = Some(Notice::error(LINK_COPY_FAILED));
            }
        }
    }

    /// When the session expires, as shown on the panel.
    pub fn expiration_label(session: &SessionData) -> String {
        format_expiration(session.expiration)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::SessionConfig,
        dto::{identity::{Identity, UserIdentity}, session::NewSession},
        remote::memory::InMemorySessionService,
        state::SessionMachine,
    };

    const OWNER: &str = "+15550000001";

    #[derive(Default)]
    struct RecordingClipboard {
        copied: Vec<String>,
        broken: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> io::Result<()> {
            if self.broken {
                return Err(io::Error::other("clipboard unavailable"));
            }
            self.copied.push(text.to_string());
            Ok(())
        }
    }

    async fn owned_session(service: &InMemorySessionService) -> SessionMachine {
        let created = service.create_session(NewSession::default()).await.unwrap();
        let mut machine = SessionMachine::new(
            created.session_id,
            Arc::new(service.clone()),
            SessionConfig::default(),
        );
        machine.mount().await;
        machine
            .set_identity(Some(UserIdentity::guest(Identity::from(OWNER))))
            .await;
        machine
    }

    #[test]
    fn user_count_is_bounded() {
        let mut panel = OwnerPanel::new("abc", "http://localhost:8000", &SessionData::placeholder());
        assert!(panel.set_user_count(5).is_ok());
        assert!(matches!(
            panel.set_user_count(6),
            Err(SessionError::InvalidInput(_))
        ));
        assert!(panel.set_user_count(1).is_err());
        assert_eq!(panel.pending_user_count(), 5);
    }

    #[tokio::test]
    async fn submit_patches_only_the_user_count() {
        let service = InMemorySessionService::with_owner(OWNER);
        let mut machine = owned_session(&service).await;
        let mut panel = OwnerPanel::new(machine.session_id(), "http://localhost:8000", machine.session());

        panel.set_user_count(4).unwrap();
        let updated = panel.submit(&service, machine.session()).await.unwrap();
        machine.adopt_session(updated);

        assert_eq!(machine.session().user_count, 4);
        assert_eq!(service.session(machine.session_id()).unwrap().user_count, 4);
        assert_eq!(panel.notice(), Some(&Notice::success(SESSION_UPDATED)));

        panel.dismiss_notice();
        assert!(panel.notice().is_none());
        assert!(panel.submit(&service, machine.session()).await.is_none());
        assert_eq!(service.calls().update_session, 1);
    }

    #[tokio::test]
    async fn failed_updates_raise_an_error_notice() {
        let service = InMemorySessionService::with_owner(OWNER);
        let machine = owned_session(&service).await;
        let mut panel = OwnerPanel::new(machine.session_id(), "http://localhost:8000", machine.session());
        service.expire(machine.session_id());

        panel.set_user_count(3).unwrap();
        assert!(panel.submit(&service, machine.session()).await.is_none());
        assert_eq!(panel.notice(), Some(&Notice::error(SESSION_UPDATE_ERROR)));
        assert!(!panel.is_loading());
    }

    #[test]
    fn copying_the_link_reports_the_outcome() {
        let mut panel = OwnerPanel::new("abc123", "https://scatter.example.test/", &SessionData::placeholder());
        assert_eq!(panel.session_url(), "https://scatter.example.test/s/abc123");

        let mut clipboard = RecordingClipboard::default();
        panel.copy_session_url(&mut clipboard);
        assert_eq!(clipboard.copied, vec!["https://scatter.example.test/s/abc123"]);
        assert_eq!(panel.notice().map(|notice| notice.message), Some(LINK_COPIED));

        clipboard.broken = true;
        panel.copy_session_url(&mut clipboard);
        assert_eq!(
            panel.notice(),
            Some(&Notice::error(LINK_COPY_FAILED))
        );
    }

    #[test]
    fn expiration_is_rendered_as_a_timestamp() {
        let mut session = SessionData::placeholder();
        session.expiration = 1_700_000_000;
        assert_eq!(OwnerPanel::expiration_label(&session), "2023-11-14T22:13:20Z");
    }
}
