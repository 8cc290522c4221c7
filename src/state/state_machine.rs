//! The per-tab session state machine driving polling, rounds, points and decision sync.

use std::{sync::Arc, time::Duration};

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{
    config::SessionConfig,
    dto::{
        decisions::{Decisions, Letter, PromptIndex, Prompts, ResponseKey},
        identity::UserIdentity,
        session::{SessionData, SessionStatus},
    },
    error::{DECISIONS_FETCH_ERROR, DECISIONS_SAVE_ERROR, SessionError},
    remote::SessionApi,
    state::{
        phase::{check_transition, is_phase},
        points::PointsBoard,
        reconciler::{DecisionSync, SyncPlan},
        round_timer::{Advance, FinishedCategory, RoundTimer, TickOutcome, TickTicket},
        view::{Overlay, View, ViewInput, select_overlay, select_view},
    },
};

/// Client-side state for one session in one tab.
///
/// The remote store is the only channel between participants, so the machine polls it: once when
/// mounted and again whenever the local player completes a phase. Decisions are pushed as patches
/// whenever they change locally and pulled only when nothing is pending.
pub struct SessionMachine {
    session_id: String,
    api: Arc<dyn SessionApi>,
    config: SessionConfig,
    session: SessionData,
    reached: SessionStatus,
    identity: Option<UserIdentity>,
    sync: DecisionSync,
    error_message: Option<String>,
    loading: bool,
    waiting: bool,
    gave_up: bool,
    status_refresh_count: u32,
    playing_done: bool,
    pointing_done: bool,
    round: Option<RoundTimer>,
    points: Option<PointsBoard>,
}

impl SessionMachine {
    /// Create a machine for `session_id`. Nothing is fetched until [`mount`](Self::mount).
    pub fn new(session_id: impl Into<String>, api: Arc<dyn SessionApi>, config: SessionConfig) -> Self {
        Self {
            session_id: session_id.into(),
            api,
            config,
            session: SessionData::placeholder(),
            reached: SessionData::placeholder().status,
            identity: None,
            sync: DecisionSync::default(),
            error_message: None,
            loading: false,
            waiting: false,
            gave_up: false,
            status_refresh_count: 0,
            playing_done: false,
            pointing_done: false,
            round: None,
            points: None,
        }
    }

    /// First status fetch, followed by a decisions sync when the player is already known.
    pub async fn mount(&mut self) {
        info!(session_id = %self.session_id, "mounting session");
        self.refresh_status().await;
        if self.identity.is_some() {
            self.reconcile_decisions().await;
        }
    }

    /// Record who is playing. A newly known identity triggers a decisions sync.
    pub async fn set_identity(&mut self, identity: Option<UserIdentity>) {
        let changed = match (&self.identity, &identity) {
            (Some(current), Some(next)) => current.id != next.id,
            (None, None) => false,
            _ => true,
        };
        self.identity = identity;
        if !changed {
            return;
        }

        self.sync = DecisionSync::default();
        self.points = None;
        if self.identity.is_some() {
            self.reconcile_decisions().await;
            self.seed_points();
        }
    }

    /// Fetch the session and adopt it, polling while the server still reports a phase the local
    /// player already finished.
    ///
    /// A call made while a refresh is running, after polling gave up or once the session expired
    /// does nothing.
    pub async fn refresh_status(&mut self) {
        if self.is_expired() {
            debug!(session_id = %self.session_id, "session expired; not refreshing");
            return;
        }
        if self.loading {
            debug!(session_id = %self.session_id, "status refresh already in flight");
            return;
        }
        self.loading = true;

        loop {
            let session = match self.api.fetch_session(&self.session_id).await {
                Ok(session) => session,
                Err(err) => {
                    error!(session_id = %self.session_id, error = %err, "failed to fetch session");
                    self.expire();
                    return;
                }
            };

            if self.finished_phase() != Some(session.status) {
                self.adopt_session(session);
                self.waiting = false;
                self.loading = false;
                return;
            }

            self.waiting = true;
            if self.status_refresh_count >= self.config.max_status_refresh_count {
                warn!(
                    session_id = %self.session_id,
                    attempts = self.status_refresh_count,
                    "other players have not finished; giving up polling"
                );
                self.gave_up = true;
                return;
            }

            self.status_refresh_count += 1;
            debug!(
                session_id = %self.session_id,
                attempt = self.status_refresh_count,
                status = ?session.status,
                "waiting for other players"
            );
            tokio::time::sleep(self.config.delay_between_refresh).await;
        }
    }

    /// Push local decision changes, or pull the remote copy when nothing is pending.
    ///
    /// Failures leave a sticky error message; the session keeps rendering.
    pub async fn reconcile_decisions(&mut self) {
        if self.is_expired() {
            return;
        }
        let Some(identity) = self.identity.as_ref().map(|identity| identity.id.clone()) else {
            return;
        };

        let plan = match self.sync.plan() {
            Ok(plan) => plan,
            Err(err) => {
                error!(error = %err, "failed to diff decisions");
                self.error_message = Some(DECISIONS_SAVE_ERROR.into());
                return;
            }
        };

        match plan {
            SyncPlan::Push {
                operations,
                snapshot,
            } => {
                let count = operations.len();
                match self
                    .api
                    .update_decisions(&self.session_id, &identity, operations)
                    .await
                {
                    Ok(_) => {
                        debug!(%identity, operations = count, "pushed decisions");
                        self.sync.mark_pushed(snapshot);
                    }
                    Err(err) => {
                        error!(%identity, error = %err, "failed to save decisions");
                        self.error_message = Some(DECISIONS_SAVE_ERROR.into());
                    }
                }
            }
            SyncPlan::Pull => match self.api.fetch_decisions(&self.session_id, &identity).await {
                Ok(remote) => {
                    if self.sync.accept_remote(remote) {
                        debug!(%identity, "adopted remote decisions");
                    }
                }
                Err(err) => {
                    error!(%identity, error = %err, "failed to fetch decisions");
                    self.error_message = Some(DECISIONS_FETCH_ERROR.into());
                }
            },
        }
    }

    /// Replace the local session with a fetched one.
    ///
    /// Status is checked against the furthest phase reached, so backwards moves are ignored even
    /// across an unrecognised status in between. Categories never change once assigned.
    pub fn adopt_session(&mut self, mut session: SessionData) {
        if let Err(err) = check_transition(self.reached, session.status) {
            warn!(session_id = %self.session_id, error = %err, "ignoring stale session status");
            return;
        }
        if self.session.has_categories() && session.categories != self.session.categories {
            warn!(session_id = %self.session_id, "server sent different categories; keeping the original");
            session.categories = std::mem::take(&mut self.session.categories);
        }

        let previous = self.session.status;
        self.session = session;
        if previous != self.session.status {
            info!(
                session_id = %self.session_id,
                from = ?previous,
                to = ?self.session.status,
                "session status changed"
            );
        }

        if is_phase(self.session.status) {
            self.reached = self.session.status;
            if self.reached != SessionStatus::Playing {
                if let Some(round) = self.round.as_mut() {
                    round.cancel();
                }
            }
        }
        self.seed_points();
    }

    /// Begin the playing phase and return the first tick to schedule.
    pub async fn start_round(&mut self, now: Instant) -> Result<Option<TickTicket>, SessionError> {
        self.ensure_active()?;
        if self.round.is_some() {
            return Err(SessionError::InvalidState("round already started".into()));
        }
        if self.session.status != SessionStatus::Playing || !self.session.has_categories() {
            return Err(SessionError::InvalidState(
                "session has no categories to play".into(),
            ));
        }

        let mut round = RoundTimer::new(
            &self.session.categories,
            Duration::from_secs(u64::from(self.session.time_limit)),
            self.sync.current().answered_letters(),
        );
        let advance = round.start(now);
        self.round = Some(round);

        Ok(match advance {
            Some(advance) => self.handle_advance(advance).await,
            None => None,
        })
    }

    /// Store the text typed for one prompt of the current letter.
    pub fn set_draft(&mut self, index: PromptIndex, text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_active()?;
        let round = self
            .round
            .as_mut()
            .ok_or_else(|| SessionError::InvalidState("no category in progress".into()))?;
        if round.set_draft(index, text) {
            Ok(())
        } else {
            Err(SessionError::InvalidInput(format!(
                "prompt {index} is not part of the current category"
            )))
        }
    }

    /// Handle a scheduled tick, returning the next one to schedule.
    pub async fn tick(&mut self, ticket: TickTicket, now: Instant) -> Option<TickTicket> {
        if self.is_expired() {
            return None;
        }
        let outcome = self.round.as_mut()?.tick(ticket, now);
        match outcome {
            TickOutcome::Pending { tick, .. } => Some(tick),
            TickOutcome::Stale => None,
            TickOutcome::Advanced(advance) => self.handle_advance(advance).await,
        }
    }

    /// Finish the current category early, returning the next tick to schedule.
    pub async fn submit_category(&mut self, now: Instant) -> Option<TickTicket> {
        if self.is_expired() {
            return None;
        }
        let advance = self.round.as_mut()?.submit(now)?;
        self.handle_advance(advance).await
    }

    /// Flip one checkbox on the points board.
    pub fn toggle_point(&mut self, key: &ResponseKey) -> Result<u32, SessionError> {
        self.ensure_active()?;
        if self.pointing_done {
            return Err(SessionError::InvalidState("points already submitted".into()));
        }
        self.points
            .as_mut()
            .ok_or_else(|| SessionError::InvalidState("session is not in pointing".into()))?
            .toggle(key)
    }

    /// Submit the points board and wait for the other reviewers.
    pub async fn submit_points(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        if self.pointing_done {
            return Err(SessionError::InvalidState("points already submitted".into()));
        }
        let points = self
            .points
            .as_ref()
            .ok_or_else(|| SessionError::InvalidState("session is not in pointing".into()))?
            .to_points();

        self.sync.merge_points(points);
        self.reconcile_decisions().await;
        self.pointing_done = true;
        self.refresh_status().await;
        Ok(())
    }

    /// Screen to render for the current state.
    pub fn view(&self) -> View {
        select_view(&ViewInput {
            error_message: self.error_message.as_deref(),
            status: self.session.status,
            identity: self.identity.as_ref(),
            owner: &self.session.owner,
            has_categories: self.session.has_categories(),
            playing_done: self.playing_done,
            current_letter: self.current_letter(),
            winners: self.session.winners.as_deref(),
        })
    }

    /// Backdrop to render above the view.
    pub fn overlay(&self) -> Overlay {
        select_overlay(self.loading, self.waiting, self.gave_up)
    }

    /// Id the machine was created for.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Last adopted session document.
    pub fn session(&self) -> &SessionData {
        &self.session
    }

    /// Status of the last adopted document; may be `Unknown`.
    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    /// Whether the local player created this session.
    pub fn is_owner(&self) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|identity| identity.owns(&self.session.owner))
    }

    /// Local decisions, including edits not yet pushed.
    pub fn decisions(&self) -> &Decisions {
        self.sync.current()
    }

    /// Sticky error set by a failed decisions sync.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether a status refresh is running or polling gave up.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Polling retries spent so far in this session.
    pub fn status_refresh_count(&self) -> u32 {
        self.status_refresh_count
    }

    /// Whether the player went through every category.
    pub fn playing_done(&self) -> bool {
        self.playing_done
    }

    /// Letter being played, if a category is active.
    pub fn current_letter(&self) -> Option<&Letter> {
        self.round.as_ref().and_then(RoundTimer::current_letter)
    }

    /// Prompts shown for the active letter.
    pub fn current_prompts(&self) -> Prompts {
        self.round
            .as_ref()
            .map(RoundTimer::current_prompts)
            .unwrap_or_default()
    }

    /// Whole seconds left in the current category.
    pub fn remaining(&self, now: Instant) -> i64 {
        self.round.as_ref().map_or(0, |round| round.remaining(now))
    }

    /// Points being reviewed; present once the session is in pointing.
    pub fn points_board(&self) -> Option<&PointsBoard> {
        self.points.as_ref()
    }

    fn is_expired(&self) -> bool {
        self.reached == SessionStatus::Expired
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_expired() {
            return Err(SessionError::InvalidState("session has expired".into()));
        }
        Ok(())
    }

    fn finished_phase(&self) -> Option<SessionStatus> {
        if self.pointing_done {
            Some(SessionStatus::Pointing)
        } else if self.playing_done {
            Some(SessionStatus::Playing)
        } else {
            None
        }
    }

    fn expire(&mut self) {
        self.session.status = SessionStatus::Expired;
        self.reached = SessionStatus::Expired;
        self.waiting = false;
        self.loading = false;
        if let Some(round) = self.round.as_mut() {
            round.cancel();
        }
    }

    fn seed_points(&mut self) {
        if self.points.is_some() || self.session.status != SessionStatus::Pointing {
            return;
        }
        if let Some(identity) = &self.identity {
            self.points = Some(PointsBoard::seed(
                &identity.id,
                &self.session.categories,
                &self.session.decisions,
            ));
        }
    }

    async fn handle_advance(&mut self, advance: Advance) -> Option<TickTicket> {
        match advance {
            Advance::Entered {
                finished,
                letter,
                tick,
            } => {
                debug!(session_id = %self.session_id, %letter, "entered category");
                if let Some(finished) = finished {
                    self.record(finished).await;
                }
                Some(tick)
            }
            Advance::PlayingDone { finished } => {
                if let Some(finished) = finished {
                    self.record(finished).await;
                }
                info!(session_id = %self.session_id, "finished playing");
                self.playing_done = true;
                self.refresh_status().await;
                None
            }
        }
    }

    async fn record(&mut self, finished: FinishedCategory) {
        self.sync
            .record_responses(finished.letter, finished.responses);
        self.reconcile_decisions().await;
    }
}
