//! In-memory stand-in for the remote session store, used by tests.
//!
//! It mirrors the observable behaviour clients rely on: ids, categories and expiration are assigned
//! on create, decisions are patched atomically, and the status advances on fetch once every
//! participant has submitted for the current phase.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

use futures::future::BoxFuture;
use reqwest::StatusCode;

use crate::{
    dto::{
        decisions::{Categories, Decisions, Prompts},
        identity::Identity,
        session::{CreatedSession, NewSession, SessionData, SessionStatus},
    },
    patch::{PatchOperation, apply},
    remote::{
        SessionApi,
        error::{ApiError, ApiResult},
    },
};

const LETTERS: &str = "KLMNPRSTBC";
const PROMPTS_PER_LETTER: u32 = 3;

/// Number of calls received per operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create_session: usize,
    pub fetch_session: usize,
    pub update_session: usize,
    pub fetch_decisions: usize,
    pub update_decisions: usize,
    pub send_invite: usize,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, SessionData>,
    next_id: u32,
    owner: String,
    frozen: bool,
    fail_decision_writes: bool,
    fail_decision_reads: bool,
    fail_create: bool,
    failing_invites: Vec<Identity>,
    invites: Vec<(String, Identity)>,
    calls: CallCounts,
}

/// Shared handle to the in-memory store; clones see the same sessions.
#[derive(Clone, Default)]
pub struct InMemorySessionService {
    inner: Arc<Mutex<Inner>>,
}

impl InMemorySessionService {
    /// Sessions created through this service are owned by `owner`.
    pub fn with_owner(owner: &str) -> Self {
        let service = Self::default();
        service.lock().owner = owner.to_string();
        service
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stop the status from ever advancing.
    pub fn freeze_status(&self) {
        self.lock().frozen = true;
    }

    /// Drop a session so further fetches fail like an expired document.
    pub fn expire(&self, session_id: &str) {
        self.lock().sessions.remove(session_id);
    }

    pub fn fail_decision_writes(&self) {
        self.lock().fail_decision_writes = true;
    }

    pub fn fail_decision_reads(&self) {
        self.lock().fail_decision_reads = true;
    }

    pub fn fail_create(&self) {
        self.lock().fail_create = true;
    }

    pub fn fail_invite_to(&self, identity: &Identity) {
        self.lock().failing_invites.push(identity.clone());
    }

    /// Overwrite one participant's stored decisions, as another tab would.
    pub fn put_decisions(&self, session_id: &str, identity: &Identity, decisions: Decisions) {
        if let Some(session) = self.lock().sessions.get_mut(session_id) {
            session.decisions.insert(identity.clone(), decisions);
        }
    }

    pub fn session(&self, session_id: &str) -> Option<SessionData> {
        self.lock().sessions.get(session_id).cloned()
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls.clone()
    }

    pub fn invites(&self) -> Vec<(String, Identity)> {
        self.lock().invites.clone()
    }
}

fn not_found(path: String) -> ApiError {
    ApiError::RequestStatus {
        path,
        status: StatusCode::NOT_FOUND,
    }
}

fn rejected(path: String) -> ApiError {
    ApiError::RequestStatus {
        path,
        status: StatusCode::BAD_REQUEST,
    }
}

fn unavailable(path: String) -> ApiError {
    ApiError::RequestStatus {
        path,
        status: StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn assign_categories(rounds: u32) -> Categories {
    LETTERS
        .chars()
        .take(rounds as usize)
        .map(|letter| {
            let prompts: Prompts = (1..=PROMPTS_PER_LETTER)
                .map(|index| (index, format!("Category {letter}{index}")))
                .collect();
            (letter.to_string(), prompts)
        })
        .collect()
}

fn everyone_answered(session: &SessionData) -> bool {
    session.decisions.len() as u32 >= session.user_count
        && session.decisions.values().all(|decisions| {
            session
                .categories
                .keys()
                .all(|letter| decisions.responses.contains_key(letter))
        })
}

fn everyone_pointed(session: &SessionData) -> bool {
    session.decisions.iter().all(|(reviewer, decisions)| {
        session
            .decisions
            .keys()
            .filter(|participant| *participant != reviewer)
            .all(|participant| decisions.points.contains_key(participant))
    })
}

fn winners(session: &SessionData) -> Vec<String> {
    let mut totals: BTreeMap<&Identity, u32> =
        session.decisions.keys().map(|participant| (participant, 0)).collect();
    for (reviewer, decisions) in &session.decisions {
        for (participant, letters) in &decisions.points {
            if participant == reviewer {
                continue;
            }
            let awarded: u32 = letters.values().flat_map(|cells| cells.values()).sum();
            if let Some(total) = totals.get_mut(participant) {
                *total += awarded;
            }
        }
    }
    let best = totals.values().copied().max().unwrap_or(0);
    totals
        .into_iter()
        .filter(|(_, total)| *total == best)
        .map(|(participant, _)| participant.to_string())
        .collect()
}

fn advance(session: &mut SessionData) {
    match session.status {
        SessionStatus::Playing if everyone_answered(session) => {
            session.status = SessionStatus::Pointing;
        }
        SessionStatus::Pointing if everyone_pointed(session) => {
            session.winners = Some(winners(session));
            session.status = SessionStatus::Winner;
        }
        _ => {}
    }
}

impl SessionApi for InMemorySessionService {
    fn create_session(&self, session: NewSession) -> BoxFuture<'static, ApiResult<CreatedSession>> {
        let mut inner = self.lock();
        inner.calls.create_session += 1;
        let result = if inner.fail_create {
            Err(unavailable("/sessions".into()))
        } else {
            inner.next_id += 1;
            let session_id = format!("s{:04}", inner.next_id);
            let document = SessionData {
                rounds: session.rounds,
                time_limit: session.time_limit,
                user_count: session.user_count,
                text_updates: Some(session.text_updates),
                expiration: 1_900_000_000,
                owner: inner.owner.clone(),
                status: SessionStatus::Playing,
                categories: assign_categories(session.rounds),
                decisions: BTreeMap::new(),
                winners: None,
            };
            inner.sessions.insert(session_id.clone(), document);
            Ok(CreatedSession { session_id })
        };
        Box::pin(async move { result })
    }

    fn fetch_session(&self, session_id: &str) -> BoxFuture<'static, ApiResult<SessionData>> {
        let mut inner = self.lock();
        inner.calls.fetch_session += 1;
        let frozen = inner.frozen;
        let result = match inner.sessions.get_mut(session_id) {
            Some(session) => {
                if !frozen {
                    advance(session);
                }
                Ok(session.clone())
            }
            None => Err(not_found(format!("/sessions/{session_id}"))),
        };
        Box::pin(async move { result })
    }

    fn update_session(
        &self,
        session_id: &str,
        operations: Vec<PatchOperation>,
    ) -> BoxFuture<'static, ApiResult<SessionData>> {
        let mut inner = self.lock();
        inner.calls.update_session += 1;
        let path = format!("/sessions/{session_id}");
        let result = match inner.sessions.get_mut(session_id) {
            Some(session) => serde_json::to_value(&*session)
                .ok()
                .and_then(|document| apply(&document, &operations).ok())
                .and_then(|patched| serde_json::from_value::<SessionData>(patched).ok())
                .map(|mut patched| {
                    // Categories are immutable and keep their assigned order.
                    patched.categories = session.categories.clone();
                    *session = patched.clone();
                    patched
                })
                .ok_or_else(|| rejected(path)),
            None => Err(not_found(path)),
        };
        Box::pin(async move { result })
    }

    fn fetch_decisions(
        &self,
        session_id: &str,
        identity: &Identity,
    ) -> BoxFuture<'static, ApiResult<Decisions>> {
        let mut inner = self.lock();
        inner.calls.fetch_decisions += 1;
        let path = format!("/sessions/{session_id}/decisions/{identity}");
        let result = if inner.fail_decision_reads {
            Err(unavailable(path))
        } else {
            match inner.sessions.get(session_id) {
                Some(session) => Ok(session.decisions.get(identity).cloned().unwrap_or_default()),
                None => Err(not_found(path)),
            }
        };
        Box::pin(async move { result })
    }

    fn update_decisions(
        &self,
        session_id: &str,
        identity: &Identity,
        operations: Vec<PatchOperation>,
    ) -> BoxFuture<'static, ApiResult<Decisions>> {
        let mut inner = self.lock();
        inner.calls.update_decisions += 1;
        let path = format!("/sessions/{session_id}/decisions/{identity}");
        let result = if inner.fail_decision_writes {
            Err(unavailable(path))
        } else {
            match inner.sessions.get_mut(session_id) {
                Some(session) => {
                    let current = session.decisions.get(identity).cloned().unwrap_or_default();
                    serde_json::to_value(&current)
                        .ok()
                        .and_then(|document| apply(&document, &operations).ok())
                        .and_then(|patched| serde_json::from_value::<Decisions>(patched).ok())
                        .map(|patched| {
                            session.decisions.insert(identity.clone(), patched.clone());
                            patched
                        })
                        .ok_or_else(|| rejected(path))
                }
                None => Err(not_found(path)),
            }
        };
        Box::pin(async move { result })
    }

    fn send_invite(&self, session_id: &str, identity: &Identity) -> BoxFuture<'static, ApiResult<()>> {
        let mut inner = self.lock();
        inner.calls.send_invite += 1;
        let result = if inner.failing_invites.contains(identity) {
            Err(unavailable(format!("/sessions/{session_id}/send-text/{identity}")))
        } else {
            inner.invites.push((session_id.to_string(), identity.clone()));
            Ok(())
        };
        Box::pin(async move { result })
    }
}
