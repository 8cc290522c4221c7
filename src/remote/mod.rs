//! The remote session store every participant reads and patches.

/// Failures talking to the session service.
pub mod error;
/// HTTP implementation of [`SessionApi`].
pub mod http;
#[cfg(test)]
pub(crate) mod memory;

use futures::future::BoxFuture;

use crate::{
    dto::{
        decisions::Decisions,
        identity::Identity,
        session::{CreatedSession, NewSession, SessionData},
    },
    patch::PatchOperation,
};

pub use error::{ApiError, ApiResult};

/// Abstraction over the remote session store every client reconciles against.
pub trait SessionApi: Send + Sync {
    /// Create a session; the server assigns the id, categories, expiration and owner.
    fn create_session(&self, session: NewSession) -> BoxFuture<'static, ApiResult<CreatedSession>>;
    /// Fetch the authoritative session document.
    fn fetch_session(&self, session_id: &str) -> BoxFuture<'static, ApiResult<SessionData>>;
    /// Patch session-level settings (owner only).
    fn update_session(
        &self,
        session_id: &str,
        operations: Vec<PatchOperation>,
    ) -> BoxFuture<'static, ApiResult<SessionData>>;
    /// Fetch one participant's decisions.
    fn fetch_decisions(
        &self,
        session_id: &str,
        identity: &Identity,
    ) -> BoxFuture<'static, ApiResult<Decisions>>;
    /// Patch one participant's decisions.
    fn update_decisions(
        &self,
        session_id: &str,
        identity: &Identity,
        operations: Vec<PatchOperation>,
    ) -> BoxFuture<'static, ApiResult<Decisions>>;
    /// Ask the service to text a participant the session link.
    fn send_invite(&self, session_id: &str, identity: &Identity) -> BoxFuture<'static, ApiResult<()>>;
}
