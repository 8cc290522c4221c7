//! Player-facing actions built on top of the session store.

/// Session creation and invitations.
pub mod create;
/// Settings and link sharing for the session owner.
pub mod owner;
/// Point values for free-text responses.
pub mod scoring;
