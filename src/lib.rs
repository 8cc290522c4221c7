//! Library crate for scatter-client, exposing modules for the terminal driver and tests.

/// File and environment configuration.
pub mod config;
/// Documents exchanged with the session service.
pub mod dto;
/// Session-level errors and user-facing error copy.
pub mod error;
pub mod patch;
/// Access to the remote session store.
pub mod remote;
pub mod services;
/// Client-held session state.
pub mod state;
