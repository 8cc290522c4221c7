//! Client-held session state: phases, round timing, points and decision sync.

pub mod phase;
pub mod points;
/// Push/pull planning for the local participant's decisions.
pub mod reconciler;
/// Per-letter countdown.
pub mod round_timer;
pub mod state_machine;
pub mod view;

pub use self::state_machine::SessionMachine;
pub use self::view::{Overlay, View};
