//! Local-edits-win synchronisation of one participant's decisions.
//!
//! `current` is what the player has done locally, `applied` is the last state known to be on the
//! server. A non-empty diff between the two is pushed; an empty one means the client is idle and may
//! pull whatever the server holds.

use std::collections::BTreeMap;

use crate::{
    dto::decisions::{Decisions, Letter, PointsByParticipant, PromptIndex},
    error::SessionError,
    patch::{PatchOperation, diff},
};

/// Next step for the decisions resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    /// Send `operations`; on success `snapshot` becomes the applied state.
    Push {
        /// Patch turning the applied state into the local one.
        operations: Vec<PatchOperation>,
        /// Local state the patch was computed from.
        snapshot: Decisions,
    },
    /// Nothing pending; fetch the remote copy.
    Pull,
}

/// Local and last-pushed decisions for the current participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionSync {
    current: Decisions,
    applied: Decisions,
}

impl DecisionSync {
    /// Local decisions, pushed or not.
    pub fn current(&self) -> &Decisions {
        &self.current
    }

    /// Decisions as last confirmed by the store.
    pub fn applied(&self) -> &Decisions {
        &self.applied
    }

    /// Store the responses for a finished letter, replacing any earlier answers for it.
    pub fn record_responses(&mut self, letter: Letter, responses: BTreeMap<PromptIndex, String>) {
        self.current.responses.insert(letter, responses);
    }

    /// Overlay a reviewer's points; each participant's block is replaced as a whole.
    pub fn merge_points(&mut self, points: PointsByParticipant) {
        self.current.points.extend(points);
    }

    /// Diff the local state against the applied snapshot.
    pub fn plan(&self) -> Result<SyncPlan, SessionError> {
        let before = serde_json::to_value(&self.applied)?;
        let after = serde_json::to_value(&self.current)?;
        let operations = diff(&before, &after);

        if operations.is_empty() {
            Ok(SyncPlan::Pull)
        } else {
            Ok(SyncPlan::Push {
                operations,
                snapshot: self.current.clone(),
            })
        }
    }

    /// Record that `snapshot` reached the server.
    pub fn mark_pushed(&mut self, snapshot: Decisions) {
        self.applied = snapshot;
    }

    /// Adopt a pulled copy when it differs from the applied snapshot. Returns whether it did.
    pub fn accept_remote(&mut self, remote: Decisions) -> bool {
        if remote == self.applied {
            return false;
        }
        self.current = remote.clone();
        self.applied = remote;
        true
    }
}
