//! JSON-Patch operations used to ship local edits to the session store.
//!
//! [`diff`] turns a before/after pair into an ordered operation list and [`apply`] replays such a
//! list atomically. Existing scalars are guarded with a `test` before they are replaced or removed
//! so the store can reject a write made against a stale read.

mod apply;
mod diff;
mod pointer;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use apply::{PatchError, apply};
pub use diff::diff;
pub use pointer::escape_token;

/// A single patch instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    /// Insert a value, replacing an object member or shifting array items.
    Add {
        /// JSON pointer to the new location.
        path: String,
        /// Value to insert.
        value: Value,
    },
    /// Delete a value.
    Remove {
        /// JSON pointer to the value.
        path: String,
    },
    /// Overwrite an existing value.
    Replace {
        /// JSON pointer to the value.
        path: String,
        /// Replacement.
        value: Value,
    },
    /// Fail the whole patch unless the document holds `value` at `path`.
    Test {
        /// JSON pointer to check.
        path: String,
        /// Expected value.
        value: Value,
    },
    /// Detach a value and add it elsewhere.
    Move {
        /// JSON pointer to the value being moved.
        from: String,
        /// JSON pointer to its new location.
        path: String,
    },
}

impl PatchOperation {
    /// Target path of the operation.
    pub fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Test { path, .. }
            | PatchOperation::Move { path, .. } => path,
        }
    }

    /// Whether applying the operation can change the document.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, PatchOperation::Test { .. })
    }
}
