use serde_json::Value;
use thiserror::Error;

use super::{
    PatchOperation,
    pointer::{parse, parse_index},
};

/// Failures raised while replaying a patch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The pointer is neither empty nor `/`-prefixed.
    #[error("invalid JSON pointer `{path}`")]
    InvalidPointer {
        /// Offending pointer.
        path: String,
    },
    /// The pointer does not resolve to an existing value.
    #[error("path `{path}` does not exist")]
    MissingPath {
        /// Unresolved pointer.
        path: String,
    },
    /// A `test` operation found a different value.
    #[error("test failed at `{path}`")]
    TestFailed {
        /// Pointer whose value differed.
        path: String,
    },
    /// An array index token is malformed or out of range.
    #[error("invalid array index `{token}` at `{path}`")]
    InvalidIndex {
        /// Pointer being resolved.
        path: String,
        /// Token that is not a usable index.
        token: String,
    },
}

/// Apply `operations` to a copy of `document`.
///
/// Either every operation succeeds and the patched copy is returned, or the first failure is
/// returned and the input is left untouched.
pub fn apply(document: &Value, operations: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut working = document.clone();
    for operation in operations {
        apply_one(&mut working, operation)?;
    }
    Ok(working)
}

fn apply_one(document: &mut Value, operation: &PatchOperation) -> Result<(), PatchError> {
    match operation {
        PatchOperation::Add { path, value } => insert(document, path, value.clone()),
        PatchOperation::Remove { path } => take(document, path).map(drop),
        PatchOperation::Replace { path, value } => {
            let target = resolve_mut(document, &parse(path)?, path)?;
            *target = value.clone();
            Ok(())
        }
        PatchOperation::Test { path, value } => {
            let tokens = parse(path)?;
            let current = resolve_mut(document, &tokens, path)
                .map_err(|_| PatchError::TestFailed { path: path.clone() })?;
            if *current == *value {
                Ok(())
            } else {
                Err(PatchError::TestFailed { path: path.clone() })
            }
        }
        PatchOperation::Move { from, path } => {
            let value = take(document, from)?;
            insert(document, path, value)
        }
    }
}

fn insert(document: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let tokens = parse(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        *document = value;
        return Ok(());
    };

    match resolve_mut(document, parents, path)? {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let index = parse_index(last, path)?;
            if index > items.len() {
                return Err(PatchError::InvalidIndex {
                    path: path.to_string(),
                    token: last.clone(),
                });
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::MissingPath {
            path: path.to_string(),
        }),
    }
}

fn take(document: &mut Value, path: &str) -> Result<Value, PatchError> {
    let tokens = parse(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        return Err(PatchError::InvalidPointer {
            path: path.to_string(),
        });
    };

    let missing = || PatchError::MissingPath {
        path: path.to_string(),
    };
    match resolve_mut(document, parents, path)? {
        Value::Object(map) => map.remove(last).ok_or_else(missing),
        Value::Array(items) => {
            let index = parse_index(last, path)?;
            if index < items.len() {
                Ok(items.remove(index))
            } else {
                Err(missing())
            }
        }
        _ => Err(missing()),
    }
}

fn resolve_mut<'a>(
    mut node: &'a mut Value,
    tokens: &[String],
    path: &str,
) -> Result<&'a mut Value, PatchError> {
    for token in tokens {
        node = match node {
            Value::Object(map) => map.get_mut(token),
            Value::Array(items) => {
                let index = parse_index(token, path)?;
                items.get_mut(index)
            }
            _ => None,
        }
        .ok_or_else(|| PatchError::MissingPath {
            path: path.to_string(),
        })?;
    }
    Ok(node)
}
