use serde_json::{Map, Value};

use super::{PatchOperation, pointer::join};

/// Compute the operations that turn `before` into `after`.
///
/// Keys missing from `before` are added with their complete value. Keys missing from `after` are
/// removed, and changed scalars are replaced, each preceded by a `test` of the previous value.
/// Arrays are compared index by index, except that a single inserted or removed element is
/// detected and emitted as one `add`/`remove` instead of shifting every following index.
pub fn diff(before: &Value, after: &Value) -> Vec<PatchOperation> {
    let mut operations = Vec::new();
    diff_into(before, after, "", &mut operations);
    operations
}

fn diff_into(before: &Value, after: &Value, path: &str, operations: &mut Vec<PatchOperation>) {
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => diff_objects(old, new, path, operations),
        (Value::Array(old), Value::Array(new)) => diff_arrays(old, new, path, operations),
        (old, new) if old == new => {}
        (old, new) => {
            operations.push(PatchOperation::Test {
                path: path.to_string(),
                value: old.clone(),
            });
            operations.push(PatchOperation::Replace {
                path: path.to_string(),
                value: new.clone(),
            });
        }
    }
}

fn diff_objects(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    path: &str,
    operations: &mut Vec<PatchOperation>,
) {
    for (key, old_value) in old {
        let child = join(path, key);
        match new.get(key) {
            Some(new_value) => diff_into(old_value, new_value, &child, operations),
            None => push_removal(old_value, child, operations),
        }
    }

    for (key, new_value) in new {
        if !old.contains_key(key) {
            operations.push(PatchOperation::Add {
                path: join(path, key),
                value: new_value.clone(),
            });
        }
    }
}

fn diff_arrays(old: &[Value], new: &[Value], path: &str, operations: &mut Vec<PatchOperation>) {
    if old.len() == new.len() + 1 {
        let at = first_difference(old, new);
        if old[at + 1..] == new[at..] {
            push_removal(&old[at], index_path(path, at), operations);
            return;
        }
    } else if new.len() == old.len() + 1 {
        let at = first_difference(old, new);
        if old[at..] == new[at + 1..] {
            operations.push(PatchOperation::Add {
                path: index_path(path, at),
                value: new[at].clone(),
            });
            return;
        }
    }

    let shared = old.len().min(new.len());
    for index in 0..shared {
        diff_into(&old[index], &new[index], &index_path(path, index), operations);
    }
    // Trailing removals run from the end so earlier indexes stay valid.
    for index in (shared..old.len()).rev() {
        push_removal(&old[index], index_path(path, index), operations);
    }
    for (index, value) in new.iter().enumerate().skip(shared) {
        operations.push(PatchOperation::Add {
            path: index_path(path, index),
            value: value.clone(),
        });
    }
}

fn first_difference(old: &[Value], new: &[Value]) -> usize {
    old.iter()
        .zip(new)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| old.len().min(new.len()))
}

fn push_removal(old_value: &Value, path: String, operations: &mut Vec<PatchOperation>) {
    operations.push(PatchOperation::Test {
        path: path.clone(),
        value: old_value.clone(),
    });
    operations.push(PatchOperation::Remove { path });
}

fn index_path(path: &str, index: usize) -> String {
    format!("{path}/{index}")
}
