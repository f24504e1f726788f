//! Name-keyed list reconciliation.
//!
//! After a `strategic-merge`, lists of maps carrying a `name` key behave like
//! keyed collections: entries sharing a name collapse into the most recently
//! merged one, kept at the position where the name first appeared.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::pointer::ValueKind;

/// Key that identifies list entries.
pub const NAME_KEY: &str = "name";

/// Collapse entries of `elems` that share a `name`.
///
/// Entries that are not maps, or have no `name`, keep their position and are
/// never collapsed. A `name` that is not a string is an error.
pub fn cleanup_list(elems: Vec<Value>) -> Result<Vec<Value>> {
    let mut result: Vec<Value> = Vec::with_capacity(elems.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for elem in elems {
        let name = match elem.as_object().and_then(|m| m.get(NAME_KEY)) {
            None => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => {
                return Err(Error::Strategic {
                    message: format!(
                        "'{}' must be a string, found {}",
                        NAME_KEY,
                        ValueKind::of(other).name()
                    ),
                })
            }
        };

        match name {
            Some(name) => match positions.get(&name) {
                Some(&index) => result[index] = elem,
                None => {
                    positions.insert(name, result.len());
                    result.push(elem);
                }
            },
            None => result.push(elem),
        }
    }

    Ok(result)
}

/// Apply [`cleanup_list`] to every list reachable through maps below `map`.
///
/// List entries are not descended into.
pub fn cleanup_map(map: &mut Map<String, Value>) -> Result<()> {
    for value in map.values_mut() {
        cleanup(value)?;
    }
    Ok(())
}

/// Apply the cleanup to `value`, whatever its kind.
pub fn cleanup(value: &mut Value) -> Result<()> {
    match value {
        Value::Object(map) => cleanup_map(map),
        Value::Array(list) => {
            *list = cleanup_list(std::mem::take(list))?;
            Ok(())
        }
        _ => Ok(()),
    }
}
