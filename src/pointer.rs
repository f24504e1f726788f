//! JSON Pointer (RFC 6901) primitives over document trees.
//!
//! Merge strategies are scoped by pointer, so the executor and the schema
//! loader both read and write documents exclusively through this module.
//!
//! - [`get`] looks a pointer up and reports absence as `Ok(None)`.
//! - [`set`] copies the value found at a pointer in one document into the same
//!   pointer of another, creating intermediate maps.
//! - [`set_relative`] writes a given value at a pointer, creating intermediate
//!   maps.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// The kind of a document node, used to report type mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    List,
    Map,
}

impl ValueKind {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::List,
            Value::Object(_) => ValueKind::Map,
        }
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        }
    }
}

/// Split a pointer into its unescaped reference tokens.
///
/// The empty pointer refers to the whole document and yields no tokens.
pub fn parse(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(Error::Pointer {
            pointer: pointer.to_string(),
            message: "a non-empty pointer must start with '/'".to_string(),
        });
    };

    Ok(rest.split('/').map(unescape).collect())
}

/// Escape one reference token (`~` → `~0`, `/` → `~1`).
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Parse an array index token. `-` and leading zeros never match an element.
fn array_index(token: &str) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Look up the value at `pointer`.
///
/// Missing keys, out-of-range indices and attempts to descend into a scalar
/// all report `Ok(None)`. Only a malformed pointer is an error.
pub fn get<'a>(doc: &'a Value, pointer: &str) -> Result<Option<&'a Value>> {
    let tokens = parse(pointer)?;
    let mut current = doc;

    for token in &tokens {
        let next = match current {
            Value::Object(map) => map.get(token),
            Value::Array(list) => array_index(token).and_then(|i| list.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Mutable variant of [`get`].
pub fn get_mut<'a>(doc: &'a mut Value, pointer: &str) -> Result<Option<&'a mut Value>> {
    let tokens = parse(pointer)?;
    let mut current = doc;

    for token in &tokens {
        let next = match current {
            Value::Object(map) => map.get_mut(token),
            Value::Array(list) => array_index(token).and_then(|i| list.get_mut(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Check whether `pointer` resolves in `doc`.
pub fn contains(doc: &Value, pointer: &str) -> Result<bool> {
    Ok(get(doc, pointer)?.is_some())
}

/// Copy the value at `pointer` in `src` into `dst` at the same pointer.
///
/// Nothing happens when `src` has no value there.
pub fn set(dst: &mut Value, pointer: &str, src: &Value) -> Result<()> {
    match get(src, pointer)? {
        Some(value) => set_relative(dst, pointer, value.clone()),
        None => Ok(()),
    }
}

/// Write `value` at `pointer` in `dst`, creating missing intermediate maps.
///
/// A `null` intermediate is replaced by an empty map. For lists, the last
/// token may be an existing index (replace), the list length, or `-` (append).
pub fn set_relative(dst: &mut Value, pointer: &str, value: Value) -> Result<()> {
    let tokens = parse(pointer)?;
    let Some((last, parents)) = tokens.split_last() else {
        *dst = value;
        return Ok(());
    };

    let fail = |message: String| Error::Pointer {
        pointer: pointer.to_string(),
        message,
    };

    let mut current = dst;
    for token in parents {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(token.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(list) => {
                let len = list.len();
                array_index(token)
                    .and_then(|i| list.get_mut(i))
                    .ok_or_else(|| fail(format!("index '{}' out of bounds ({})", token, len)))?
            }
            other => {
                return Err(fail(format!(
                    "cannot descend into a {} at '{}'",
                    ValueKind::of(other).name(),
                    token
                )))
            }
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(list) => {
            if last == "-" {
                list.push(value);
                return Ok(());
            }
            match array_index(last) {
                Some(i) if i < list.len() => {
                    list[i] = value;
                    Ok(())
                }
                Some(i) if i == list.len() => {
                    list.push(value);
                    Ok(())
                }
                _ => Err(fail(format!(
                    "index '{}' out of bounds ({})",
                    last,
                    list.len()
                ))),
            }
        }
        other => Err(fail(format!(
            "cannot set a key inside a {}",
            ValueKind::of(other).name()
        ))),
    }
}
