//! Document loading.
//!
//! Source files are YAML. They are parsed with `serde_yaml` and converted into
//! `serde_json::Value` trees, which is the single document model used by the
//! pointer primitives and the merge strategies. Map keys that are not strings
//! are stringified and YAML tags are dropped.

use std::fs;
use std::path::Path;

use log::{debug, error};
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

use crate::defaults::META_KEY;
use crate::error::{Error, Result};
use crate::path::is_meta_path;

/// Load one document from disk.
///
/// An empty or comment-only file is an empty map. Any other top-level shape
/// than a map is rejected.
pub fn load(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    parse(path, &content)
}

/// Parse document text that was read from `path`.
pub fn parse(path: &Path, content: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let yaml: YamlValue = serde_yaml::from_str(content).map_err(|e| {
        error!("cannot parse {}: {}", path.display(), e);
        Error::DocumentParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    match from_yaml(path, yaml)? {
        Value::Null => Ok(Value::Object(Map::new())),
        doc @ Value::Object(_) => Ok(doc),
        other => Err(Error::DocumentParse {
            path: path.to_path_buf(),
            message: format!(
                "top-level value must be a map, found {}",
                crate::pointer::ValueKind::of(&other).name()
            ),
        }),
    }
}

/// Load a merge-list entry, applying the meta file re-wrap rule.
pub fn load_source(path: &Path) -> Result<Value> {
    let doc = load(path)?;
    if is_meta_path(path) {
        return wrap_meta(path, doc);
    }
    Ok(doc)
}

/// Wrap a meta file's content under the meta key.
///
/// A document that already has the meta key is kept as is, unless it also has
/// other top-level keys, which is an [`Error::IncorrectMeta`].
pub fn wrap_meta(path: &Path, doc: Value) -> Result<Value> {
    let Value::Object(map) = doc else {
        return Ok(doc);
    };

    if map.contains_key(META_KEY) {
        if map.len() > 1 {
            error!(
                "meta file {} has {} and other variables, only {} is allowed",
                path.display(),
                META_KEY,
                META_KEY
            );
            return Err(Error::IncorrectMeta {
                path: path.to_path_buf(),
            });
        }
        return Ok(Value::Object(map));
    }

    debug!("wrapping {} under {}", path.display(), META_KEY);
    let mut wrapped = Map::new();
    wrapped.insert(META_KEY.to_string(), Value::Object(map));
    Ok(Value::Object(wrapped))
}

/// Convert a YAML tree into the document model.
pub fn from_yaml(path: &Path, value: YamlValue) -> Result<Value> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => convert_number(&n),
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(seq) => Value::Array(
            seq.into_iter()
                .map(|item| from_yaml(path, item))
                .collect::<Result<Vec<_>>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, item) in mapping {
                map.insert(key_to_string(path, key)?, from_yaml(path, item)?);
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => from_yaml(path, tagged.value)?,
    })
}

fn convert_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        return Value::Number(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Value::Number(u.into());
    }
    // .nan and .inf have no JSON representation
    n.as_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(n.to_string()))
}

fn key_to_string(path: &Path, key: YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => key_to_string(path, tagged.value),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => Err(Error::DocumentParse {
            path: path.to_path_buf(),
            message: "map keys must be scalars".to_string(),
        }),
    }
}

/// Serialize a document as YAML.
pub fn to_yaml_string(doc: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(doc)?)
}
