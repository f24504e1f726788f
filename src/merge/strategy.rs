//! Path-scoped application of one merge strategy.

use log::{debug, warn};
use serde_json::{Map, Value};

use super::{strategic, MergeStrategy, StrategyKind};
use crate::error::{Error, Result};
use crate::pointer::{self, escape, ValueKind};

/// Combine the value `source` holds at the strategy path into `target`.
///
/// Nothing happens when `source` has no value at the path. When `target` has
/// none yet, the source value is copied in.
pub fn apply(target: &mut Value, source: &Value, strategy: &MergeStrategy) -> Result<()> {
    let Some(src) = pointer::get(source, &strategy.path)? else {
        return Ok(());
    };

    match pointer::get_mut(target, &strategy.path)? {
        Some(dst) => combine(dst, src.clone(), strategy.kind, &strategy.path),
        None => {
            let mut value = src.clone();
            if strategy.kind == StrategyKind::StrategicMerge {
                strategic::cleanup(&mut value)?;
            }
            pointer::set_relative(target, &strategy.path, value)
        }
    }
}

/// Combine `src` into `dst`, both found at `pointer`.
///
/// Values of the same scalar kind, or a `null` on either side, resolve to
/// `src`. Any other kind difference is a [`Error::TypeMismatch`].
pub fn combine(dst: &mut Value, src: Value, kind: StrategyKind, pointer: &str) -> Result<()> {
    let dst_kind = ValueKind::of(dst);
    let src_kind = ValueKind::of(&src);

    if dst_kind != src_kind {
        if dst_kind == ValueKind::Null || src_kind == ValueKind::Null {
            *dst = src;
            return Ok(());
        }
        return Err(Error::TypeMismatch {
            pointer: pointer.to_string(),
            expected: dst_kind.name(),
            found: src_kind.name(),
        });
    }

    match (dst, src) {
        (Value::Array(dst), Value::Array(src)) => match kind {
            StrategyKind::Overwrite | StrategyKind::MergeNoAppend => {
                debug!("{}: overwrite list", pointer);
                *dst = src;
            }
            StrategyKind::Merge => {
                debug!("{}: append list", pointer);
                dst.extend(src);
            }
            StrategyKind::StrategicMerge => {
                debug!("{}: strategic merge of list", pointer);
                dst.extend(src);
                *dst = strategic::cleanup_list(std::mem::take(dst))?;
            }
        },
        (Value::Object(dst), Value::Object(src)) => match kind {
            StrategyKind::Overwrite => *dst = src,
            StrategyKind::Merge => deep_merge(dst, src, true, pointer),
            StrategyKind::MergeNoAppend => deep_merge(dst, src, false, pointer),
            StrategyKind::StrategicMerge => {
                deep_merge(dst, src, true, pointer);
                strategic::cleanup_map(dst)?;
            }
        },
        (dst, src) => *dst = src,
    }
    Ok(())
}

/// Merge `src` into `dst` key by key.
///
/// Nested maps are merged recursively, lists are concatenated when `append`
/// is set and replaced otherwise, and everything else is overwritten by the
/// source, empty values included.
pub fn deep_merge(dst: &mut Map<String, Value>, src: Map<String, Value>, append: bool, pointer: &str) {
    for (key, value) in src {
        let Some(existing) = dst.get_mut(&key) else {
            dst.insert(key, value);
            continue;
        };

        match (existing, value) {
            (Value::Object(existing), Value::Object(value)) => {
                let child = format!("{}/{}", pointer, escape(&key));
                deep_merge(existing, value, append, &child);
            }
            (Value::Array(existing), Value::Array(value)) if append => existing.extend(value),
            (existing, value) => {
                let old = ValueKind::of(existing);
                let new = ValueKind::of(&value);
                if old != new && old != ValueKind::Null && new != ValueKind::Null {
                    warn!(
                        "Type mismatch at path '{}/{}': replacing {} with {}",
                        pointer,
                        escape(&key),
                        old.name(),
                        new.name()
                    );
                }
                *existing = value;
            }
        }
    }
}
