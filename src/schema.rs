//! # Schemas
//!
//! Schema files live under `<root>/.schemas/`. Each one is a JSON Schema
//! written in YAML, optionally extended with an `x-merge` list of
//! `{path, strategy}` pairs contributing merge strategies.
//!
//! Schemas declaring `__meta__` properties get the built-in description of
//! `__meta__.last_update` merged in, since that key is injected by the
//! merge executor and would otherwise trip `additionalProperties: false`.
//!
//! Validation is done by the `jsonschema` engine. The OpenAPI-style
//! `nullable: true` is rewritten into a `null` entry of `type` before the
//! definition is compiled.

use std::path::{Path, PathBuf};

use jsonschema::Validator as Engine;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::config::StrategySpec;
use crate::defaults::SCHEMA_DIR;
use crate::document;
use crate::error::{Error, Result};
use crate::merge::{strategy, MergeStrategy, StrategyKind};
use crate::path::has_document_extension;
use crate::pointer;

const META_SCHEMA_POINTER: &str = "/properties/__meta__";

const DEFAULT_META_SCHEMA: &str = r#"
type: object
properties:
  __meta__:
    type: object
    properties:
      last_update:
        description: Information about the last update, injected when merging.
        type: object
        additionalProperties: false
        properties:
          git:
            description: Information about the last git commit touching the item.
            type: object
"#;

/// Keywords whose value is a single subschema.
const SUBSCHEMA_KEYWORDS: &[&str] = &["items", "additionalProperties", "not", "if", "then", "else"];

/// Keywords whose value is a list of subschemas.
const SUBSCHEMA_LIST_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords whose value maps names to subschemas.
const SUBSCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "$defs", "definitions"];

/// Something that can check a merged document.
pub trait Validator {
    /// Validate the document merged from `path`.
    fn validate(&self, path: &Path, document: &Value) -> Result<()>;
}

#[derive(Debug, Default, Deserialize)]
struct Extensions {
    #[serde(rename = "x-merge", default)]
    x_merge: Vec<StrategySpec>,
}

/// One loaded schema file.
#[derive(Debug, Clone)]
pub struct Schema {
    pub path: PathBuf,
    pub definition: Value,
    pub strategies: Vec<StrategySpec>,
}

impl Schema {
    /// Build a schema from its parsed definition.
    ///
    /// The definition is compiled once here, so a malformed schema fails
    /// when the catalog is opened rather than on the first merge.
    pub fn from_definition(path: &Path, mut definition: Value) -> Result<Self> {
        if pointer::contains(&definition, META_SCHEMA_POINTER)? {
            let defaults = document::parse(path, DEFAULT_META_SCHEMA)?;
            let merge = MergeStrategy::new(META_SCHEMA_POINTER, StrategyKind::Merge);
            strategy::apply(&mut definition, &defaults, &merge)?;
        }
        rewrite_nullable(&mut definition);

        compile(&definition).map_err(|message| Error::Config {
            message: format!("invalid schema {}: {}", path.display(), message),
        })?;

        let extensions: Extensions = serde_json::from_value(definition.clone())?;
        Ok(Self {
            path: path.to_path_buf(),
            definition,
            strategies: extensions.x_merge,
        })
    }

    /// Load a schema file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_definition(path, document::load(path)?)
    }

    /// Check `value` against this schema.
    ///
    /// Every failure is reported, one per line, with the JSON pointer of the
    /// offending value.
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        let engine = compile(&self.definition)?;
        let failures: Vec<String> = engine
            .iter_errors(value)
            .map(|e| format!("{}: {}", location(&e.instance_path.to_string()), e))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("\n"))
        }
    }
}

/// Every schema of a repository, in path order.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: Vec<Schema>,
}

impl SchemaSet {
    pub fn new(schemas: Vec<Schema>) -> Self {
        Self { schemas }
    }

    /// Load all schema files under `<root>/.schemas`.
    pub fn load(root: &Path) -> Result<Self> {
        let dir = root.join(SCHEMA_DIR);
        if !dir.is_dir() {
            debug!("schema dir not found: {}", dir.display());
            return Ok(Self::default());
        }

        let mut schemas = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() || !has_document_extension(entry.path()) {
                continue;
            }
            debug!("loading schema {}", entry.path().display());
            schemas.push(Schema::load(entry.path())?);
        }
        Ok(Self { schemas })
    }

    /// Strategies contributed by `x-merge`, in schema order.
    pub fn strategies(&self) -> Result<Vec<MergeStrategy>> {
        self.schemas
            .iter()
            .flat_map(|s| s.strategies.iter())
            .map(MergeStrategy::from_spec)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }
}

impl Validator for SchemaSet {
    fn validate(&self, path: &Path, document: &Value) -> Result<()> {
        for schema in &self.schemas {
            debug!("validating {} against {}", path.display(), schema.path.display());
            schema.check(document).map_err(|message| Error::Validation {
                path: path.to_path_buf(),
                message,
            })?;
        }
        Ok(())
    }
}

fn compile(definition: &Value) -> std::result::Result<Engine, String> {
    jsonschema::validator_for(definition).map_err(|e| e.to_string())
}

/// Turn `nullable: true` into a `null` member of `type`, in every subschema.
fn rewrite_nullable(schema: &mut Value) {
    let Value::Object(map) = schema else {
        return;
    };

    if map.get("nullable").and_then(Value::as_bool) == Some(true) {
        map.remove("nullable");
        if let Some(ty) = map.get_mut("type") {
            match ty {
                Value::String(name) => {
                    let name = std::mem::take(name);
                    *ty = Value::Array(vec![Value::String(name), Value::String("null".to_string())]);
                }
                Value::Array(names) => {
                    if !names.iter().any(|n| n == "null") {
                        names.push(Value::String("null".to_string()));
                    }
                }
                _ => {}
            }
        }
    }

    for keyword in SUBSCHEMA_KEYWORDS {
        if let Some(sub) = map.get_mut(*keyword) {
            rewrite_nullable(sub);
        }
    }
    for keyword in SUBSCHEMA_LIST_KEYWORDS {
        if let Some(Value::Array(subs)) = map.get_mut(*keyword) {
            subs.iter_mut().for_each(rewrite_nullable);
        }
    }
    for keyword in SUBSCHEMA_MAP_KEYWORDS {
        if let Some(Value::Object(subs)) = map.get_mut(*keyword) {
            subs.values_mut().for_each(rewrite_nullable);
        }
    }
}

fn location(pointer: &str) -> String {
    format!("Error at \"{}\"", if pointer.is_empty() { "/" } else { pointer })
}
