//! Fixture front ends: JSON and YAML into the same ordered [`Tree`].
//!
//! Both formats decode through the order-preserving visitors in
//! `polluter-types`, so a YAML mapping and the equivalent JSON object yield
//! identical trees and therefore identical commands.
//!
//! YAML merge keys (`<<: *anchor`) are expanded before the tree is built.
//! The merged fields take the place of the `<<` key, so
//!
//! ```yaml
//! base: &base
//!   role: admin
//! users:
//! - <<: *base
//!   id: 1
//! ```
//!
//! yields a `users` row with fields `role, id`. A field written next to the
//! merge key wins over a merged one; among several merged mappings the
//! earlier one wins.

use polluter_types::Tree;
use serde_yml::{Mapping, Value as YamlValue};

use crate::error::ParseError;

/// Input format of a fixture document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parser {
    /// JSON object at the top level.
    Json,
    /// YAML mapping at the top level.
    #[default]
    Yaml,
}

impl Parser {
    /// Decode `input` into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] or [`ParseError::Yaml`] when the input is
    /// malformed or its top level is not an object, and
    /// [`ParseError::Merge`] when a YAML merge key does not refer to
    /// mappings. No partial tree is returned.
    pub fn parse(self, input: &[u8]) -> Result<Tree, ParseError> {
        match self {
            Self::Json => Ok(serde_json::from_slice(input)?),
            Self::Yaml => {
                // An empty YAML stream is an empty fixture, not a null document.
                if input.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Tree::default());
                }
                let document: YamlValue = serde_yml::from_slice(input)?;
                Ok(serde_yml::from_value(merge_keys(document)?)?)
            }
        }
    }

    /// Pick a parser from a file extension (`json`, `yaml`, `yml`).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Format name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Expand every merge key below `value`.
fn merge_keys(value: YamlValue) -> Result<YamlValue, ParseError> {
    match value {
        YamlValue::Mapping(mapping) => merge_mapping(mapping).map(YamlValue::Mapping),
        YamlValue::Sequence(values) => values
            .into_iter()
            .map(merge_keys)
            .collect::<Result<_, _>>()
            .map(YamlValue::Sequence),
        YamlValue::Tagged(mut tagged) => {
            tagged.value = merge_keys(std::mem::take(&mut tagged.value))?;
            Ok(YamlValue::Tagged(tagged))
        }
        other => Ok(other),
    }
}

fn merge_mapping(mapping: Mapping) -> Result<Mapping, ParseError> {
    let explicit: Vec<YamlValue> = mapping
        .keys()
        .filter(|key| !is_merge_key(key))
        .cloned()
        .collect();

    let mut merged = Mapping::with_capacity(mapping.len());
    for (key, value) in mapping {
        if !is_merge_key(&key) {
            merged.insert(key, merge_keys(value)?);
            continue;
        }
        for source in merge_sources(value)? {
            for (k, v) in source {
                if !explicit.contains(&k) && !merged.contains_key(&k) {
                    merged.insert(k, v);
                }
            }
        }
    }
    Ok(merged)
}

/// The mappings named by a merge key: one mapping or a sequence of them.
fn merge_sources(value: YamlValue) -> Result<Vec<Mapping>, ParseError> {
    match value {
        YamlValue::Mapping(mapping) => Ok(vec![merge_mapping(mapping)?]),
        YamlValue::Sequence(values) => values
            .into_iter()
            .map(|value| match value {
                YamlValue::Mapping(mapping) => merge_mapping(mapping),
                _ => Err(ParseError::Merge("sequence elements must be mappings")),
            })
            .collect(),
        _ => Err(ParseError::Merge("value must be a mapping or a sequence of mappings")),
    }
}

fn is_merge_key(key: &YamlValue) -> bool {
    matches!(key, YamlValue::String(name) if name == "<<")
}
