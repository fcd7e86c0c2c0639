use std::{fs, path::Path};

use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::item::BibItem;

/// Field requirements shipped with the binary, used when no `--config` is given.
pub const DEFAULT_CONFIG: &str = include_str!("../assets/bibtex-doc-types.yml");

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fields: FieldTable,
}

impl Config {
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("invalid field configuration")
    }

    /// Loads the configuration at `path`, or the bundled default when there is none.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
            }
            None => Self::from_yaml(DEFAULT_CONFIG),
        }
    }
}

/// Entry type name to its field requirements, in configuration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FieldTable(IndexMap<String, FieldSpec>);

impl FieldTable {
    pub fn spec(&self, entry_type: &str) -> Option<&FieldSpec> {
        self.0.get(entry_type)
    }

    /// Required fields for `entry_type`; unknown types require nothing.
    pub fn required(&self, entry_type: &str) -> &[Requirement] {
        self.spec(entry_type)
            .map_or(&[][..], |spec| spec.required.as_slice())
    }

    pub fn optional(&self, entry_type: &str) -> &[String] {
        self.spec(entry_type)
            .map_or(&[][..], |spec| spec.optional.as_slice())
    }

    /// The opening token for `entry_type`: its configured identifier, or the type itself.
    pub fn identifier<'a>(&'a self, entry_type: &'a str) -> &'a str {
        self.spec(entry_type)
            .and_then(|spec| spec.identifier.as_deref())
            .unwrap_or(entry_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub required: Vec<Requirement>,
    #[serde(default)]
    pub optional: Vec<String>,
}

/// A required field, or a set of alternatives of which at least one must be present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Field(String),
    AnyOf(Vec<String>),
}

impl Requirement {
    pub fn is_met_by(&self, item: &BibItem) -> bool {
        match self {
            Requirement::Field(name) => item.contains(name),
            Requirement::AnyOf(names) => names.iter().any(|name| item.contains(name)),
        }
    }
}
