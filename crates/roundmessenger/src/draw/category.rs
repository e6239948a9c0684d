// Venue categories: named meeting links matched against venue names.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("no category matches venue {venue:?}")]
    NoMatch { venue: String },
}

/// How a category recognises its venues. Written in TOML as an inline table
/// keyed by the rule kind, e.g. `rule = { prefix = "Room A" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    OneOf(Vec<String>),
}

impl MatchRule {
    /// Returns `true` if `venue` satisfies this rule. The empty venue name
    /// never matches.
    pub fn matches(&self, venue: &str) -> bool {
        if venue.is_empty() {
            return false;
        }
        match self {
            MatchRule::Exact(name) => venue == name,
            MatchRule::Prefix(prefix) => venue.starts_with(prefix.as_str()),
            MatchRule::Suffix(suffix) => venue.ends_with(suffix.as_str()),
            MatchRule::Contains(needle) => venue.contains(needle.as_str()),
            MatchRule::OneOf(names) => names.iter().any(|n| n == venue),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            MatchRule::Exact(s)
            | MatchRule::Prefix(s)
            | MatchRule::Suffix(s)
            | MatchRule::Contains(s) => s.is_empty(),
            MatchRule::OneOf(names) => names.is_empty() || names.iter().any(String::is_empty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub name: String,
    /// Meeting link for every venue in this category. May be empty.
    #[serde(default)]
    pub url: String,
    pub rule: MatchRule,
}

/// Ordered category rules. Lookup is first-match-wins in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Categories {
    #[serde(default, rename = "category")]
    categories: Vec<Category>,
}

impl Categories {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Parse and validate a categories document.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let categories: Categories =
            toml::from_str(text).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        categories.validate()?;
        Ok(categories)
    }

    /// Load a categories TOML file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        Self::from_toml(&text, path)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Find the category for `venue`. A miss is not fatal; callers log it
    /// and carry on without a meeting link.
    pub fn lookup(&self, venue: &str) -> Result<&Category, CategoryError> {
        self.categories
            .iter()
            .find(|c| c.rule.matches(venue))
            .ok_or_else(|| CategoryError::NoMatch {
                venue: venue.to_string(),
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (i, category) in self.categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    field: format!("category[{i}].name"),
                    message: "must not be empty".into(),
                });
            }
            if category.rule.is_blank() {
                return Err(ConfigError::ValidationError {
                    field: format!("category[{i}].rule"),
                    message: format!("pattern for {:?} must not be empty", category.name),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
