//! Validation profiles
//!
//! A profile names the patterns that mark a value as a placeholder: a
//! template string standing in for data that has not been supplied yet.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// `<PAN>`, `<AMOUNT>`, ...
pub const DEFAULT_PLACEHOLDER_PATTERN: &str = r"^<.+>$";

static DEFAULT_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_PLACEHOLDER_PATTERN).unwrap());

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("PROFILE/PARSE: {0}")]
    Parse(String),

    #[error("PROFILE/PATTERN: invalid placeholder regex '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("PROFILE/IO: {0}")]
    Io(#[from] std::io::Error),
}

/// One placeholder pattern as written in a profile file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderPattern {
    /// Matched against the trimmed value
    Regex(String),
    /// Equal to the trimmed value
    Exact(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationProfile {
    /// Profile name (e.g., "strict@1.0")
    pub name: String,

    #[serde(
        default = "default_placeholders",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub placeholders: Vec<PlaceholderPattern>,
}

fn default_placeholders() -> Vec<PlaceholderPattern> {
    vec![PlaceholderPattern::Regex(DEFAULT_PLACEHOLDER_PATTERN.to_string())]
}

impl ValidationProfile {
    /// Bracketed template values count as missing
    pub fn strict() -> Self {
        Self {
            name: "strict@1.0".to_string(),
            placeholders: default_placeholders(),
        }
    }

    /// Only empty values count as missing
    pub fn presence_only() -> Self {
        Self {
            name: "presence@1.0".to_string(),
            placeholders: Vec::new(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ProfileError> {
        serde_yaml::from_str(yaml).map_err(|e| ProfileError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn compile(&self) -> Result<PlaceholderSet, ProfileError> {
        let matchers = self
            .placeholders
            .iter()
            .map(|p| match p {
                PlaceholderPattern::Regex(pattern) if pattern == DEFAULT_PLACEHOLDER_PATTERN => {
                    Ok(PlaceholderMatcher::Regex(DEFAULT_PLACEHOLDER.clone()))
                }
                PlaceholderPattern::Regex(pattern) => Regex::new(pattern)
                    .map(PlaceholderMatcher::Regex)
                    .map_err(|source| ProfileError::Pattern {
                        pattern: pattern.clone(),
                        source,
                    }),
                PlaceholderPattern::Exact(literal) => Ok(PlaceholderMatcher::Exact(literal.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PlaceholderSet { matchers })
    }
}

impl Default for ValidationProfile {
    fn default() -> Self {
        Self::strict()
    }
}

#[derive(Debug, Clone)]
pub enum PlaceholderMatcher {
    Regex(Regex),
    Exact(String),
}

impl PlaceholderMatcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            PlaceholderMatcher::Regex(re) => re.is_match(value),
            PlaceholderMatcher::Exact(literal) => value == literal,
        }
    }
}

/// Compiled placeholder patterns
#[derive(Debug, Clone)]
pub struct PlaceholderSet {
    matchers: Vec<PlaceholderMatcher>,
}

impl PlaceholderSet {
    pub fn new(matchers: Vec<PlaceholderMatcher>) -> Self {
        Self { matchers }
    }

    pub fn is_placeholder(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.matchers.iter().any(|m| m.matches(trimmed))
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Default for PlaceholderSet {
    fn default() -> Self {
        Self {
            matchers: vec![PlaceholderMatcher::Regex(DEFAULT_PLACEHOLDER.clone())],
        }
    }
}
