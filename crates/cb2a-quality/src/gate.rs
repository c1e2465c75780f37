//! Mandatory-field gate
//!
//! Checks a constructed message against resolved requirement rows and
//! reports every mandatory field that is empty or still holds a placeholder.

use crate::profile::{PlaceholderSet, ProfileError, ValidationProfile};
use cb2a_core::{ConstructedMessage, FieldValue};
use cb2a_policy::ResolvedRequirementRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a mandatory field failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingReason {
    #[serde(rename = "Empty (null/undefined/blank)")]
    Empty,
    #[serde(rename = "Placeholder value")]
    Placeholder,
}

impl MissingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingReason::Empty => "Empty (null/undefined/blank)",
            MissingReason::Placeholder => "Placeholder value",
        }
    }
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingItem {
    pub key: String,
    pub field: String,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub label: String,
    pub reason: MissingReason,
    /// Value found at the key, for diagnostics; `None` when nothing is set
    pub current_value: Option<FieldValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub mandatory_count: usize,
    pub missing_count: usize,
    pub ok_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Failing rows, in requirement order
    pub missing: Vec<MissingItem>,
    pub missing_by_key: BTreeMap<String, MissingItem>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn is_missing(&self, key: &str) -> bool {
        self.missing_by_key.contains_key(key)
    }

    pub fn summary(&self) -> String {
        if self.passed() {
            format!(
                "OK: {}/{} mandatory fields present",
                self.stats.ok_count, self.stats.mandatory_count
            )
        } else {
            let keys: Vec<&str> = self.missing.iter().map(|m| m.key.as_str()).collect();
            format!(
                "Blocked: {}/{} mandatory fields missing: {}",
                self.stats.missing_count,
                self.stats.mandatory_count,
                keys.join(", ")
            )
        }
    }
}

/// Classify a looked-up value. Emptiness wins over placeholder detection;
/// numbers and booleans are always real values.
pub fn check_value(value: Option<&FieldValue>, placeholders: &PlaceholderSet) -> Option<MissingReason> {
    match value {
        None | Some(FieldValue::Absent) => Some(MissingReason::Empty),
        Some(FieldValue::Text(s)) if s.trim().is_empty() => Some(MissingReason::Empty),
        Some(FieldValue::Text(s)) if placeholders.is_placeholder(s) => Some(MissingReason::Placeholder),
        Some(_) => None,
    }
}

/// Validate `message` against the mandatory rows of `rows`
pub fn validate(
    message: &ConstructedMessage,
    rows: &[ResolvedRequirementRow],
    placeholders: &PlaceholderSet,
) -> ValidationReport {
    let mut missing = Vec::new();
    let mut missing_by_key = BTreeMap::new();
    let mut mandatory_count = 0;

    for row in rows.iter().filter(|r| r.is_mandatory()) {
        mandatory_count += 1;

        let value = message.lookup(&row.field_key());
        if let Some(reason) = check_value(value, placeholders) {
            let item = MissingItem {
                key: row.key.clone(),
                field: row.row.field.clone(),
                r#type: row.row.r#type.clone(),
                label: row.row.label.clone(),
                reason,
                current_value: value.filter(|v| !v.is_absent()).cloned(),
            };
            missing_by_key.insert(item.key.clone(), item.clone());
            missing.push(item);
        }
    }

    let missing_count = missing.len();
    let stats = ValidationStats {
        mandatory_count,
        missing_count,
        ok_count: mandatory_count.saturating_sub(missing_count),
    };

    tracing::debug!(
        mandatory = stats.mandatory_count,
        missing = stats.missing_count,
        "message validated"
    );

    ValidationReport {
        missing,
        missing_by_key,
        stats,
    }
}

/// Validator bound to one profile
#[derive(Debug, Clone)]
pub struct Validator {
    profile: String,
    placeholders: PlaceholderSet,
}

impl Validator {
    pub fn new(profile: &ValidationProfile) -> Result<Self, ProfileError> {
        Ok(Self {
            profile: profile.name.clone(),
            placeholders: profile.compile()?,
        })
    }

    pub fn strict() -> Self {
        Self {
            profile: ValidationProfile::strict().name,
            placeholders: PlaceholderSet::default(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn placeholders(&self) -> &PlaceholderSet {
        &self.placeholders
    }

    pub fn validate(&self, message: &ConstructedMessage, rows: &[ResolvedRequirementRow]) -> ValidationReport {
        validate(message, rows, &self.placeholders)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::strict()
    }
}
