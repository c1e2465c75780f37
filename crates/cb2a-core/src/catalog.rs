//! Schema Catalog
//!
//! Declarative description of the CB2A authorization messages: payment use
//! cases, the variants offered for each of them, requirement profiles,
//! presence conditions and the base construction skeleton.
//!
//! A [`CatalogDocument`] is the raw deserialized form. [`Catalog`] is the
//! validated, indexed form the pipeline works with; it is immutable once
//! built and meant to be shared behind an `Arc`.

use crate::data_model::{FieldKey, MessageTemplate, Requirement, DEFAULT_MESSAGE_TYPE};
use crate::directive::{expand_overrides, Overrides};
use crate::error::{Cb2aError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// CB2A v3 catalog shipped with the crate
const EMBEDDED_CATALOG: &str = include_str!("../catalog/cb2a-v3.yaml");

static EMBEDDED: Lazy<std::result::Result<Arc<Catalog>, String>> = Lazy::new(|| {
    Catalog::from_yaml(EMBEDDED_CATALOG)
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMeta {
    pub version: String,
    #[serde(default = "default_message_type")]
    pub default_message_template: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

fn default_message_type() -> String {
    DEFAULT_MESSAGE_TYPE.to_string()
}

impl Default for CatalogMeta {
    fn default() -> Self {
        Self {
            version: "unversioned".to_string(),
            default_message_template: default_message_type(),
            notes: Vec::new(),
        }
    }
}

/// Coarse business category of a transaction (56.0028)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUseCase {
    pub code: String,
    pub label: String,
}

/// One selectable refinement of a payment use case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCaseVariant {
    pub id: String,
    pub use_case_code: String,
    pub label_suffix: String,
    /// Semantic labels matched by presence conditions
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub requirement_profile_id: String,
    #[serde(default)]
    pub defaults: MessageTemplate,
    #[serde(default)]
    pub overrides: Overrides,
}

impl UseCaseVariant {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRow {
    pub field: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(rename = "req", alias = "requirementSpec")]
    pub requirement: Requirement,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
}

impl RequirementRow {
    pub fn new(field: impl Into<String>, requirement: Requirement) -> Self {
        Self {
            field: field.into(),
            r#type: None,
            requirement,
            label: String::new(),
            flags: Vec::new(),
        }
    }

    pub fn with_type(mut self, r#type: impl Into<String>) -> Self {
        self.r#type = Some(r#type.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn key(&self) -> FieldKey {
        FieldKey {
            field: self.field.clone(),
            r#type: self.r#type.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementProfile {
    pub requirements: Vec<RequirementRow>,
}

/// Predicate over a variant: explicit variant ids, or any shared tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionMatch {
    #[serde(default, alias = "useCaseIds", skip_serializing_if = "Vec::is_empty")]
    pub variant_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags_any: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionAction {
    #[serde(default = "default_upgrade")]
    pub upgrade_to: Requirement,
}

fn default_upgrade() -> Requirement {
    Requirement::Mandatory
}

impl Default for ConditionAction {
    fn default() -> Self {
        Self {
            upgrade_to: default_upgrade(),
        }
    }
}

/// Rule deciding when a `C(n)` entry becomes mandatory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceCondition {
    pub id: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "match")]
    pub r#match: ConditionMatch,
    #[serde(default)]
    pub action: ConditionAction,
}

impl PresenceCondition {
    pub fn new(id: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            r#match: ConditionMatch::default(),
            action: ConditionAction::default(),
        }
    }

    pub fn for_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.r#match.tags_any = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn for_variants<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.r#match.variant_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn upgrade_to(mut self, requirement: Requirement) -> Self {
        self.action.upgrade_to = requirement;
        self
    }
}

/// Catalog file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default)]
    pub meta: CatalogMeta,
    pub payment_use_cases: Vec<PaymentUseCase>,
    pub use_case_variants: Vec<UseCaseVariant>,
    pub requirement_profiles: BTreeMap<String, RequirementProfile>,
    #[serde(default)]
    pub presence_conditions: Vec<PresenceCondition>,
    pub construction_defaults: MessageTemplate,
}

/// Validated catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    document: CatalogDocument,
    use_case_index: HashMap<String, usize>,
    variant_index: HashMap<String, usize>,
    /// Variant id → defaults with the `set` directives expanded
    overlays: HashMap<String, MessageTemplate>,
}

impl Catalog {
    /// The CB2A v3 catalog embedded in the crate, parsed once
    pub fn embedded() -> Result<Arc<Catalog>> {
        EMBEDDED
            .as_ref()
            .map(Arc::clone)
            .map_err(|e| Cb2aError::CatalogParse(e.clone()))
    }

    /// Load from a file; `.json` files are read as JSON, everything else as YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: CatalogDocument = serde_yaml::from_str(yaml)
            .map_err(|e| Cb2aError::CatalogParse(format!("failed to parse catalog YAML: {}", e)))?;
        Self::from_document(document)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| Cb2aError::CatalogParse(format!("failed to parse catalog JSON: {}", e)))?;
        Self::from_document(document)
    }

    /// Check referential integrity and build the lookup indexes
    pub fn from_document(mut document: CatalogDocument) -> Result<Self> {
        if document.construction_defaults.message_type.is_none() {
            document.construction_defaults.message_type =
                Some(document.meta.default_message_template.clone());
        }

        let mut use_case_index = HashMap::new();
        for (i, use_case) in document.payment_use_cases.iter().enumerate() {
            if use_case.code.len() != 2 || !use_case.code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Cb2aError::CatalogParse(format!(
                    "payment use case code '{}' is not two digits",
                    use_case.code
                )));
            }
            if use_case_index.insert(use_case.code.clone(), i).is_some() {
                return Err(Cb2aError::Duplicate(format!(
                    "payment use case code '{}'",
                    use_case.code
                )));
            }
        }

        for (profile_id, profile) in &document.requirement_profiles {
            let mut keys = HashSet::new();
            for row in &profile.requirements {
                let key = FieldKey::new(row.field.clone(), row.r#type.clone())?;
                if !keys.insert(key.clone()) {
                    return Err(Cb2aError::Duplicate(format!(
                        "requirement key '{}' in profile '{}'",
                        key, profile_id
                    )));
                }
            }
        }

        let mut condition_ids = HashSet::new();
        for condition in &document.presence_conditions {
            if !condition_ids.insert(condition.id) {
                return Err(Cb2aError::Duplicate(format!(
                    "presence condition id {}",
                    condition.id
                )));
            }
            if condition.action.upgrade_to.is_conditional() {
                return Err(Cb2aError::InvalidRequirement(format!(
                    "presence condition {} upgrades to another conditional ({})",
                    condition.id, condition.action.upgrade_to
                )));
            }
        }

        let mut variant_index = HashMap::new();
        let mut overlays = HashMap::new();
        for (i, variant) in document.use_case_variants.iter().enumerate() {
            if variant_index.insert(variant.id.clone(), i).is_some() {
                return Err(Cb2aError::Duplicate(format!("variant id '{}'", variant.id)));
            }
            if !use_case_index.contains_key(&variant.use_case_code) {
                return Err(Cb2aError::DanglingReference(format!(
                    "variant '{}' names unknown payment use case '{}'",
                    variant.id, variant.use_case_code
                )));
            }
            if !document.requirement_profiles.contains_key(&variant.requirement_profile_id) {
                return Err(Cb2aError::DanglingReference(format!(
                    "variant '{}' names unknown requirement profile '{}'",
                    variant.id, variant.requirement_profile_id
                )));
            }

            let overlay = expand_overrides(&variant.defaults, &variant.overrides).map_err(|e| {
                Cb2aError::InvalidDirective(format!("variant '{}': {}", variant.id, e))
            })?;
            overlays.insert(variant.id.clone(), overlay);
        }

        let catalog = Self {
            document,
            use_case_index,
            variant_index,
            overlays,
        };
        catalog.report_condition_coverage();

        tracing::info!(
            version = %catalog.meta().version,
            use_cases = catalog.use_cases().len(),
            variants = catalog.variants().len(),
            profiles = catalog.document.requirement_profiles.len(),
            conditions = catalog.presence_conditions().len(),
            "catalog loaded"
        );

        Ok(catalog)
    }

    /// Log `C(n)` markers without a rule and rules no profile refers to.
    /// Neither is fatal: unresolved rows stay conditional.
    fn report_condition_coverage(&self) {
        let defined: BTreeSet<u32> = self.presence_conditions().iter().map(|c| c.id).collect();
        let mut referenced = BTreeSet::new();

        for (profile_id, profile) in &self.document.requirement_profiles {
            for row in &profile.requirements {
                if let Some(id) = row.requirement.condition_id() {
                    referenced.insert(id);
                    if !defined.contains(&id) {
                        tracing::warn!(
                            profile = %profile_id,
                            key = %row.key(),
                            condition = id,
                            "no presence condition defined for conditional requirement"
                        );
                    }
                }
            }
        }

        for id in defined.difference(&referenced) {
            tracing::warn!(condition = id, "presence condition is not referenced by any profile");
        }
    }

    pub fn meta(&self) -> &CatalogMeta {
        &self.document.meta
    }

    pub fn use_cases(&self) -> &[PaymentUseCase] {
        &self.document.payment_use_cases
    }

    pub fn variants(&self) -> &[UseCaseVariant] {
        &self.document.use_case_variants
    }

    pub fn presence_conditions(&self) -> &[PresenceCondition] {
        &self.document.presence_conditions
    }

    pub fn construction_defaults(&self) -> &MessageTemplate {
        &self.document.construction_defaults
    }

    pub fn use_case(&self, code: &str) -> Option<&PaymentUseCase> {
        self.use_case_index
            .get(code)
            .map(|&i| &self.document.payment_use_cases[i])
    }

    pub fn variant(&self, id: &str) -> Option<&UseCaseVariant> {
        self.variant_index
            .get(id)
            .map(|&i| &self.document.use_case_variants[i])
    }

    /// Variants of one use case, in catalog order
    pub fn variants_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a UseCaseVariant> + 'a {
        self.variants().iter().filter(move |v| v.use_case_code == code)
    }

    pub fn profile(&self, id: &str) -> Option<&RequirementProfile> {
        self.document.requirement_profiles.get(id)
    }

    pub fn profile_for(&self, variant: &UseCaseVariant) -> Option<&RequirementProfile> {
        self.profile(&variant.requirement_profile_id)
    }

    /// Defaults of a variant with its `set` directives applied
    pub fn overlay(&self, variant_id: &str) -> Option<&MessageTemplate> {
        self.overlays.get(variant_id)
    }

    /// Display label, e.g. "Single payment - 3DS secured"
    pub fn variant_label(&self, variant: &UseCaseVariant) -> String {
        match self.use_case(&variant.use_case_code) {
            Some(use_case) => format!("{} - {}", use_case.label, variant.label_suffix),
            None => variant.label_suffix.clone(),
        }
    }
}
