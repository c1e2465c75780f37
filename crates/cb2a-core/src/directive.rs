//! Overlay directives
//!
//! Variants describe their business values as `set` directives keyed by field
//! key. Each directive is tagged with a `kind`; expansion turns it into the
//! plain leaf value the builder works with.

use crate::data_model::{Container, FieldKey, FieldValue, MessageTemplate};
use crate::error::{Cb2aError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValueDirective {
    /// Literal value
    Value { value: String },

    /// ISO 8583 field 3: transaction type, source account, destination account
    #[serde(rename_all = "camelCase")]
    ProcessingCode {
        transaction_desc: String,
        debit: String,
        credit: String,
    },
}

impl ValueDirective {
    pub fn value(value: impl Into<String>) -> Self {
        ValueDirective::Value {
            value: value.into(),
        }
    }

    /// Expand the directive into its leaf value
    pub fn resolve(&self) -> Result<String> {
        match self {
            ValueDirective::Value { value } => Ok(value.clone()),
            ValueDirective::ProcessingCode {
                transaction_desc,
                debit,
                credit,
            } => {
                for (name, part) in [
                    ("transactionDesc", transaction_desc),
                    ("debit", debit),
                    ("credit", credit),
                ] {
                    if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(Cb2aError::InvalidDirective(format!(
                            "processingCode.{} must be two digits, got '{}'",
                            name, part
                        )));
                    }
                }
                Ok(format!("{}{}{}", transaction_desc, debit, credit))
            }
        }
    }
}

/// `set` section of a variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default)]
    pub set: BTreeMap<String, ValueDirective>,
}

/// Apply a variant's directives on top of its defaults.
///
/// Sub-element keys (`"59.0101"`) land inside the field's container, which is
/// created when the defaults don't declare one.
pub fn expand_overrides(defaults: &MessageTemplate, overrides: &Overrides) -> Result<MessageTemplate> {
    let mut overlay = defaults.clone();

    for (raw_key, directive) in &overrides.set {
        let key: FieldKey = raw_key.parse()?;
        let value = FieldValue::Text(directive.resolve()?);

        match &key.r#type {
            None => {
                overlay.fields.insert(key.field, value);
            }
            Some(t) => {
                let slot = overlay
                    .fields
                    .entry(key.field.clone())
                    .or_insert_with(|| FieldValue::Container(Container::new()));

                if slot.is_absent() {
                    *slot = FieldValue::Container(Container::new());
                }

                match slot {
                    FieldValue::Container(container) => container.insert(t.clone(), value),
                    _ => {
                        return Err(Cb2aError::InvalidDirective(format!(
                            "'{}' targets a sub-element but field {} is not a container",
                            raw_key, key.field
                        )))
                    }
                }
            }
        }
    }

    Ok(overlay)
}
