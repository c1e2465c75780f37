//! Data Model: requirement markers, field keys, field values and messages
use crate::error::Cb2aError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Message type used when neither the base skeleton nor the overlay names one
pub const DEFAULT_MESSAGE_TYPE: &str = "0100";

/// Requirement level of a field in a requirement profile.
///
/// Serialized with the table notation of the scheme documents: `"X"` for
/// mandatory, `"F"` for optional and `"C(n)"` for conditional entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Requirement {
    Mandatory,
    Optional,
    /// Mandatory or not depending on presence condition `n`
    Conditional(u32),
}

impl Requirement {
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Requirement::Mandatory)
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, Requirement::Conditional(_))
    }

    /// The presence condition id of a conditional marker
    pub fn condition_id(&self) -> Option<u32> {
        match self {
            Requirement::Conditional(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Mandatory => write!(f, "X"),
            Requirement::Optional => write!(f, "F"),
            Requirement::Conditional(id) => write!(f, "C({})", id),
        }
    }
}

impl FromStr for Requirement {
    type Err = Cb2aError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Requirement::Mandatory),
            "F" => Ok(Requirement::Optional),
            other => other
                .strip_prefix("C(")
                .and_then(|rest| rest.strip_suffix(')'))
                .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|digits| digits.parse::<u32>().ok())
                .filter(|id| *id > 0)
                .map(Requirement::Conditional)
                .ok_or_else(|| {
                    Cb2aError::InvalidRequirement(format!("unrecognised requirement marker '{}'", s))
                }),
        }
    }
}

impl TryFrom<String> for Requirement {
    type Error = Cb2aError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Requirement> for String {
    fn from(req: Requirement) -> Self {
        req.to_string()
    }
}

/// Address of a field or of a sub-element inside a container field.
///
/// Formatted `"56"` for a plain field and `"56.0022"` for a sub-element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldKey {
    pub field: String,
    pub r#type: Option<String>,
}

impl FieldKey {
    /// Build a key, checking that the field number is numeric and the
    /// sub-element type (if any) is a non-empty alphanumeric tag
    pub fn new(field: impl Into<String>, r#type: Option<String>) -> Result<Self, Cb2aError> {
        let key = Self {
            field: field.into(),
            r#type,
        };

        let field_ok = !key.field.is_empty() && key.field.bytes().all(|b| b.is_ascii_digit());
        let type_ok = key
            .r#type
            .as_deref()
            .map(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_alphanumeric()))
            .unwrap_or(true);

        if field_ok && type_ok {
            Ok(key)
        } else {
            Err(Cb2aError::InvalidFieldKey(key.to_string()))
        }
    }

    pub fn is_composite(&self) -> bool {
        self.r#type.is_some()
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.r#type {
            Some(t) => write!(f, "{}.{}", self.field, t),
            None => write!(f, "{}", self.field),
        }
    }
}

impl FromStr for FieldKey {
    type Err = Cb2aError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((field, t)) => FieldKey::new(field, Some(t.to_string())),
            None => FieldKey::new(s, None),
        }
        .map_err(|_| Cb2aError::InvalidFieldKey(s.to_string()))
    }
}

/// Field number → value
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Keys that make a single-entry map read back as a [`Container`]
const CONTAINER_KEYS: [&str; 2] = ["tlv", "TLV"];

/// A node of a message.
///
/// The variant decides how the builder treats it: records merge key by key,
/// everything else is replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null; never erases a value during a merge
    Absent,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Container(Container),
    Record(BTreeMap<String, FieldValue>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Rewrite the node into the shape it takes after a serialization round
    /// trip. A record whose only entry is `tlv` holding a map is written out
    /// exactly like a container and is read back as one.
    pub fn canonical(&self) -> FieldValue {
        match self {
            FieldValue::Record(map) => {
                if let Some(entries) = single_container_entry(map) {
                    return FieldValue::Container(Container { tlv: entries });
                }
                FieldValue::Record(canonical_map(map))
            }
            FieldValue::Container(c) => FieldValue::Container(Container {
                tlv: canonical_map(&c.tlv),
            }),
            FieldValue::List(items) => {
                FieldValue::List(items.iter().map(FieldValue::canonical).collect())
            }
            leaf => leaf.clone(),
        }
    }

    /// Entries of a map-shaped node as they appear on the wire
    fn object_entries(&self) -> Option<BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Record(map) => Some(map.clone()),
            FieldValue::Container(c) => {
                let mut map = BTreeMap::new();
                map.insert("tlv".to_string(), FieldValue::Record(c.tlv.clone()));
                Some(map)
            }
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            FieldValue::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

fn canonical_map(map: &BTreeMap<String, FieldValue>) -> BTreeMap<String, FieldValue> {
    map.iter().map(|(k, v)| (k.clone(), v.canonical())).collect()
}

fn single_container_entry(map: &BTreeMap<String, FieldValue>) -> Option<BTreeMap<String, FieldValue>> {
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    if !CONTAINER_KEYS.contains(&key.as_str()) {
        return None;
    }
    value.object_entries().map(|entries| canonical_map(&entries))
}

/// Canonical copy of every value in a field map
pub fn canonical_fields(fields: &FieldMap) -> FieldMap {
    canonical_map(fields)
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Number(n.into())
    }
}

impl From<Container> for FieldValue {
    fn from(c: Container) -> Self {
        FieldValue::Container(c)
    }
}

/// Composite field holding tagged sub-elements (`{tlv: {type: value}}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Container {
    #[serde(alias = "TLV")]
    pub tlv: BTreeMap<String, FieldValue>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, r#type: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(r#type, value);
        self
    }

    pub fn insert(&mut self, r#type: impl Into<String>, value: impl Into<FieldValue>) {
        self.tlv.insert(r#type.into(), value.into());
    }

    pub fn get(&self, r#type: &str) -> Option<&FieldValue> {
        self.tlv.get(r#type)
    }

    pub fn len(&self) -> usize {
        self.tlv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tlv.is_empty()
    }
}

/// Message skeleton or overlay: a message type plus a partial field map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    #[serde(default, alias = "mti", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default)]
    pub fields: FieldMap,
}

impl MessageTemplate {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: Some(message_type.into()),
            fields: FieldMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }
}

/// Message produced by the builder for one variant selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructedMessage {
    pub message_type: String,
    pub fields: FieldMap,
}

impl ConstructedMessage {
    pub fn field(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Value at a key; `None` when the field, its container or the
    /// sub-element is missing
    pub fn lookup(&self, key: &FieldKey) -> Option<&FieldValue> {
        let value = self.fields.get(&key.field)?;
        match &key.r#type {
            None => Some(value),
            Some(t) => value.as_container()?.get(t),
        }
    }
}
