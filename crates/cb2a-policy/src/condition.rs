//! Presence condition matching
//!
//! A condition matches a variant when the variant id is listed explicitly or
//! when the variant shares at least one tag with `tagsAny`.

use cb2a_core::{ConditionMatch, PresenceCondition, UseCaseVariant};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Why a condition matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "camelCase")]
pub enum MatchReason {
    #[serde(rename_all = "camelCase")]
    VariantId { variant_id: String },
    Tag { tag: String },
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchReason::VariantId { variant_id } => write!(f, "variant {} listed", variant_id),
            MatchReason::Tag { tag } => write!(f, "tag '{}'", tag),
        }
    }
}

/// Evaluate a match predicate against a variant.
///
/// Explicit ids are checked first; among tags, the first entry of `tagsAny`
/// carried by the variant is reported.
pub fn match_condition(rule: &ConditionMatch, variant: &UseCaseVariant) -> Option<MatchReason> {
    if rule.variant_ids.iter().any(|id| id == &variant.id) {
        return Some(MatchReason::VariantId {
            variant_id: variant.id.clone(),
        });
    }

    rule.tags_any
        .iter()
        .find(|tag| variant.has_tag(tag))
        .map(|tag| MatchReason::Tag { tag: tag.clone() })
}

/// Presence conditions indexed by id
#[derive(Debug, Default)]
pub struct ConditionIndex<'a> {
    by_id: HashMap<u32, &'a PresenceCondition>,
}

impl<'a> ConditionIndex<'a> {
    /// Later entries win when ids repeat; validated catalogs never repeat them
    pub fn new(conditions: &'a [PresenceCondition]) -> Self {
        Self {
            by_id: conditions.iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: u32) -> Option<&'a PresenceCondition> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb2a_core::{MessageTemplate, Overrides};

    fn variant(id: &str, tags: &[&str]) -> UseCaseVariant {
        UseCaseVariant {
            id: id.to_string(),
            use_case_code: "01".to_string(),
            label_suffix: "test".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            requirement_profile_id: "p".to_string(),
            defaults: MessageTemplate::default(),
            overrides: Overrides::default(),
        }
    }

    #[test]
    fn test_tag_match() {
        let rule = PresenceCondition::new(155, "3DS").for_tags(["3ds"]).r#match;

        assert_eq!(
            match_condition(&rule, &variant("V", &["remote", "ecom", "3ds"])),
            Some(MatchReason::Tag { tag: "3ds".to_string() })
        );
        assert_eq!(match_condition(&rule, &variant("V", &["remote", "ecom"])), None);
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        let rule = PresenceCondition::new(155, "3DS").for_tags(["3DS"]).r#match;
        assert_eq!(match_condition(&rule, &variant("V", &["3ds"])), None);
    }

    #[test]
    fn test_variant_id_match() {
        let rule = PresenceCondition::new(9, "listed")
            .for_variants(["PUC01_MIT"])
            .for_tags(["mit"])
            .r#match;

        assert_eq!(
            match_condition(&rule, &variant("PUC01_MIT", &["mit"])),
            Some(MatchReason::VariantId { variant_id: "PUC01_MIT".to_string() })
        );
    }

    #[test]
    fn test_empty_predicate_never_matches() {
        let rule = ConditionMatch::default();
        assert_eq!(match_condition(&rule, &variant("V", &["remote"])), None);
    }

    #[test]
    fn test_index_lookup() {
        let conditions = vec![
            PresenceCondition::new(3, "first"),
            PresenceCondition::new(155, "3ds"),
            PresenceCondition::new(3, "second"),
        ];
        let index = ConditionIndex::new(&conditions);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(3).unwrap().description, "second");
        assert!(index.get(42).is_none());
    }
}
