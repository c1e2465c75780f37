//! Requirement resolution
//!
//! Turns the rows of a requirement profile into effective requirement levels
//! for one variant. Literal markers pass through; `C(n)` markers are upgraded
//! when presence condition `n` matches the variant and stay conditional
//! otherwise. Rows are independent of each other.

use crate::condition::{match_condition, ConditionIndex, MatchReason};
use cb2a_core::{FieldKey, PresenceCondition, Requirement, RequirementRow, UseCaseVariant};
use serde::{Deserialize, Serialize};

/// How a row reached its effective requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Resolution {
    /// Literal marker, nothing to resolve
    Literal,
    #[serde(rename_all = "camelCase")]
    Upgraded { condition_id: u32, via: MatchReason },
    /// The condition exists but the variant does not satisfy it
    #[serde(rename_all = "camelCase")]
    Unmatched { condition_id: u32 },
    /// No presence condition carries this id
    #[serde(rename_all = "camelCase")]
    NoRule { condition_id: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRequirementRow {
    #[serde(flatten)]
    pub row: RequirementRow,
    /// `"field"` or `"field.type"`
    pub key: String,
    pub effective_requirement: Requirement,
    pub explanation: String,
    pub resolution: Resolution,
}

impl ResolvedRequirementRow {
    pub fn field_key(&self) -> FieldKey {
        self.row.key()
    }

    pub fn is_mandatory(&self) -> bool {
        self.effective_requirement.is_mandatory()
    }

    pub fn is_unresolved(&self) -> bool {
        self.effective_requirement.is_conditional()
    }
}

/// Resolve every row against the selected variant, preserving order
pub fn resolve(
    rows: &[RequirementRow],
    conditions: &[PresenceCondition],
    variant: &UseCaseVariant,
) -> Vec<ResolvedRequirementRow> {
    let index = ConditionIndex::new(conditions);
    rows.iter()
        .map(|row| resolve_row(row, &index, variant))
        .collect()
}

/// Resolve a single row
pub fn resolve_row(
    row: &RequirementRow,
    index: &ConditionIndex<'_>,
    variant: &UseCaseVariant,
) -> ResolvedRequirementRow {
    let key = row.key().to_string();

    let (effective_requirement, explanation, resolution) = match row.requirement.condition_id() {
        None => (row.requirement, row.label.clone(), Resolution::Literal),
        Some(id) => match index.get(id) {
            Some(condition) => match match_condition(&condition.r#match, variant) {
                Some(via) => {
                    tracing::debug!(
                        variant = %variant.id,
                        key = %key,
                        condition = id,
                        upgrade_to = %condition.action.upgrade_to,
                        "conditional requirement upgraded"
                    );
                    (
                        condition.action.upgrade_to,
                        format!(
                            "{} - conditional C({}) matched ({}): {}",
                            row.label, id, via, condition.description
                        ),
                        Resolution::Upgraded {
                            condition_id: id,
                            via,
                        },
                    )
                }
                None => (
                    row.requirement,
                    format!("{} - conditional C({}): {}", row.label, id, condition.description),
                    Resolution::Unmatched { condition_id: id },
                ),
            },
            None => (
                row.requirement,
                format!(
                    "{} - conditional C({}) (no resolver rule defined)",
                    row.label, id
                ),
                Resolution::NoRule { condition_id: id },
            ),
        },
    };

    ResolvedRequirementRow {
        row: row.clone(),
        key,
        effective_requirement,
        explanation,
        resolution,
    }
}

/// Rows whose effective requirement is mandatory
pub fn mandatory_rows(rows: &[ResolvedRequirementRow]) -> impl Iterator<Item = &ResolvedRequirementRow> {
    rows.iter().filter(|r| r.is_mandatory())
}

/// Number of rows still carrying a `C(n)` marker after resolution
pub fn unresolved_count(rows: &[ResolvedRequirementRow]) -> usize {
    rows.iter().filter(|r| r.is_unresolved()).count()
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
            requirement_profile_id: "remote_sec_ecom_0100".to_string(),
            defaults: MessageTemplate::default(),
            overrides: Overrides::default(),
        }
    }

    fn rows() -> Vec<RequirementRow> {
        vec![
            RequirementRow::new("2", Requirement::Mandatory).with_label("PAN"),
            RequirementRow::new("56", Requirement::Conditional(155))
                .with_type("0022")
                .with_label("3DS protocol major version"),
            RequirementRow::new("56", Requirement::Conditional(2)).with_label("Additional data"),
            RequirementRow::new("59", Requirement::Optional)
                .with_type("0416")
                .with_label("Electronic commerce indicator"),
        ]
    }

    fn conditions() -> Vec<PresenceCondition> {
        vec![PresenceCondition::new(155, "3DS protocol major version required")
            .for_tags(["3ds"])
            .upgrade_to(Requirement::Mandatory)]
    }

    #[test]
    fn test_tag_driven_upgrade() {
        let resolved = resolve(&rows(), &conditions(), &variant("PUC01_3DS", &["remote", "ecom", "3ds"]));
        let row = &resolved[1];

        assert_eq!(row.key, "56.0022");
        assert_eq!(row.effective_requirement, Requirement::Mandatory);
        assert!(row.explanation.contains("C(155) matched"));
        assert!(row.explanation.contains("tag '3ds'"));
        assert_eq!(
            row.resolution,
            Resolution::Upgraded {
                condition_id: 155,
                via: MatchReason::Tag { tag: "3ds".to_string() }
            }
        );
    }

    #[test]
    fn test_unmatched_stays_conditional() {
        let resolved = resolve(&rows(), &conditions(), &variant("PUC01_NON3DS", &["remote", "ecom"]));
        let row = &resolved[1];

        assert_eq!(row.effective_requirement, Requirement::Conditional(155));
        assert_eq!(row.effective_requirement.to_string(), "C(155)");
        assert_eq!(row.resolution, Resolution::Unmatched { condition_id: 155 });
        assert!(row.explanation.contains("3DS protocol major version required"));
    }

    #[test]
    fn test_missing_rule_is_reported() {
        let resolved = resolve(&rows(), &conditions(), &variant("V", &["3ds"]));
        let row = &resolved[2];

        assert_eq!(row.key, "56");
        assert_eq!(row.effective_requirement, Requirement::Conditional(2));
        assert_eq!(row.resolution, Resolution::NoRule { condition_id: 2 });
        assert!(row.explanation.contains("no resolver rule defined"));
    }

    #[test]
    fn test_literals_pass_through() {
        let resolved = resolve(&rows(), &[], &variant("V", &[]));

        assert_eq!(resolved[0].effective_requirement, Requirement::Mandatory);
        assert_eq!(resolved[0].explanation, "PAN");
        assert_eq!(resolved[3].effective_requirement, Requirement::Optional);
        assert_eq!(resolved[3].resolution, Resolution::Literal);
    }

    #[test]
    fn test_order_and_length_preserved() {
        let input = rows();
        let resolved = resolve(&input, &conditions(), &variant("V", &["3ds"]));

        assert_eq!(resolved.len(), input.len());
        for (original, out) in input.iter().zip(&resolved) {
            assert_eq!(&out.row, original);
        }
    }

    #[test]
    fn test_deterministic() {
        let v = variant("V", &["remote", "3ds"]);
        let a = resolve(&rows(), &conditions(), &v);
        let b = resolve(&rows(), &conditions(), &v);
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_upgrade_to_optional() {
        let conditions = vec![PresenceCondition::new(2, "optional in this profile")
            .for_tags(["remote"])
            .upgrade_to(Requirement::Optional)];
        let resolved = resolve(&rows(), &conditions, &variant("V", &["remote"]));
        assert_eq!(resolved[2].effective_requirement, Requirement::Optional);
    }

    #[test]
    fn test_helpers() {
        let resolved = resolve(&rows(), &conditions(), &variant("V", &["3ds"]));
        assert_eq!(mandatory_rows(&resolved).count(), 2);
        assert_eq!(unresolved_count(&resolved), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let resolved = resolve(&rows(), &conditions(), &variant("V", &["3ds"]));
        let json = serde_json::to_value(&resolved[1]).unwrap();

        assert_eq!(json["field"], "56");
        assert_eq!(json["type"], "0022");
        assert_eq!(json["req"], "C(155)");
        assert_eq!(json["key"], "56.0022");
        assert_eq!(json["effectiveRequirement"], "X");
        assert_eq!(json["resolution"]["status"], "upgraded");
        assert_eq!(json["resolution"]["conditionId"], 155);

        let back: ResolvedRequirementRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, resolved[1]);
    }
}
