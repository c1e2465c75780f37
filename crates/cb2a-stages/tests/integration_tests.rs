//! End-to-end tests over the embedded CB2A v3 catalog.

use cb2a_core::{Catalog, FieldValue, Requirement};
use cb2a_policy::Resolution;
use cb2a_quality::{MissingReason, ValidationProfile, Validator};
use cb2a_stages::{Evaluator, VariantEvaluation};

fn evaluate(variant_id: &str) -> VariantEvaluation {
    Evaluator::embedded().unwrap().evaluate(variant_id).unwrap()
}

fn row<'a>(eval: &'a VariantEvaluation, key: &str) -> &'a cb2a_policy::ResolvedRequirementRow {
    eval.requirements
        .iter()
        .find(|r| r.key == key)
        .unwrap_or_else(|| panic!("no requirement row {}", key))
}

// =============================================================================
// 3DS single payment
// =============================================================================

#[test]
fn test_3ds_message_construction() {
    let eval = evaluate("PUC01_3DS");

    assert_eq!(eval.label, "Single payment - 3DS secured");
    assert_eq!(eval.message.message_type, "0100");
    assert_eq!(eval.message.field("3"), Some(&FieldValue::text("000000")));
    assert_eq!(eval.message.field("2"), Some(&FieldValue::text("<PAN>")));

    let c56 = eval.message.field("56").and_then(FieldValue::as_container).unwrap();
    assert_eq!(c56.get("0028"), Some(&FieldValue::text("01")));
    assert_eq!(c56.get("0022"), Some(&FieldValue::text("<3DS_PROTOCOL_MAJOR_VERSION>")));

    // container declared only in the skeleton survives untouched
    let c55 = eval.message.field("55").and_then(FieldValue::as_container).unwrap();
    assert!(c55.is_empty());
}

#[test]
fn test_3ds_requirements() {
    let eval = evaluate("PUC01_3DS");

    for key in ["56.0022", "56.0023", "59.0412", "56.0028", "7"] {
        assert_eq!(row(&eval, key).effective_requirement, Requirement::Mandatory, "{}", key);
    }

    let r = row(&eval, "56.0022");
    assert!(matches!(r.resolution, Resolution::Upgraded { condition_id: 155, .. }));
    assert!(r.explanation.contains("C(155) matched"));

    // MIT-only conditions stay conditional
    assert_eq!(row(&eval, "119.0047").effective_requirement, Requirement::Conditional(156));
    assert_eq!(row(&eval, "56.0056").effective_requirement, Requirement::Conditional(108));

    // no rule for 158
    let r = row(&eval, "56.0020");
    assert_eq!(r.resolution, Resolution::NoRule { condition_id: 158 });
    assert!(r.explanation.ends_with("(no resolver rule defined)"));

    // literal rows keep their label as explanation
    assert_eq!(row(&eval, "2").explanation, "PAN");
    assert_eq!(row(&eval, "2").row.flags, vec!["S".to_string()]);
}

#[test]
fn test_3ds_validation() {
    let eval = evaluate("PUC01_3DS");
    let report = &eval.report;

    assert!(!report.passed());
    assert_eq!(report.missing_by_key["56.0022"].reason, MissingReason::Placeholder);
    assert_eq!(report.missing_by_key["56.0023"].reason, MissingReason::Placeholder);
    assert_eq!(report.missing_by_key["59.0412"].reason, MissingReason::Placeholder);
    assert_eq!(report.missing_by_key["2"].reason, MissingReason::Placeholder);
    assert_eq!(report.missing_by_key["56.0029"].reason, MissingReason::Empty);

    // filled by the variant
    assert!(!report.is_missing("3"));
    assert!(!report.is_missing("56.0028"));

    // not mandatory for this variant
    assert!(!report.is_missing("119.0047"));
    assert!(!report.is_missing("56.0020"));

    assert_eq!(report.stats.mandatory_count, 31);
    assert_eq!(report.stats.ok_count, 2);
    assert_eq!(report.stats.missing_count, 29);
}

// =============================================================================
// Other postures
// =============================================================================

#[test]
fn test_non3ds_keeps_3ds_fields_conditional() {
    let eval = evaluate("PUC01_NON3DS");

    let r = row(&eval, "56.0022");
    assert_eq!(r.effective_requirement, Requirement::Conditional(155));
    assert_eq!(r.resolution, Resolution::Unmatched { condition_id: 155 });
    assert_eq!(
        r.explanation,
        "3DS protocol major version - conditional C(155): 3DS protocol major version required for 3DS-secured payments"
    );

    assert!(!eval.report.is_missing("56.0022"));
    assert!(!eval.report.is_missing("59.0412"));
    assert_eq!(eval.report.stats.mandatory_count, 28);
}

#[test]
fn test_mit_requires_original_debit_reference() {
    let eval = evaluate("PUC01_MIT");

    assert_eq!(row(&eval, "119.0047").effective_requirement, Requirement::Mandatory);
    let item = &eval.report.missing_by_key["119.0047"];
    assert_eq!(item.reason, MissingReason::Placeholder);
    assert_eq!(item.current_value, Some(FieldValue::text("<ORIGINAL_DEBIT_UNIQUE_REF>")));

    // PAR is upgraded but nothing sets it
    assert_eq!(eval.report.missing_by_key["56.0056"].reason, MissingReason::Empty);

    // card-on-file action is a real value
    assert!(!eval.report.is_missing("56.0029"));
}

#[test]
fn test_presence_only_profile() {
    let catalog = Catalog::embedded().unwrap();
    let validator = Validator::new(&ValidationProfile::presence_only()).unwrap();
    let evaluator = Evaluator::new(catalog, validator);

    let eval = evaluator.evaluate("PUC01_3DS").unwrap();
    assert!(eval.report.missing.iter().all(|m| m.reason == MissingReason::Empty));
    assert!(eval.report.is_missing("56.0029"));
    assert!(!eval.report.is_missing("56.0022"));
}

// =============================================================================
// Whole catalog
// =============================================================================

#[test]
fn test_evaluate_all() {
    let evaluator = Evaluator::embedded().unwrap();
    let all = evaluator.evaluate_all().unwrap();

    assert_eq!(all.len(), 18);
    assert_eq!(all[0].variant_id, "PUC01_NON3DS");

    for eval in &all {
        let stats = eval.report.stats;
        assert_eq!(stats.ok_count + stats.missing_count, stats.mandatory_count, "{}", eval.variant_id);
        assert_eq!(stats.missing_count, eval.report.missing.len());
        assert_eq!(eval.requirements.len(), 43);
        // every variant sets its payment use case and processing code
        assert!(!eval.report.is_missing("56.0028"), "{}", eval.variant_id);
        assert!(!eval.report.is_missing("3"), "{}", eval.variant_id);
    }
}

#[test]
fn test_missing_keys_are_mandatory_rows() {
    let eval = evaluate("PUC02_MIT_SUBSEQUENT");

    for item in &eval.report.missing {
        assert!(row(&eval, &item.key).is_mandatory(), "{}", item.key);
    }
}

// =============================================================================
// Runner proofs
// =============================================================================

#[test]
fn test_run_with_proof_matches_direct_evaluation() {
    let evaluator = Evaluator::embedded().unwrap();

    let (staged, proof) = evaluator.run_with_proof("PUC01_3DS").unwrap();
    let direct = evaluator.evaluate("PUC01_3DS").unwrap();

    assert_eq!(staged, direct);
    assert_eq!(proof.pipeline_id, "build→resolve→validate");
    assert_eq!(proof.stages.len(), 3);
    assert!(proof.stages.iter().all(|s| s.deterministic));
    assert_eq!(proof.stages[0].out_hash, proof.stages[1].in_hash);
}

#[test]
fn test_runs_are_byte_identical() {
    let evaluator = Evaluator::embedded().unwrap();

    let (first, a) = evaluator.run_with_proof("PUC06_MIT").unwrap();
    let (second, b) = evaluator.run_with_proof("PUC06_MIT").unwrap();

    assert_ne!(a.trace_id, b.trace_id);
    assert_eq!(a.output_hash(), b.output_hash());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
