//! CB2A Stages: the message pipeline wired end to end.
//!
//! ```text
//! variant id → build.message → resolve.requirements → validate.message → report
//!                   ↓                  ↓                      ↓
//!           ConstructedMessage   resolved rows        ValidationReport
//! ```
//!
//! [`Evaluator`] runs the three steps directly for one variant or for the
//! whole catalog. [`Evaluator::run_with_proof`] runs the same steps as
//! [`Stage`](cb2a_core::Stage)s through the [`PipelineRunner`] so every step
//! is hashed.

mod build_message;
mod resolve_requirements;
mod state;
mod validate_message;

pub use build_message::BuildMessageStage;
pub use resolve_requirements::ResolveRequirementsStage;
pub use state::PipelineState;
pub use validate_message::ValidateMessageStage;

use cb2a_core::{
    Catalog, Cb2aError, ConstructedMessage, ExecutionContext, PipelineRunner, Result, RunProof,
    Stage,
};
use cb2a_policy::ResolvedRequirementRow;
use cb2a_quality::{ValidationReport, Validator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything computed for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantEvaluation {
    pub variant_id: String,
    pub label: String,
    pub message: ConstructedMessage,
    pub requirements: Vec<ResolvedRequirementRow>,
    pub report: ValidationReport,
}

impl VariantEvaluation {
    pub fn passed(&self) -> bool {
        self.report.passed()
    }
}

/// Build → resolve → validate as runner stages
pub fn default_pipeline(validator: Validator) -> PipelineRunner {
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(BuildMessageStage),
        Box::new(ResolveRequirementsStage),
        Box::new(ValidateMessageStage::new(validator)),
    ];
    PipelineRunner::new(stages)
}

/// Long-lived service holding a catalog and a validator
#[derive(Debug, Clone)]
pub struct Evaluator {
    catalog: Arc<Catalog>,
    validator: Validator,
}

impl Evaluator {
    pub fn new(catalog: Arc<Catalog>, validator: Validator) -> Self {
        Self { catalog, validator }
    }

    /// Embedded catalog with the strict validator
    pub fn embedded() -> Result<Self> {
        Ok(Self::new(Catalog::embedded()?, Validator::strict()))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn evaluate(&self, variant_id: &str) -> Result<VariantEvaluation> {
        let catalog = &self.catalog;
        let variant = catalog
            .variant(variant_id)
            .ok_or_else(|| Cb2aError::UnknownVariant(variant_id.to_string()))?;
        let profile = catalog.profile_for(variant).ok_or_else(|| {
            Cb2aError::DanglingReference(format!(
                "variant '{}' names unknown profile '{}'",
                variant.id, variant.requirement_profile_id
            ))
        })?;

        let message = cb2a_builder::build(catalog.construction_defaults(), catalog.overlay(&variant.id));
        let requirements =
            cb2a_policy::resolve(&profile.requirements, catalog.presence_conditions(), variant);
        let report = self.validator.validate(&message, &requirements);

        tracing::info!(
            variant = %variant.id,
            mandatory = report.stats.mandatory_count,
            missing = report.stats.missing_count,
            "variant evaluated"
        );

        Ok(VariantEvaluation {
            variant_id: variant.id.clone(),
            label: catalog.variant_label(variant),
            message,
            requirements,
            report,
        })
    }

    /// Every variant, in catalog order
    pub fn evaluate_all(&self) -> Result<Vec<VariantEvaluation>> {
        self.catalog
            .variants()
            .iter()
            .map(|v| self.evaluate(&v.id))
            .collect()
    }

    /// Same as [`evaluate`](Self::evaluate), run stage by stage with a proof
    pub fn run_with_proof(&self, variant_id: &str) -> Result<(VariantEvaluation, RunProof)> {
        let variant = self
            .catalog
            .variant(variant_id)
            .ok_or_else(|| Cb2aError::UnknownVariant(variant_id.to_string()))?;

        let ctx = ExecutionContext::new(Arc::clone(&self.catalog));
        let input = PipelineState::new(variant_id)
            .encode()
            .map_err(|e| Cb2aError::Stage(e.to_string()))?;

        let runner = default_pipeline(self.validator.clone());
        let (output, proof) = runner.run(&input, &ctx)?;

        let state = PipelineState::decode(&output).map_err(|e| Cb2aError::Stage(e.to_string()))?;
        let incomplete = || Cb2aError::Stage(format!("{}: incomplete pipeline state", runner.pipeline_id()));

        let evaluation = VariantEvaluation {
            variant_id: state.variant_id,
            label: self.catalog.variant_label(variant),
            message: state.message.ok_or_else(incomplete)?,
            requirements: state.requirements.ok_or_else(incomplete)?,
            report: state.report.ok_or_else(incomplete)?,
        };

        Ok((evaluation, proof))
    }
}
