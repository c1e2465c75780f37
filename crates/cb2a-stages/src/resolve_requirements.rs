use crate::state::PipelineState;
use cb2a_core::{ExecutionContext, Stage, StageError};

/// Resolves the variant's requirement profile against the presence conditions
#[derive(Debug, Default)]
pub struct ResolveRequirementsStage;

impl Stage for ResolveRequirementsStage {
    fn id(&self) -> &'static str {
        "resolve.requirements.v1"
    }

    fn run(&self, input: &[u8], ctx: &ExecutionContext) -> Result<Vec<u8>, StageError> {
        let mut state = PipelineState::decode(input)?;
        let catalog = &ctx.catalog;

        let variant = catalog
            .variant(&state.variant_id)
            .ok_or_else(|| StageError::Lookup(format!("unknown variant '{}'", state.variant_id)))?;
        let profile = catalog.profile_for(variant).ok_or_else(|| {
            StageError::Lookup(format!(
                "unknown requirement profile '{}'",
                variant.requirement_profile_id
            ))
        })?;

        let rows = cb2a_policy::resolve(&profile.requirements, catalog.presence_conditions(), variant);
        state.requirements = Some(rows);
        state.encode()
    }
}
