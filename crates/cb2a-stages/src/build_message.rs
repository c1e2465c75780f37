use crate::state::PipelineState;
use cb2a_core::{ExecutionContext, Stage, StageError};

/// Merges the variant overlay onto the catalog construction defaults
#[derive(Debug, Default)]
pub struct BuildMessageStage;

impl Stage for BuildMessageStage {
    fn id(&self) -> &'static str {
        "build.message.v1"
    }

    fn run(&self, input: &[u8], ctx: &ExecutionContext) -> Result<Vec<u8>, StageError> {
        let mut state = PipelineState::decode(input)?;
        let catalog = &ctx.catalog;

        if catalog.variant(&state.variant_id).is_none() {
            return Err(StageError::Lookup(format!("unknown variant '{}'", state.variant_id)));
        }

        let message = cb2a_builder::build(
            catalog.construction_defaults(),
            catalog.overlay(&state.variant_id),
        );
        state.message = Some(message);
        state.encode()
    }
}
