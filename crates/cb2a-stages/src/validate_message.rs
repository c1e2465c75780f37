use crate::state::PipelineState;
use cb2a_core::{ExecutionContext, Stage, StageError};
use cb2a_quality::Validator;

/// Checks the built message against the resolved requirements
#[derive(Debug, Default)]
pub struct ValidateMessageStage {
    validator: Validator,
}

impl ValidateMessageStage {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }
}

impl Stage for ValidateMessageStage {
    fn id(&self) -> &'static str {
        "validate.message.v1"
    }

    fn run(&self, input: &[u8], _ctx: &ExecutionContext) -> Result<Vec<u8>, StageError> {
        let mut state = PipelineState::decode(input)?;

        let report = match (&state.message, &state.requirements) {
            (Some(message), Some(rows)) => self.validator.validate(message, rows),
            (None, _) => return Err(StageError::ValidationFailed("message not built".to_string())),
            (_, None) => {
                return Err(StageError::ValidationFailed(
                    "requirements not resolved".to_string(),
                ))
            }
        };

        state.report = Some(report);
        state.encode()
    }
}
