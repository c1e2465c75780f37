//! Pipeline state exchanged between stages as JSON bytes
use cb2a_core::ConstructedMessage;
use cb2a_core::StageError;
use cb2a_policy::ResolvedRequirementRow;
use cb2a_quality::ValidationReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    pub variant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ConstructedMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<ResolvedRequirementRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ValidationReport>,
}

impl PipelineState {
    pub fn new(variant_id: impl Into<String>) -> Self {
        Self {
            variant_id: variant_id.into(),
            message: None,
            requirements: None,
            report: None,
        }
    }

    pub fn decode(input: &[u8]) -> Result<Self, StageError> {
        serde_json::from_slice(input).map_err(|e| StageError::ValidationFailed(e.to_string()))
    }

    pub fn encode(&self) -> Result<Vec<u8>, StageError> {
        serde_json::to_vec(self).map_err(|e| StageError::ExecutionFailed(e.to_string()))
    }
}
