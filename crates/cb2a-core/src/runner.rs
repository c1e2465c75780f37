//! Pipeline Runner: chains stages and records a proof per stage
use crate::context::ExecutionContext;
use crate::error::{Cb2aError, Result};
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProof {
    pub id: String,
    pub in_hash: String,
    pub out_hash: String,
    pub deterministic: bool,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProof {
    pub pipeline_id: String,
    pub trace_id: String,
    pub started_at: DateTime<Utc>,
    pub stages: Vec<StageProof>,
}

impl RunProof {
    /// Hash of the final output, if any stage ran
    pub fn output_hash(&self) -> Option<&str> {
        self.stages.last().map(|s| s.out_hash.as_str())
    }
}

pub struct PipelineRunner {
    stages: Vec<Box<dyn Stage>>,
    pipeline_id: String,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.id().split('.').next().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join("→");

        Self { stages, pipeline_id }
    }

    pub fn run(&self, input: &[u8], ctx: &ExecutionContext) -> Result<(Vec<u8>, RunProof)> {
        let started_at = Utc::now();
        let mut current = input.to_vec();
        let mut proofs = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let start = Instant::now();
            let in_hash = hash_bytes(&current);

            let result = stage
                .run(&current, ctx)
                .map_err(|e| Cb2aError::Stage(format!("{}: {}", stage.id(), e)))?;

            let out_hash = hash_bytes(&result);
            let latency_ms = start.elapsed().as_millis() as u64;

            tracing::debug!(
                trace_id = %ctx.trace_id,
                stage = stage.id(),
                latency_ms,
                out_hash = %out_hash,
                "stage complete"
            );

            proofs.push(StageProof {
                id: stage.id().to_string(),
                in_hash,
                out_hash,
                deterministic: stage.deterministic(),
                latency_ms,
            });

            current = result;
        }

        let proof = RunProof {
            pipeline_id: self.pipeline_id.clone(),
            trace_id: ctx.trace_id.clone(),
            started_at,
            stages: proofs,
        };

        Ok((current, proof))
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

fn hash_bytes(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::stage::StageError;

    struct Upper;

    impl Stage for Upper {
        fn id(&self) -> &'static str {
            "upper.test.v1"
        }

        fn run(&self, input: &[u8], _ctx: &ExecutionContext) -> std::result::Result<Vec<u8>, StageError> {
            Ok(input.to_ascii_uppercase())
        }
    }

    struct Failing;

    impl Stage for Failing {
        fn id(&self) -> &'static str {
            "fail.test.v1"
        }

        fn run(&self, _input: &[u8], _ctx: &ExecutionContext) -> std::result::Result<Vec<u8>, StageError> {
            Err(StageError::ExecutionFailed("boom".to_string()))
        }
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Catalog::embedded().unwrap())
    }

    #[test]
    fn test_pipeline_id() {
        let runner = PipelineRunner::new(vec![Box::new(Upper), Box::new(Failing)]);
        assert_eq!(runner.pipeline_id(), "upper→fail");
        assert_eq!(runner.len(), 2);
    }

    #[test]
    fn test_run_records_hashes() {
        let runner = PipelineRunner::new(vec![Box::new(Upper), Box::new(Upper)]);
        let (out, proof) = runner.run(b"abc", &ctx()).unwrap();

        assert_eq!(out, b"ABC");
        assert_eq!(proof.stages.len(), 2);
        assert!(proof.stages[0].in_hash.starts_with("blake3:"));
        // second pass is a no-op on already upper-cased bytes
        assert_eq!(proof.stages[1].in_hash, proof.stages[1].out_hash);
        assert_eq!(proof.output_hash(), Some(proof.stages[1].out_hash.as_str()));
    }

    #[test]
    fn test_stage_error_is_wrapped() {
        let runner = PipelineRunner::new(vec![Box::new(Upper), Box::new(Failing)]);
        let err = runner.run(b"abc", &ctx()).unwrap_err();
        assert!(err.to_string().contains("fail.test.v1"));
        assert!(err.to_string().contains("boom"));
    }
}
