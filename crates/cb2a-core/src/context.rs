//! Execution Context: read-only state shared by the stages of one run
use crate::catalog::Catalog;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub trace_id: String,
    pub catalog: Arc<Catalog>,
    pub metadata: BTreeMap<String, Value>,
}

impl ExecutionContext {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            catalog,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
