//! CB2A Core: catalog, message model, stage contract and runner
//!
//! Shared foundation of the authorization message pipeline. The schema
//! catalog is loaded once, validated at the boundary, and then handed to the
//! builder, resolver and validator crates as an immutable value.

pub mod catalog;
pub mod context;
pub mod data_model;
pub mod directive;
pub mod error;
pub mod runner;
pub mod stage;

pub use catalog::{
    Catalog, CatalogDocument, CatalogMeta, ConditionAction, ConditionMatch, PaymentUseCase,
    PresenceCondition, RequirementProfile, RequirementRow, UseCaseVariant,
};
pub use context::ExecutionContext;
pub use data_model::{
    canonical_fields, ConstructedMessage, Container, FieldKey, FieldMap, FieldValue,
    MessageTemplate, Requirement, DEFAULT_MESSAGE_TYPE,
};
pub use directive::{Overrides, ValueDirective};
pub use error::{Cb2aError, Result};
pub use runner::{PipelineRunner, RunProof, StageProof};
pub use stage::{Stage, StageError};

/// Version of the pipeline crates
pub const CB2A_VERSION: &str = "1.0.0";
