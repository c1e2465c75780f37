//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Cb2aError {
    #[error("CATALOG/PARSE: {0}")]
    CatalogParse(String),

    /// A variant names a use case or requirement profile that does not exist
    #[error("CATALOG/REF: {0}")]
    DanglingReference(String),

    #[error("CATALOG/DUP: {0}")]
    Duplicate(String),

    #[error("CATALOG/REQ: {0}")]
    InvalidRequirement(String),

    #[error("CATALOG/KEY: invalid field key '{0}'")]
    InvalidFieldKey(String),

    #[error("CATALOG/DIRECTIVE: {0}")]
    InvalidDirective(String),

    #[error("LOOKUP/VARIANT: unknown variant '{0}'")]
    UnknownVariant(String),

    #[error("STAGE/{0}")]
    Stage(String),

    #[error("IO/{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Cb2aError>;
