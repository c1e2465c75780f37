//! CB2A Quality: mandatory-field validation
//!
//! Given a constructed message and resolved requirement rows, report which
//! mandatory fields are empty or still hold placeholder values.
//!
//! # Example
//!
//! ```
//! use cb2a_core::Catalog;
//! use cb2a_quality::{MissingReason, Validator};
//!
//! let catalog = Catalog::embedded().unwrap();
//! let variant = catalog.variant("PUC01_3DS").unwrap();
//! let profile = catalog.profile_for(variant).unwrap();
//!
//! let message = cb2a_builder::build(catalog.construction_defaults(), catalog.overlay(&variant.id));
//! let rows = cb2a_policy::resolve(&profile.requirements, catalog.presence_conditions(), variant);
//!
//! let report = Validator::strict().validate(&message, &rows);
//! assert_eq!(report.missing_by_key["56.0022"].reason, MissingReason::Placeholder);
//! println!("{}", report.summary());
//! ```

pub mod gate;
pub mod profile;

pub use gate::{check_value, validate, MissingItem, MissingReason, ValidationReport, ValidationStats, Validator};
pub use profile::{
    PlaceholderMatcher, PlaceholderPattern, PlaceholderSet, ProfileError, ValidationProfile,
    DEFAULT_PLACEHOLDER_PATTERN,
};

/// Validate with the default placeholder patterns
pub fn validate_default(
    message: &cb2a_core::ConstructedMessage,
    rows: &[cb2a_policy::ResolvedRequirementRow],
) -> ValidationReport {
    validate(message, rows, &PlaceholderSet::default())
}
