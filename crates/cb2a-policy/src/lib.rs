//! CB2A Policy: resolution of conditional requirements
//!
//! A requirement profile lists, per field key, whether the field is
//! mandatory (`X`), optional (`F`) or conditional (`C(n)`). This crate
//! decides, for one selected variant, what each conditional entry means.
//!
//! # Architecture
//!
//! ```text
//! RequirementRow ──→ literal? ──yes──→ unchanged
//!                       │
//!                       no (C(n))
//!                       ↓
//!              PresenceCondition n ──missing──→ C(n), "no resolver rule"
//!                       │
//!               match(variant)? ──no──→ C(n), condition text
//!                       │
//!                      yes
//!                       ↓
//!                   upgradeTo (X)
//! ```
//!
//! # Example
//!
//! ```
//! use cb2a_core::Catalog;
//! use cb2a_policy::resolve;
//!
//! let catalog = Catalog::embedded().unwrap();
//! let variant = catalog.variant("PUC01_3DS").unwrap();
//! let profile = catalog.profile_for(variant).unwrap();
//!
//! let resolved = resolve(&profile.requirements, catalog.presence_conditions(), variant);
//! let row = resolved.iter().find(|r| r.key == "56.0022").unwrap();
//! assert!(row.is_mandatory());
//! ```

pub mod condition;
pub mod resolver;

pub use condition::{match_condition, ConditionIndex, MatchReason};
pub use resolver::{
    mandatory_rows, resolve, resolve_row, unresolved_count, Resolution, ResolvedRequirementRow,
};
