//! CB2A Builder: constructs a message for one variant selection
//!
//! ```text
//! constructionDefaults ──┐
//!                        ├── deep merge ──→ ConstructedMessage
//! variant overlay ───────┘
//! ```
//!
//! # Example
//!
//! ```
//! use cb2a_builder::build;
//! use cb2a_core::{FieldValue, MessageTemplate};
//!
//! let base = MessageTemplate::new("0100")
//!     .with_field("2", "<PAN>")
//!     .with_field("4", "<AMOUNT>");
//! let overlay = MessageTemplate::default().with_field("4", "000000001000");
//!
//! let message = build(&base, Some(&overlay));
//! assert_eq!(message.message_type, "0100");
//! assert_eq!(message.field("2"), Some(&FieldValue::text("<PAN>")));
//! assert_eq!(message.field("4"), Some(&FieldValue::text("000000001000")));
//! ```

pub mod merge;

pub use merge::{merge_fields, merge_value};

use cb2a_core::{canonical_fields, ConstructedMessage, MessageTemplate, DEFAULT_MESSAGE_TYPE};

/// Merge a variant's overlay into the base skeleton.
///
/// Every key of `base` survives; overlay values win wherever they are set.
/// Building again with the same overlay yields the same message.
pub fn build(base: &MessageTemplate, overlay: Option<&MessageTemplate>) -> ConstructedMessage {
    let message_type = overlay
        .and_then(|o| o.message_type.clone())
        .or_else(|| base.message_type.clone())
        .unwrap_or_else(|| DEFAULT_MESSAGE_TYPE.to_string());

    // inputs take their wire shape first so a rebuild from serialized
    // output merges exactly like the first build
    let base_fields = canonical_fields(&base.fields);
    let fields = match overlay {
        Some(o) => merge_fields(&base_fields, &canonical_fields(&o.fields)),
        None => base_fields,
    };

    tracing::trace!(message_type = %message_type, fields = fields.len(), "message built");

    ConstructedMessage {
        message_type,
        fields,
    }
}

/// Rebuild on top of a previously constructed message
pub fn rebuild(previous: &ConstructedMessage, overlay: Option<&MessageTemplate>) -> ConstructedMessage {
    let base = MessageTemplate {
        message_type: Some(previous.message_type.clone()),
        fields: previous.fields.clone(),
    };
    build(&base, overlay)
}
