//! Right-biased deep merge over field values
//!
//! Only [`FieldValue::Record`] nodes merge key by key. Text, lists and
//! containers are replaced whole by the overlay. An [`FieldValue::Absent`]
//! overlay never erases what the base holds.

use cb2a_core::{FieldMap, FieldValue};
use std::collections::BTreeMap;

/// Merge `overlay` onto `base`, returning a new map
pub fn merge_fields(base: &FieldMap, overlay: &FieldMap) -> FieldMap {
    merge_records(base, overlay)
}

pub fn merge_value(base: &FieldValue, overlay: &FieldValue) -> FieldValue {
    match (base, overlay) {
        (_, FieldValue::Absent) => base.clone(),
        (FieldValue::Record(b), FieldValue::Record(o)) => FieldValue::Record(merge_records(b, o)),
        (_, o) => o.clone(),
    }
}

fn merge_records(
    base: &BTreeMap<String, FieldValue>,
    overlay: &BTreeMap<String, FieldValue>,
) -> BTreeMap<String, FieldValue> {
    let mut out = base.clone();

    for (key, value) in overlay {
        let merged = match out.get(key) {
            Some(existing) => merge_value(existing, value),
            None => value.clone(),
        };
        out.insert(key.clone(), merged);
    }

    out
}
