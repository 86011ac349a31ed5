#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Shared helpers for reading and rewriting local `$ref` targets.
//!
//! These utilities never resolve references; they only recognise the
//! `#/components/schemas/{name}` form and rename the component it points to.

use serde_json::Value;

/// JSON Pointer prefix of local schema component references.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Returns the portion of a `$ref` following `#/components/schemas/`.
///
/// Returns `None` for external references and other component sections.
pub fn schema_ref_target(ref_str: &str) -> Option<&str> {
    ref_str.strip_prefix(SCHEMA_REF_PREFIX)
}

/// Builds the merged component name for a schema owned by `service`.
pub fn prefixed_schema_name(service: &str, schema: &str) -> String {
    format!("{}_{}", service, schema)
}

/// Rewrites every `#/components/schemas/X` reference beneath `value` to
/// `#/components/schemas/{service}_X`.
///
/// The walk is fully recursive: references inside `items`, `properties`,
/// `oneOf`/`allOf`/`anyOf`, response content, etc. are all rewritten.
pub fn prefix_schema_refs(value: &mut Value, service: &str) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "$ref" {
                    if let Value::String(target) = child {
                        if let Some(name) = schema_ref_target(target) {
                            *target = format!(
                                "{}{}",
                                SCHEMA_REF_PREFIX,
                                prefixed_schema_name(service, name)
                            );
                        }
                        continue;
                    }
                }
                prefix_schema_refs(child, service);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                prefix_schema_refs(item, service);
            }
        }
        _ => {}
    }
}
