#![deny(missing_docs)]

//! # Multi-Service Merger
//!
//! Combines already-fetched OpenAPI documents from independent services into a single
//! gateway document.
//!
//! Per service:
//! 1. Paths are re-rooted under the service's configured prefix.
//! 2. Operations are tagged with the service name.
//! 3. Component schemas are renamed `{service}_{schema}` and every `$ref` to them
//!    (inside operations and inside other schemas) is rewritten to match.

use crate::gateway::ServiceConfig;
use crate::oas::document::OPENAPI_VERSION;
use crate::oas::models::HttpMethod;
use crate::oas::ref_utils::{prefix_schema_refs, prefixed_schema_name};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

const GATEWAY_TITLE: &str = "API Gateway";
const GATEWAY_VERSION: &str = "1.0.0";

/// Merges service documents using the registered service configuration.
#[derive(Debug, Clone, Default)]
pub struct GatewayMerger {
    services: Vec<ServiceConfig>,
}

impl GatewayMerger {
    /// Creates a merger for the registered services.
    pub fn new(services: Vec<ServiceConfig>) -> Self {
        Self { services }
    }

    /// Registered services, in declaration order.
    pub fn services(&self) -> &[ServiceConfig] {
        &self.services
    }

    /// Looks up a registered service by name.
    pub fn find_service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Merges `documents` (service name → document) in iteration order.
    ///
    /// Services missing from the registry are merged without a path prefix.
    pub fn merge(&self, documents: &IndexMap<String, Value>) -> Value {
        let mut paths = Map::new();
        let mut tags = Vec::new();
        let mut tag_names = HashSet::new();
        let mut schemas = Map::new();

        for (service, document) in documents {
            let prefix = self
                .find_service(service)
                .map(ServiceConfig::normalized_prefix)
                .unwrap_or_default();

            if tag_names.insert(service.as_str()) {
                tags.push(json!({
                    "name": service,
                    "description": format!("Operations from {} service", service),
                }));
            }

            let mut operation_count = 0usize;
            if let Some(source_paths) = document.get("paths").and_then(Value::as_object) {
                for (path, item) in source_paths {
                    let Some(item) = item.as_object() else {
                        continue;
                    };
                    let merged_path = prefixed_path(prefix, path);

                    for (key, operation) in item {
                        if HttpMethod::from_key(key).is_none() {
                            continue;
                        }
                        let Some(operation) = tag_operation(operation, service) else {
                            tracing::debug!(%service, %path, method = %key, "skipping non-object operation");
                            continue;
                        };

                        let target = paths
                            .entry(merged_path.clone())
                            .or_insert_with(|| Value::Object(Map::new()));
                        if let Value::Object(target) = target {
                            target.insert(key.clone(), operation);
                            operation_count += 1;
                        }
                    }
                }
            }

            let mut schema_count = 0usize;
            if let Some(source_schemas) = document
                .pointer("/components/schemas")
                .and_then(Value::as_object)
            {
                for (name, schema) in source_schemas {
                    let mut schema = schema.clone();
                    prefix_schema_refs(&mut schema, service);
                    schemas.insert(prefixed_schema_name(service, name), schema);
                    schema_count += 1;
                }
            }

            tracing::debug!(
                %service,
                prefix,
                operations = operation_count,
                schemas = schema_count,
                "merged service document"
            );
        }

        let mut merged = Map::new();
        merged.insert("openapi".into(), Value::String(OPENAPI_VERSION.into()));
        merged.insert(
            "info".into(),
            json!({ "title": GATEWAY_TITLE, "version": GATEWAY_VERSION }),
        );
        merged.insert("paths".into(), Value::Object(paths));
        if !tags.is_empty() {
            merged.insert("tags".into(), Value::Array(tags));
        }
        if !schemas.is_empty() {
            merged.insert("components".into(), json!({ "schemas": Value::Object(schemas) }));
        }
        Value::Object(merged)
    }
}

/// Clones `operation`, puts `service` first in its tags and rewrites its schema refs.
fn tag_operation(operation: &Value, service: &str) -> Option<Value> {
    let mut operation = operation.clone();
    let map = operation.as_object_mut()?;

    let existing: Vec<Value> = map
        .get("tags")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if !existing.iter().any(|t| t.as_str() == Some(service)) {
        let mut tags = Vec::with_capacity(existing.len() + 1);
        tags.push(Value::String(service.to_string()));
        tags.extend(existing);
        map.insert("tags".into(), Value::Array(tags));
    }

    prefix_schema_refs(&mut operation, service);
    Some(operation)
}

fn slash_run_regex() -> &'static Regex {
    static SLASH_RUN_RE: OnceLock<Regex> = OnceLock::new();
    SLASH_RUN_RE.get_or_init(|| Regex::new(r"/+").expect("Invalid regex"))
}

/// Joins `prefix` and `path`, collapsing slash runs and keeping one leading slash.
pub fn prefixed_path(prefix: &str, path: &str) -> String {
    let joined = format!("/{}/{}", prefix, path);
    let collapsed = slash_run_regex().replace_all(&joined, "/");
    format!("/{}", collapsed.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn merger() -> GatewayMerger {
        GatewayMerger::new(vec![
            ServiceConfig::new("users", "http://users/openapi.json").with_prefix("/api/users/"),
            ServiceConfig::new("orders", "http://orders/openapi.json").with_prefix("orders"),
        ])
    }

    fn item_document(description: &str) -> Value {
        json!({
            "openapi": "3.0.0",
            "paths": {
                "/items": {
                    "parameters": [{"name": "tenant", "in": "header"}],
                    "get": {
                        "tags": ["items"],
                        "responses": {"200": {"content": {"application/json": {"schema": {
                            "type": "array", "items": {"$ref": "#/components/schemas/Item"}
                        }}}}}
                    }
                }
            },
            "components": {"schemas": {
                "Item": {
                    "description": description,
                    "properties": {"owner": {"$ref": "#/components/schemas/Owner"}}
                },
                "Owner": {"type": "object"}
            }}
        })
    }

    #[test]
    fn test_prefixed_path_normalization() {
        assert_eq!(prefixed_path("/api/users", "/items"), "/api/users/items");
        assert_eq!(prefixed_path("orders", "items/{id}"), "/orders/items/{id}");
        assert_eq!(prefixed_path("", "/items"), "/items");
        assert_eq!(prefixed_path("//a//", "//b"), "/a/b");
        assert_eq!(prefixed_path("/api", "/"), "/api/");
    }

    #[test]
    fn test_schema_collision_avoidance() {
        let mut docs = IndexMap::new();
        docs.insert("users".to_string(), item_document("user item"));
        docs.insert("orders".to_string(), item_document("order item"));

        let merged = merger().merge(&docs);
        let schemas = merged["components"]["schemas"].as_object().unwrap();

        assert!(schemas.contains_key("users_Item"));
        assert!(schemas.contains_key("orders_Item"));
        assert!(!schemas.contains_key("Item"));
        assert_eq!(schemas["users_Item"]["description"], "user item");
        assert_eq!(
            schemas["orders_Item"]["properties"]["owner"]["$ref"],
            "#/components/schemas/orders_Owner"
        );
    }

    #[test]
    fn test_paths_prefixed_tagged_and_rewritten() {
        let mut docs = IndexMap::new();
        docs.insert("users".to_string(), item_document("u"));
        docs.insert("orders".to_string(), item_document("o"));

        let merged = merger().merge(&docs);
        let paths = merged["paths"].as_object().unwrap();
        let keys: Vec<&String> = paths.keys().collect();
        assert_eq!(keys, vec!["/api/users/items", "/orders/items"]);

        let get = &paths["/api/users/items"]["get"];
        assert_eq!(get["tags"], json!(["users", "items"]));
        assert_eq!(
            get["responses"]["200"]["content"]["application/json"]["schema"]["items"]["$ref"],
            "#/components/schemas/users_Item"
        );
        assert!(paths["/orders/items"].get("parameters").is_none());
    }

    #[test]
    fn test_service_tags_registered_once() {
        let mut docs = IndexMap::new();
        docs.insert("users".to_string(), item_document("u"));
        let merged = merger().merge(&docs);
        assert_eq!(
            merged["tags"],
            json!([{"name": "users", "description": "Operations from users service"}])
        );
        assert_eq!(merged["info"]["title"], "API Gateway");
    }

    #[test]
    fn test_existing_service_tag_not_duplicated() {
        let mut docs = IndexMap::new();
        docs.insert(
            "billing".to_string(),
            json!({"paths": {"/invoices": {"post": {"tags": ["invoices", "billing"]}}}}),
        );
        let merged = merger().merge(&docs);
        assert_eq!(
            merged["paths"]["/invoices"]["post"]["tags"],
            json!(["invoices", "billing"])
        );
    }

    #[test]
    fn test_empty_sections_omitted() {
        let merged = merger().merge(&IndexMap::new());
        assert_eq!(
            merged,
            json!({
                "openapi": "3.0.0",
                "info": {"title": "API Gateway", "version": "1.0.0"},
                "paths": {}
            })
        );

        let mut docs = IndexMap::new();
        docs.insert("users".to_string(), json!({"paths": {}}));
        let merged = merger().merge(&docs);
        assert!(merged.get("components").is_none());
        assert!(merged.get("tags").is_some());
    }
}
