#![deny(missing_docs)]

//! # Spec Assembly
//!
//! Builds a complete OpenAPI 3.0 document from static [`DocumentConfig`] metadata and
//! an ordered list of [`Endpoint`] values.
//!
//! Assembly is permissive: missing or empty optional data is omitted from the output
//! rather than emitted as `null` or `{}`, and nothing about the endpoint input can
//! make [`SpecAssembler::build`] fail. Operations sharing a path and method overwrite
//! each other (last write wins) unless [`SpecAssembler::build_strict`] is used.

use crate::config::{ContactConfig, DocumentConfig, LicenseConfig};
use crate::error::{AppError, AppResult};
use crate::oas::document::{to_json, OPENAPI_VERSION};
use crate::oas::models::{Endpoint, ParamLocation, Parameter, RequestBody};
use crate::oas::security::security_scheme;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

const DEFAULT_TITLE: &str = "API Documentation";
const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_RESPONSE_DESCRIPTION: &str = "Response";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Assembles OpenAPI documents for a fixed document configuration.
///
/// The assembler holds no per-build state, so one instance can serve concurrent
/// builds.
#[derive(Debug, Clone, Default)]
pub struct SpecAssembler {
    config: DocumentConfig,
}

impl SpecAssembler {
    /// Creates an assembler for `config`.
    pub fn new(config: DocumentConfig) -> Self {
        Self { config }
    }

    /// Builds the document.
    ///
    /// When `external` is supplied (typically the output of the gateway merger),
    /// its paths, tags and component schemas are grafted onto the result, with
    /// external operations winning on path+method collisions.
    pub fn build(&self, endpoints: &[Endpoint], external: Option<&Value>) -> Value {
        let mut spec = Map::new();
        spec.insert("openapi".into(), Value::String(OPENAPI_VERSION.into()));
        spec.insert("info".into(), self.build_info());

        if !self.config.servers.is_empty() {
            spec.insert("servers".into(), Value::Array(self.config.servers.clone()));
        }
        if !self.config.tags.is_empty() {
            spec.insert("tags".into(), Value::Array(self.config.tags.clone()));
        }

        spec.insert("paths".into(), Value::Object(build_paths(endpoints)));

        let schemes = build_security_schemes(endpoints);
        if !schemes.is_empty() {
            spec.insert(
                "components".into(),
                json!({ "securitySchemes": Value::Object(schemes) }),
            );
        }

        if let Some(external) = external {
            merge_external(&mut spec, external);
        }

        Value::Object(spec)
    }

    /// Builds the document, refusing duplicate path+method registrations.
    pub fn build_strict(&self, endpoints: &[Endpoint], external: Option<&Value>) -> AppResult<Value> {
        let duplicates = find_duplicates(endpoints);
        if !duplicates.is_empty() {
            return Err(AppError::DuplicateOperations(duplicates));
        }
        Ok(self.build(endpoints, external))
    }

    /// Builds and serializes the document.
    pub fn build_json(
        &self,
        endpoints: &[Endpoint],
        external: Option<&Value>,
        pretty: bool,
    ) -> AppResult<String> {
        to_json(&self.build(endpoints, external), pretty)
    }

    fn build_info(&self) -> Value {
        let info = &self.config.info;
        let mut out = Map::new();
        out.insert(
            "title".into(),
            Value::String(non_empty_or(info.title.as_deref(), DEFAULT_TITLE)),
        );
        out.insert(
            "version".into(),
            Value::String(non_empty_or(info.version.as_deref(), DEFAULT_VERSION)),
        );

        if !info.description.is_empty() {
            out.insert("description".into(), Value::String(info.description.clone()));
        }
        if let Some(contact) = info.contact.as_ref().and_then(contact_object) {
            out.insert("contact".into(), contact);
        }
        if let Some(license) = info.license.as_ref().and_then(license_object) {
            out.insert("license".into(), license);
        }

        Value::Object(out)
    }
}

/// Lists every `"{METHOD} {path}"` registered more than once, in first-seen order.
pub fn find_duplicates(endpoints: &[Endpoint]) -> Vec<String> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for endpoint in endpoints {
        *counts.entry(endpoint.key()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(key, _)| key)
        .collect()
}

fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn object_of_non_empty(fields: &[(&str, &str)]) -> Option<Value> {
    let map: Map<String, Value> = fields
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

fn contact_object(contact: &ContactConfig) -> Option<Value> {
    object_of_non_empty(&[
        ("name", contact.name.as_str()),
        ("url", contact.url.as_str()),
        ("email", contact.email.as_str()),
    ])
}

fn license_object(license: &LicenseConfig) -> Option<Value> {
    object_of_non_empty(&[
        ("name", license.name.as_str()),
        ("url", license.url.as_str()),
    ])
}

fn build_paths(endpoints: &[Endpoint]) -> Map<String, Value> {
    let mut paths = Map::new();

    for endpoint in endpoints {
        let item = paths
            .entry(endpoint.path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(item) = item {
            let previous = item.insert(endpoint.method.key().into(), build_operation(endpoint));
            if previous.is_some() {
                tracing::debug!(operation = %endpoint.key(), "overwriting previously registered operation");
            }
        }
    }

    paths
}

fn build_operation(endpoint: &Endpoint) -> Value {
    let mut op = Map::new();

    if !endpoint.summary.is_empty() {
        op.insert("summary".into(), Value::String(endpoint.summary.clone()));
    }
    if !endpoint.description.is_empty() {
        op.insert("description".into(), Value::String(endpoint.description.clone()));
    }
    if !endpoint.tags.is_empty() {
        op.insert("tags".into(), json!(endpoint.tags));
    }

    let parameters = merge_path_parameters(endpoint);
    if !parameters.is_empty() {
        op.insert(
            "parameters".into(),
            Value::Array(parameters.iter().map(build_parameter).collect()),
        );
    }

    if let Some(body) = &endpoint.request_body {
        op.insert("requestBody".into(), build_request_body(body));
    }

    if !endpoint.responses.is_empty() {
        let mut responses = Map::new();
        for (status, response) in &endpoint.responses {
            let mut entry = Map::new();
            let description = if response.description.is_empty() {
                DEFAULT_RESPONSE_DESCRIPTION
            } else {
                response.description.as_str()
            };
            entry.insert("description".into(), Value::String(description.into()));
            if let Some(schema) = response.schema.as_ref().filter(|s| !s.is_null()) {
                entry.insert(
                    "content".into(),
                    json!({ JSON_CONTENT_TYPE: { "schema": schema } }),
                );
            }
            responses.insert(status.to_string(), Value::Object(entry));
        }
        op.insert("responses".into(), Value::Object(responses));
    }

    if !endpoint.security.is_empty() {
        let requirements = endpoint
            .security
            .iter()
            .map(|scheme| json!({ scheme.as_str(): [] }))
            .collect();
        op.insert("security".into(), Value::Array(requirements));
    }

    if endpoint.deprecated {
        op.insert("deprecated".into(), Value::Bool(true));
    }

    Value::Object(op)
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("Invalid regex"))
}

/// Declared parameters followed by synthesized string path parameters for every
/// `{name}` placeholder that has no declared `in: path` counterpart.
fn merge_path_parameters(endpoint: &Endpoint) -> Vec<Parameter> {
    let mut declared: HashSet<&str> = endpoint
        .parameters
        .iter()
        .filter(|p| p.location == ParamLocation::Path)
        .map(|p| p.name.as_str())
        .collect();

    let mut merged = endpoint.parameters.clone();
    for captures in placeholder_regex().captures_iter(&endpoint.path) {
        let Some(name) = captures.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if declared.insert(name) {
            merged.push(Parameter::path(name).with_schema(json!({ "type": "string" })));
        }
    }
    merged
}

fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn build_parameter(param: &Parameter) -> Value {
    let mut out = Map::new();
    out.insert("name".into(), Value::String(param.name.clone()));
    out.insert("in".into(), Value::String(param.location.as_str().into()));

    if !param.description.is_empty() {
        out.insert("description".into(), Value::String(param.description.clone()));
    }
    if param.is_required() {
        out.insert("required".into(), Value::Bool(true));
    }
    if !is_empty_schema(&param.schema) {
        out.insert("schema".into(), param.schema.clone());
    }
    if let Some(example) = param.example.as_ref().filter(|e| !e.is_null()) {
        out.insert("example".into(), example.clone());
    }

    Value::Object(out)
}

fn build_request_body(body: &RequestBody) -> Value {
    let mut out = Map::new();

    if !body.description.is_empty() {
        out.insert("description".into(), Value::String(body.description.clone()));
    }
    if body.required {
        out.insert("required".into(), Value::Bool(true));
    }

    let content_type = if body.content_type.is_empty() {
        JSON_CONTENT_TYPE
    } else {
        body.content_type.as_str()
    };
    out.insert(
        "content".into(),
        json!({ content_type: { "schema": body.schema } }),
    );

    Value::Object(out)
}

/// Registry definitions for every scheme referenced by at least one endpoint,
/// in order of first reference.
fn build_security_schemes(endpoints: &[Endpoint]) -> Map<String, Value> {
    let referenced: IndexSet<&str> = endpoints
        .iter()
        .flat_map(|e| e.security.iter().map(String::as_str))
        .collect();

    let mut schemes = Map::new();
    for name in referenced {
        match security_scheme(name) {
            Some(definition) => {
                schemes.insert(name.to_string(), definition);
            }
            None => tracing::debug!(scheme = name, "dropping unknown security scheme"),
        }
    }
    schemes
}

fn merge_external(spec: &mut Map<String, Value>, external: &Value) {
    if let Some(external_paths) = external.get("paths").and_then(Value::as_object) {
        let paths = spec
            .entry("paths")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(paths) = paths {
            for (path, methods) in external_paths {
                let Some(methods) = methods.as_object() else {
                    continue;
                };
                let item = paths
                    .entry(path.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(item) = item {
                    for (method, operation) in methods {
                        item.insert(method.clone(), operation.clone());
                    }
                }
            }
        }
    }

    if let Some(external_tags) = external.get("tags").and_then(Value::as_array) {
        if !external_tags.is_empty() {
            let tags = spec
                .entry("tags")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(tags) = tags {
                let mut known: HashSet<String> = tags
                    .iter()
                    .filter_map(|t| t.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                for tag in external_tags {
                    let name = tag.get("name").and_then(Value::as_str).unwrap_or_default();
                    if known.insert(name.to_string()) {
                        tags.push(tag.clone());
                    }
                }
            }
        }
    }

    if let Some(external_schemas) = external
        .pointer("/components/schemas")
        .and_then(Value::as_object)
    {
        if !external_schemas.is_empty() {
            let components = spec
                .entry("components")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(components) = components {
                let schemas = components
                    .entry("schemas")
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(schemas) = schemas {
                    for (name, schema) in external_schemas {
                        schemas.insert(name.clone(), schema.clone());
                    }
                }
            }
        }
    }
}
