use indexmap::IndexMap;
use openswag_core::gateway::{FetchError, GatewayAggregator, SpecSource};
use openswag_core::{
    compare, compare_files, to_json, DocumentConfig, Endpoint, GatewayMerger, HttpMethod,
    Parameter, RequestBody, ResponseDefinition, ServiceConfig, SpecAssembler,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

fn user_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new(HttpMethod::Get, "/users")
            .with_summary("List users")
            .with_tag("users")
            .with_parameter(Parameter::query("page").with_schema(json!({"type": "integer"})))
            .with_response(200, ResponseDefinition::new("OK").with_schema(json!({"type": "array"}))),
        Endpoint::new(HttpMethod::Post, "/users")
            .with_request_body(
                RequestBody::json(json!({"type": "object", "required": ["name"]})).required(true),
            )
            .with_security("bearerAuth")
            .with_response(201, ResponseDefinition::new("Created")),
        Endpoint::new(HttpMethod::Get, "/users/{id}")
            .with_security("apiKeyHeader")
            .with_response(200, ResponseDefinition::new("OK"))
            .with_response(404, ResponseDefinition::new("Missing")),
    ]
}

#[test]
fn test_assembly_is_idempotent_and_round_trips() {
    let assembler = SpecAssembler::new(DocumentConfig::new("Users", "1.0.0"));
    let endpoints = user_endpoints();

    let first = to_json(&assembler.build(&endpoints, None), true).unwrap();
    let second = to_json(&assembler.build(&endpoints, None), true).unwrap();
    assert_eq!(first, second);

    let parsed: Value = serde_json::from_str(&first).unwrap();
    assert_eq!(parsed, assembler.build(&endpoints, None));
    assert_eq!(to_json(&parsed, true).unwrap(), first);
}

#[test]
fn test_document_diffed_against_itself_is_empty() {
    let assembler = SpecAssembler::new(DocumentConfig::new("Users", "1.0.0"));
    let document = assembler.build(&user_endpoints(), None);

    let result = compare(&document, &document);
    assert!(result.changes.is_empty());
    assert!(!result.has_breaking_changes());
}

#[test]
fn test_evolving_endpoints_reports_breaking_changes() {
    let old = SpecAssembler::new(DocumentConfig::new("Users", "1.0.0")).build(&user_endpoints(), None);

    let mut evolved = user_endpoints();
    evolved[1] = Endpoint::new(HttpMethod::Post, "/users")
        .with_request_body(
            RequestBody::json(json!({"type": "object", "required": ["name", "email"]})).required(true),
        )
        .with_security("bearerAuth")
        .with_response(201, ResponseDefinition::new("Created"));
    evolved[2] = Endpoint::new(HttpMethod::Get, "/users/{id}")
        .with_parameter(Parameter::query("fields").required(true))
        .with_security("apiKeyHeader")
        .with_response(200, ResponseDefinition::new("OK"));
    evolved.push(Endpoint::new(HttpMethod::Delete, "/users/{id}"));
    let new = SpecAssembler::new(DocumentConfig::new("Users", "2.0.0")).build(&evolved, None);

    let result = compare(&old, &new);
    assert_eq!(result.summary.added_endpoints, 1);
    assert_eq!(result.summary.removed_endpoints, 0);
    assert_eq!(result.summary.modified_endpoints, 2);

    let reasons: Vec<&str> = result.breaking.iter().map(|b| b.reason.as_str()).collect();
    assert_eq!(
        reasons,
        vec![
            "New required request body field added: email",
            "New required parameter added: fields",
            "Response code removed: 404",
        ]
    );
    assert!(result.to_markdown().contains("## Breaking Changes (3)"));
}

#[test]
fn test_merged_gateway_grafted_into_local_document() {
    let merger = GatewayMerger::new(vec![
        ServiceConfig::new("billing", "http://billing").with_prefix("/billing"),
    ]);
    let mut documents = IndexMap::new();
    documents.insert(
        "billing".to_string(),
        json!({
            "paths": {"/invoices/{id}": {"get": {
                "responses": {"200": {"content": {"application/json": {"schema": {
                    "$ref": "#/components/schemas/Invoice"
                }}}}}
            }}},
            "components": {"schemas": {"Invoice": {"type": "object"}}}
        }),
    );
    let gateway = merger.merge(&documents);

    let document = SpecAssembler::new(DocumentConfig::new("Shop", "1.0.0"))
        .build(&user_endpoints(), Some(&gateway));

    let op = &document["paths"]["/billing/invoices/{id}"]["get"];
    assert_eq!(op["tags"], json!(["billing"]));
    assert_eq!(
        op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/billing_Invoice"
    );
    assert!(document["components"]["schemas"]["billing_Invoice"].is_object());
    assert!(document["components"]["securitySchemes"]["bearerAuth"].is_object());
    assert!(document["paths"]["/users"]["get"].is_object());
}

struct StaticSource(IndexMap<String, Value>);

impl SpecSource for StaticSource {
    fn check_health(&self, url: &str, _timeout: Duration) -> bool {
        !url.contains("down")
    }

    fn fetch(&self, url: &str, _timeout: Duration) -> Result<Value, FetchError> {
        self.0.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

#[test]
fn test_aggregation_skips_unavailable_services() {
    let mut docs = IndexMap::new();
    docs.insert(
        "http://users/openapi.json".to_string(),
        json!({"paths": {"/me": {"get": {}}}}),
    );
    let aggregator = GatewayAggregator::new(
        vec![
            ServiceConfig::new("users", "http://users/openapi.json").with_prefix("users"),
            ServiceConfig::new("search", "http://down/openapi.json"),
        ],
        StaticSource(docs),
    );

    let spec = aggregator.aggregated_spec();
    let paths: Vec<&String> = spec["paths"].as_object().unwrap().keys().collect();
    assert_eq!(paths, vec!["/users/me"]);
    assert_eq!(spec["tags"].as_array().unwrap().len(), 1);
}

#[test]
fn test_compare_files_from_disk() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("old.json");
    let new = dir.path().join("new.json");
    let assembler = SpecAssembler::new(DocumentConfig::new("Users", "1.0.0"));
    fs::write(&old, assembler.build_json(&user_endpoints(), None, true).unwrap()).unwrap();
    fs::write(&new, assembler.build_json(&user_endpoints()[..1], None, false).unwrap()).unwrap();

    let result = compare_files(&old, &new).unwrap();
    assert_eq!(result.summary.removed_endpoints, 2);
    assert_eq!(result.summary.breaking_changes, 2);

    fs::write(&new, "[1, 2]").unwrap();
    let err = compare_files(&old, &new).unwrap_err();
    assert!(err.to_string().starts_with("Invalid JSON in spec file"));
}
