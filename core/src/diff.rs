#![deny(missing_docs)]

//! # Version Diff
//!
//! Compares two OpenAPI documents endpoint by endpoint and classifies every
//! difference as breaking or non-breaking.
//!
//! Endpoints are keyed `"{METHOD} {path}"`. A removed endpoint is always breaking.
//! An endpoint present on both sides is breaking when it gains a required parameter,
//! gains a required request body field, or loses a response code. Any other
//! structural difference is a non-breaking modification.

use crate::error::AppResult;
use crate::oas::document::{info_version, operations, read_document};
use crate::oas::models::HttpMethod;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display};
use std::path::Path;

/// Kind of endpoint-level change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Endpoint exists only in the new document.
    #[default]
    Added,
    /// Endpoint exists only in the old document.
    Removed,
    /// Endpoint exists in both but differs.
    Modified,
}

/// One endpoint-level change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Change {
    /// Added, removed or modified.
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// Endpoint path.
    pub path: String,
    /// Uppercase HTTP method.
    pub method: String,
    /// Human readable description.
    pub description: String,
    /// Whether existing clients may break.
    pub is_breaking: bool,
}

impl Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{} {}` — {}", self.method, self.path, self.description)
    }
}

/// A change that can break existing clients, with a suggested migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakingChange {
    /// Endpoint path.
    pub path: String,
    /// Uppercase HTTP method.
    pub method: String,
    /// Why the change is breaking.
    pub reason: String,
    /// Suggested client-side migration step.
    pub migration: String,
}

impl BreakingChange {
    fn new(entry: &EndpointEntry<'_>, reason: String, migration: String) -> Self {
        Self {
            path: entry.path.to_string(),
            method: entry.method.to_string(),
            reason,
            migration,
        }
    }
}

impl Display for BreakingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{} {}` — {}", self.method, self.path, self.reason)
    }
}

/// Counts derived from a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiffSummary {
    /// Number of added endpoints.
    pub added_endpoints: usize,
    /// Number of removed endpoints.
    pub removed_endpoints: usize,
    /// Number of modified endpoints.
    pub modified_endpoints: usize,
    /// Number of breaking findings.
    pub breaking_changes: usize,
}

impl DiffSummary {
    /// Derives the summary from the change and breaking lists.
    pub fn from_changes(changes: &[Change], breaking: &[BreakingChange]) -> Self {
        let count = |kind: ChangeType| changes.iter().filter(|c| c.change_type == kind).count();
        Self {
            added_endpoints: count(ChangeType::Added),
            removed_endpoints: count(ChangeType::Removed),
            modified_endpoints: count(ChangeType::Modified),
            breaking_changes: breaking.len(),
        }
    }

    fn count_for(&self, kind: ChangeType) -> usize {
        match kind {
            ChangeType::Added => self.added_endpoints,
            ChangeType::Removed => self.removed_endpoints,
            ChangeType::Modified => self.modified_endpoints,
        }
    }
}

impl Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diff Summary:")?;
        writeln!(f, "  Added endpoints:    {}", self.added_endpoints)?;
        writeln!(f, "  Removed endpoints:  {}", self.removed_endpoints)?;
        writeln!(f, "  Modified endpoints: {}", self.modified_endpoints)?;
        write!(f, "  Breaking changes:   {}", self.breaking_changes)
    }
}

/// Full result of comparing two documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiffResult {
    /// `info.version` of the old document.
    pub old_version: String,
    /// `info.version` of the new document.
    pub new_version: String,
    /// Added, then removed, then modified endpoints.
    pub changes: Vec<Change>,
    /// Every breaking finding.
    pub breaking: Vec<BreakingChange>,
    /// Derived counts.
    pub summary: DiffSummary,
}

impl DiffResult {
    fn new(old_version: String, new_version: String, changes: Vec<Change>, breaking: Vec<BreakingChange>) -> Self {
        let summary = DiffSummary::from_changes(&changes, &breaking);
        Self {
            old_version,
            new_version,
            changes,
            breaking,
            summary,
        }
    }

    /// True when at least one breaking change was found.
    pub fn has_breaking_changes(&self) -> bool {
        !self.breaking.is_empty()
    }

    /// Renders a Markdown changelog.
    ///
    /// Sections with a zero count are omitted.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            format!("# Changelog: {} → {}", self.old_version, self.new_version),
            String::new(),
        ];

        for (kind, title) in [
            (ChangeType::Added, "Added"),
            (ChangeType::Removed, "Removed"),
            (ChangeType::Modified, "Modified"),
        ] {
            let count = self.summary.count_for(kind);
            if count == 0 {
                continue;
            }
            lines.push(format!("## {} ({})", title, count));
            lines.extend(
                self.changes
                    .iter()
                    .filter(|c| c.change_type == kind)
                    .map(|c| format!("- {}", c)),
            );
            lines.push(String::new());
        }

        if self.has_breaking_changes() {
            lines.push(format!("## Breaking Changes ({})", self.summary.breaking_changes));
            lines.extend(self.breaking.iter().map(|b| format!("- {}", b)));
            lines.push(String::new());
        }

        lines.join("\n")
    }

    /// Renders the plain-text command-line report.
    ///
    /// The summary counts always appear; breaking changes with their migration steps
    /// and the Markdown guide follow only when something is breaking.
    pub fn to_text_report(&self) -> String {
        let mut out = self.summary.to_string();
        out.push('\n');

        if self.has_breaking_changes() {
            out.push_str("\nBreaking Changes:\n");
            for bc in &self.breaking {
                out.push_str(&format!("  - [{} {}] {}\n", bc.method, bc.path, bc.reason));
                out.push_str(&format!("    Migration: {}\n", bc.migration));
            }
            out.push_str("\nMigration Guide:\n");
            out.push_str(&self.to_markdown());
            out.push('\n');
        }

        out
    }

    /// Serializes the result as JSON.
    pub fn to_json(&self, pretty: bool) -> AppResult<String> {
        let out = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(out)
    }
}

/// One operation from a document, addressed for diffing.
struct EndpointEntry<'a> {
    path: &'a str,
    method: HttpMethod,
    operation: &'a Value,
}

fn extract_endpoints(document: &Value) -> IndexMap<String, EndpointEntry<'_>> {
    operations(document)
        .into_iter()
        .map(|op| {
            (
                format!("{} {}", op.method, op.path),
                EndpointEntry {
                    path: op.path,
                    method: op.method,
                    operation: op.operation,
                },
            )
        })
        .collect()
}

/// Compares two documents.
///
/// Changes are ordered: added endpoints (new document order), removed endpoints
/// (old document order), then modified endpoints (old document order).
pub fn compare(old: &Value, new: &Value) -> DiffResult {
    let old_endpoints = extract_endpoints(old);
    let new_endpoints = extract_endpoints(new);

    let mut changes = Vec::new();
    let mut breaking = Vec::new();

    for (key, entry) in &new_endpoints {
        if !old_endpoints.contains_key(key) {
            changes.push(Change {
                change_type: ChangeType::Added,
                path: entry.path.to_string(),
                method: entry.method.to_string(),
                description: format!("Endpoint added: {}", key),
                is_breaking: false,
            });
        }
    }

    for (key, entry) in &old_endpoints {
        if !new_endpoints.contains_key(key) {
            changes.push(Change {
                change_type: ChangeType::Removed,
                path: entry.path.to_string(),
                method: entry.method.to_string(),
                description: format!("Endpoint removed: {}", key),
                is_breaking: true,
            });
            breaking.push(BreakingChange::new(
                entry,
                format!("Endpoint removed: {}", key),
                format!(
                    "Remove all client calls to {} or replace with an alternative endpoint.",
                    key
                ),
            ));
        }
    }

    for (key, old_entry) in &old_endpoints {
        let Some(new_entry) = new_endpoints.get(key) else {
            continue;
        };

        let findings = detect_breaking_changes(old_entry, new_entry);
        if !findings.is_empty() {
            let reasons: Vec<&str> = findings.iter().map(|b| b.reason.as_str()).collect();
            changes.push(Change {
                change_type: ChangeType::Modified,
                path: old_entry.path.to_string(),
                method: old_entry.method.to_string(),
                description: format!("Breaking changes: {}", reasons.join("; ")),
                is_breaking: true,
            });
            breaking.extend(findings);
        } else if old_entry.operation != new_entry.operation {
            changes.push(Change {
                change_type: ChangeType::Modified,
                path: old_entry.path.to_string(),
                method: old_entry.method.to_string(),
                description: format!("Endpoint modified: {}", key),
                is_breaking: false,
            });
        }
    }

    let result = DiffResult::new(info_version(old), info_version(new), changes, breaking);
    tracing::debug!(
        added = result.summary.added_endpoints,
        removed = result.summary.removed_endpoints,
        modified = result.summary.modified_endpoints,
        breaking = result.summary.breaking_changes,
        "compared documents"
    );
    result
}

/// Loads two JSON documents from disk and compares them.
///
/// Fails fast on the first file that is missing, unreadable or not a JSON object.
pub fn compare_files(old_path: &Path, new_path: &Path) -> AppResult<DiffResult> {
    let old = read_document(old_path)?;
    let new = read_document(new_path)?;
    Ok(compare(&old, &new))
}

fn detect_breaking_changes(old: &EndpointEntry<'_>, new: &EndpointEntry<'_>) -> Vec<BreakingChange> {
    let mut breaking = Vec::new();
    let target = format!("{} {}", old.method, old.path);

    let old_params = required_parameters(old.operation);
    for name in newly_present(&required_parameters(new.operation), &old_params) {
        breaking.push(BreakingChange::new(
            old,
            format!("New required parameter added: {}", name),
            format!(
                "Add the required parameter '{}' to all requests to {}.",
                name, target
            ),
        ));
    }

    let old_fields = required_body_fields(old.operation);
    for field in newly_present(&required_body_fields(new.operation), &old_fields) {
        breaking.push(BreakingChange::new(
            old,
            format!("New required request body field added: {}", field),
            format!(
                "Add the required field '{}' to the request body for {}.",
                field, target
            ),
        ));
    }

    let new_codes = response_codes(new.operation);
    for code in newly_present(&response_codes(old.operation), &new_codes) {
        breaking.push(BreakingChange::new(
            old,
            format!("Response code removed: {}", code),
            format!(
                "Update client code that handles response code {} from {}.",
                code, target
            ),
        ));
    }

    breaking
}

/// Items of `candidates` absent from `baseline`, deduplicated, in candidate order.
fn newly_present<'a>(candidates: &'a [String], baseline: &[String]) -> Vec<&'a str> {
    let mut seen = IndexSet::new();
    for item in candidates {
        if !baseline.contains(item) {
            seen.insert(item.as_str());
        }
    }
    seen.into_iter().collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn required_parameters(operation: &Value) -> Vec<String> {
    operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .filter(|p| p.get("required").is_some_and(is_truthy))
                .map(|p| {
                    p.get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `required` of the schema under the first media type of the request body.
fn required_body_fields(operation: &Value) -> Vec<String> {
    operation
        .pointer("/requestBody/content")
        .and_then(Value::as_object)
        .and_then(|content| content.values().next())
        .and_then(|media| media.pointer("/schema/required"))
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn response_codes(operation: &Value) -> Vec<String> {
    operation
        .get("responses")
        .and_then(Value::as_object)
        .map(|responses| responses.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document(version: &str, paths: Value) -> Value {
        json!({"openapi": "3.0.0", "info": {"title": "T", "version": version}, "paths": paths})
    }

    #[test]
    fn test_identical_documents() {
        let doc = document(
            "1.0.0",
            json!({"/users": {"get": {"responses": {"200": {"description": "ok"}}}}}),
        );
        let result = compare(&doc, &doc);
        assert!(result.changes.is_empty());
        assert!(result.breaking.is_empty());
        assert_eq!(result.summary, DiffSummary::default());
        assert!(!result.has_breaking_changes());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let old = document(
            "1.0.0",
            json!({
                "/users": {"get": {"summary": "List users"}, "post": {"summary": "Create"}},
                "/legacy": {"get": {"summary": "Old"}}
            }),
        );
        let new = document(
            "2.0.0",
            json!({
                "/users": {"get": {"summary": "List all users"}, "put": {"summary": "Replace"}}
            }),
        );

        let result = compare(&old, &new);
        assert_eq!(
            result.summary,
            DiffSummary {
                added_endpoints: 1,
                removed_endpoints: 2,
                modified_endpoints: 1,
                breaking_changes: 2,
            }
        );
        assert_eq!(result.old_version, "1.0.0");
        assert_eq!(result.new_version, "2.0.0");

        let described: Vec<(ChangeType, &str, &str, bool)> = result
            .changes
            .iter()
            .map(|c| (c.change_type, c.method.as_str(), c.path.as_str(), c.is_breaking))
            .collect();
        assert_eq!(
            described,
            vec![
                (ChangeType::Added, "PUT", "/users", false),
                (ChangeType::Removed, "POST", "/users", true),
                (ChangeType::Removed, "GET", "/legacy", true),
                (ChangeType::Modified, "GET", "/users", false),
            ]
        );
        assert_eq!(result.changes[3].description, "Endpoint modified: GET /users");
        assert_eq!(
            result.breaking[0],
            BreakingChange {
                path: "/users".into(),
                method: "POST".into(),
                reason: "Endpoint removed: POST /users".into(),
                migration: "Remove all client calls to POST /users or replace with an alternative endpoint.".into(),
            }
        );
    }

    #[test]
    fn test_each_removal_is_one_breaking_change() {
        let old = document("1", json!({"/a": {"get": {}, "delete": {}}, "/b": {"get": {}}}));
        let base = compare(&old, &old).summary.breaking_changes;
        let new = document("2", json!({"/a": {"get": {}}}));
        let result = compare(&old, &new);
        assert_eq!(result.summary.breaking_changes, base + 2);
        assert!(result.breaking.iter().all(|b| b.reason.contains("removed")));
    }

    #[test]
    fn test_new_required_body_field() {
        let body = |required: Value| {
            json!({"post": {"requestBody": {"content": {"application/json": {"schema": {
                "type": "object", "required": required
            }}}}}})
        };
        let old = document("1", json!({"/users": body(json!(["name"]))}));
        let new = document("1", json!({"/users": body(json!(["name", "email"]))}));

        let result = compare(&old, &new);
        assert_eq!(result.breaking.len(), 1);
        assert!(result.breaking[0].reason.contains("email"));
        assert_eq!(
            result.breaking[0].migration,
            "Add the required field 'email' to the request body for POST /users."
        );
        assert_eq!(
            result.changes[0].description,
            "Breaking changes: New required request body field added: email"
        );
        assert!(result.changes[0].is_breaking);
    }

    #[test]
    fn test_only_first_media_type_inspected() {
        let old = document("1", json!({"/f": {"post": {"requestBody": {"content": {
            "application/json": {"schema": {"required": ["a"]}},
            "application/xml": {"schema": {"required": []}}
        }}}}}));
        let new = document("1", json!({"/f": {"post": {"requestBody": {"content": {
            "application/json": {"schema": {"required": ["a"]}},
            "application/xml": {"schema": {"required": ["b"]}}
        }}}}}));
        let result = compare(&old, &new);
        assert!(result.breaking.is_empty());
        assert_eq!(result.summary.modified_endpoints, 1);
    }

    #[test]
    fn test_required_parameter_and_removed_response() {
        let old = document("1", json!({"/s": {"get": {
            "parameters": [{"name": "q", "in": "query"}],
            "responses": {"200": {}, "404": {}}
        }}}));
        let new = document("1", json!({"/s": {"get": {
            "parameters": [{"name": "q", "in": "query", "required": true}],
            "responses": {"200": {}}
        }}}));

        let result = compare(&old, &new);
        let reasons: Vec<&str> = result.breaking.iter().map(|b| b.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec!["New required parameter added: q", "Response code removed: 404"]
        );
        assert_eq!(
            result.changes[0].description,
            "Breaking changes: New required parameter added: q; Response code removed: 404"
        );
        assert_eq!(result.summary.modified_endpoints, 1);
        assert_eq!(result.summary.breaking_changes, 2);
    }

    #[test]
    fn test_non_method_keys_and_missing_paths() {
        let old = json!({"paths": {"/x": {"parameters": [{"name": "a"}], "get": {}}}});
        let new = json!({"paths": {"/x": {"parameters": [{"name": "b"}], "get": {}}}});
        assert!(compare(&old, &new).changes.is_empty());

        let empty = json!({});
        let result = compare(&empty, &old);
        assert_eq!(result.summary.added_endpoints, 1);
        assert_eq!(result.old_version, "");
    }

    #[test]
    fn test_markdown_rendering() {
        let old = document("1.0.0", json!({"/a": {"get": {}}, "/b": {"get": {}}}));
        let new = document("1.1.0", json!({"/a": {"get": {}}, "/c": {"post": {}}}));
        let md = compare(&old, &new).to_markdown();
        assert_eq!(
            md,
            [
                "# Changelog: 1.0.0 → 1.1.0",
                "",
                "## Added (1)",
                "- `POST /c` — Endpoint added: POST /c",
                "",
                "## Removed (1)",
                "- `GET /b` — Endpoint removed: GET /b",
                "",
                "## Breaking Changes (1)",
                "- `GET /b` — Endpoint removed: GET /b",
                "",
            ]
            .join("\n")
        );
        assert!(!md.contains("## Modified"));
    }

    #[test]
    fn test_text_report() {
        let old = document("1", json!({"/a": {"get": {}}}));
        let quiet = compare(&old, &old).to_text_report();
        assert!(quiet.starts_with("Diff Summary:\n  Added endpoints:    0"));
        assert!(!quiet.contains("Breaking Changes:"));

        let new = document("2", json!({}));
        let report = compare(&old, &new).to_text_report();
        assert!(report.contains("  - [GET /a] Endpoint removed: GET /a"));
        assert!(report.contains("    Migration: Remove all client calls to GET /a"));
        assert!(report.contains("Migration Guide:\n# Changelog: 1 → 2"));
    }

    #[test]
    fn test_result_round_trip() {
        let old = document("1", json!({"/a": {"get": {}}, "/b": {"get": {"summary": "x"}}}));
        let new = document("2", json!({"/b": {"get": {"summary": "y"}}, "/c": {"get": {}}}));
        let result = compare(&old, &new);

        let encoded = result.to_json(false).unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["changes"][0]["type"], "added");
        assert_eq!(value["changes"][1]["isBreaking"], true);
        assert_eq!(value["summary"]["breakingChanges"], 1);

        let decoded: DiffResult = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, result);
    }
}
