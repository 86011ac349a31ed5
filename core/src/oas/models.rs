#![deny(missing_docs)]

//! # Endpoint Models
//!
//! Definition of the language-neutral Intermediate Representation (IR) for HTTP
//! operations.
//!
//! These structs are produced by external route/annotation readers and consumed by
//! the [`SpecAssembler`](crate::assembler::SpecAssembler). They carry no behaviour
//! beyond (de)serialization and invariant-preserving constructors.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// HTTP verbs recognised as operation keys in an OpenAPI `paths` entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpMethod {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Every recognised method, in OpenAPI declaration order.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    /// Uppercase verb, as used in diff keys and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Lowercase verb, as used for keys under `paths[p]`.
    pub fn key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }

    /// Case-insensitive lookup of a path-item key.
    ///
    /// Returns `None` for non-operation keys such as `parameters` or `summary`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("unsupported HTTP method '{}'", s))
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Location of a parameter (OpenAPI `in`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// Path segment placeholder (`/users/{id}`).
    Path,
    /// Query string parameter.
    #[default]
    Query,
    /// Request header.
    Header,
    /// Cookie value.
    Cookie,
}

impl ParamLocation {
    /// The OpenAPI `in` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
        }
    }
}

/// A single operation parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is carried.
    #[serde(rename = "in")]
    pub location: ParamLocation,
    /// Human readable description. Empty means "not documented".
    pub description: String,
    /// Whether clients must supply it. Always true for path parameters.
    pub required: bool,
    /// JSON-Schema-shaped descriptor. `null` or `{}` means "unspecified".
    pub schema: Value,
    /// Optional example value.
    pub example: Option<Value>,
}

impl Parameter {
    /// Creates a parameter, forcing `required` for path parameters.
    pub fn new(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == ParamLocation::Path,
            ..Default::default()
        }
    }

    /// Shorthand for a path parameter.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Path)
    }

    /// Shorthand for a query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Query)
    }

    /// Sets the schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the example.
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Marks the parameter as required (ignored for path parameters, which always are).
    pub fn required(mut self, required: bool) -> Self {
        self.required = required || self.location == ParamLocation::Path;
        self
    }

    /// Effective requiredness, honouring the path invariant even for hand-built values.
    pub fn is_required(&self) -> bool {
        self.required || self.location == ParamLocation::Path
    }
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Request payload definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestBody {
    /// Human readable description.
    pub description: String,
    /// Whether the body must be present.
    pub required: bool,
    /// Body schema, possibly a `$ref`.
    pub schema: Value,
    /// MIME type the schema is published under.
    pub content_type: String,
}

impl Default for RequestBody {
    fn default() -> Self {
        Self {
            description: String::new(),
            required: false,
            schema: Value::Null,
            content_type: default_content_type(),
        }
    }
}

impl RequestBody {
    /// Creates a JSON request body with the given schema.
    pub fn json(schema: Value) -> Self {
        Self {
            schema,
            ..Default::default()
        }
    }

    /// Marks the body as required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// A documented response for one status code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseDefinition {
    /// Human readable description.
    pub description: String,
    /// JSON body schema, when the response carries one.
    pub schema: Option<Value>,
}

impl ResponseDefinition {
    /// A response with a description and no body.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            schema: None,
        }
    }

    /// Attaches a body schema.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// One HTTP operation and its documentation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoint {
    /// HTTP verb.
    pub method: HttpMethod,
    /// URI template with `{name}` placeholders. Always starts with `/`.
    #[serde(deserialize_with = "deserialize_path")]
    pub path: String,
    /// Short summary.
    pub summary: String,
    /// Detailed description.
    pub description: String,
    /// Grouping tags, in order.
    pub tags: Vec<String>,
    /// Declared parameters.
    pub parameters: Vec<Parameter>,
    /// Optional request body.
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code.
    pub responses: IndexMap<u16, ResponseDefinition>,
    /// Referenced security scheme names, in order.
    pub security: Vec<String>,
    /// Whether the operation is deprecated.
    pub deprecated: bool,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            path: "/".to_string(),
            summary: String::new(),
            description: String::new(),
            tags: Vec::new(),
            parameters: Vec::new(),
            request_body: None,
            responses: IndexMap::new(),
            security: Vec::new(),
            deprecated: false,
        }
    }
}

impl Endpoint {
    /// Creates an endpoint for `method` + `path`, normalizing the leading slash.
    pub fn new(method: HttpMethod, path: impl AsRef<str>) -> Self {
        Self {
            method,
            path: normalize_path(path.as_ref()),
            ..Default::default()
        }
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Appends a declared parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the request body.
    pub fn with_request_body(mut self, body: RequestBody) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Adds (or replaces) the response for `status`.
    pub fn with_response(mut self, status: u16, response: ResponseDefinition) -> Self {
        self.responses.insert(status, response);
        self
    }

    /// Appends a security scheme reference.
    pub fn with_security(mut self, scheme: impl Into<String>) -> Self {
        self.security.push(scheme.into());
        self
    }

    /// Marks the endpoint deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// `"{METHOD} {path}"`, the identity used for duplicate and diff reporting.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Ensures a path template starts with exactly the slash it needs.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_path(&raw))
}
