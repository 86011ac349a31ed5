#![deny(missing_docs)]

//! # Security Scheme Registry
//!
//! Fixed table of the well-known security scheme definitions an endpoint may reference
//! by name. The table is never mutated; lookups build a fresh JSON value.

use serde_json::{json, Value};

/// Returns the OpenAPI Security Scheme Object registered under `name`.
///
/// Unknown names yield `None`; callers drop them silently.
pub fn security_scheme(name: &str) -> Option<Value> {
    let scheme = match name {
        "bearerAuth" => json!({
            "type": "http",
            "scheme": "bearer",
            "bearerFormat": "JWT"
        }),
        "basicAuth" => json!({
            "type": "http",
            "scheme": "basic"
        }),
        "apiKeyHeader" => json!({
            "type": "apiKey",
            "in": "header",
            "name": "X-API-Key"
        }),
        "apiKeyQuery" => json!({
            "type": "apiKey",
            "in": "query",
            "name": "api_key"
        }),
        "cookieAuth" => json!({
            "type": "apiKey",
            "in": "cookie",
            "name": "session"
        }),
        "oauth2" => json!({
            "type": "oauth2",
            "flows": {
                "authorizationCode": {
                    "authorizationUrl": "https://example.com/oauth/authorize",
                    "tokenUrl": "https://example.com/oauth/token",
                    "scopes": {}
                }
            }
        }),
        _ => return None,
    };
    Some(scheme)
}
