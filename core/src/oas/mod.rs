#![deny(missing_docs)]

//! # OpenAPI Module
//!
//! - **models**: Endpoint Intermediate Representation.
//! - **document**: Operation walking and wire serialization for documents.
//! - **ref_utils**: `$ref` recognition and rewriting.
//! - **security**: The built-in security scheme registry.

pub mod document;
pub mod models;
pub mod ref_utils;
pub mod security;

pub use document::{info_version, operations, read_document, to_json, OperationRef, OPENAPI_VERSION};
pub use models::{
    Endpoint, HttpMethod, ParamLocation, Parameter, RequestBody, ResponseDefinition,
};
pub use security::security_scheme;
