#![deny(missing_docs)]

//! # OpenSwag Core
//!
//! Core library for assembling, merging and diffing OpenAPI 3.0 documents.

/// Shared error types.
pub mod error;

/// Document metadata and gateway configuration.
pub mod config;

/// OpenAPI document primitives (endpoint model, traversal, `$ref` helpers).
pub mod oas;

/// Endpoint-to-document assembly.
pub mod assembler;

/// Multi-service merging and aggregation.
pub mod gateway;

/// Version diffing and breaking-change detection.
pub mod diff;

pub use assembler::{find_duplicates, SpecAssembler};
pub use config::{DocumentConfig, GatewayConfig, InfoConfig, OpenSwagConfig};
pub use diff::{
    compare, compare_files, BreakingChange, Change, ChangeType, DiffResult, DiffSummary,
};
pub use error::{AppError, AppResult};
pub use gateway::{
    FetchError, GatewayAggregator, GatewayMerger, MemoryCache, ServiceConfig, Skipped, SpecCache,
    SpecSource,
};
pub use oas::{
    read_document, to_json, Endpoint, HttpMethod, ParamLocation, Parameter, RequestBody,
    ResponseDefinition,
};
