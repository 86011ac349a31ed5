#![deny(missing_docs)]

//! # Gateway Module
//!
//! - **service**: Upstream service configuration.
//! - **merger**: Pure merge of already-fetched documents.
//! - **aggregator**: Concurrent fetch with health checks and cache fallback.

pub mod aggregator;
pub mod merger;
pub mod service;

pub use aggregator::{FetchError, GatewayAggregator, MemoryCache, Skipped, SpecCache, SpecSource};
pub use merger::{prefixed_path, GatewayMerger};
pub use service::ServiceConfig;
