#![deny(missing_docs)]

//! Core library for the search sync webhook service.

/// Algolia search index integration.
pub mod algolia;
/// HTTP routing and webhook handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Request authorization and activation gate.
pub mod gate;
/// Structured logging and tracing setup.
pub mod logging;
/// Sync metrics helpers.
pub mod metrics;
/// Post normalization, fragmentation, and indexing pipeline.
pub mod processing;
