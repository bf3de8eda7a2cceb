//! Algolia search index integration.

pub mod client;
/// Index service traits and the Algolia connector.
pub mod service;
pub mod types;

pub use client::AlgoliaService;
pub use service::{AlgoliaConnector, IndexConnector, IndexService};
pub use types::{IndexConfig, IndexError, IndexSettings};
