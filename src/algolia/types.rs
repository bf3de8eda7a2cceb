//! Shared types used by the Algolia client and the index orchestrator.

use crate::config::{Config, ConfigError, require};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors returned while interacting with the index service.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Algolia host: {0}")]
    InvalidHost(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Algolia rejected the request; the message is surfaced verbatim.
    #[error("{message}")]
    Api {
        /// HTTP status returned by Algolia.
        status: StatusCode,
        /// Error message reported by Algolia.
        message: String,
    },
    /// Any other failure reported by an index service implementation.
    #[error("{0}")]
    Service(String),
}

/// Index-level settings applied before every upsert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    /// Collapse records sharing [`Self::attribute_for_distinct`] into one hit.
    pub distinct: bool,
    /// Grouping attribute for distinct results.
    pub attribute_for_distinct: String,
    /// Tie-breaking ranking expressions.
    pub custom_ranking: Vec<String>,
    /// Attributes searched, in priority order.
    pub searchable_attributes: Vec<String>,
    /// Facet declarations.
    pub attributes_for_faceting: Vec<String>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            distinct: true,
            attribute_for_distinct: "slug".into(),
            custom_ranking: strings(&[
                "desc(customRanking.heading)",
                "asc(customRanking.position)",
            ]),
            searchable_attributes: strings(&[
                "title",
                "headings",
                "html",
                "url",
                "tags.name",
                "tags",
                "authors.name",
                "authors",
            ]),
            attributes_for_faceting: strings(&["filterOnly(slug)", "searchable(tags.slug)"]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Connection descriptor for one sync invocation.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Algolia application identifier.
    pub app_id: String,
    /// Admin API key.
    pub api_key: String,
    /// Target index name.
    pub index_name: String,
    /// Base URL override; defaults to `https://{app_id}.algolia.net`.
    pub host: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Settings applied before writing.
    pub settings: IndexSettings,
}

impl IndexConfig {
    /// Build the descriptor from service configuration, failing when credentials are missing.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            app_id: require(&config.algolia_app_id, "ALGOLIA_APP_ID")?.to_string(),
            api_key: require(&config.algolia_api_key, "ALGOLIA_API_KEY")?.to_string(),
            index_name: require(&config.algolia_index, "ALGOLIA_INDEX")?.to_string(),
            host: config.algolia_host.clone(),
            timeout: config.index_timeout(),
            settings: IndexSettings::default(),
        })
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> String {
        self.host
            .clone()
            .unwrap_or_else(|| format!("https://{}.algolia.net", self.app_id))
    }
}

/// Error body returned by Algolia on non-2xx responses.
#[derive(Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) message: String,
}

/// Response to a batch write.
#[derive(Deserialize)]
pub(crate) struct BatchResponse {
    #[serde(default, rename = "objectIDs")]
    pub(crate) object_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_serialize_with_algolia_names() {
        let value = serde_json::to_value(IndexSettings::default()).expect("settings json");
        assert_eq!(value["distinct"], json!(true));
        assert_eq!(value["attributeForDistinct"], json!("slug"));
        assert_eq!(
            value["customRanking"],
            json!(["desc(customRanking.heading)", "asc(customRanking.position)"])
        );
        assert_eq!(value["searchableAttributes"][1], json!("headings"));
        assert_eq!(
            value["attributesForFaceting"],
            json!(["filterOnly(slug)", "searchable(tags.slug)"])
        );
    }

    #[test]
    fn index_config_requires_credentials() {
        let mut config = Config {
            algolia_app_id: Some("APP".into()),
            algolia_api_key: Some("secret".into()),
            ..Config::default()
        };
        let error = IndexConfig::from_config(&config).expect_err("missing index");
        assert_eq!(error.to_string(), "Missing environment variable: ALGOLIA_INDEX");

        config.algolia_index = Some("posts".into());
        let index = IndexConfig::from_config(&config).expect("index config");
        assert_eq!(index.base_url(), "https://APP.algolia.net");
        assert_eq!(index.index_name, "posts");
    }
}
