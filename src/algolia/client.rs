//! HTTP client wrapper for the Algolia REST API.

use crate::algolia::types::{ApiErrorBody, BatchResponse, IndexConfig, IndexError, IndexSettings};
use crate::processing::SearchableFragment;
use reqwest::{Client, Method, Url};
use serde_json::json;

const USER_AGENT: &str = concat!("search-sync/", env!("CARGO_PKG_VERSION"));

/// Lightweight HTTP client bound to a single Algolia index.
pub struct AlgoliaService {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) app_id: String,
    pub(crate) api_key: String,
    pub(crate) index_name: String,
}

impl AlgoliaService {
    /// Construct a client for the index described by `config`.
    pub fn connect(config: &IndexConfig) -> Result<Self, IndexError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        let base_url = normalize_base_url(&config.base_url())?;
        tracing::debug!(
            url = %base_url,
            index = %config.index_name,
            "Initialized Algolia HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
            index_name: config.index_name.clone(),
        })
    }

    /// Replace the index settings. Safe to repeat.
    pub async fn set_settings(&self, settings: &IndexSettings) -> Result<(), IndexError> {
        let response = self
            .request(Method::PUT, "settings")?
            .json(settings)
            .send()
            .await?;

        ensure_success(response).await?;
        tracing::debug!(index = %self.index_name, "Index settings applied");
        Ok(())
    }

    /// Add or replace records keyed by their `objectID` in one batch request.
    pub async fn save_objects(
        &self,
        records: &[SearchableFragment],
    ) -> Result<Vec<String>, IndexError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let requests: Vec<_> = records
            .iter()
            .map(|record| json!({ "action": "updateObject", "body": record }))
            .collect();

        let response = self
            .request(Method::POST, "batch")?
            .json(&json!({ "requests": requests }))
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let BatchResponse { object_ids } = response.json().await?;
        tracing::debug!(
            index = %self.index_name,
            records = object_ids.len(),
            "Records saved"
        );
        Ok(object_ids)
    }

    fn request(&self, method: Method, action: &str) -> Result<reqwest::RequestBuilder, IndexError> {
        let url = self.endpoint(action)?;
        Ok(self
            .client
            .request(method, url)
            .header("x-algolia-application-id", self.app_id.as_str())
            .header("x-algolia-api-key", self.api_key.as_str()))
    }

    fn endpoint(&self, action: &str) -> Result<Url, IndexError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| IndexError::InvalidHost(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["1", "indexes", self.index_name.as_str(), action]);
        Ok(url)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|parsed| parsed.message)
        .unwrap_or_else(|_| format!("Unexpected Algolia response ({status}): {body}"));
    let error = IndexError::Api { status, message };
    tracing::error!(error = %error, %status, "Algolia request failed");
    Err(error)
}

fn normalize_base_url(url: &str) -> Result<Url, IndexError> {
    let mut parsed = Url::parse(url).map_err(|err| IndexError::InvalidHost(err.to_string()))?;
    if parsed.cannot_be_a_base() {
        return Err(IndexError::InvalidHost(url.to_string()));
    }
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed)
}
