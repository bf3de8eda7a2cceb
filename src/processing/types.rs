//! Core data types and error definitions for the sync pipeline.

use crate::{algolia::IndexError, config::ConfigError};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

/// Inbound webhook payload: `{ "post": { "current": { ... } } }`.
#[derive(Debug, Default, Deserialize)]
pub struct ContentEvent {
    /// Envelope holding the post snapshots; absent when Ghost sends no post.
    #[serde(default)]
    pub post: Option<PostEnvelope>,
}

/// Snapshot container sent by Ghost.
#[derive(Debug, Default, Deserialize)]
pub struct PostEnvelope {
    /// Post state after the change; may be missing, `null`, or `{}`.
    #[serde(default)]
    pub current: Option<Value>,
}

impl ContentEvent {
    /// Extract the current post snapshot, returning `None` when there is nothing actionable.
    pub fn into_current(self) -> Option<serde_json::Map<String, Value>> {
        match self.post?.current? {
            Value::Object(map) if !map.is_empty() => Some(map),
            _ => None,
        }
    }
}

/// Post representation as delivered by the CMS.
///
/// Only `id` is required. Every other field tolerates a missing, `null`, or wrongly typed value
/// and degrades to `None`, so a sloppy payload still indexes with defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    /// Stable post identifier.
    pub id: String,
    /// URL slug.
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    /// Canonical URL.
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    /// Rendered post HTML.
    #[serde(default, deserialize_with = "lenient")]
    pub html: Option<String>,
    /// Feature image URL.
    #[serde(default, deserialize_with = "lenient")]
    pub feature_image: Option<String>,
    /// Alt text for the feature image.
    #[serde(default, deserialize_with = "lenient")]
    pub feature_image_alt: Option<String>,
    /// Post title.
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    /// Custom or generated excerpt.
    #[serde(default, deserialize_with = "lenient")]
    pub excerpt: Option<String>,
    /// Publication timestamp.
    #[serde(default, deserialize_with = "lenient")]
    pub published_at: Option<String>,
    /// Estimated reading time in minutes; numeric strings and fractions are accepted.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub reading_time: Option<u32>,
    /// Attached tags.
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Option<Vec<RawTaxonomy>>,
    /// Post authors.
    #[serde(default, deserialize_with = "lenient_list")]
    pub authors: Option<Vec<RawTaxonomy>>,
}

/// Tag or author object as delivered by the CMS; only `name` and `slug` are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTaxonomy {
    /// Display name.
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// URL-safe identifier.
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
}

/// Read any JSON value, keeping it only when it has the expected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Arrays map element-wise; elements of the wrong shape become `T::default()`.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(minutes
        .filter(|m| m.is_finite() && *m >= 0.0 && *m <= f64::from(u32::MAX))
        .map(|m| m.round() as u32))
}

/// `{name, slug}` pair attached to posts and fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
}

/// Canonical post record derived from a [`RawPost`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchablePost {
    /// Stable post identifier; the only identity used downstream.
    pub id: String,
    /// URL slug; also the index's distinct key.
    pub slug: String,
    /// Canonical URL of the post.
    pub url: String,
    /// Raw post HTML.
    pub html: String,
    /// Feature image URL.
    pub image: Option<String>,
    /// Alt text for the feature image.
    pub image_alt: Option<String>,
    /// Post title.
    pub title: String,
    /// Custom or generated excerpt.
    pub excerpt: Option<String>,
    /// Publication timestamp as sent by the CMS.
    pub published_at: Option<String>,
    /// Reading time in minutes.
    pub reading_time: u32,
    /// Tags in source order.
    pub tags: Vec<Taxonomy>,
    /// Authors in source order.
    pub authors: Vec<Taxonomy>,
}

/// Values referenced by the index's `customRanking` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustomRanking {
    /// Zero-based position of the fragment within its post.
    pub position: usize,
    /// Weight of the heading that opens the fragment.
    pub heading: u32,
}

/// Index-ready record derived from one [`SearchablePost`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchableFragment {
    /// Record key, `{post_id}_{position}`.
    #[serde(rename = "objectID")]
    pub object_id: String,
    /// Identifier of the source post.
    pub post_id: String,
    /// Slug of the source post; the distinct key.
    pub slug: String,
    /// URL of the source post.
    pub url: String,
    /// Fragment content; plain text once the pipeline has finalized it.
    pub html: String,
    /// Feature image of the source post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Alt text for the feature image.
    #[serde(rename = "feature_image_alt", skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    /// Title of the source post.
    pub title: String,
    /// Excerpt of the source post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Publication timestamp of the source post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Reading time of the source post in minutes.
    pub reading_time: u32,
    /// Tags of the source post.
    pub tags: Vec<Taxonomy>,
    /// Authors of the source post.
    pub authors: Vec<Taxonomy>,
    /// Heading that opens this fragment, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// In-page anchor for the heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// Every heading in the source post.
    pub headings: Vec<String>,
    /// Ranking signals.
    #[serde(rename = "customRanking")]
    pub custom_ranking: CustomRanking,
}

/// Errors raised by a [`crate::processing::Fragmenter`].
#[derive(Debug, Error)]
pub enum FragmentError {
    /// A CSS selector used to inspect fragments failed to parse.
    #[error("invalid selector '{selector}': {reason}")]
    Selector {
        /// Selector source text.
        selector: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Errors emitted by the sync pipeline after the request gate.
#[derive(Debug, Error)]
pub enum SyncError {
    /// `post.current` could not be read as a post.
    #[error("invalid post payload: {0}")]
    InvalidPost(#[from] serde_json::Error),
    /// Index credentials are not configured.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Fragmenter rejected the post.
    #[error(transparent)]
    Fragment(#[from] FragmentError),
    /// Index service call failed.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// Settings + upsert did not finish within the configured bound.
    #[error("index request timed out after {0}s")]
    Timeout(u64),
}

/// Summary of a completed upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Number of records written to the index.
    pub records: usize,
}

/// Terminal state of one webhook invocation.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Gate refused the request because of a bad key or caller.
    Unauthorized,
    /// Synchronization is switched off.
    NotActivated,
    /// No post snapshot in the payload.
    EmptyPayload,
    /// The post's slug is on the ignore list.
    Ignored {
        /// Title of the excluded post.
        title: String,
    },
    /// Fragments were written to the index.
    Indexed {
        /// Title of the synced post.
        title: String,
        /// Number of fragments written.
        fragments: usize,
    },
    /// Normalization, fragmentation, or indexing failed.
    Failed(SyncError),
}

/// Inbound webhook request as seen by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    /// `key` query parameter.
    pub key: Option<String>,
    /// `User-Agent` header.
    pub user_agent: Option<String>,
    /// Raw JSON body.
    pub body: Vec<u8>,
}
