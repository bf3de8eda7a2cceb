//! HTTP surface for the search sync service.
//!
//! - `POST /webhooks/post-published` – Ghost "post published/updated" webhook. Also served at
//!   `/.netlify/functions/post-published` so existing Ghost integrations keep working.
//! - `GET /metrics` – Sync counters.
//!
//! Webhook responses:
//!
//! | Outcome         | Status | Body                                          |
//! |-----------------|--------|-----------------------------------------------|
//! | unauthorized    | 401    | `Unauthorized`                                |
//! | not activated   | 200    | `Algolia is not activated`                    |
//! | empty payload   | 200    | `No valid request body detected`              |
//! | ignored slug    | 200    | `Post "<title>" is excluded from the index.`  |
//! | indexed         | 200    | `Post "<title>" has been added to the index.` |
//! | failure         | 500    | `{"msg": "<error message>"}`                  |
//!
//! The `key` query parameter is read from the raw query string; when it repeats, the first
//! value wins. Bodies up to [`WEBHOOK_BODY_LIMIT`] bytes are accepted.

use crate::metrics::MetricsSnapshot;
use crate::processing::{SyncApi, SyncOutcome, WebhookRequest};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, RawQuery, State},
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;

/// Primary webhook route.
pub const WEBHOOK_PATH: &str = "/webhooks/post-published";
/// Route used by the serverless deployment this service replaces.
pub const LEGACY_WEBHOOK_PATH: &str = "/.netlify/functions/post-published";

/// Largest accepted webhook body, sized for long posts with inline HTML.
pub const WEBHOOK_BODY_LIMIT: usize = 32 * 1024 * 1024;

const FEATURE_NAME: &str = "Algolia";

/// Build the HTTP router exposing the webhook and metrics endpoints.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SyncApi + 'static,
{
    Router::new()
        .route(WEBHOOK_PATH, post(post_published::<S>))
        .route(LEGACY_WEBHOOK_PATH, post(post_published::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(WEBHOOK_BODY_LIMIT))
        .with_state(service)
}

/// First `key` value in a raw query string.
fn query_key(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(name, _)| name == "key")
        .map(|(_, value)| value.into_owned())
}

/// Handle a Ghost post webhook.
async fn post_published<S>(
    State(service): State<Arc<S>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: SyncApi,
{
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let request = WebhookRequest {
        key: query_key(query.as_deref()),
        user_agent,
        body: body.to_vec(),
    };

    let outcome = service.handle_event(request).await;
    WebhookResponse(outcome).into_response()
}

/// Return the sync counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: SyncApi,
{
    Json(service.metrics_snapshot())
}

struct WebhookResponse(SyncOutcome);

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        match self.0 {
            SyncOutcome::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            SyncOutcome::NotActivated => {
                (StatusCode::OK, format!("{FEATURE_NAME} is not activated")).into_response()
            }
            SyncOutcome::EmptyPayload => {
                (StatusCode::OK, "No valid request body detected").into_response()
            }
            SyncOutcome::Ignored { title } => (
                StatusCode::OK,
                format!("Post \"{title}\" is excluded from the index."),
            )
                .into_response(),
            SyncOutcome::Indexed { title, .. } => (
                StatusCode::OK,
                format!("Post \"{title}\" has been added to the index."),
            )
                .into_response(),
            SyncOutcome::Failed(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "msg": error.to_string() })),
            )
                .into_response(),
        }
    }
}
