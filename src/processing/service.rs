//! Sync service driving one webhook invocation from gate to index.

use crate::{
    algolia::{AlgoliaConnector, IndexConfig, IndexConnector},
    config::Config,
    gate::{GateDecision, GatePolicy, GateRequest},
    metrics::{MetricsSnapshot, SyncMetrics},
    processing::{
        normalize::{IgnoreList, is_ignored, normalize_post},
        orchestrator::index_fragments,
        pipeline::FragmentPipeline,
        types::{
            ContentEvent, FragmentError, RawPost, SearchableFragment, SyncError, SyncOutcome,
            UpsertSummary, WebhookRequest,
        },
    },
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Runs the gate → normalize → fragment → index sequence for each webhook.
///
/// Holds no per-request state: index configuration and the index client are rebuilt on
/// every call, so concurrent invocations never share mutable data beyond the atomic metrics.
pub struct SyncService<C = AlgoliaConnector> {
    config: Arc<Config>,
    gate: GatePolicy,
    ignore_slugs: IgnoreList,
    pipeline: FragmentPipeline,
    connector: C,
    metrics: Arc<SyncMetrics>,
}

/// Abstraction over the sync pipeline used by the HTTP surface.
#[async_trait]
pub trait SyncApi: Send + Sync {
    /// Process a webhook invocation to a terminal outcome. Never panics or errors.
    async fn handle_event(&self, request: WebhookRequest) -> SyncOutcome;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SyncService<AlgoliaConnector> {
    /// Build the production service: heading fragmenter, HTML extractor, Algolia client.
    pub fn new(config: Config) -> Result<Self, FragmentError> {
        Ok(Self::with_parts(
            config,
            FragmentPipeline::with_defaults()?,
            AlgoliaConnector,
        ))
    }
}

impl<C> SyncService<C>
where
    C: IndexConnector,
{
    /// Build a service from explicit collaborators.
    pub fn with_parts(config: Config, pipeline: FragmentPipeline, connector: C) -> Self {
        let gate = GatePolicy::from_config(&config);
        let ignore_slugs = config.ignore_slugs.iter().cloned().collect();
        Self {
            config: Arc::new(config),
            gate,
            ignore_slugs,
            pipeline,
            connector,
            metrics: Arc::new(SyncMetrics::new()),
        }
    }

    /// Process one webhook invocation.
    pub async fn handle_event(&self, request: WebhookRequest) -> SyncOutcome {
        let decision = self.gate.evaluate(&GateRequest {
            key: request.key.as_deref(),
            caller: request.user_agent.as_deref(),
        });
        match decision {
            GateDecision::Proceed => {}
            GateDecision::Unauthorized => {
                self.metrics.record_rejection();
                return SyncOutcome::Unauthorized;
            }
            GateDecision::NotActivated => {
                tracing::info!("Index sync is not activated; ignoring webhook");
                return SyncOutcome::NotActivated;
            }
        }

        let Some(current) = parse_current(&request.body) else {
            tracing::info!("Webhook carried no post payload");
            return SyncOutcome::EmptyPayload;
        };

        match self.sync_post(current).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(error = %error, "Post sync failed");
                self.metrics.record_failure();
                SyncOutcome::Failed(error)
            }
        }
    }

    /// Normalize, fragment, and index a post snapshot.
    pub async fn sync_post(&self, current: Map<String, Value>) -> Result<SyncOutcome, SyncError> {
        let raw: RawPost = serde_json::from_value(Value::Object(current))?;
        let title = raw.title.clone().unwrap_or_default();
        tracing::info!(post_id = %raw.id, slug = ?raw.slug, "Syncing post");

        let Some(fragments) = self.prepare(raw)? else {
            return Ok(SyncOutcome::Ignored { title });
        };
        let UpsertSummary { records } = self.index(fragments).await?;

        self.metrics.record_post(records as u64);
        tracing::info!(title = %title, fragments = records, "Post added to index");
        Ok(SyncOutcome::Indexed {
            title,
            fragments: records,
        })
    }

    /// Normalize and fragment a raw post. Returns `None` when its slug is ignored.
    pub fn prepare(&self, raw: RawPost) -> Result<Option<Vec<SearchableFragment>>, SyncError> {
        if is_ignored(&raw, Some(&self.ignore_slugs)) {
            tracing::info!("Post slug is on the ignore list; skipping");
            return Ok(None);
        }
        self.pipeline.run(normalize_post(raw)).map(Some)
    }

    /// Write finalized fragments to the configured index.
    pub async fn index(
        &self,
        fragments: Vec<SearchableFragment>,
    ) -> Result<UpsertSummary, SyncError> {
        let index_config = IndexConfig::from_config(&self.config)?;
        index_fragments(&self.connector, &index_config, fragments).await
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl<C> SyncApi for SyncService<C>
where
    C: IndexConnector,
{
    async fn handle_event(&self, request: WebhookRequest) -> SyncOutcome {
        SyncService::handle_event(self, request).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SyncService::metrics_snapshot(self)
    }
}

/// Decode the request body and extract a non-empty `post.current` object.
fn parse_current(body: &[u8]) -> Option<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<ContentEvent>(body) {
        Ok(event) => event.into_current(),
        Err(error) => {
            tracing::warn!(error = %error, "Webhook body is not a valid content event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::orchestrator::tests::MemoryIndex;
    use serde_json::json;

    const GHOST_UA: &str = "Ghost/5.82 (https://github.com/TryGhost/Ghost)";

    fn config() -> Config {
        Config {
            webhook_key: Some("secret".into()),
            algolia_active: true,
            algolia_app_id: Some("APP".into()),
            algolia_api_key: Some("key".into()),
            algolia_index: Some("posts".into()),
            ignore_slugs: vec!["about".into()],
            ..Config::default()
        }
    }

    fn service(config: Config, index: MemoryIndex) -> SyncService<MemoryIndex> {
        SyncService::with_parts(
            config,
            FragmentPipeline::with_defaults().expect("pipeline"),
            index,
        )
    }

    fn request(body: serde_json::Value) -> WebhookRequest {
        WebhookRequest {
            key: Some("secret".into()),
            user_agent: Some(GHOST_UA.into()),
            body: body.to_string().into_bytes(),
        }
    }

    fn post_body(slug: &str) -> serde_json::Value {
        json!({
            "post": {
                "current": {
                    "id": "p1",
                    "slug": slug,
                    "title": "Hello",
                    "url": "https://blog.example.org/hello/",
                    "html": "<p>Intro</p><h2>Details</h2><p>More</p>",
                    "tags": [{ "name": "News", "slug": "news" }],
                    "authors": []
                },
                "previous": {}
            }
        })
    }

    #[tokio::test]
    async fn indexes_valid_post() {
        let index = MemoryIndex::default();
        let service = service(config(), index.clone());

        let outcome = service.handle_event(request(post_body("hello"))).await;

        match outcome {
            SyncOutcome::Indexed { title, fragments } => {
                assert_eq!(title, "Hello");
                assert_eq!(fragments, 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let stored = index.snapshot();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored["p1_1"].html, "Details\nMore");
        assert_eq!(service.metrics_snapshot().posts_indexed, 1);
    }

    #[tokio::test]
    async fn empty_current_is_empty_payload() {
        let index = MemoryIndex::default();
        let service = service(config(), index.clone());

        for body in [
            json!({ "post": { "current": {} } }),
            json!({ "post": {} }),
            json!({}),
        ] {
            let outcome = service.handle_event(request(body)).await;
            assert!(matches!(outcome, SyncOutcome::EmptyPayload));
        }
        let garbage = WebhookRequest {
            body: b"not json".to_vec(),
            ..request(json!({}))
        };
        assert!(matches!(
            service.handle_event(garbage).await,
            SyncOutcome::EmptyPayload
        ));
        assert_eq!(index.connects(), 0);
    }

    #[tokio::test]
    async fn deactivated_feature_skips_index() {
        let index = MemoryIndex::default();
        let service = service(
            Config {
                algolia_active: false,
                ..config()
            },
            index.clone(),
        );

        let outcome = service.handle_event(request(post_body("hello"))).await;
        assert!(matches!(outcome, SyncOutcome::NotActivated));
        assert_eq!(index.connects(), 0);
    }

    #[tokio::test]
    async fn invalid_key_rejected_before_activation_check() {
        let index = MemoryIndex::default();
        let service = service(
            Config {
                algolia_active: false,
                ..config()
            },
            index.clone(),
        );
        let request = WebhookRequest {
            key: Some("nope".into()),
            ..request(post_body("hello"))
        };

        assert!(matches!(
            service.handle_event(request).await,
            SyncOutcome::Unauthorized
        ));
        assert_eq!(service.metrics_snapshot().requests_rejected, 1);
    }

    #[tokio::test]
    async fn ignored_slug_skips_index() {
        let index = MemoryIndex::default();
        let service = service(config(), index.clone());

        let outcome = service.handle_event(request(post_body("about"))).await;
        assert!(matches!(outcome, SyncOutcome::Ignored { ref title } if title == "Hello"));
        assert_eq!(index.upserts(), 0);
    }

    #[tokio::test]
    async fn index_failure_is_reported_with_message() {
        let index = MemoryIndex::failing("timeout");
        let service = service(config(), index);

        let outcome = service.handle_event(request(post_body("hello"))).await;
        match outcome {
            SyncOutcome::Failed(error) => assert_eq!(error.to_string(), "timeout"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(service.metrics_snapshot().requests_failed, 1);
    }

    #[tokio::test]
    async fn wrongly_typed_optional_fields_still_index() {
        for (field, value) in [
            ("reading_time", json!("5")),
            ("reading_time", json!(4.5)),
            ("tags", json!("news")),
            ("feature_image", json!(false)),
        ] {
            let index = MemoryIndex::default();
            let service = service(config(), index.clone());
            let mut body = post_body("hello");
            body["post"]["current"][field] = value;

            match service.handle_event(request(body)).await {
                SyncOutcome::Indexed { title, .. } => assert_eq!(title, "Hello"),
                other => panic!("{field}: unexpected outcome: {other:?}"),
            }
            assert_eq!(index.snapshot().len(), 2);
        }
    }

    #[tokio::test]
    async fn missing_id_fails_normalization() {
        let service = service(config(), MemoryIndex::default());
        let outcome = service
            .handle_event(request(json!({ "post": { "current": { "slug": "x" } } })))
            .await;
        match outcome {
            SyncOutcome::Failed(SyncError::InvalidPost(error)) => {
                assert!(error.to_string().contains("missing field `id`"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_credentials_fail_at_index_step() {
        let index = MemoryIndex::default();
        let service = service(
            Config {
                algolia_app_id: None,
                ..config()
            },
            index.clone(),
        );

        match service.handle_event(request(post_body("hello"))).await {
            SyncOutcome::Failed(error) => {
                assert_eq!(error.to_string(), "Missing environment variable: ALGOLIA_APP_ID");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(index.connects(), 0);
    }
}
