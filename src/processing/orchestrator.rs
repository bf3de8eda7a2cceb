//! Index orchestration: connect, apply settings, and upsert one post's fragments.

use crate::algolia::{IndexConfig, IndexConnector};
use tokio::time::timeout;

use super::types::{SearchableFragment, SyncError, UpsertSummary};

/// Push `fragments` into the index described by `config`.
///
/// A fresh client is opened per call, settings are (re)applied, and a single upsert carries
/// every fragment. Records with matching `objectID`s are replaced by the service. The whole
/// step is bounded by `config.timeout` and is never retried.
pub async fn index_fragments(
    connector: &dyn IndexConnector,
    config: &IndexConfig,
    fragments: Vec<SearchableFragment>,
) -> Result<UpsertSummary, SyncError> {
    let index = connector.connect(config)?;

    let work = async {
        index.configure(&config.settings).await?;
        tracing::debug!(index = %config.index_name, "Index settings ensured");
        let records = index.upsert(&fragments).await?;
        Ok::<_, SyncError>(UpsertSummary { records })
    };

    match timeout(config.timeout, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(
                index = %config.index_name,
                timeout_secs = config.timeout.as_secs(),
                "Index request timed out"
            );
            Err(SyncError::Timeout(config.timeout.as_secs()))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::algolia::{IndexError, IndexService, IndexSettings};
    use crate::processing::CustomRanking;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// In-memory index keyed by `objectID`, recording every call.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryIndex {
        pub(crate) records: Arc<Mutex<BTreeMap<String, SearchableFragment>>>,
        pub(crate) settings_calls: Arc<Mutex<usize>>,
        pub(crate) upsert_calls: Arc<Mutex<usize>>,
        pub(crate) connects: Arc<Mutex<usize>>,
        pub(crate) failure: Option<String>,
        pub(crate) delay: Option<Duration>,
    }

    impl MemoryIndex {
        pub(crate) fn failing(message: &str) -> Self {
            Self {
                failure: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub(crate) fn upserts(&self) -> usize {
            *self.upsert_calls.lock().expect("lock")
        }

        pub(crate) fn connects(&self) -> usize {
            *self.connects.lock().expect("lock")
        }

        pub(crate) fn snapshot(&self) -> BTreeMap<String, SearchableFragment> {
            self.records.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl IndexService for MemoryIndex {
        async fn configure(&self, _settings: &IndexSettings) -> Result<(), IndexError> {
            *self.settings_calls.lock().expect("lock") += 1;
            Ok(())
        }

        async fn upsert(&self, records: &[SearchableFragment]) -> Result<usize, IndexError> {
            *self.upsert_calls.lock().expect("lock") += 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = &self.failure {
                return Err(IndexError::Service(message.clone()));
            }
            let mut stored = self.records.lock().expect("lock");
            for record in records {
                stored.insert(record.object_id.clone(), record.clone());
            }
            Ok(records.len())
        }
    }

    impl IndexConnector for MemoryIndex {
        fn connect(&self, _config: &IndexConfig) -> Result<Box<dyn IndexService>, IndexError> {
            *self.connects.lock().expect("lock") += 1;
            Ok(Box::new(self.clone()))
        }
    }

    pub(crate) fn index_config() -> IndexConfig {
        IndexConfig {
            app_id: "APP".into(),
            api_key: "key".into(),
            index_name: "posts".into(),
            host: None,
            timeout: Duration::from_secs(5),
            settings: IndexSettings::default(),
        }
    }

    fn fragment(id: &str, position: usize, html: &str) -> SearchableFragment {
        SearchableFragment {
            object_id: format!("{id}_{position}"),
            post_id: id.into(),
            slug: "hello".into(),
            url: "https://blog.example.org/hello/".into(),
            html: html.into(),
            image: None,
            image_alt: None,
            title: "Hello".into(),
            excerpt: None,
            published_at: None,
            reading_time: 3,
            tags: vec![],
            authors: vec![],
            heading: None,
            anchor: None,
            headings: vec![],
            custom_ranking: CustomRanking {
                position,
                heading: 100,
            },
        }
    }

    #[tokio::test]
    async fn applies_settings_then_upserts_once() {
        let index = MemoryIndex::default();
        let summary = index_fragments(
            &index,
            &index_config(),
            vec![fragment("p1", 0, "a"), fragment("p1", 1, "b")],
        )
        .await
        .expect("indexed");

        assert_eq!(summary.records, 2);
        assert_eq!(*index.settings_calls.lock().expect("lock"), 1);
        assert_eq!(index.upserts(), 1);
    }

    #[tokio::test]
    async fn repeated_sync_replaces_instead_of_duplicating() {
        let index = MemoryIndex::default();
        let config = index_config();
        let fragments = vec![fragment("p1", 0, "a"), fragment("p1", 1, "b")];

        index_fragments(&index, &config, fragments.clone())
            .await
            .expect("first");
        let first = index.snapshot();
        index_fragments(&index, &config, fragments)
            .await
            .expect("second");

        assert_eq!(index.snapshot(), first);
        assert_eq!(first.len(), 2);
        assert_eq!(index.connects(), 2);
    }

    #[tokio::test]
    async fn service_errors_keep_their_message() {
        let index = MemoryIndex::failing("timeout");
        let error = index_fragments(&index, &index_config(), vec![fragment("p1", 0, "a")])
            .await
            .expect_err("failure");

        assert_eq!(error.to_string(), "timeout");
        assert!(index.snapshot().is_empty());
    }

    #[tokio::test]
    async fn slow_index_hits_timeout() {
        let index = MemoryIndex {
            delay: Some(Duration::from_millis(200)),
            ..MemoryIndex::default()
        };
        let config = IndexConfig {
            timeout: Duration::from_millis(20),
            ..index_config()
        };

        let error = index_fragments(&index, &config, vec![fragment("p1", 0, "a")])
            .await
            .expect_err("timeout");
        assert!(matches!(error, SyncError::Timeout(_)));
    }
}
