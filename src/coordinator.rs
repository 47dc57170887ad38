//! Refresh coordination: when to fetch, and how classification catches up.
//!
//! A refresh cycle fetches articles synchronously, replaces the snapshot,
//! and hands a stable copy of the fetched list to a spawned classification
//! task. The task reconciles through the cache's generation token, so a
//! cycle overtaken by a newer fetch has its results dropped rather than
//! resurrecting stale articles.

use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::cache::ArticleCache;
use crate::classifier::SeverityClassifier;
use crate::rss::FeedClient;

/// Delay before the periodic driver resumes after an unexpected error.
const DRIVER_BACKOFF: Duration = Duration::from_secs(60);

pub struct RefreshCoordinator {
    cache: Arc<ArticleCache>,
    feeds: FeedClient,
    classifier: Arc<SeverityClassifier>,
    classify_delay: Duration,
    per_feed_limit: usize,
}

impl RefreshCoordinator {
    pub fn new(
        cache: Arc<ArticleCache>,
        feeds: FeedClient,
        classifier: Arc<SeverityClassifier>,
        classify_delay: Duration,
        per_feed_limit: usize,
    ) -> Self {
        RefreshCoordinator {
            cache,
            feeds,
            classifier,
            classify_delay,
            per_feed_limit,
        }
    }

    pub fn cache(&self) -> &Arc<ArticleCache> {
        &self.cache
    }

    /// Refresh only when the snapshot is stale. Returns the number of
    /// articles now cached.
    pub async fn maybe_refresh(&self) -> usize {
        if self.cache.is_stale() {
            self.force_refresh().await
        } else {
            self.cache.article_count()
        }
    }

    /// Unconditionally run one refresh cycle: fetch, replace the snapshot,
    /// and launch background classification. Returns the number of articles
    /// now cached.
    ///
    /// Classification never blocks the caller; readers see the fresh,
    /// unclassified articles immediately.
    pub async fn force_refresh(&self) -> usize {
        info!("Refreshing articles cache...");
        let articles = self.feeds.fetch_all(self.per_feed_limit).await;

        if articles.is_empty() && self.cache.article_count() > 0 {
            // Every feed failed; keep serving the previous snapshot.
            error!("Refresh produced no articles, keeping previous snapshot");
            return self.cache.article_count();
        }

        let count = articles.len();
        let generation = self.cache.write_articles(articles.clone());
        info!("Cache refreshed with {} articles", count);

        let cache = Arc::clone(&self.cache);
        let classifier = Arc::clone(&self.classifier);
        let delay = self.classify_delay;
        tokio::spawn(async move {
            info!("Background classification started...");
            let classified = classifier.classify_batch(articles, delay).await;
            let total = classified.len();
            if cache.apply_classification(classified, generation) {
                info!("Background classification completed for {} articles", total);
            }
        });

        count
    }

    /// Periodic driver: refresh on a fixed interval for the life of the
    /// process. Fetch failures surface inside `force_refresh` and are
    /// retried on the next normal interval; a panicking iteration backs
    /// off briefly before the loop resumes.
    pub async fn run_periodic(self: Arc<Self>, interval: Duration) {
        info!(
            "Auto-refresh started (interval: {} seconds)",
            interval.as_secs()
        );
        loop {
            sleep(interval).await;
            info!("Auto-refresh triggered");

            let coordinator = Arc::clone(&self);
            let result = tokio::spawn(async move {
                coordinator.force_refresh().await;
            })
            .await;

            if let Err(err) = result {
                error!("Error in auto-refresh task: {}", err);
                sleep(DRIVER_BACKOFF).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SeverityEngine;
    use crate::config::default_feeds;
    use crate::rss::Severity;
    use anyhow::Result;
    use async_trait::async_trait;

    struct InstantEngine;

    #[async_trait]
    impl SeverityEngine for InstantEngine {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("{\"severity\":\"HIGH\",\"reasoning\":\"test\"}".to_string())
        }
    }

    fn coordinator(max_age: Duration) -> RefreshCoordinator {
        let cache = Arc::new(ArticleCache::new(max_age));
        let feeds = FeedClient::new(default_feeds(), reqwest::Client::new());
        let classifier = Arc::new(SeverityClassifier::new(Box::new(InstantEngine)));
        RefreshCoordinator::new(cache, feeds, classifier, Duration::from_millis(0), 15)
    }

    #[tokio::test]
    async fn maybe_refresh_skips_fresh_cache() {
        let coordinator = coordinator(Duration::from_secs(300));
        // Seed the cache so it is fresh; maybe_refresh must not fetch.
        coordinator.cache().write_articles(Vec::new());
        assert!(!coordinator.cache().is_stale());
        assert_eq!(coordinator.maybe_refresh().await, 0);
    }

    #[tokio::test]
    async fn classification_task_applies_to_current_generation() {
        let cache = Arc::new(ArticleCache::new(Duration::from_secs(300)));
        let classifier = Arc::new(SeverityClassifier::new(Box::new(InstantEngine)));

        let articles = vec![crate::rss::Article {
            title: "Exploit in the wild".to_string(),
            link: "#".to_string(),
            published: chrono::Utc::now(),
            summary: "details".to_string(),
            source: "Test Feed".to_string(),
            author: "Unknown".to_string(),
            severity: None,
            severity_reasoning: None,
        }];

        let generation = cache.write_articles(articles.clone());
        let classified = classifier
            .classify_batch(articles, Duration::from_millis(0))
            .await;
        assert!(cache.apply_classification(classified, generation));

        let snapshot = cache.read();
        assert!(snapshot.classified);
        assert_eq!(snapshot.articles[0].severity, Some(Severity::High));
    }
}
