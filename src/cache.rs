//! In-memory article cache with atomic snapshot replacement.
//!
//! Exactly one snapshot is live at a time. A refresh replaces the whole
//! article list; classification results are applied only when they still
//! belong to the most recent refresh cycle, identified by the snapshot's
//! `last_updated` timestamp (the generation token).

use chrono::{DateTime, Utc};
use std::sync::RwLock;
use tokio::time::Duration;
use tracing::info;

use crate::rss::Article;

/// The complete, atomically-replaceable state of cached articles.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Articles sorted newest-published-first.
    pub articles: Vec<Article>,
    pub last_updated: Option<DateTime<Utc>>,
    /// True once every article in this snapshot carries a severity rating.
    pub classified: bool,
}

pub struct ArticleCache {
    inner: RwLock<Snapshot>,
    max_age: Duration,
}

impl ArticleCache {
    pub fn new(max_age: Duration) -> Self {
        ArticleCache {
            inner: RwLock::new(Snapshot::default()),
            max_age,
        }
    }

    /// Returns the current snapshot by value.
    ///
    /// Readers always see a fully-old or fully-new snapshot, never a mix.
    pub fn read(&self) -> Snapshot {
        self.inner.read().expect("cache lock poisoned").clone()
    }

    /// Atomically replace the article list with a fresh, unclassified fetch.
    ///
    /// This is the only way the article list is replaced wholesale; prior
    /// classifications on re-appearing articles are recovered through the
    /// classifier's title-keyed cache, not merged here. Returns the new
    /// generation token.
    pub fn write_articles(&self, articles: Vec<Article>) -> DateTime<Utc> {
        let now = Utc::now();
        let mut snapshot = self.inner.write().expect("cache lock poisoned");
        snapshot.articles = articles;
        snapshot.last_updated = Some(now);
        snapshot.classified = false;
        now
    }

    /// Apply a classified article list produced by the cycle identified by
    /// `generation`.
    ///
    /// If a newer fetch has replaced the snapshot in the meantime the
    /// results are silently dropped; an older cycle must never overwrite a
    /// newer cycle's articles. Returns whether the results were applied.
    pub fn apply_classification(
        &self,
        articles: Vec<Article>,
        generation: DateTime<Utc>,
    ) -> bool {
        let mut snapshot = self.inner.write().expect("cache lock poisoned");
        if snapshot.last_updated != Some(generation) {
            info!(
                "Discarding classification results for superseded refresh cycle ({})",
                generation
            );
            return false;
        }
        snapshot.articles = articles;
        snapshot.classified = true;
        true
    }

    /// True when the snapshot has never been filled or has outlived `max_age`.
    pub fn is_stale(&self) -> bool {
        let snapshot = self.inner.read().expect("cache lock poisoned");
        match snapshot.last_updated {
            Some(last_updated) => {
                let age = Utc::now().signed_duration_since(last_updated);
                age.num_milliseconds() > self.max_age.as_millis() as i64
            }
            None => true,
        }
    }

    pub fn article_count(&self) -> usize {
        self.inner.read().expect("cache lock poisoned").articles.len()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.read().expect("cache lock poisoned").last_updated
    }

    pub fn is_classified(&self) -> bool {
        self.inner.read().expect("cache lock poisoned").classified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rss::Severity;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            link: "https://example.com/a".to_string(),
            published: Utc::now(),
            summary: "summary".to_string(),
            source: "Test Feed".to_string(),
            author: "Unknown".to_string(),
            severity: None,
            severity_reasoning: None,
        }
    }

    fn classified(title: &str) -> Article {
        let mut a = article(title);
        a.severity = Some(Severity::High);
        a.severity_reasoning = Some("test".to_string());
        a
    }

    #[test]
    fn empty_cache_is_stale() {
        let cache = ArticleCache::new(Duration::from_secs(300));
        assert!(cache.is_stale());
    }

    #[test]
    fn fresh_write_is_not_stale() {
        let cache = ArticleCache::new(Duration::from_secs(300));
        cache.write_articles(vec![article("a")]);
        assert!(!cache.is_stale());
        assert_eq!(cache.article_count(), 1);
        assert!(!cache.is_classified());
    }

    #[test]
    fn zero_max_age_is_always_stale() {
        let cache = ArticleCache::new(Duration::from_secs(0));
        cache.write_articles(vec![article("a")]);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cache.is_stale());
    }

    #[test]
    fn classification_applies_for_current_generation() {
        let cache = ArticleCache::new(Duration::from_secs(300));
        let generation = cache.write_articles(vec![article("a")]);

        assert!(cache.apply_classification(vec![classified("a")], generation));
        let snapshot = cache.read();
        assert!(snapshot.classified);
        assert_eq!(snapshot.articles[0].severity, Some(Severity::High));
    }

    #[test]
    fn stale_classification_is_discarded() {
        let cache = ArticleCache::new(Duration::from_secs(300));
        let cycle_a = cache.write_articles(vec![article("old")]);

        // Cycle B lands while cycle A's classification is still pending.
        std::thread::sleep(std::time::Duration::from_millis(5));
        let cycle_b = cache.write_articles(vec![article("new")]);

        assert!(!cache.apply_classification(vec![classified("old")], cycle_a));

        let snapshot = cache.read();
        assert_eq!(snapshot.last_updated, Some(cycle_b));
        assert!(!snapshot.classified);
        assert_eq!(snapshot.articles[0].title, "new");
    }
}
