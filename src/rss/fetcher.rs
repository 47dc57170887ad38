//! Feed fetching and article normalization.

use chrono::Utc;
use feed_rs::parser;
use regex::Regex;
use std::io;
use tracing::{error, info};

use super::client::fetch_feed_body;
use super::types::{Article, FeedSource, SUMMARY_MAX_LEN};
use crate::TARGET_WEB_REQUEST;

/// Fetches and normalizes articles from the configured news feeds.
#[derive(Clone)]
pub struct FeedClient {
    feeds: Vec<FeedSource>,
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new(feeds: Vec<FeedSource>, client: reqwest::Client) -> Self {
        FeedClient { feeds, client }
    }

    pub fn sources(&self) -> Vec<String> {
        self.feeds.iter().map(|f| f.name.clone()).collect()
    }

    /// Fetch articles from every configured feed, sorted newest first.
    ///
    /// A failing feed is logged and contributes zero articles; it never
    /// aborts the overall fetch.
    pub async fn fetch_all(&self, limit_per_feed: usize) -> Vec<Article> {
        let mut all_articles = Vec::new();

        for feed in &self.feeds {
            match self.fetch_feed(feed, limit_per_feed).await {
                Ok(articles) => {
                    info!(
                        target: TARGET_WEB_REQUEST,
                        "Fetched {} articles from {}",
                        articles.len(),
                        feed.name
                    );
                    all_articles.extend(articles);
                }
                Err(err) => {
                    error!(
                        target: TARGET_WEB_REQUEST,
                        "Error fetching feed from {}: {}", feed.name, err
                    );
                }
            }
        }

        all_articles.sort_by(|a, b| b.published.cmp(&a.published));

        info!(target: TARGET_WEB_REQUEST, "Total articles fetched: {}", all_articles.len());
        all_articles
    }

    /// Fetch and parse a single feed into normalized articles.
    async fn fetch_feed(
        &self,
        feed: &FeedSource,
        limit: usize,
    ) -> anyhow::Result<Vec<Article>> {
        let body = fetch_feed_body(&self.client, &feed.url).await?;

        let reader = io::Cursor::new(body);
        let parsed = parser::parse(reader)
            .map_err(|e| anyhow::anyhow!("Failed to parse feed from {}: {}", feed.url, e))?;

        let articles = parsed
            .entries
            .into_iter()
            .take(limit)
            .map(|entry| {
                let title = entry
                    .title
                    .map(|t| t.content)
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "No Title".to_string());
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_else(|| "#".to_string());
                let published = entry
                    .published
                    .or(entry.updated)
                    .unwrap_or_else(Utc::now);
                let summary = entry
                    .summary
                    .map(|s| clean_summary(&s.content))
                    .unwrap_or_else(|| "No summary available".to_string());
                let author = entry
                    .authors
                    .first()
                    .map(|a| a.name.clone())
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string());

                Article {
                    title,
                    link,
                    published,
                    summary,
                    source: feed.name.clone(),
                    author,
                    severity: None,
                    severity_reasoning: None,
                }
            })
            .collect();

        Ok(articles)
    }
}

/// Strip HTML tags from a summary and cap its length.
pub fn clean_summary(summary: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").expect("valid tag regex");
    let clean = tag_re.replace_all(summary, "");
    let clean = clean.trim();

    if clean.chars().count() > SUMMARY_MAX_LEN {
        let truncated: String = clean.chars().take(SUMMARY_MAX_LEN).collect();
        format!("{}...", truncated)
    } else {
        clean.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_summary_strips_tags() {
        let cleaned = clean_summary("<p>Ransomware hits <b>hospital</b> network</p>");
        assert_eq!(cleaned, "Ransomware hits hospital network");
    }

    #[test]
    fn clean_summary_caps_length() {
        let long = "a".repeat(500);
        let cleaned = clean_summary(&long);
        assert_eq!(cleaned.chars().count(), SUMMARY_MAX_LEN + 3);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn clean_summary_keeps_short_text_unchanged() {
        assert_eq!(clean_summary("short note"), "short note");
    }
}
