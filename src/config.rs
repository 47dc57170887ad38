//! Runtime configuration, derived from environment variables.

use std::env;
use tokio::time::Duration;

use crate::rss::FeedSource;

/// How long a snapshot stays fresh before a read triggers a refresh.
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(300);

/// How often the periodic driver forces a refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Delay between successive classification calls, to respect API rate limits.
pub const DEFAULT_CLASSIFY_DELAY: Duration = Duration::from_millis(300);

/// Maximum articles fetched from each feed per refresh.
pub const DEFAULT_PER_FEED_LIMIT: usize = 15;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub feeds: Vec<FeedSource>,
    pub cache_max_age: Duration,
    pub refresh_interval: Duration,
    pub classify_delay: Duration,
    pub per_feed_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let feeds = match env::var("THREATWIRE_FEEDS") {
            Ok(raw) => {
                let parsed = parse_feed_overrides(&raw);
                if parsed.is_empty() {
                    default_feeds()
                } else {
                    parsed
                }
            }
            Err(_) => default_feeds(),
        };

        Config {
            port,
            gemini_api_key,
            gemini_model,
            feeds,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            classify_delay: DEFAULT_CLASSIFY_DELAY,
            per_feed_limit: DEFAULT_PER_FEED_LIMIT,
        }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.feeds.iter().map(|f| f.name.clone()).collect()
    }
}

/// The default cybersecurity news sources.
pub fn default_feeds() -> Vec<FeedSource> {
    [
        ("The Hacker News", "https://feeds.feedburner.com/TheHackersNews"),
        ("Krebs on Security", "https://krebsonsecurity.com/feed/"),
        ("Bleeping Computer", "https://www.bleepingcomputer.com/feed/"),
        ("Dark Reading", "https://www.darkreading.com/rss.xml"),
        ("Threatpost", "https://threatpost.com/feed/"),
        ("Security Week", "https://www.securityweek.com/feed/"),
        (
            "Cybersecurity Insiders",
            "https://www.cybersecurity-insiders.com/feed/",
        ),
    ]
    .iter()
    .map(|(name, url)| FeedSource {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

/// Parses a `Name=url;Name=url` feed override string, skipping malformed entries.
fn parse_feed_overrides(raw: &str) -> Vec<FeedSource> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, url) = pair.split_once('=')?;
            let name = name.trim();
            let url = url.trim();
            if name.is_empty() || url.is_empty() {
                return None;
            }
            Some(FeedSource {
                name: name.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}
