use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use threatwire::cache::ArticleCache;
use threatwire::classifier::{GeminiEngine, SeverityClassifier};
use threatwire::config::Config;
use threatwire::coordinator::RefreshCoordinator;
use threatwire::logging::configure_logging;
use threatwire::rss::{create_http_client, FeedClient};
use threatwire::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let config = Config::from_env();

    if config.gemini_api_key.is_empty() {
        warn!("GEMINI_API_KEY not set; articles will fall back to MEDIUM severity");
    }

    let http = create_http_client()?;

    let cache = Arc::new(ArticleCache::new(config.cache_max_age));
    let feeds = FeedClient::new(config.feeds.clone(), http.clone());
    let engine = GeminiEngine::new(
        http.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    );
    let classifier = Arc::new(SeverityClassifier::new(Box::new(engine)));

    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::clone(&cache),
        feeds,
        classifier,
        config.classify_delay,
        config.per_feed_limit,
    ));

    // Initial cache load before accepting traffic.
    coordinator.force_refresh().await;

    tokio::spawn(Arc::clone(&coordinator).run_periodic(config.refresh_interval));
    info!(
        "Auto-refresh enabled: every {} seconds",
        config.refresh_interval.as_secs()
    );

    let state = Arc::new(AppState {
        coordinator,
        cache,
        sources: config.source_names(),
        http,
    });

    web::serve(state, config.port).await
}
