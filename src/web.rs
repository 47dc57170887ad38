//! HTTP surface: the HTML listing plus the JSON API.

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::cache::ArticleCache;
use crate::coordinator::RefreshCoordinator;
use crate::query::{self, ArticleQuery};
use crate::reader;
use crate::render::{self, IndexView};
use crate::rss::Article;

pub struct AppState {
    pub coordinator: Arc<RefreshCoordinator>,
    pub cache: Arc<ArticleCache>,
    pub sources: Vec<String>,
    pub http: reqwest::Client,
}

pub async fn serve(state: Arc<AppState>, port: u16) -> Result<()> {
    let app = Router::new()
        .route("/", get(index))
        .route("/about", get(about))
        .route("/api/articles", get(api_articles))
        .route("/api/sources", get(api_sources))
        .route("/api/refresh", get(api_refresh))
        .route("/api/classification-status", get(api_classification_status))
        .route("/api/article-content", get(api_article_content))
        .fallback(not_found)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Raw listing params, parsed leniently so malformed values coerce to
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    source: Option<String>,
    severity: Option<String>,
    search: Option<String>,
    sort: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
}

impl ListingParams {
    pub fn into_query(self) -> ArticleQuery {
        let defaults = ArticleQuery::default();
        ArticleQuery {
            source: self.source.unwrap_or(defaults.source),
            severity: self.severity.unwrap_or(defaults.severity),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            sort: self.sort.unwrap_or(defaults.sort),
            page: self
                .page
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.page),
            per_page: self
                .per_page
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.per_page),
        }
        .validated()
    }
}

/// Main page: filterable, sortable, paginated news listing.
async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingParams>,
) -> Html<String> {
    state.coordinator.maybe_refresh().await;

    let snapshot = state.cache.read();
    let query = params.into_query();
    let page = query::run(&snapshot.articles, &query);

    let view = IndexView {
        page: &page,
        query: &query,
        sources: &state.sources,
        last_updated: snapshot.last_updated,
        classified: snapshot.classified,
    };
    Html(render::index_page(&view))
}

async fn about(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render::about_page(&state.sources))
}

#[derive(Debug, Default, Deserialize)]
struct ArticlesParams {
    source: Option<String>,
    limit: Option<String>,
}

fn article_json(article: &Article) -> serde_json::Value {
    json!({
        "title": article.title,
        "link": article.link,
        "published": article.published.to_rfc3339(),
        "summary": article.summary,
        "source": article.source,
        "author": article.author,
    })
}

/// JSON list of cached articles.
async fn api_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ArticlesParams>,
) -> Json<serde_json::Value> {
    state.coordinator.maybe_refresh().await;

    let snapshot = state.cache.read();
    let source = params.source.unwrap_or_else(|| "all".to_string());
    let limit: usize = params.limit.and_then(|l| l.parse().ok()).unwrap_or(50);

    let articles: Vec<serde_json::Value> = snapshot
        .articles
        .iter()
        .take(limit)
        .filter(|a| source == "all" || a.source == source)
        .map(article_json)
        .collect();

    Json(json!({
        "articles": articles,
        "total": articles.len(),
        "last_updated": snapshot.last_updated.map(|t| t.to_rfc3339()),
    }))
}

async fn api_sources(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "sources": state.sources,
        "total": state.sources.len(),
    }))
}

/// Force an unconditional cache refresh.
async fn api_refresh(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let count = state.coordinator.force_refresh().await;
    Json(json!({
        "success": true,
        "articles_count": count,
        "last_updated": state.cache.last_updated().map(|t| t.to_rfc3339()),
    }))
}

/// Polling endpoint for the background classification pass.
async fn api_classification_status(
    State(state): State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    Json(json!({
        "classified": state.cache.is_classified(),
        "article_count": state.cache.article_count(),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ContentParams {
    url: Option<String>,
}

/// Fetch a third-party article page for the reading view.
async fn api_article_content(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ContentParams>,
) -> impl IntoResponse {
    let article_url = match params.url {
        Some(url) if !url.trim().is_empty() => url,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "URL parameter is required" })),
            );
        }
    };

    match reader::fetch_article_content(&state.http, &article_url).await {
        Ok(content) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "title": content.title,
                "content": content.content,
                "url": article_url,
            })),
        ),
        Err(err) => {
            let status = StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(json!({
                    "success": false,
                    "error": err.code(),
                    "message": err.to_string(),
                    "url": article_url,
                })),
            )
        }
    }
}

async fn not_found() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(render::not_found_page()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::DEFAULT_PER_PAGE;

    #[test]
    fn listing_params_default_when_absent() {
        let query = ListingParams::default().into_query();
        assert_eq!(query.source, "all");
        assert_eq!(query.severity, "all");
        assert_eq!(query.sort, "newest");
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn listing_params_coerce_malformed_values() {
        let params = ListingParams {
            page: Some("not-a-number".to_string()),
            per_page: Some("7".to_string()),
            sort: Some("sideways".to_string()),
            severity: Some("HIGH".to_string()),
            search: Some("  botnet  ".to_string()),
            source: None,
        };
        let query = params.into_query();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, DEFAULT_PER_PAGE);
        assert_eq!(query.sort, "newest");
        assert_eq!(query.severity, "high");
        assert_eq!(query.search, "botnet");
    }
}
