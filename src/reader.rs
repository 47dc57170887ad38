//! Third-party article fetching and main-content extraction for the
//! reading view.

use scraper::{Html, Selector};
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::TARGET_WEB_REQUEST;

const READER_TIMEOUT: Duration = Duration::from_secs(10);
const READER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Selectors tried in order when looking for the main article element.
const CONTENT_SELECTORS: [&str; 7] = [
    "article",
    "[role=\"main\"]",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content",
    "main",
];

/// Elements detached from the document before content extraction.
const STRIP_TAGS: [&str; 7] = [
    "script", "style", "nav", "header", "footer", "aside", "iframe",
];

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Request timeout - article took too long to load")]
    Timeout,
    #[error("Unable to access this article due to security restrictions")]
    Forbidden,
    #[error("Failed to fetch article: status {0}")]
    Status(u16),
    #[error("Failed to fetch article content")]
    Request(#[from] reqwest::Error),
    #[error("Could not extract article content")]
    Extract,
    #[error("Invalid article URL")]
    InvalidUrl,
}

impl ContentError {
    /// Short error code surfaced in the JSON payload.
    pub fn code(&self) -> &'static str {
        match self {
            ContentError::Timeout => "timeout",
            ContentError::Forbidden => "forbidden",
            ContentError::Status(_) => "http_error",
            ContentError::Request(_) => "request_failed",
            ContentError::Extract => "extract_failed",
            ContentError::InvalidUrl => "invalid_url",
        }
    }

    /// HTTP status mirroring the failure class.
    pub fn http_status(&self) -> u16 {
        match self {
            ContentError::Timeout => 504,
            ContentError::Forbidden => 403,
            ContentError::Status(code) => *code,
            ContentError::Request(_) => 500,
            ContentError::Extract => 404,
            ContentError::InvalidUrl => 400,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArticleContent {
    pub title: String,
    pub content: String,
}

/// Fetch a third-party article page and extract its main content element.
pub async fn fetch_article_content(
    client: &reqwest::Client,
    article_url: &str,
) -> Result<ArticleContent, ContentError> {
    if !is_valid_url(article_url) {
        return Err(ContentError::InvalidUrl);
    }

    debug!(target: TARGET_WEB_REQUEST, "Fetching article content from {}", article_url);

    let response = timeout(
        READER_TIMEOUT,
        client
            .get(article_url)
            .header(reqwest::header::USER_AGENT, READER_USER_AGENT)
            .send(),
    )
    .await
    .map_err(|_| ContentError::Timeout)??;

    let status = response.status();
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ContentError::Forbidden);
    }
    if !status.is_success() {
        return Err(ContentError::Status(status.as_u16()));
    }

    let body = response.text().await?;

    extract_content(&body).ok_or(ContentError::Extract)
}

/// Helper function to validate a URL.
fn is_valid_url(url: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        parsed.scheme() == "http" || parsed.scheme() == "https"
    } else {
        false
    }
}

/// Find the best-guess main-content element and return its cleaned inner
/// HTML plus the page title.
fn extract_content(body: &str) -> Option<ArticleContent> {
    let mut document = Html::parse_document(body);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Article".to_string());

    strip_unwanted_nodes(&mut document);

    let mut content_html = None;
    for selector in CONTENT_SELECTORS {
        let sel = Selector::parse(selector).expect("valid content selector");
        if let Some(element) = document.select(&sel).next() {
            content_html = Some(element.inner_html());
            break;
        }
    }

    // Fall back to the whole body when no article element is found.
    let content_html = content_html.or_else(|| {
        let body_sel = Selector::parse("body").expect("valid body selector");
        document.select(&body_sel).next().map(|b| b.inner_html())
    })?;

    Some(ArticleContent {
        title,
        content: content_html,
    })
}

/// Detach scripts, styles, navigation, and other non-content elements from
/// the parsed tree, nested occurrences included.
fn strip_unwanted_nodes(document: &mut Html) {
    let mut doomed = Vec::new();
    for tag in STRIP_TAGS {
        let sel = Selector::parse(tag).expect("valid strip selector");
        doomed.extend(document.select(&sel).map(|element| element.id()));
    }
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_article_element_over_body() {
        let page = "<html><head><title>Breach Report</title></head><body>\
                    <nav>menu</nav><article><p>The details.</p></article></body></html>";
        let content = extract_content(page).unwrap();
        assert_eq!(content.title, "Breach Report");
        assert!(content.content.contains("The details."));
        assert!(!content.content.contains("menu"));
    }

    #[test]
    fn falls_back_to_body_and_strips_scripts() {
        let page = "<html><head><title>T</title></head><body>\
                    <script>alert(1)</script><p>visible text</p></body></html>";
        let content = extract_content(page).unwrap();
        assert!(content.content.contains("visible text"));
        assert!(!content.content.contains("alert(1)"));
    }

    #[test]
    fn strips_noise_elements_from_content() {
        let page = "<html><head><title>T</title></head><body><article>\
                    <style>.x{}</style><p>keep</p><aside>ads</aside>\
                    <iframe src=\"x\"></iframe></article></body></html>";
        let content = extract_content(page).unwrap();
        assert!(content.content.contains("keep"));
        assert!(!content.content.contains("ads"));
        assert!(!content.content.contains(".x{}"));
        assert!(!content.content.contains("iframe"));
    }

    #[test]
    fn strips_nested_same_tag_elements_entirely() {
        let page = "<html><head><title>T</title></head><body><article>\
                    <aside>outer<aside>inner</aside></aside>\
                    <p>the story</p></article></body></html>";
        let content = extract_content(page).unwrap();
        assert!(content.content.contains("the story"));
        assert!(!content.content.contains("outer"));
        assert!(!content.content.contains("inner"));
        assert!(!content.content.contains("aside"));
    }

    #[test]
    fn missing_title_defaults() {
        let page = "<html><body><article>text</article></body></html>";
        let content = extract_content(page).unwrap();
        assert_eq!(content.title, "Article");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(!is_valid_url("ftp://example.com/feed"));
        assert!(!is_valid_url("not a url"));
        assert!(is_valid_url("https://example.com/post"));
    }

    #[test]
    fn error_codes_map_to_statuses() {
        assert_eq!(ContentError::Timeout.http_status(), 504);
        assert_eq!(ContentError::Forbidden.http_status(), 403);
        assert_eq!(ContentError::Status(451).http_status(), 451);
        assert_eq!(ContentError::Extract.http_status(), 404);
        assert_eq!(ContentError::Timeout.code(), "timeout");
    }
}
