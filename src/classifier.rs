//! Severity classification of articles via an external LLM engine.
//!
//! Classifications are cached by article title for the life of the process;
//! identical titles from different sources share one cached rating. Failures
//! are never cached, so a later refresh can retry the same title.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, warn};

use crate::prompts;
use crate::rss::{Article, Severity};
use crate::TARGET_LLM_REQUEST;

pub const FALLBACK_REASONING: &str = "Classification unavailable";
const REASONING_MAX_LEN: usize = 150;
const ENGINE_TIMEOUT: Duration = Duration::from_secs(60);

/// A severity label plus the engine's rationale for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    pub reasoning: String,
}

impl Classification {
    fn fallback() -> Self {
        Classification {
            severity: Severity::Medium,
            reasoning: FALLBACK_REASONING.to_string(),
        }
    }
}

/// The external text-classification engine boundary.
#[async_trait]
pub trait SeverityEngine: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Gemini `generateContent` REST client.
pub struct GeminiEngine {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiEngine {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        GeminiEngine {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl SeverityEngine for GeminiEngine {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        debug!(target: TARGET_LLM_REQUEST, "Sending classification request to model {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {}: {}", status, text);
        }

        let parsed: GeminiResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no candidate text"))?;

        Ok(text)
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: String,
}

/// Classifies articles, caching successful results by title.
pub struct SeverityClassifier {
    engine: Box<dyn SeverityEngine>,
    cache: DashMap<String, Classification>,
}

impl SeverityClassifier {
    pub fn new(engine: Box<dyn SeverityEngine>) -> Self {
        SeverityClassifier {
            engine,
            cache: DashMap::new(),
        }
    }

    /// Cached classification for a title, if any.
    pub fn cached(&self, title: &str) -> Option<Classification> {
        self.cache.get(title).map(|entry| entry.value().clone())
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Classify one article. Never fails: any engine or parse error falls
    /// back to MEDIUM with a placeholder rationale, and the failure is not
    /// cached.
    pub async fn classify(&self, title: &str, description: &str) -> Classification {
        if let Some(hit) = self.cached(title) {
            debug!(target: TARGET_LLM_REQUEST, "Cache hit for '{}'", title);
            return hit;
        }

        let prompt = prompts::severity_prompt(title, description);

        let response = match timeout(ENGINE_TIMEOUT, self.engine.generate(&prompt)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                error!(target: TARGET_LLM_REQUEST, "Error classifying article severity: {}", err);
                return Classification::fallback();
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "Classification request timed out");
                return Classification::fallback();
            }
        };

        match parse_classification(&response) {
            Some(classification) => {
                info!(
                    target: TARGET_LLM_REQUEST,
                    "Classified article '{}' as {}",
                    title.chars().take(50).collect::<String>(),
                    classification.severity.as_str()
                );
                self.cache
                    .insert(title.to_string(), classification.clone());
                classification
            }
            None => {
                error!(
                    target: TARGET_LLM_REQUEST,
                    "Failed to parse classification response: {}", response
                );
                Classification::fallback()
            }
        }
    }

    /// Classify a batch sequentially, sleeping `delay` between successive
    /// external calls. Cache hits cost no call and no delay; the last
    /// article is never followed by a delay.
    pub async fn classify_batch(
        &self,
        mut articles: Vec<Article>,
        delay: Duration,
    ) -> Vec<Article> {
        let total = articles.len();
        for (i, article) in articles.iter_mut().enumerate() {
            let was_cached = self.cached(&article.title).is_some();
            let classification = self.classify(&article.title, &article.summary).await;
            article.severity = Some(classification.severity);
            article.severity_reasoning = Some(classification.reasoning);

            if !was_cached && i + 1 < total {
                sleep(delay).await;
            }
        }
        articles
    }
}

/// Extract the JSON payload from an engine response that may wrap it in a
/// fenced code block.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return match rest.find("```") {
            Some(end) => rest[..end].trim(),
            None => rest.trim(),
        };
    }
    if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + 3..];
        return match rest.find("```") {
            Some(end) => rest[..end].trim(),
            None => rest.trim(),
        };
    }
    trimmed
}

#[derive(Deserialize)]
struct RawClassification {
    severity: String,
    reasoning: String,
}

/// Parse an engine response into a classification.
///
/// An invalid severity label is normalized to MEDIUM while keeping the
/// engine's reasoning; a malformed payload yields `None`.
fn parse_classification(response: &str) -> Option<Classification> {
    let raw: RawClassification = serde_json::from_str(extract_json(response)).ok()?;

    let severity = Severity::from_label(&raw.severity).unwrap_or(Severity::Medium);
    let reasoning = if raw.reasoning.chars().count() > REASONING_MAX_LEN {
        raw.reasoning.chars().take(REASONING_MAX_LEN).collect()
    } else {
        raw.reasoning
    };

    Some(Classification {
        severity,
        reasoning,
    })
}
