//! Type definitions for the RSS module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Duration;

/// Severity rating assigned to an article by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LOW")]
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// Parses a severity label case-insensitively.
    pub fn from_label(label: &str) -> Option<Severity> {
        match label.trim().to_uppercase().as_str() {
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// A named feed source.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

/// A normalized news article.
///
/// Severity fields start unset and are filled in by the background
/// classification pass.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub summary: String,
    pub source: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_reasoning: Option<String>,
}

// Constants
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const SUMMARY_MAX_LEN: usize = 300;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels_parse_case_insensitively() {
        assert_eq!(Severity::from_label("high"), Some(Severity::High));
        assert_eq!(Severity::from_label(" MEDIUM "), Some(Severity::Medium));
        assert_eq!(Severity::from_label("Low"), Some(Severity::Low));
        assert_eq!(Severity::from_label("critical"), None);
    }

    #[test]
    fn severity_serializes_uppercase() {
        let json = serde_json::to_string(&Severity::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
    }
}
