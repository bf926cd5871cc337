//! Structured insight extracted from context notes.

use serde::{Deserialize, Serialize};

/// Normalized summary of one or more context notes.
///
/// `Default` is the degraded value used whenever extraction is unavailable:
/// every list empty, sentiment `0.0`. Field names match the JSON shape
/// requested from the text-analysis capability, and missing fields in a
/// capability answer deserialize to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightRecord {
    pub keywords: Vec<String>,
    pub urgency_indicators: Vec<String>,
    /// Unbounded, typically within `[-1, 1]`.
    pub sentiment_score: f64,
    pub common_themes: Vec<String>,
    pub time_references: Vec<String>,
    pub action_verbs: Vec<String>,
}

impl InsightRecord {
    /// First `n` keywords, in extraction order.
    pub fn top_keywords(&self, n: usize) -> &[String] {
        &self.keywords[..self.keywords.len().min(n)]
    }

    /// First `n` themes, in extraction order.
    pub fn top_themes(&self, n: usize) -> &[String] {
        &self.common_themes[..self.common_themes.len().min(n)]
    }
}
