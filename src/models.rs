//! Core data models for the financial document analyzer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// Characters of passage content that participate in dedup identity.
pub const DEDUP_PREFIX_CHARS: usize = 50;

/// Maximum characters of a source snippet surfaced to the caller.
pub const SNIPPET_CHARS: usize = 100;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// The numeric score stays canonical; the level is a display band.
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            ConfidenceLevel::High
        } else if score > 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

//
// ================= Passage =================
//

/// One retrieved chunk of an indexed document. Produced by ingestion,
/// immutable inside the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub page_number: u32,
    #[serde(default)]
    pub has_table: bool,
}

impl Passage {
    pub fn new(content: impl Into<String>, page_number: u32, has_table: bool) -> Self {
        Self {
            content: content.into(),
            page_number,
            has_table,
        }
    }

    /// Dedup identity: page number plus the first 50 characters of content.
    /// Character-based so multibyte currency symbols cannot split.
    pub fn dedup_key(&self) -> (u32, String) {
        (self.page_number, char_prefix(&self.content, DEDUP_PREFIX_CHARS))
    }

    /// Truncated content for source attribution.
    pub fn snippet(&self) -> String {
        char_prefix(&self.content, SNIPPET_CHARS)
    }
}

fn char_prefix(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

//
// ================= Risk Flags =================
//

/// One classification outcome per evaluated ratio. `message` is the full
/// human-readable sentence; `severity` is the structured tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFlag {
    pub ratio: String,
    pub severity: RiskSeverity,
    pub message: String,
}

//
// ================= Pipeline State =================
//

/// The single record threaded through the pipeline stages. Created once per
/// request, exclusively owned by that request, discarded when the response
/// is produced. Never persisted, never shared across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub request_id: Uuid,
    /// The user's original question. Immutable once set.
    pub query: String,
    pub started_at: DateTime<Utc>,
    /// Never empty after the Decompose stage.
    pub sub_questions: Vec<String>,
    /// Deduplicated union of per-sub-question retrievals, retrieval order.
    pub passages: Vec<Passage>,
    /// Six base metric keys always present after Analyze, value or None,
    /// plus any query-conditional keys.
    pub metrics: BTreeMap<String, Option<f64>>,
    /// Finite values or None, never NaN or infinity.
    pub ratios: BTreeMap<String, Option<f64>>,
    /// Subset of the keys of `metrics`.
    pub missing_metrics: BTreeSet<String>,
    pub risk_flags: Vec<RiskFlag>,
    pub confidence: f64,
    pub final_answer: Option<String>,
    /// Stage-transition trace surfaced in the report.
    pub trace: Vec<String>,
}

impl PipelineState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            query: query.into(),
            started_at: Utc::now(),
            sub_questions: Vec::new(),
            passages: Vec::new(),
            metrics: BTreeMap::new(),
            ratios: BTreeMap::new(),
            missing_metrics: BTreeSet::new(),
            risk_flags: Vec::new(),
            confidence: 0.0,
            final_answer: None,
            trace: Vec::new(),
        }
    }
}

//
// ================= Final Report =================
//

/// Source attribution: one entry per contributing page, ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub page_number: u32,
    pub snippet: String,
}

/// What `Orchestrator::run` hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    pub request_id: Uuid,
    pub answer: String,
    pub metrics: BTreeMap<String, Option<f64>>,
    pub ratios: BTreeMap<String, Option<f64>>,
    pub flags: Vec<String>,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub sources: Vec<SourceRef>,
    pub trace: Vec<String>,
    pub elapsed_ms: u64,
}

impl fmt::Display for RiskSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskSeverity::Low => "Low",
            RiskSeverity::Medium => "Medium",
            RiskSeverity::High => "High",
            RiskSeverity::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceLevel::High => "High",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::Low => "Low",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_uses_fifty_char_prefix() {
        let long = "x".repeat(80);
        let p = Passage::new(long.clone(), 3, false);
        let (page, prefix) = p.dedup_key();
        assert_eq!(page, 3);
        assert_eq!(prefix.chars().count(), 50);
        assert_eq!(prefix, "x".repeat(50));
    }

    #[test]
    fn test_dedup_key_multibyte_safe() {
        // Rupee sign is 3 bytes in UTF-8; a byte slice at 50 would panic.
        let content = "₹".repeat(60);
        let p = Passage::new(content, 1, true);
        let (_, prefix) = p.dedup_key();
        assert_eq!(prefix.chars().count(), 50);
    }

    #[test]
    fn test_snippet_is_capped_at_hundred_chars() {
        let p = Passage::new("short text", 1, false);
        assert_eq!(p.snippet(), "short text");

        let p = Passage::new("y".repeat(250), 2, false);
        assert_eq!(p.snippet().chars().count(), 100);
    }

    #[test]
    fn test_confidence_level_bands() {
        assert_eq!(ConfidenceLevel::from_score(1.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.81), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.8), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.51), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.5), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.0), ConfidenceLevel::Low);
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = PipelineState::new("What is the debt position?");
        assert_eq!(state.query, "What is the debt position?");
        assert!(state.sub_questions.is_empty());
        assert!(state.passages.is_empty());
        assert!(state.metrics.is_empty());
        assert_eq!(state.confidence, 0.0);
        assert!(state.final_answer.is_none());
    }
}
