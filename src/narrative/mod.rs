//! Narrative generator trait and implementations
//!
//! Turns accumulated findings into the final prose answer. The pipeline
//! requires non-empty text from this seam; free-text quality is the
//! collaborator's concern, the figures are already settled.

use crate::models::{Passage, RiskFlag};
use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub mod llm;
pub use llm::LlmNarrator;

/// Trait for answer generation (LLM controlled)
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn summarize(
        &self,
        query: &str,
        metrics: &BTreeMap<String, Option<f64>>,
        ratios: &BTreeMap<String, Option<f64>>,
        flags: &[RiskFlag],
        passages: &[Passage],
    ) -> Result<String>;
}

/// Mock narrator for development & testing
/// Keeps system functional without LLM dependency
pub struct MockNarrator;

#[async_trait]
impl NarrativeGenerator for MockNarrator {
    async fn summarize(
        &self,
        query: &str,
        metrics: &BTreeMap<String, Option<f64>>,
        ratios: &BTreeMap<String, Option<f64>>,
        flags: &[RiskFlag],
        passages: &[Passage],
    ) -> Result<String> {
        let mut answer = format!("Assessment for \"{}\":", query);

        let found: Vec<String> = metrics
            .iter()
            .filter_map(|(k, v)| v.map(|v| format!("{} = {}", k, v)))
            .collect();
        if found.is_empty() {
            answer.push_str(
                "\nThe document was indexed, but none of the requested figures could be located.",
            );
        } else {
            answer.push_str(&format!("\nFigures located: {}.", found.join(", ")));
        }

        let computed: Vec<String> = ratios
            .iter()
            .filter_map(|(k, v)| v.map(|v| format!("{} = {}", k, v)))
            .collect();
        if !computed.is_empty() {
            answer.push_str(&format!("\nRatios: {}.", computed.join(", ")));
        }

        for flag in flags {
            answer.push_str(&format!("\n{}", flag.message));
        }

        let missing: Vec<&str> = metrics
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
            .collect();
        if !missing.is_empty() && !found.is_empty() {
            answer.push_str(&format!(
                "\nNot located in the indexed document: {}.",
                missing.join(", ")
            ));
        }

        answer.push_str(&format!(
            "\nBased on {} passage(s) from the document.",
            passages.len()
        ));

        Ok(answer)
    }
}
