//! OpenRouter-powered narrative generator
//!
//! Hands the settled findings to the model and asks for an analyst's
//! answer. Risk wording is steered toward a measured risk-officer voice;
//! the figures themselves are fixed inputs the model must cite.

use crate::models::{Passage, RiskFlag};
use crate::openrouter::OpenRouterClient;
use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub struct LlmNarrator {
    client: OpenRouterClient,
}

impl LlmNarrator {
    pub fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }

    fn build_prompt(
        query: &str,
        metrics: &BTreeMap<String, Option<f64>>,
        ratios: &BTreeMap<String, Option<f64>>,
        flags: &[RiskFlag],
    ) -> String {
        format!(
            r#"You are a senior financial analyst. Using the data below, answer the user's question.

User Question: {}

Extracted Financial Metrics:
{}

Calculated Ratios:
{}

Risk Flags:
{}

Metrics not found in the document:
{}

Instructions:
1. If the question asks for a specific metric, state that figure clearly.
2. If the question asks for a summary, risk, or analysis, give a full assessment in the measured voice of a financial risk officer, grounded in the flags above.
3. Mention the specific numbers from the metrics in your answer.
4. If a figure was not found, say so rather than estimating it."#,
            query,
            format_value_lines(metrics, "No figures could be extracted."),
            format_value_lines(ratios, "No ratios could be computed."),
            format_flag_lines(flags),
            format_missing_lines(metrics),
        )
    }
}

#[async_trait]
impl crate::narrative::NarrativeGenerator for LlmNarrator {
    async fn summarize(
        &self,
        query: &str,
        metrics: &BTreeMap<String, Option<f64>>,
        ratios: &BTreeMap<String, Option<f64>>,
        flags: &[RiskFlag],
        _passages: &[Passage],
    ) -> Result<String> {
        let prompt = Self::build_prompt(query, metrics, ratios, flags);
        let response = self.client.chat(&prompt).await?;
        Ok(response.trim().to_string())
    }
}

fn format_value_lines(values: &BTreeMap<String, Option<f64>>, when_empty: &str) -> String {
    let lines: Vec<String> = values
        .iter()
        .filter_map(|(k, v)| v.map(|v| format!("- {}: {:.2}", k, v)))
        .collect();

    if lines.is_empty() {
        format!("- {}", when_empty)
    } else {
        lines.join("\n")
    }
}

fn format_flag_lines(flags: &[RiskFlag]) -> String {
    if flags.is_empty() {
        return "- None".to_string();
    }
    flags
        .iter()
        .map(|f| format!("- {}", f.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_missing_lines(metrics: &BTreeMap<String, Option<f64>>) -> String {
    let missing: Vec<&str> = metrics
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| k.as_str())
        .collect();

    if missing.is_empty() {
        "- None".to_string()
    } else {
        format!("- {}", missing.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskSeverity;

    #[test]
    fn test_prompt_carries_findings() {
        let mut metrics = BTreeMap::new();
        metrics.insert("total_debt".to_string(), Some(626_130.0));
        metrics.insert("EBITDA".to_string(), None);

        let mut ratios = BTreeMap::new();
        ratios.insert("debt_to_equity".to_string(), Some(1.57));

        let flags = vec![RiskFlag {
            ratio: "debt_to_equity".to_string(),
            severity: RiskSeverity::Medium,
            message: "Medium Risk: Debt-to-Equity is 1.57".to_string(),
        }];

        let prompt = LlmNarrator::build_prompt("How leveraged are we?", &metrics, &ratios, &flags);

        assert!(prompt.contains("How leveraged are we?"));
        assert!(prompt.contains("- total_debt: 626130.00"));
        assert!(prompt.contains("- debt_to_equity: 1.57"));
        assert!(prompt.contains("Medium Risk: Debt-to-Equity is 1.57"));
        assert!(prompt.contains("- EBITDA"));
    }

    #[test]
    fn test_prompt_empty_sections_have_placeholders() {
        let prompt =
            LlmNarrator::build_prompt("Anything?", &BTreeMap::new(), &BTreeMap::new(), &[]);
        assert!(prompt.contains("- No figures could be extracted."));
        assert!(prompt.contains("- No ratios could be computed."));
        assert!(prompt.contains("- None"));
    }
}
