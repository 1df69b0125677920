//! OpenRouter-powered query decomposer
//!
//! Asks the model for bullet-point sub-questions and parses them back out
//! of free text.

use crate::openrouter::OpenRouterClient;
use crate::Result;
use async_trait::async_trait;
use tracing::debug;

pub struct LlmDecomposer {
    client: OpenRouterClient,
}

impl LlmDecomposer {
    pub fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }

    fn build_prompt(query: &str) -> String {
        format!(
            r#"You are a financial analyst. Break the following question into 2-4 clear sub-questions that can be answered using financial documents.

Question: {}

Return only the sub-questions, one per line, as bullet points."#,
            query
        )
    }
}

#[async_trait]
impl crate::decomposer::QueryDecomposer for LlmDecomposer {
    async fn decompose(&self, query: &str) -> Result<Vec<String>> {
        let prompt = Self::build_prompt(query);
        let response = self.client.chat(&prompt).await?;

        let sub_questions = parse_bullet_lines(&response);
        debug!(count = sub_questions.len(), "Decomposer produced sub-questions");

        Ok(sub_questions)
    }
}

/// Parse model output into sub-questions: one per line, bullet markers and
/// surrounding whitespace stripped, lines that were only markers dropped.
pub fn parse_bullet_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(|line| {
            line.trim_matches(|c: char| c == '-' || c == '•' || c == ' ')
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dash_bullets() {
        let parsed = parse_bullet_lines("- What is total debt?\n- What is total equity?");
        assert_eq!(
            parsed,
            vec![
                "What is total debt?".to_string(),
                "What is total equity?".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_dot_bullets_and_blanks() {
        let parsed = parse_bullet_lines("• First question \n\n  • Second question  ");
        assert_eq!(
            parsed,
            vec!["First question".to_string(), "Second question".to_string()]
        );
    }

    #[test]
    fn test_separator_lines_are_dropped() {
        let parsed = parse_bullet_lines("---\nWhat is EBITDA?\n---");
        assert_eq!(parsed, vec!["What is EBITDA?".to_string()]);
    }

    #[test]
    fn test_plain_text_is_one_question() {
        let parsed = parse_bullet_lines("What is the interest coverage?");
        assert_eq!(parsed, vec!["What is the interest coverage?".to_string()]);
    }

    #[test]
    fn test_empty_response_is_empty() {
        assert!(parse_bullet_lines("").is_empty());
        assert!(parse_bullet_lines("\n\n").is_empty());
    }

    #[test]
    fn test_prompt_carries_the_question() {
        let prompt = LlmDecomposer::build_prompt("How leveraged is the company?");
        assert!(prompt.contains("How leveraged is the company?"));
        assert!(prompt.contains("2-4"));
    }
}
