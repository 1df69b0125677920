//! Query decomposer trait and implementations
//!
//! Splits a compound financial question into retrievable sub-questions.
//! The pipeline treats a failure or an empty result as "use the original
//! question unchanged", so no implementation needs a fallback of its own.

use crate::Result;
use async_trait::async_trait;

pub mod llm;
pub use llm::LlmDecomposer;

/// Trait for question decomposition (LLM controlled)
#[async_trait]
pub trait QueryDecomposer: Send + Sync {
    async fn decompose(&self, query: &str) -> Result<Vec<String>>;
}

/// Mock decomposer for development & testing
/// Keeps system functional without LLM dependency
pub struct MockDecomposer;

#[async_trait]
impl QueryDecomposer for MockDecomposer {
    async fn decompose(&self, query: &str) -> Result<Vec<String>> {
        Ok(vec![query.to_string()])
    }
}
