//! Retrieval seam and cross-sub-question aggregation
//!
//! The pipeline never searches anything itself; it asks a `Retriever` and
//! merges what comes back. Semantic quality is the collaborator's problem,
//! deduplication is ours.

pub mod index;

use crate::error::Result;
use crate::models::Passage;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;

/// Trait for passage retrieval against the live document index.
///
/// Returns zero or more passages for a query. Errors must propagate;
/// an empty result and a failure are different outcomes.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>>;
}

/// Fans sub-questions out to the retriever and merges the results.
pub struct RetrievalAggregator {
    top_k: usize,
}

impl RetrievalAggregator {
    /// High enough that sparse tabular rows ranked far down the list still
    /// make it into the evidence set.
    pub const DEFAULT_TOP_K: usize = 15;

    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Retrieve per sub-question, in order, and deduplicate across the
    /// whole set. Identity is (page number, 50-char content prefix); the
    /// first occurrence wins and keeps its position.
    pub async fn gather(
        &self,
        sub_questions: &[String],
        retriever: &dyn Retriever,
    ) -> Result<Vec<Passage>> {
        let mut unique: Vec<Passage> = Vec::new();
        let mut seen: HashSet<(u32, String)> = HashSet::new();

        for question in sub_questions {
            let passages = retriever.retrieve(question, self.top_k).await?;
            debug!(hits = passages.len(), "Sub-question retrieval");

            for passage in passages {
                if seen.insert(passage.dedup_key()) {
                    unique.push(passage);
                }
            }
        }

        Ok(unique)
    }
}

impl Default for RetrievalAggregator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOP_K)
    }
}

//
// ================= Tests =================
//
