//! In-memory document index with atomic replacement
//!
//! One logical index per corpus: readable by many concurrent queries,
//! replaced wholesale when a new document is ingested. The new corpus is
//! indexed fully before a pointer swap makes it visible; in-flight readers
//! keep the snapshot they started with.

use crate::error::Result;
use crate::models::Passage;
use crate::retrieval::Retriever;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Immutable snapshot of an indexed corpus.
pub struct DocumentIndex {
    passages: Vec<Passage>,
    fingerprint: String,
}

impl DocumentIndex {
    pub fn empty() -> Self {
        Self::build(Vec::new())
    }

    /// Index a corpus of pre-chunked passages.
    pub fn build(passages: Vec<Passage>) -> Self {
        let fingerprint = compute_corpus_fingerprint(&passages);
        Self {
            passages,
            fingerprint,
        }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Identifies which corpus build served a reply.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Lexical retrieval: score each passage by how many query terms it
    /// contains, drop zero scores, stable-sort descending so equal scores
    /// keep corpus order, take `k`.
    pub fn search(&self, query: &str, k: usize) -> Vec<Passage> {
        let needle = query.to_lowercase();
        let terms: Vec<&str> = needle
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &Passage)> = self
            .passages
            .iter()
            .filter_map(|p| {
                let content = p.content.to_lowercase();
                let score = terms.iter().filter(|t| content.contains(**t)).count();
                if score == 0 {
                    None
                } else {
                    Some((score, p))
                }
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(k).map(|(_, p)| p.clone()).collect()
    }
}

/// Compute SHA256 fingerprint of a corpus
/// Uses zero-copy streaming serialization into hasher
fn compute_corpus_fingerprint(passages: &[Passage]) -> String {
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), passages).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Shared handle to the live index. Clones are cheap and point at the same
/// slot; searches run against a snapshot, never under the lock.
#[derive(Clone)]
pub struct IndexHandle {
    current: Arc<RwLock<Arc<DocumentIndex>>>,
}

impl IndexHandle {
    pub fn empty() -> Self {
        Self::with_index(DocumentIndex::empty())
    }

    pub fn with_index(index: DocumentIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    pub async fn snapshot(&self) -> Arc<DocumentIndex> {
        self.current.read().await.clone()
    }

    /// Atomically swap in a fully-built index. Returns its fingerprint.
    pub async fn replace(&self, index: DocumentIndex) -> String {
        let index = Arc::new(index);
        let fingerprint = index.fingerprint().to_string();

        let mut slot = self.current.write().await;
        *slot = index;

        info!(
            passages = slot.len(),
            fingerprint = %fingerprint,
            "Document index replaced"
        );

        fingerprint
    }
}

/// Retrieval collaborator backed by the in-process index
pub struct IndexRetriever {
    handle: IndexHandle,
}

impl IndexRetriever {
    pub fn new(handle: IndexHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        let index = self.handle.snapshot().await;
        let passages = index.search(query, k);

        debug!(hits = passages.len(), k = k, "Index search");
        Ok(passages)
    }
}

//
// ================= Tests =================
//
