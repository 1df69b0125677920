//! Financial Document Analyzer
//!
//! A deterministic question-answering pipeline for financial filings:
//! - Splits a question into focused sub-questions
//! - Retrieves supporting passages from an in-memory document index
//! - Extracts metrics and computes ratios with deterministic rules
//! - Classifies leverage and coverage risk, scores confidence
//! - Writes the final answer (LLM used for language only, never for math)
//!
//! PIPELINE:
//! DECOMPOSE → RETRIEVE → ANALYZE → VALIDATE → SUMMARIZE → DONE

pub mod analysis;
pub mod api;
pub mod decomposer;
pub mod error;
pub mod finance;
pub mod models;
pub mod narrative;
pub mod openrouter;
pub mod pipeline;
pub mod retrieval;
pub mod validation;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use pipeline::{Orchestrator, Stage};
