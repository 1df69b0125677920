//! Pipeline orchestrator - the staged analysis state machine
//!
//! DECOMPOSE → RETRIEVE → ANALYZE → VALIDATE → SUMMARIZE → DONE
//!
//! One `PipelineState` per request, threaded through the stages in order,
//! no stage revisited. The orchestrator is shared behind `Arc` and holds
//! no per-request state of its own.

use crate::analysis::{analyze_passages, MetricExtractor};
use crate::decomposer::QueryDecomposer;
use crate::error::AnalysisError;
use crate::models::{ConfidenceLevel, PipelineState, QueryReport, SourceRef};
use crate::narrative::NarrativeGenerator;
use crate::retrieval::{RetrievalAggregator, Retriever};
use crate::validation::RiskRuleEngine;
use crate::Result;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Answer used when retrieval produced no evidence at all.
const NO_EVIDENCE_ANSWER: &str = "No documents have been indexed yet, so there is no evidence to \
     analyze. Upload a document and ask the question again.";

/// The stages a request moves through. Each runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decompose,
    Retrieve,
    Analyze,
    Validate,
    Summarize,
    Done,
}

/// Routing point after Validate. Structurally a branch; every path leads
/// to Summarize today.
fn route_after_validate(_state: &PipelineState) -> Stage {
    Stage::Summarize
}

/// Main orchestrator that drives one question through the pipeline
pub struct Orchestrator {
    decomposer: Box<dyn QueryDecomposer>,
    retriever: Box<dyn Retriever>,
    aggregator: RetrievalAggregator,
    extractor: MetricExtractor,
    rule_engine: RiskRuleEngine,
    narrator: Box<dyn NarrativeGenerator>,
}

impl Orchestrator {
    /// Components in stage order.
    pub fn new(
        decomposer: Box<dyn QueryDecomposer>,
        retriever: Box<dyn Retriever>,
        aggregator: RetrievalAggregator,
        extractor: MetricExtractor,
        rule_engine: RiskRuleEngine,
        narrator: Box<dyn NarrativeGenerator>,
    ) -> Self {
        Self {
            decomposer,
            retriever,
            aggregator,
            extractor,
            rule_engine,
            narrator,
        }
    }

    /// Run one request through the staged pipeline.
    ///
    /// Never returns an error: a stage failure degrades into a report
    /// whose answer names the failure, with zero confidence and no
    /// metrics. Concurrent calls are independent; requests share nothing
    /// but the collaborators.
    pub async fn run(&self, query: &str) -> QueryReport {
        let start_time = Instant::now();
        let mut state = PipelineState::new(query);

        info!(
            request_id = %state.request_id,
            query = %state.query,
            "Pipeline: starting request"
        );

        match self.execute(&mut state).await {
            Ok(()) => build_report(state, start_time),
            Err(e) => {
                warn!(
                    request_id = %state.request_id,
                    error = %e,
                    "Pipeline degraded"
                );
                degraded_report(state, &e, start_time)
            }
        }
    }

    async fn execute(&self, state: &mut PipelineState) -> Result<()> {
        let mut stage = Stage::Decompose;
        while stage != Stage::Done {
            stage = self.step(stage, state).await?;
        }
        Ok(())
    }

    /// Execute one stage and return the next.
    async fn step(&self, stage: Stage, state: &mut PipelineState) -> Result<Stage> {
        match stage {
            Stage::Decompose => {
                self.decompose(state).await;
                Ok(Stage::Retrieve)
            }
            Stage::Retrieve => {
                self.retrieve(state).await?;
                Ok(Stage::Analyze)
            }
            Stage::Analyze => {
                self.analyze(state);
                Ok(Stage::Validate)
            }
            Stage::Validate => {
                self.validate(state);
                Ok(route_after_validate(state))
            }
            Stage::Summarize => {
                self.summarize(state).await?;
                Ok(Stage::Done)
            }
            Stage::Done => Ok(Stage::Done),
        }
    }

    // === DECOMPOSE ===
    async fn decompose(&self, state: &mut PipelineState) {
        state.trace.push("DECOMPOSE: Splitting the question".to_string());

        state.sub_questions = match self.decomposer.decompose(&state.query).await {
            Ok(subs) if !subs.is_empty() => subs,
            Ok(_) => {
                warn!(
                    request_id = %state.request_id,
                    "Decomposer returned nothing, using the original question"
                );
                vec![state.query.clone()]
            }
            Err(e) => {
                warn!(
                    request_id = %state.request_id,
                    error = %e,
                    "Decomposer failed, using the original question"
                );
                vec![state.query.clone()]
            }
        };

        state.trace.push(format!(
            "DECOMPOSE: {} sub-question(s)",
            state.sub_questions.len()
        ));
        debug!(
            request_id = %state.request_id,
            count = state.sub_questions.len(),
            "Decomposition complete"
        );
    }

    // === RETRIEVE ===
    async fn retrieve(&self, state: &mut PipelineState) -> Result<()> {
        state.trace.push("RETRIEVE: Gathering evidence".to_string());

        state.passages = self
            .aggregator
            .gather(&state.sub_questions, self.retriever.as_ref())
            .await?;

        state.trace.push(format!(
            "RETRIEVE: {} unique passage(s)",
            state.passages.len()
        ));

        // Zero evidence is a state, not an error; later stages observe it.
        if state.passages.is_empty() {
            warn!(request_id = %state.request_id, "Retrieval produced no passages");
        }

        Ok(())
    }

    // === ANALYZE ===
    fn analyze(&self, state: &mut PipelineState) {
        state.trace.push("ANALYZE: Extracting metrics".to_string());

        let outcome = analyze_passages(&self.extractor, &state.query, &state.passages);
        state.metrics = outcome.metrics;
        state.ratios = outcome.ratios;
        state.missing_metrics = outcome.missing_metrics;

        state.trace.push(format!(
            "ANALYZE: {} metric(s) found, {} missing",
            state.metrics.len() - state.missing_metrics.len(),
            state.missing_metrics.len()
        ));
    }

    // === VALIDATE ===
    fn validate(&self, state: &mut PipelineState) {
        state.trace.push("VALIDATE: Classifying risk".to_string());

        let assessment = self
            .rule_engine
            .evaluate(&state.ratios, &state.missing_metrics);
        state.risk_flags = assessment.flags;
        state.confidence = assessment.confidence;

        state.trace.push(format!(
            "VALIDATE: {} flag(s), confidence {:.2}",
            state.risk_flags.len(),
            state.confidence
        ));
    }

    // === SUMMARIZE ===
    async fn summarize(&self, state: &mut PipelineState) -> Result<()> {
        state.trace.push("SUMMARIZE: Writing the answer".to_string());

        if state.passages.is_empty() {
            state.final_answer = Some(NO_EVIDENCE_ANSWER.to_string());
            state
                .trace
                .push("SUMMARIZE: No evidence, fixed answer".to_string());
            return Ok(());
        }

        let answer = self
            .narrator
            .summarize(
                &state.query,
                &state.metrics,
                &state.ratios,
                &state.risk_flags,
                &state.passages,
            )
            .await?;

        if answer.trim().is_empty() {
            return Err(AnalysisError::NarrativeError(
                "generator returned empty text".to_string(),
            ));
        }

        state.final_answer = Some(answer);
        Ok(())
    }
}

/// Deduplicate passages into per-page source attributions, ascending by
/// page; the first passage seen for a page supplies the snippet.
fn build_sources(state: &PipelineState) -> Vec<SourceRef> {
    let mut by_page: BTreeMap<u32, String> = BTreeMap::new();
    for passage in &state.passages {
        by_page
            .entry(passage.page_number)
            .or_insert_with(|| passage.snippet());
    }

    by_page
        .into_iter()
        .map(|(page_number, snippet)| SourceRef {
            page_number,
            snippet,
        })
        .collect()
}

fn build_report(state: PipelineState, start_time: Instant) -> QueryReport {
    let sources = build_sources(&state);
    let flags: Vec<String> = state.risk_flags.iter().map(|f| f.message.clone()).collect();

    info!(
        request_id = %state.request_id,
        confidence = state.confidence,
        sources = sources.len(),
        "Pipeline: request complete"
    );

    let answer = match state.final_answer {
        Some(a) => a,
        None => NO_EVIDENCE_ANSWER.to_string(),
    };

    QueryReport {
        request_id: state.request_id,
        answer,
        metrics: state.metrics,
        ratios: state.ratios,
        flags,
        confidence: state.confidence,
        confidence_level: ConfidenceLevel::from_score(state.confidence),
        sources,
        trace: state.trace,
        elapsed_ms: start_time.elapsed().as_millis() as u64,
    }
}

/// Total-failure conversion: the caller still gets a well-formed report,
/// with the failure class named in the answer.
fn degraded_report(state: PipelineState, error: &AnalysisError, start_time: Instant) -> QueryReport {
    let answer = match error {
        AnalysisError::RetrievalError(_) => {
            "The document index could not be searched due to a transient error. Please retry; \
             if the problem persists, re-upload the document."
        }
        AnalysisError::NarrativeError(_) | AnalysisError::LlmError(_) => {
            "The figures were analyzed but the answer could not be written due to a transient \
             error with the language model. Please retry."
        }
        _ => "The analysis could not be completed due to an internal error. Please retry.",
    };

    let mut trace = state.trace;
    trace.push(format!("FAILED: {}", error));

    QueryReport {
        request_id: state.request_id,
        answer: answer.to_string(),
        metrics: BTreeMap::new(),
        ratios: BTreeMap::new(),
        flags: Vec::new(),
        confidence: 0.0,
        confidence_level: ConfidenceLevel::Low,
        sources: Vec::new(),
        trace,
        elapsed_ms: start_time.elapsed().as_millis() as u64,
    }
}

//
// ================= Tests =================
//
