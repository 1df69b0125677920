//! Keyword-driven metric extraction over retrieved passages
//!
//! Deliberately low-tech: financial statements put the figure on the same
//! line as its label, so extraction scans lines for label vocabulary and
//! takes the numeric tokens standing alongside. Best effort by contract:
//! an absent metric is None, never an error.

pub mod metrics;

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::finance::{calculate_ratio, parse_financial_value};
use crate::models::Passage;
use metrics::{
    conditional_metrics_for, BASE_METRICS, DEBT_TO_EQUITY, EBITDA, INTEREST_COVERAGE,
    INTEREST_EXPENSE, TOTAL_DEBT, TOTAL_EQUITY,
};

lazy_static! {
    // Optional minus, 1-3 leading digits, comma groups of 2-3 digits
    // (covers Western 1,234,567 and Indian 1,20,500 grouping), optional
    // decimal fraction.
    static ref NUMBER_RE: Regex = Regex::new(r"-?\d{1,3}(?:,\d{2,3})*(?:\.\d+)?").unwrap();
}

/// Line-oriented extraction with a tunable preference for statement-scale
/// figures over the small integers that share their lines.
#[derive(Debug, Clone)]
pub struct MetricExtractor {
    /// Values whose magnitude exceeds this floor win within a line. Note
    /// references, serial numbers and year labels sit below it.
    pub large_value_floor: f64,
}

impl Default for MetricExtractor {
    fn default() -> Self {
        Self {
            large_value_floor: 1000.0,
        }
    }
}

impl MetricExtractor {
    pub fn new(large_value_floor: f64) -> Self {
        Self { large_value_floor }
    }

    /// Scan `text` line by line for any of `keywords` (case-insensitive
    /// substring match) and pull the numeric value standing next to the
    /// label.
    ///
    /// Within a line: the last value above the floor, else the last value.
    /// Across lines: the last matching line that yielded at least one
    /// parseable token wins; a matching line with no tokens does not clear
    /// an earlier result.
    pub fn extract(&self, text: &str, keywords: &[&str]) -> Option<f64> {
        let mut best: Option<f64> = None;

        for line in text.lines() {
            let lower = line.to_lowercase();
            if !keywords.iter().any(|kw| lower.contains(kw)) {
                continue;
            }

            let values: Vec<f64> = NUMBER_RE
                .find_iter(line)
                .filter_map(|m| parse_financial_value(m.as_str()).ok())
                .collect();
            if values.is_empty() {
                continue;
            }

            best = values
                .iter()
                .rev()
                .find(|v| v.abs() > self.large_value_floor)
                .or_else(|| values.last())
                .copied();
        }

        best
    }
}

/// Everything the Analyze stage produces.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub metrics: BTreeMap<String, Option<f64>>,
    pub ratios: BTreeMap<String, Option<f64>>,
    pub missing_metrics: BTreeSet<String>,
}

/// Extract the six base metrics plus whatever the question conditionally
/// asks for, then derive the two ratios. The conditional rule table is
/// evaluated once, against the original query.
pub fn analyze_passages(
    extractor: &MetricExtractor,
    query: &str,
    passages: &[Passage],
) -> AnalysisOutcome {
    let text = passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let mut metrics: BTreeMap<String, Option<f64>> = BTreeMap::new();
    for spec in BASE_METRICS.iter() {
        metrics.insert(spec.name.to_string(), extractor.extract(&text, spec.keywords));
    }
    for spec in conditional_metrics_for(query) {
        metrics.insert(spec.name.to_string(), extractor.extract(&text, spec.keywords));
    }

    let mut ratios: BTreeMap<String, Option<f64>> = BTreeMap::new();
    ratios.insert(
        DEBT_TO_EQUITY.to_string(),
        calculate_ratio(metric(&metrics, TOTAL_DEBT), metric(&metrics, TOTAL_EQUITY)),
    );
    ratios.insert(
        INTEREST_COVERAGE.to_string(),
        calculate_ratio(metric(&metrics, EBITDA), metric(&metrics, INTEREST_EXPENSE)),
    );

    let missing_metrics: BTreeSet<String> = metrics
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| k.clone())
        .collect();

    debug!(
        extracted = metrics.len() - missing_metrics.len(),
        missing = missing_metrics.len(),
        "metric extraction complete"
    );

    AnalysisOutcome {
        metrics,
        ratios,
        missing_metrics,
    }
}

fn metric(metrics: &BTreeMap<String, Option<f64>>, name: &str) -> Option<f64> {
    metrics.get(name).copied().flatten()
}
