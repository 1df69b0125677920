//! Risk rule engine for ratio classification and confidence scoring
//!
//! Rules-based classification of computed ratios against supervisory
//! thresholds. Deterministic enforcement.

use crate::analysis::metrics::{BASE_METRIC_COUNT, DEBT_TO_EQUITY, INTEREST_COVERAGE};
use crate::finance::round2;
use crate::models::{RiskFlag, RiskSeverity};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Trait for ratio classification rules
pub trait RatioRule: Send + Sync {
    /// Key this rule reads from the ratio map.
    fn ratio_name(&self) -> &'static str;

    /// Classify the value into exactly one flag. An absent value maps to
    /// the Unknown band, never to silence.
    fn evaluate(&self, value: Option<f64>) -> RiskFlag;
}

/// Leverage bands: above `high_above` is High, above `watch_above` is
/// Medium, at or below `watch_above` is Low.
pub struct DebtToEquityRule {
    pub high_above: f64,
    pub watch_above: f64,
}

impl Default for DebtToEquityRule {
    fn default() -> Self {
        Self {
            high_above: 2.33,
            watch_above: 1.5,
        }
    }
}

impl RatioRule for DebtToEquityRule {
    fn ratio_name(&self) -> &'static str {
        DEBT_TO_EQUITY
    }

    fn evaluate(&self, value: Option<f64>) -> RiskFlag {
        match value {
            Some(v) if v > self.high_above => flag(
                DEBT_TO_EQUITY,
                RiskSeverity::High,
                format!(
                    "High Risk: Debt-to-Equity is {:.2} (exceeds the RBI standard norm of 2.0)",
                    v
                ),
            ),
            Some(v) if v > self.watch_above => flag(
                DEBT_TO_EQUITY,
                RiskSeverity::Medium,
                format!(
                    "Medium Risk: Debt-to-Equity is {:.2} (watchlist per SEBI guidelines)",
                    v
                ),
            ),
            Some(v) => flag(
                DEBT_TO_EQUITY,
                RiskSeverity::Low,
                format!(
                    "Low Risk: Debt-to-Equity is {:.2} (compliant with standard norms)",
                    v
                ),
            ),
            None => flag(
                DEBT_TO_EQUITY,
                RiskSeverity::Unknown,
                "Unknown: Debt-to-Equity data missing".to_string(),
            ),
        }
    }
}

/// Coverage bands: below `high_below` is High, below `watch_below` is
/// Medium, at or above `watch_below` is Low.
pub struct InterestCoverageRule {
    pub high_below: f64,
    pub watch_below: f64,
}

impl Default for InterestCoverageRule {
    fn default() -> Self {
        Self {
            high_below: 1.5,
            watch_below: 2.5,
        }
    }
}

impl RatioRule for InterestCoverageRule {
    fn ratio_name(&self) -> &'static str {
        INTEREST_COVERAGE
    }

    fn evaluate(&self, value: Option<f64>) -> RiskFlag {
        match value {
            Some(v) if v < self.high_below => flag(
                INTEREST_COVERAGE,
                RiskSeverity::High,
                format!(
                    "High Risk: Interest Coverage is {:.2} (below the RBI recommended minimum of 1.5)",
                    v
                ),
            ),
            Some(v) if v < self.watch_below => flag(
                INTEREST_COVERAGE,
                RiskSeverity::Medium,
                format!("Medium Risk: Interest Coverage is {:.2}", v),
            ),
            Some(v) => flag(
                INTEREST_COVERAGE,
                RiskSeverity::Low,
                format!("Low Risk: Interest Coverage is {:.2} (healthy per guidelines)", v),
            ),
            None => flag(
                INTEREST_COVERAGE,
                RiskSeverity::Unknown,
                "Unknown: Interest Coverage data missing".to_string(),
            ),
        }
    }
}

fn flag(ratio: &str, severity: RiskSeverity, message: String) -> RiskFlag {
    RiskFlag {
        ratio: ratio.to_string(),
        severity,
        message,
    }
}

/// What the Validate stage produces.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub flags: Vec<RiskFlag>,
    pub confidence: f64,
}

/// Engine that classifies every registered ratio
pub struct RiskRuleEngine {
    rules: Vec<Box<dyn RatioRule>>,
}

impl RiskRuleEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn RatioRule>) {
        self.rules.push(rule);
    }

    /// Classify ratios and score confidence (SYNC, pure over its inputs)
    pub fn evaluate(
        &self,
        ratios: &BTreeMap<String, Option<f64>>,
        missing_metrics: &BTreeSet<String>,
    ) -> RiskAssessment {
        let mut flags = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let value = ratios.get(rule.ratio_name()).copied().flatten();
            flags.push(rule.evaluate(value));
        }

        let confidence = confidence_score(missing_metrics.len());

        info!(
            rule_count = self.rules.len(),
            confidence = confidence,
            "Risk evaluation completed"
        );

        RiskAssessment { flags, confidence }
    }
}

impl Default for RiskRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Coverage-based confidence: the share of the six base metrics that were
/// found, rounded to two decimals, clamped to [0, 1]. Missing conditional
/// metrics also count against the numerator (which can push the raw share
/// negative); the denominator stays fixed at six.
pub fn confidence_score(missing_count: usize) -> f64 {
    let found = BASE_METRIC_COUNT as f64 - missing_count as f64;
    round2(found / BASE_METRIC_COUNT as f64).clamp(0.0, 1.0)
}

/// Create a rule engine with the standard leverage and coverage rules
pub fn create_default_rule_engine() -> RiskRuleEngine {
    let mut engine = RiskRuleEngine::new();
    engine.add_rule(Box::new(DebtToEquityRule::default()));
    engine.add_rule(Box::new(InterestCoverageRule::default()));
    engine
}

//
// ================= Tests =================
//

#[cfg(test)]
mod tests {
    use super::*;

    fn severity_of(rule: &dyn RatioRule, value: Option<f64>) -> RiskSeverity {
        rule.evaluate(value).severity
    }

    #[test]
    fn test_debt_to_equity_bands() {
        let rule = DebtToEquityRule::default();

        assert_eq!(severity_of(&rule, Some(2.34)), RiskSeverity::High);
        assert_eq!(severity_of(&rule, Some(10.0)), RiskSeverity::High);
        // Band upper bounds are inclusive.
        assert_eq!(severity_of(&rule, Some(2.33)), RiskSeverity::Medium);
        assert_eq!(severity_of(&rule, Some(1.57)), RiskSeverity::Medium);
        assert_eq!(severity_of(&rule, Some(1.51)), RiskSeverity::Medium);
        assert_eq!(severity_of(&rule, Some(1.5)), RiskSeverity::Low);
        assert_eq!(severity_of(&rule, Some(0.8)), RiskSeverity::Low);
        assert_eq!(severity_of(&rule, Some(0.0)), RiskSeverity::Low);
        assert_eq!(severity_of(&rule, None), RiskSeverity::Unknown);
    }

    #[test]
    fn test_interest_coverage_bands() {
        let rule = InterestCoverageRule::default();

        assert_eq!(severity_of(&rule, Some(1.49)), RiskSeverity::High);
        assert_eq!(severity_of(&rule, Some(0.0)), RiskSeverity::High);
        assert_eq!(severity_of(&rule, Some(1.5)), RiskSeverity::Medium);
        assert_eq!(severity_of(&rule, Some(2.49)), RiskSeverity::Medium);
        assert_eq!(severity_of(&rule, Some(2.5)), RiskSeverity::Low);
        assert_eq!(severity_of(&rule, Some(4.0)), RiskSeverity::Low);
        assert_eq!(severity_of(&rule, None), RiskSeverity::Unknown);
    }

    #[test]
    fn test_flag_messages_carry_severity_and_value() {
        let rule = DebtToEquityRule::default();
        let f = rule.evaluate(Some(2.5));
        assert!(f.message.starts_with("High Risk:"));
        assert!(f.message.contains("2.50"));
        assert_eq!(f.ratio, DEBT_TO_EQUITY);

        let f = rule.evaluate(None);
        assert!(f.message.contains("data missing"));
    }

    #[test]
    fn test_engine_emits_one_flag_per_ratio() {
        let engine = create_default_rule_engine();

        let mut ratios = BTreeMap::new();
        ratios.insert(DEBT_TO_EQUITY.to_string(), Some(1.57));
        ratios.insert(INTEREST_COVERAGE.to_string(), None);

        let assessment = engine.evaluate(&ratios, &BTreeSet::new());
        assert_eq!(assessment.flags.len(), 2);
        assert_eq!(assessment.flags[0].severity, RiskSeverity::Medium);
        assert_eq!(assessment.flags[1].severity, RiskSeverity::Unknown);
        assert_eq!(assessment.confidence, 1.0);
    }

    #[test]
    fn test_tunable_thresholds() {
        let rule = DebtToEquityRule {
            high_above: 1.0,
            watch_above: 0.5,
        };
        assert_eq!(severity_of(&rule, Some(1.57)), RiskSeverity::High);
        assert_eq!(severity_of(&rule, Some(0.8)), RiskSeverity::Medium);
    }

    #[test]
    fn test_confidence_is_monotonic_in_found_metrics() {
        let expected = [1.0, 0.83, 0.67, 0.5, 0.33, 0.17, 0.0];

        let mut previous = f64::INFINITY;
        for (missing, want) in expected.iter().enumerate() {
            let score = confidence_score(missing);
            assert_eq!(score, *want, "missing={}", missing);
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_confidence_clamps_below_zero() {
        // Six base metrics plus three missing conditional metrics.
        assert_eq!(confidence_score(9), 0.0);
    }

    #[test]
    fn test_confidence_bounds() {
        for missing in 0..=12 {
            let score = confidence_score(missing);
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
