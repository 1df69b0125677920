//! Numeric utilities for financial statements: token parsing and ratio
//! computation. Both are leaf functions with no IO; extraction and
//! validation build on top of them.

use crate::error::{AnalysisError, Result};

/// Parse a single numeric token the way it appears in annual reports:
/// thousands separators (Western `1,234,567` or Indian `1,20,500`) and the
/// accounting convention of parenthesized negatives (`(500)` is -500).
///
/// Failure is recoverable by contract: callers skip the token.
pub fn parse_financial_value(token: &str) -> Result<f64> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::ParseError("empty token".to_string()));
    }

    // Parenthesized figures are negative. The sign is prepended before the
    // final parse, so a redundant inner sign still fails.
    let normalized = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => format!("-{}", inner),
        None => trimmed.to_string(),
    };

    let cleaned = normalized.replace(',', "");
    let value = cleaned
        .trim()
        .parse::<f64>()
        .map_err(|_| AnalysisError::ParseError(format!("not a numeric token: {:?}", token)))?;

    if !value.is_finite() {
        return Err(AnalysisError::ParseError(format!(
            "non-finite value: {:?}",
            token
        )));
    }

    Ok(value)
}

/// Derived-ratio arithmetic shared by every ratio the pipeline computes.
/// Absent inputs propagate as absence. A present-but-zero denominator
/// deliberately yields 0.0, not absence. Produced values are always finite:
/// the check runs on the rounded result, since the rounding itself scales by
/// 100 and can overflow quotients that were still finite.
pub fn calculate_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let n = numerator?;
    let d = denominator?;

    if d == 0.0 {
        return Some(0.0);
    }

    let ratio = round2(n / d);
    if !ratio.is_finite() {
        return None;
    }

    Some(ratio)
}

/// Round to two decimal places, half away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_financial_value("500").unwrap(), 500.0);
        assert_eq!(parse_financial_value(" 450.75 ").unwrap(), 450.75);
    }

    #[test]
    fn test_parse_western_grouping() {
        assert_eq!(parse_financial_value("626,130").unwrap(), 626130.0);
        assert_eq!(parse_financial_value("1,234,567.89").unwrap(), 1234567.89);
    }

    #[test]
    fn test_parse_indian_grouping() {
        assert_eq!(parse_financial_value("1,20,500").unwrap(), 120500.0);
        assert_eq!(parse_financial_value("12,34,567").unwrap(), 1234567.0);
    }

    #[test]
    fn test_parse_parenthesized_negative() {
        assert_eq!(parse_financial_value("(500)").unwrap(), -500.0);
        assert_eq!(parse_financial_value("(1,234.50)").unwrap(), -1234.50);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_financial_value("abc").is_err());
        assert!(parse_financial_value("12a4").is_err());
        assert!(parse_financial_value("").is_err());
        assert!(parse_financial_value("   ").is_err());
        // Redundant sign inside parentheses is malformed, same as the
        // behavior this parser was modeled on.
        assert!(parse_financial_value("(-500)").is_err());
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        assert!(parse_financial_value("inf").is_err());
        assert!(parse_financial_value("NaN").is_err());
    }

    #[test]
    fn test_ratio_absent_inputs_propagate() {
        assert_eq!(calculate_ratio(None, Some(2.0)), None);
        assert_eq!(calculate_ratio(Some(2.0), None), None);
        assert_eq!(calculate_ratio(None, None), None);
    }

    #[test]
    fn test_ratio_zero_denominator_is_zero() {
        assert_eq!(calculate_ratio(Some(100.0), Some(0.0)), Some(0.0));
    }

    #[test]
    fn test_ratio_rounds_to_two_decimals() {
        assert_eq!(calculate_ratio(Some(626_130.0), Some(400_000.0)), Some(1.57));
        assert_eq!(calculate_ratio(Some(10.0), Some(3.0)), Some(3.33));
        assert_eq!(calculate_ratio(Some(-100.0), Some(50.0)), Some(-2.0));
    }

    #[test]
    fn test_ratio_non_finite_results_are_none() {
        // The rounding step scales by 100, so a quotient within two orders
        // of magnitude of f64::MAX overflows it even though the division
        // itself was finite.
        assert_eq!(calculate_ratio(Some(1.0e307), Some(1.0)), None);
        assert_eq!(calculate_ratio(Some(1.0e300), Some(1.0e-8)), None);
        // A quotient that overflows outright is absence too.
        assert_eq!(calculate_ratio(Some(f64::MAX), Some(0.5)), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.565325), 1.57);
        assert_eq!(round2(0.833333), 0.83);
        assert_eq!(round2(-2.346), -2.35);
    }
}
