//! Metric vocabulary: which figures the analyzer looks for and the
//! statement wording that labels them. Keyword tables are the tunable
//! surface of extraction; the matching algorithm lives in the parent
//! module.

pub const TOTAL_DEBT: &str = "total_debt";
pub const TOTAL_EQUITY: &str = "total_equity";
pub const CURRENT_LIABILITIES: &str = "current_liabilities";
pub const NON_CURRENT_LIABILITIES: &str = "non_current_liabilities";
pub const EBITDA: &str = "EBITDA";
pub const INTEREST_EXPENSE: &str = "interest_expense";

pub const REVENUE: &str = "revenue";
pub const NET_PROFIT: &str = "net_profit";
pub const CASH_FLOW: &str = "cash_flow";

pub const DEBT_TO_EQUITY: &str = "debt_to_equity";
pub const INTEREST_COVERAGE: &str = "interest_coverage";

/// One extractable figure: its canonical key and the lowercase line
/// vocabulary that marks it in a statement.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// The six balance-sheet figures every analysis extracts. Confidence is
/// scored against this set and only this set.
pub const BASE_METRICS: [MetricSpec; 6] = [
    MetricSpec {
        name: TOTAL_DEBT,
        keywords: &["total debt", "total borrowings", "long term borrowings"],
    },
    MetricSpec {
        name: TOTAL_EQUITY,
        keywords: &["total equity", "shareholder's equity", "net worth"],
    },
    MetricSpec {
        name: CURRENT_LIABILITIES,
        keywords: &["current liabilities", "short term borrowings"],
    },
    MetricSpec {
        name: NON_CURRENT_LIABILITIES,
        keywords: &["non-current liabilities", "long term liabilities"],
    },
    MetricSpec {
        name: EBITDA,
        keywords: &["ebitda", "operating profit", "profit before tax"],
    },
    MetricSpec {
        name: INTEREST_EXPENSE,
        keywords: &["finance costs", "interest expense"],
    },
];

pub const BASE_METRIC_COUNT: usize = BASE_METRICS.len();

/// A figure extracted only when the question asks for it: lowercase query
/// vocabulary on the left, metric spec on the right.
#[derive(Debug, Clone, Copy)]
pub struct ConditionalMetric {
    pub triggers: &'static [&'static str],
    pub spec: MetricSpec,
}

pub const CONDITIONAL_METRICS: [ConditionalMetric; 3] = [
    ConditionalMetric {
        triggers: &["revenue", "sales"],
        spec: MetricSpec {
            name: REVENUE,
            keywords: &["revenue from operations", "total revenue", "revenue"],
        },
    },
    ConditionalMetric {
        triggers: &["profit", "net income"],
        spec: MetricSpec {
            name: NET_PROFIT,
            keywords: &["net profit", "profit for the period", "net income"],
        },
    },
    ConditionalMetric {
        triggers: &["cash flow"],
        spec: MetricSpec {
            name: CASH_FLOW,
            keywords: &["cash flow from operating", "net cash from operating"],
        },
    },
];

/// Evaluate the conditional rule table once against the original question.
pub fn conditional_metrics_for(query: &str) -> Vec<&'static MetricSpec> {
    let q = query.to_lowercase();
    CONDITIONAL_METRICS
        .iter()
        .filter(|cm| cm.triggers.iter().any(|t| q.contains(t)))
        .map(|cm| &cm.spec)
        .collect()
}
