use serde::{Deserialize, Serialize};

/// Headline dashboard figures from `GET /analytics/summary`.
///
/// Replaced wholesale on every successful read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialSummary {
    pub net_worth: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_investments: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_loans: Option<f64>,
    /// Percentage of income saved over the summary window.
    pub savings_rate: f64,
    pub monthly_cash_flow: f64,
}
