use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Goal;

/// One point of a monthly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAmount {
    pub month: MonthLabel,
    #[serde(default)]
    pub amount: f64,
}

/// Months come back either as a label (`"2024-01"`, `"Jan"`) or a month number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonthLabel {
    Number(u32),
    Text(String),
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// `GET /analytics/expenses?months=N`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseAnalytics {
    /// Total spent per category over the window.
    pub category_breakdown: BTreeMap<String, f64>,
    pub monthly_trend: Vec<MonthlyAmount>,
}

/// `GET /analytics/investments`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentAnalytics {
    /// Current value per investment type.
    pub portfolio_breakdown: BTreeMap<String, f64>,
    /// Portfolio growth in percent.
    pub growth_rate: f64,
}

/// `GET /analytics/income?months=N`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeAnalytics {
    pub source_breakdown: BTreeMap<String, f64>,
    pub monthly_trend: Vec<MonthlyAmount>,
}

/// One row of `GET /analytics/monthly-comparison`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyComparison {
    pub month: MonthLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expenses: f64,
}

impl MonthlyComparison {
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{}/{year}", self.month),
            None => self.month.to_string(),
        }
    }

    pub fn savings(&self) -> f64 {
        self.income - self.expenses
    }

    /// Savings as a percentage of income; 0 when there was no income.
    pub fn savings_rate(&self) -> f64 {
        if self.income > 0.0 {
            self.savings() / self.income * 100.0
        } else {
            0.0
        }
    }
}

/// The analytics slices the dashboard keeps.
///
/// Each part is set independently; a part is `None` until its first successful read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsBundle {
    pub expense: Option<ExpenseAnalytics>,
    pub investment: Option<InvestmentAnalytics>,
    pub goals: Option<Vec<Goal>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_analytics_with_string_and_numeric_months() {
        let analytics: ExpenseAnalytics = serde_json::from_str(
            r#"{
                "category_breakdown": {"food": 12000, "rent": 30000},
                "monthly_trend": [{"month": "2024-01", "amount": 42000}, {"month": 2, "amount": 39000}]
            }"#,
        )
        .unwrap();
        assert_eq!(analytics.category_breakdown["rent"], 30_000.0);
        assert_eq!(analytics.monthly_trend[0].month.to_string(), "2024-01");
        assert_eq!(analytics.monthly_trend[1].month, MonthLabel::Number(2));
    }

    #[test]
    fn monthly_comparison_derivations() {
        let row: MonthlyComparison =
            serde_json::from_str(r#"{"month": 3, "year": 2024, "income": 100000, "expenses": 75000}"#)
                .unwrap();
        assert_eq!(row.label(), "3/2024");
        assert_eq!(row.savings(), 25_000.0);
        assert_eq!(row.savings_rate(), 25.0);

        let empty: MonthlyComparison = serde_json::from_str(r#"{"month": "Apr"}"#).unwrap();
        assert_eq!(empty.savings_rate(), 0.0);
    }
}
