use serde::Serialize;

use crate::models::{Id, InvestmentType, LoanType};

/// One labelled value for a pie or bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub key: String,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentPerformance {
    pub id: Id,
    pub name: String,
    pub kind: InvestmentType,
    pub invested: f64,
    pub current_value: f64,
    pub gain: f64,
    pub gain_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioOverview {
    pub total_invested: f64,
    pub total_current_value: f64,
    pub total_gain: f64,
    pub gain_percent: f64,
    /// Current value per investment type, largest first.
    pub by_type: Vec<BreakdownEntry>,
    pub holdings: Vec<InvestmentPerformance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepaymentPriority {
    Low,
    Medium,
    High,
}

impl RepaymentPriority {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Low => "Low interest rate",
            Self::Medium => "Moderate interest rate",
            Self::High => "High interest rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanStatus {
    pub id: Id,
    pub kind: LoanType,
    pub bank_name: Option<String>,
    pub amount: f64,
    pub outstanding: f64,
    pub interest_rate: f64,
    pub emi: Option<f64>,
    pub repaid_percent: f64,
    /// `None` when there is no EMI or nothing outstanding.
    pub months_remaining: Option<u32>,
    pub priority: RepaymentPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtOverview {
    pub total_amount: f64,
    pub total_outstanding: f64,
    pub total_emi: f64,
    /// Interest rate weighted by outstanding balance.
    pub weighted_interest_rate: f64,
    pub repaid_percent: f64,
    /// Outstanding balance per loan type, largest first.
    pub by_type: Vec<BreakdownEntry>,
    /// Loans above the high-interest threshold, highest rate first.
    pub high_interest: Vec<LoanStatus>,
    pub loans: Vec<LoanStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub id: Id,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    /// Uncapped progress.
    pub progress_percent: f64,
}

impl GoalProgress {
    /// Progress as shown on a bar, capped at 100.
    pub fn display_percent(&self) -> f64 {
        self.progress_percent.min(100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsBand {
    Negative,
    Low,
    Moderate,
    Healthy,
}

impl SavingsBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::Healthy => "Healthy",
        }
    }
}
