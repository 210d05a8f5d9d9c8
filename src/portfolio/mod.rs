//! Figures derived from store state for display: portfolio gains, debt
//! summary, goal progress and chart breakdowns.

mod models;
mod service;

pub use models::{
    BreakdownEntry, DebtOverview, GoalProgress, InvestmentPerformance, LoanStatus,
    PortfolioOverview, RepaymentPriority, SavingsBand,
};
pub use service::{
    breakdown, chart_label, debt_overview, goal_progress, investment_performance, loan_status,
    portfolio_overview, repayment_priority, savings_band, HIGH_INTEREST_THRESHOLD,
};

use crate::store::DashboardState;

/// Everything the dashboard shows besides the raw lists.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DashboardFigures {
    pub portfolio: PortfolioOverview,
    pub debt: DebtOverview,
    pub goals: Vec<GoalProgress>,
    pub savings_band: Option<SavingsBand>,
    pub expense_breakdown: Vec<BreakdownEntry>,
}

impl DashboardFigures {
    pub fn from_state(state: &DashboardState) -> Self {
        Self {
            portfolio: portfolio_overview(&state.investments),
            debt: debt_overview(&state.loans),
            goals: state
                .analytics
                .goals
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(goal_progress)
                .collect(),
            savings_band: state.summary.as_ref().map(|s| savings_band(s.savings_rate)),
            expense_breakdown: state
                .analytics
                .expense
                .as_ref()
                .map(|e| breakdown(&e.category_breakdown))
                .unwrap_or_default(),
        }
    }
}
