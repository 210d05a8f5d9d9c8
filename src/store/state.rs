//! Dashboard state and the reducer that evolves it.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::{
    AnalyticsBundle, Expense, ExpenseAnalytics, FinancialSummary, Goal, Id, Income, Investment,
    InvestmentAnalytics, Loan,
};

/// Recent expenses and income kept in memory, newest first.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Independently refreshed parts of [`DashboardState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slice {
    Summary,
    Investments,
    Loans,
    RecentExpenses,
    RecentIncome,
    ExpenseAnalytics,
    InvestmentAnalytics,
    Goals,
}

impl Slice {
    pub const ALL: [Slice; 8] = [
        Self::Summary,
        Self::Investments,
        Self::Loans,
        Self::RecentExpenses,
        Self::RecentIncome,
        Self::ExpenseAnalytics,
        Self::InvestmentAnalytics,
        Self::Goals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Investments => "investments",
            Self::Loans => "loans",
            Self::RecentExpenses => "recent_expenses",
            Self::RecentIncome => "recent_income",
            Self::ExpenseAnalytics => "expense_analytics",
            Self::InvestmentAnalytics => "investment_analytics",
            Self::Goals => "goals",
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    /// `None` until the first successful summary read.
    pub summary: Option<FinancialSummary>,
    pub investments: Vec<Investment>,
    pub loans: Vec<Loan>,
    pub recent_expenses: Vec<Expense>,
    pub recent_income: Vec<Income>,
    pub analytics: AnalyticsBundle,
    /// Number of batch fetches currently running.
    pub in_flight: usize,
    pub error: Option<String>,
    /// Time of the last data-changing action.
    pub last_updated: Option<DateTime<Utc>>,
    recent_limit: usize,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::with_recent_limit(RECENT_ACTIVITY_LIMIT)
    }
}

impl DashboardState {
    pub fn with_recent_limit(recent_limit: usize) -> Self {
        Self {
            summary: None,
            investments: Vec::new(),
            loans: Vec::new(),
            recent_expenses: Vec::new(),
            recent_income: Vec::new(),
            analytics: AnalyticsBundle::default(),
            in_flight: 0,
            error: None,
            last_updated: None,
            recent_limit: recent_limit.max(1),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FetchStarted,
    FetchFinished,
    SetError(Option<String>),

    SummaryLoaded(FinancialSummary),
    InvestmentsLoaded(Vec<Investment>),
    LoansLoaded(Vec<Loan>),
    RecentExpensesLoaded(Vec<Expense>),
    RecentIncomeLoaded(Vec<Income>),
    ExpenseAnalyticsLoaded(ExpenseAnalytics),
    InvestmentAnalyticsLoaded(InvestmentAnalytics),
    GoalsLoaded(Vec<Goal>),

    InvestmentAdded(Investment),
    InvestmentUpdated(Investment),
    InvestmentRemoved(Id),
    LoanAdded(Loan),
    LoanUpdated(Loan),
    LoanRemoved(Id),
    ExpenseAdded(Expense),
    IncomeAdded(Income),

    /// Drop all data, e.g. on sign-out. In-flight counters are kept.
    Reset,
}

impl Action {
    /// The slice a data action writes, if any.
    pub fn slice(&self) -> Option<Slice> {
        match self {
            Self::SummaryLoaded(_) => Some(Slice::Summary),
            Self::InvestmentsLoaded(_)
            | Self::InvestmentAdded(_)
            | Self::InvestmentUpdated(_)
            | Self::InvestmentRemoved(_) => Some(Slice::Investments),
            Self::LoansLoaded(_)
            | Self::LoanAdded(_)
            | Self::LoanUpdated(_)
            | Self::LoanRemoved(_) => Some(Slice::Loans),
            Self::RecentExpensesLoaded(_) | Self::ExpenseAdded(_) => Some(Slice::RecentExpenses),
            Self::RecentIncomeLoaded(_) | Self::IncomeAdded(_) => Some(Slice::RecentIncome),
            Self::ExpenseAnalyticsLoaded(_) => Some(Slice::ExpenseAnalytics),
            Self::InvestmentAnalyticsLoaded(_) => Some(Slice::InvestmentAnalytics),
            Self::GoalsLoaded(_) => Some(Slice::Goals),
            Self::FetchStarted | Self::FetchFinished | Self::SetError(_) | Self::Reset => None,
        }
    }
}

/// Apply `action` to `state`. Data actions stamp `last_updated` with `now`.
pub fn reduce(mut state: DashboardState, action: Action, now: DateTime<Utc>) -> DashboardState {
    let touches_data = action.slice().is_some();
    let limit = state.recent_limit;

    match action {
        Action::FetchStarted => state.in_flight += 1,
        Action::FetchFinished => state.in_flight = state.in_flight.saturating_sub(1),
        Action::SetError(error) => state.error = error,

        Action::SummaryLoaded(summary) => state.summary = Some(summary),
        Action::InvestmentsLoaded(items) => state.investments = items,
        Action::LoansLoaded(items) => state.loans = items,
        Action::RecentExpensesLoaded(mut items) => {
            items.truncate(limit);
            state.recent_expenses = items;
        }
        Action::RecentIncomeLoaded(mut items) => {
            items.truncate(limit);
            state.recent_income = items;
        }
        Action::ExpenseAnalyticsLoaded(analytics) => state.analytics.expense = Some(analytics),
        Action::InvestmentAnalyticsLoaded(analytics) => {
            state.analytics.investment = Some(analytics)
        }
        Action::GoalsLoaded(goals) => state.analytics.goals = Some(goals),

        Action::InvestmentAdded(investment) => state.investments.push(investment),
        Action::InvestmentUpdated(investment) => {
            if let Some(slot) = state.investments.iter_mut().find(|i| i.id == investment.id) {
                *slot = investment;
            }
        }
        Action::InvestmentRemoved(id) => state.investments.retain(|i| i.id != id),
        Action::LoanAdded(loan) => state.loans.push(loan),
        Action::LoanUpdated(loan) => {
            if let Some(slot) = state.loans.iter_mut().find(|l| l.id == loan.id) {
                *slot = loan;
            }
        }
        Action::LoanRemoved(id) => state.loans.retain(|l| l.id != id),
        Action::ExpenseAdded(expense) => {
            state.recent_expenses.insert(0, expense);
            state.recent_expenses.truncate(limit);
        }
        Action::IncomeAdded(income) => {
            state.recent_income.insert(0, income);
            state.recent_income.truncate(limit);
        }

        Action::Reset => {
            let in_flight = state.in_flight;
            state = DashboardState::with_recent_limit(limit);
            state.in_flight = in_flight;
        }
    }

    if touches_data {
        state.last_updated = Some(now);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvestmentType, LoanType};
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn expense(id: &str) -> Expense {
        Expense {
            id: Id::from(id),
            category: "food".to_string(),
            amount: 500.0,
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            merchant: None,
        }
    }

    fn investment(id: &str, amount: f64) -> Investment {
        Investment {
            id: Id::from(id),
            kind: InvestmentType::Stocks,
            name: format!("inv {id}"),
            amount,
            current_value: None,
            date: None,
            goal: None,
            description: None,
        }
    }

    fn loan(id: &str) -> Loan {
        Loan {
            id: Id::from(id),
            kind: LoanType::HomeLoan,
            bank_name: None,
            amount: 100.0,
            outstanding: 50.0,
            interest_rate: 8.0,
            emi: None,
            tenure_months: None,
            date: None,
            description: None,
        }
    }

    #[test]
    fn loading_counts_overlapping_fetches() {
        let mut state = DashboardState::default();
        state = reduce(state, Action::FetchStarted, now());
        state = reduce(state, Action::FetchStarted, now());
        state = reduce(state, Action::FetchFinished, now());
        assert!(state.is_loading());
        state = reduce(state, Action::FetchFinished, now());
        assert!(!state.is_loading());
        state = reduce(state, Action::FetchFinished, now());
        assert_eq!(state.in_flight, 0);
        assert_eq!(state.last_updated, None);
    }

    #[test]
    fn added_expense_goes_first_and_list_is_capped() {
        let mut state = DashboardState::default();
        let initial: Vec<_> = (0..10).map(|i| expense(&format!("old{i}"))).collect();
        state = reduce(state, Action::RecentExpensesLoaded(initial), now());
        state = reduce(state, Action::ExpenseAdded(expense("new")), now());
        assert_eq!(state.recent_expenses.len(), RECENT_ACTIVITY_LIMIT);
        assert_eq!(state.recent_expenses[0].id.as_str(), "new");
        assert_eq!(state.recent_expenses[9].id.as_str(), "old8");
    }

    #[test]
    fn loaded_lists_are_capped_too() {
        let state = DashboardState::with_recent_limit(3);
        let loaded: Vec<_> = (0..5).map(|i| expense(&format!("e{i}"))).collect();
        let state = reduce(state, Action::RecentExpensesLoaded(loaded), now());
        assert_eq!(state.recent_expenses.len(), 3);
    }

    #[test]
    fn investment_update_and_remove_match_by_id() {
        let mut state = DashboardState::default();
        state = reduce(
            state,
            Action::InvestmentsLoaded(vec![investment("a", 1.0), investment("b", 2.0)]),
            now(),
        );
        state = reduce(state, Action::InvestmentUpdated(investment("b", 5.0)), now());
        assert_eq!(state.investments[1].amount, 5.0);

        state = reduce(state, Action::InvestmentUpdated(investment("zzz", 9.0)), now());
        assert_eq!(state.investments.len(), 2);

        state = reduce(state, Action::InvestmentRemoved(Id::from("a")), now());
        assert_eq!(state.investments.len(), 1);
        assert!(state.investments.iter().all(|i| i.id.as_str() != "a"));
    }

    #[test]
    fn loan_mutations() {
        let mut state = DashboardState::default();
        state = reduce(state, Action::LoanAdded(loan("l1")), now());
        state = reduce(state, Action::LoanAdded(loan("l2")), now());
        let mut updated = loan("l1");
        updated.outstanding = 10.0;
        state = reduce(state, Action::LoanUpdated(updated), now());
        state = reduce(state, Action::LoanRemoved(Id::from("l2")), now());
        assert_eq!(state.loans.len(), 1);
        assert_eq!(state.loans[0].outstanding, 10.0);
    }

    #[test]
    fn data_actions_stamp_last_updated_but_error_does_not() {
        let state = reduce(DashboardState::default(), Action::SetError(Some("x".into())), now());
        assert_eq!(state.last_updated, None);
        let state = reduce(state, Action::SummaryLoaded(FinancialSummary::default()), now());
        assert_eq!(state.last_updated, Some(now()));
        assert_eq!(state.error.as_deref(), Some("x"));
    }

    #[test]
    fn analytics_parts_are_independent() {
        let mut state = DashboardState::default();
        state = reduce(state, Action::GoalsLoaded(Vec::new()), now());
        assert_eq!(state.analytics.goals, Some(Vec::new()));
        assert_eq!(state.analytics.expense, None);
        assert_eq!(state.analytics.investment, None);
    }

    #[test]
    fn reset_keeps_in_flight_count() {
        let mut state = DashboardState::with_recent_limit(4);
        state = reduce(state, Action::FetchStarted, now());
        state = reduce(state, Action::InvestmentAdded(investment("a", 1.0)), now());
        state = reduce(state, Action::Reset, now());
        assert!(state.investments.is_empty());
        assert!(state.is_loading());
        assert_eq!(state.recent_limit(), 4);
        assert_eq!(state.last_updated, None);
    }
}
