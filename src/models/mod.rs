//! Wire types exchanged with the finance backend.

mod analytics;
mod chat;
mod date;
mod id;
mod investment;
mod loan;
mod planning;
mod summary;
mod transaction;
mod user;

pub use analytics::{
    AnalyticsBundle, ExpenseAnalytics, IncomeAnalytics, InvestmentAnalytics, MonthLabel,
    MonthlyAmount, MonthlyComparison,
};
pub use chat::{ChatReply, ChatRequest, Suggestions};
pub use id::Id;
pub use investment::{Investment, InvestmentInput, InvestmentType};
pub use loan::{Loan, LoanInput, LoanType};
pub use planning::{Budget, BudgetInput, Goal, GoalInput, Insurance, InsuranceInput};
pub use summary::FinancialSummary;
pub use transaction::{Expense, ExpenseInput, Income, IncomeInput};
pub use user::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User};
