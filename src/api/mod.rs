//! REST client for the finance backend.
//!
//! [`ApiClient`] is the only network boundary. The store talks to it through
//! the [`FinanceBackend`] trait so tests can substitute a scripted backend.

mod analytics;
mod auth;
mod chat;
mod client;
mod finance;

pub use client::ApiClient;
pub use finance::{ListQuery, Resource};

use async_trait::async_trait;

use crate::models::{
    Expense, ExpenseAnalytics, ExpenseInput, FinancialSummary, Goal, Id, Income, IncomeInput,
    Investment, InvestmentAnalytics, InvestmentInput, Loan, LoanInput,
};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure of a single request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 401. For an authenticated request this also ends the session.
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid id {0:?}: ids must be a single path segment")]
    InvalidId(String),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Errors that automatic refreshes swallow: timeouts and transport failures.
    pub fn is_background_safe(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for a notification.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Reads and writes the dashboard store depends on.
#[async_trait]
pub trait FinanceBackend: Send + Sync {
    async fn summary(&self) -> ApiResult<FinancialSummary>;
    async fn investments(&self) -> ApiResult<Vec<Investment>>;
    async fn loans(&self) -> ApiResult<Vec<Loan>>;
    async fn recent_expenses(&self, limit: usize) -> ApiResult<Vec<Expense>>;
    async fn recent_income(&self, limit: usize) -> ApiResult<Vec<Income>>;
    async fn expense_analytics(&self, months: u32) -> ApiResult<ExpenseAnalytics>;
    async fn investment_analytics(&self) -> ApiResult<InvestmentAnalytics>;
    async fn goals(&self, limit: usize) -> ApiResult<Vec<Goal>>;

    async fn create_investment(&self, input: &InvestmentInput) -> ApiResult<Investment>;
    async fn update_investment(&self, id: &Id, input: &InvestmentInput) -> ApiResult<Investment>;
    async fn delete_investment(&self, id: &Id) -> ApiResult<()>;

    async fn create_loan(&self, input: &LoanInput) -> ApiResult<Loan>;
    async fn update_loan(&self, id: &Id, input: &LoanInput) -> ApiResult<Loan>;
    async fn delete_loan(&self, id: &Id) -> ApiResult<()>;

    async fn create_expense(&self, input: &ExpenseInput) -> ApiResult<Expense>;
    async fn create_income(&self, input: &IncomeInput) -> ApiResult<Income>;
}

#[async_trait]
impl FinanceBackend for ApiClient {
    async fn summary(&self) -> ApiResult<FinancialSummary> {
        self.financial_summary().await
    }

    async fn investments(&self) -> ApiResult<Vec<Investment>> {
        self.list_investments(&ListQuery::default()).await
    }

    async fn loans(&self) -> ApiResult<Vec<Loan>> {
        self.list_loans(&ListQuery::default()).await
    }

    async fn recent_expenses(&self, limit: usize) -> ApiResult<Vec<Expense>> {
        self.list_expenses(&ListQuery::limit(limit)).await
    }

    async fn recent_income(&self, limit: usize) -> ApiResult<Vec<Income>> {
        self.list_income(&ListQuery::limit(limit)).await
    }

    async fn expense_analytics(&self, months: u32) -> ApiResult<ExpenseAnalytics> {
        ApiClient::expense_analytics(self, Some(months)).await
    }

    async fn investment_analytics(&self) -> ApiResult<InvestmentAnalytics> {
        ApiClient::investment_analytics(self).await
    }

    async fn goals(&self, limit: usize) -> ApiResult<Vec<Goal>> {
        self.list_goals(&ListQuery::limit(limit)).await
    }

    async fn create_investment(&self, input: &InvestmentInput) -> ApiResult<Investment> {
        ApiClient::create_investment(self, input).await
    }

    async fn update_investment(&self, id: &Id, input: &InvestmentInput) -> ApiResult<Investment> {
        ApiClient::update_investment(self, id, input).await
    }

    async fn delete_investment(&self, id: &Id) -> ApiResult<()> {
        ApiClient::delete_investment(self, id).await
    }

    async fn create_loan(&self, input: &LoanInput) -> ApiResult<Loan> {
        ApiClient::create_loan(self, input).await
    }

    async fn update_loan(&self, id: &Id, input: &LoanInput) -> ApiResult<Loan> {
        ApiClient::update_loan(self, id, input).await
    }

    async fn delete_loan(&self, id: &Id) -> ApiResult<()> {
        ApiClient::delete_loan(self, id).await
    }

    async fn create_expense(&self, input: &ExpenseInput) -> ApiResult<Expense> {
        ApiClient::create_expense(self, input).await
    }

    async fn create_income(&self, input: &IncomeInput) -> ApiResult<Income> {
        ApiClient::create_income(self, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(ApiError::Timeout.is_background_safe());
        assert!(ApiError::Network("reset".into()).is_background_safe());
        let unauthorized = ApiError::Unauthorized {
            message: "Invalid token".into(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_background_safe());
        assert_eq!(unauthorized.status(), Some(401));

        let http = ApiError::Http {
            status: 422,
            message: "Amount must be positive".into(),
        };
        assert_eq!(http.user_message(), "Amount must be positive");
        assert_eq!(http.status(), Some(422));
    }
}
