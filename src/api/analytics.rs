//! Read-only `/analytics/*` endpoints.

use super::{ApiClient, ApiResult};
use crate::models::{
    ExpenseAnalytics, FinancialSummary, Goal, IncomeAnalytics, InvestmentAnalytics,
    MonthlyComparison,
};

fn months_param(months: Option<u32>) -> Vec<(&'static str, String)> {
    months
        .map(|m| vec![("months", m.to_string())])
        .unwrap_or_default()
}

impl ApiClient {
    pub async fn financial_summary(&self) -> ApiResult<FinancialSummary> {
        self.get("/analytics/summary", &[]).await
    }

    pub async fn expense_analytics(&self, months: Option<u32>) -> ApiResult<ExpenseAnalytics> {
        self.get("/analytics/expenses", &months_param(months)).await
    }

    pub async fn investment_analytics(&self) -> ApiResult<InvestmentAnalytics> {
        self.get("/analytics/investments", &[]).await
    }

    pub async fn income_analytics(&self, months: Option<u32>) -> ApiResult<IncomeAnalytics> {
        self.get("/analytics/income", &months_param(months)).await
    }

    /// The backend's trend payload has no fixed shape, so it is passed through as JSON.
    pub async fn spending_trends(&self, months: Option<u32>) -> ApiResult<serde_json::Value> {
        self.get("/analytics/spending-trends", &months_param(months))
            .await
    }

    pub async fn goal_progress(&self) -> ApiResult<Vec<Goal>> {
        self.get_list("/analytics/goal-progress", &[]).await
    }

    pub async fn monthly_comparison(
        &self,
        months: Option<u32>,
    ) -> ApiResult<Vec<MonthlyComparison>> {
        self.get_list("/analytics/monthly-comparison", &months_param(months))
            .await
    }
}
