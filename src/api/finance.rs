//! `/finance/*` CRUD endpoints.

use std::fmt;

use super::{ApiClient, ApiResult};
use crate::models::{
    Budget, BudgetInput, Expense, ExpenseInput, Goal, GoalInput, Id, Income, IncomeInput,
    Insurance, InsuranceInput, Investment, InvestmentInput, Loan, LoanInput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Income,
    Expenses,
    Investments,
    Loans,
    Insurance,
    Budgets,
    Goals,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Self::Income,
        Self::Expenses,
        Self::Investments,
        Self::Loans,
        Self::Insurance,
        Self::Budgets,
        Self::Goals,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Income => "/finance/income",
            Self::Expenses => "/finance/expenses",
            Self::Investments => "/finance/investments",
            Self::Loans => "/finance/loans",
            Self::Insurance => "/finance/insurance",
            Self::Budgets => "/finance/budgets",
            Self::Goals => "/finance/goals",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().trim_start_matches("/finance/"))
    }
}

/// Optional query parameters for list reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl ListQuery {
    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            skip: None,
        }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        pairs
    }
}

impl ApiClient {
    pub async fn list<T: serde::de::DeserializeOwned>(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> ApiResult<Vec<T>> {
        self.get_list(resource.path(), &query.pairs()).await
    }

    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> ApiResult<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: serde::de::DeserializeOwned,
    {
        self.post(resource.path(), body).await
    }

    pub async fn update<B, T>(&self, resource: Resource, id: &Id, body: &B) -> ApiResult<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: serde::de::DeserializeOwned,
    {
        let path = Self::item_path(resource.path(), id)?;
        self.put(&path, body).await
    }

    pub async fn remove(&self, resource: Resource, id: &Id) -> ApiResult<()> {
        let path = Self::item_path(resource.path(), id)?;
        self.delete(&path).await
    }

    pub async fn list_income(&self, query: &ListQuery) -> ApiResult<Vec<Income>> {
        self.list(Resource::Income, query).await
    }

    pub async fn create_income(&self, input: &IncomeInput) -> ApiResult<Income> {
        self.create(Resource::Income, input).await
    }

    pub async fn update_income(&self, id: &Id, input: &IncomeInput) -> ApiResult<Income> {
        self.update(Resource::Income, id, input).await
    }

    pub async fn delete_income(&self, id: &Id) -> ApiResult<()> {
        self.remove(Resource::Income, id).await
    }

    pub async fn list_expenses(&self, query: &ListQuery) -> ApiResult<Vec<Expense>> {
        self.list(Resource::Expenses, query).await
    }

    pub async fn create_expense(&self, input: &ExpenseInput) -> ApiResult<Expense> {
        self.create(Resource::Expenses, input).await
    }

    pub async fn update_expense(&self, id: &Id, input: &ExpenseInput) -> ApiResult<Expense> {
        self.update(Resource::Expenses, id, input).await
    }

    pub async fn delete_expense(&self, id: &Id) -> ApiResult<()> {
        self.remove(Resource::Expenses, id).await
    }

    pub async fn list_investments(&self, query: &ListQuery) -> ApiResult<Vec<Investment>> {
        self.list(Resource::Investments, query).await
    }

    pub async fn create_investment(&self, input: &InvestmentInput) -> ApiResult<Investment> {
        self.create(Resource::Investments, input).await
    }

    pub async fn update_investment(
        &self,
        id: &Id,
        input: &InvestmentInput,
    ) -> ApiResult<Investment> {
        self.update(Resource::Investments, id, input).await
    }

    pub async fn delete_investment(&self, id: &Id) -> ApiResult<()> {
        self.remove(Resource::Investments, id).await
    }

    pub async fn list_loans(&self, query: &ListQuery) -> ApiResult<Vec<Loan>> {
        self.list(Resource::Loans, query).await
    }

    pub async fn create_loan(&self, input: &LoanInput) -> ApiResult<Loan> {
        self.create(Resource::Loans, input).await
    }

    pub async fn update_loan(&self, id: &Id, input: &LoanInput) -> ApiResult<Loan> {
        self.update(Resource::Loans, id, input).await
    }

    pub async fn delete_loan(&self, id: &Id) -> ApiResult<()> {
        self.remove(Resource::Loans, id).await
    }

    pub async fn list_insurance(&self, query: &ListQuery) -> ApiResult<Vec<Insurance>> {
        self.list(Resource::Insurance, query).await
    }

    pub async fn create_insurance(&self, input: &InsuranceInput) -> ApiResult<Insurance> {
        self.create(Resource::Insurance, input).await
    }

    pub async fn update_insurance(&self, id: &Id, input: &InsuranceInput) -> ApiResult<Insurance> {
        self.update(Resource::Insurance, id, input).await
    }

    pub async fn delete_insurance(&self, id: &Id) -> ApiResult<()> {
        self.remove(Resource::Insurance, id).await
    }

    pub async fn list_budgets(&self, query: &ListQuery) -> ApiResult<Vec<Budget>> {
        self.list(Resource::Budgets, query).await
    }

    pub async fn create_budget(&self, input: &BudgetInput) -> ApiResult<Budget> {
        self.create(Resource::Budgets, input).await
    }

    pub async fn update_budget(&self, id: &Id, input: &BudgetInput) -> ApiResult<Budget> {
        self.update(Resource::Budgets, id, input).await
    }

    pub async fn delete_budget(&self, id: &Id) -> ApiResult<()> {
        self.remove(Resource::Budgets, id).await
    }

    pub async fn list_goals(&self, query: &ListQuery) -> ApiResult<Vec<Goal>> {
        self.list(Resource::Goals, query).await
    }

    pub async fn create_goal(&self, input: &GoalInput) -> ApiResult<Goal> {
        self.create(Resource::Goals, input).await
    }

    pub async fn update_goal(&self, id: &Id, input: &GoalInput) -> ApiResult<Goal> {
        self.update(Resource::Goals, id, input).await
    }

    pub async fn delete_goal(&self, id: &Id) -> ApiResult<()> {
        self.remove(Resource::Goals, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_pairs() {
        assert!(ListQuery::default().pairs().is_empty());
        assert_eq!(ListQuery::limit(10).pairs(), vec![("limit", "10".to_string())]);
    }

    #[test]
    fn resource_display_is_collection_name() {
        assert_eq!(Resource::Investments.to_string(), "investments");
        assert_eq!(Resource::ALL.len(), 7);
    }
}
