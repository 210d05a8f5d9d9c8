use std::fmt;
use std::future::Future;

use super::{Action, DashboardStore, Slice, StoreError};
use crate::api::ApiResult;
use crate::models::{
    Expense, ExpenseInput, Id, Income, IncomeInput, Investment, InvestmentInput, Loan, LoanInput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    AddInvestment,
    UpdateInvestment,
    DeleteInvestment,
    AddLoan,
    UpdateLoan,
    DeleteLoan,
    AddExpense,
    AddIncome,
}

impl MutationKind {
    fn entity(&self) -> &'static str {
        match self {
            Self::AddInvestment | Self::UpdateInvestment | Self::DeleteInvestment => "investment",
            Self::AddLoan | Self::UpdateLoan | Self::DeleteLoan => "loan",
            Self::AddExpense => "expense",
            Self::AddIncome => "income",
        }
    }

    fn verb(&self) -> (&'static str, &'static str) {
        match self {
            Self::AddInvestment | Self::AddLoan | Self::AddExpense | Self::AddIncome => {
                ("add", "added")
            }
            Self::UpdateInvestment | Self::UpdateLoan => ("update", "updated"),
            Self::DeleteInvestment | Self::DeleteLoan => ("delete", "deleted"),
        }
    }

    /// e.g. "Investment added successfully!"
    pub fn success_message(&self) -> String {
        let entity = self.entity();
        let mut chars = entity.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("{capitalized} {} successfully!", self.verb().1)
    }

    /// e.g. "Failed to add investment"
    pub fn failure_message(&self) -> String {
        format!("Failed to {} {}", self.verb().0, self.entity())
    }

    /// Slice the write itself changes.
    pub fn slice(&self) -> Slice {
        match self {
            Self::AddInvestment | Self::UpdateInvestment | Self::DeleteInvestment => {
                Slice::Investments
            }
            Self::AddLoan | Self::UpdateLoan | Self::DeleteLoan => Slice::Loans,
            Self::AddExpense => Slice::RecentExpenses,
            Self::AddIncome => Slice::RecentIncome,
        }
    }

    /// Derived slices re-read after the write succeeds.
    pub fn invalidates(&self) -> &'static [Slice] {
        match self {
            Self::AddExpense => &[Slice::Summary, Slice::ExpenseAnalytics],
            _ => &[Slice::Summary],
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb().0, self.entity())
    }
}

/// Writes go straight to the backend; the store only applies confirmed results.
///
/// Every write returns `Ok` once the backend accepts it, even when the
/// follow-up re-read fails. In that case the relay shows a warning and the
/// summary totals in [`DashboardStore::snapshot`] stay stale until the next
/// successful fetch.
impl DashboardStore {
    pub async fn add_investment(&self, input: &InvestmentInput) -> Result<Investment, StoreError> {
        let backend = self.inner.backend.clone();
        self.mutate(
            MutationKind::AddInvestment,
            async move { backend.create_investment(input).await },
            |created| Action::InvestmentAdded(created.clone()),
        )
        .await
    }

    pub async fn update_investment(
        &self,
        id: &Id,
        input: &InvestmentInput,
    ) -> Result<Investment, StoreError> {
        let backend = self.inner.backend.clone();
        self.mutate(
            MutationKind::UpdateInvestment,
            async move { backend.update_investment(id, input).await },
            |updated| Action::InvestmentUpdated(updated.clone()),
        )
        .await
    }

    pub async fn delete_investment(&self, id: &Id) -> Result<(), StoreError> {
        let backend = self.inner.backend.clone();
        self.mutate(
            MutationKind::DeleteInvestment,
            async move { backend.delete_investment(id).await },
            |_| Action::InvestmentRemoved(id.clone()),
        )
        .await
    }

    pub async fn add_loan(&self, input: &LoanInput) -> Result<Loan, StoreError> {
        let backend = self.inner.backend.clone();
        self.mutate(
            MutationKind::AddLoan,
            async move { backend.create_loan(input).await },
            |created| Action::LoanAdded(created.clone()),
        )
        .await
    }

    pub async fn update_loan(&self, id: &Id, input: &LoanInput) -> Result<Loan, StoreError> {
        let backend = self.inner.backend.clone();
        self.mutate(
            MutationKind::UpdateLoan,
            async move { backend.update_loan(id, input).await },
            |updated| Action::LoanUpdated(updated.clone()),
        )
        .await
    }

    pub async fn delete_loan(&self, id: &Id) -> Result<(), StoreError> {
        let backend = self.inner.backend.clone();
        self.mutate(
            MutationKind::DeleteLoan,
            async move { backend.delete_loan(id).await },
            |_| Action::LoanRemoved(id.clone()),
        )
        .await
    }

    pub async fn add_expense(&self, input: &ExpenseInput) -> Result<Expense, StoreError> {
        let backend = self.inner.backend.clone();
        self.mutate(
            MutationKind::AddExpense,
            async move { backend.create_expense(input).await },
            |created| Action::ExpenseAdded(created.clone()),
        )
        .await
    }

    pub async fn add_income(&self, input: &IncomeInput) -> Result<Income, StoreError> {
        let backend = self.inner.backend.clone();
        self.mutate(
            MutationKind::AddIncome,
            async move { backend.create_income(input).await },
            |created| Action::IncomeAdded(created.clone()),
        )
        .await
    }

    /// Perform a write, apply it, then re-read the slices it invalidates.
    ///
    /// A failed write is reported and returned so the caller can keep its
    /// input. A failed follow-up read only produces a warning and the result
    /// is still `Ok`, with stale totals: the write itself went through and
    /// must not be retried.
    async fn mutate<T, W, A>(&self, kind: MutationKind, write: W, to_action: A) -> Result<T, StoreError>
    where
        W: Future<Output = ApiResult<T>>,
        A: FnOnce(&T) -> Action,
    {
        let value = match write.await {
            Ok(value) => value,
            Err(source) => {
                tracing::warn!(mutation = %kind, error = %source, "write failed");
                self.inner.relay.error(kind.failure_message());
                return Err(StoreError::Mutation { kind, source });
            }
        };

        self.apply_write(to_action(&value));

        if let Err(err) = self.refresh_slices(kind.invalidates()).await {
            tracing::warn!(mutation = %kind, error = %err, "refresh after write failed");
            self.inner
                .relay
                .warning("Saved, but the dashboard totals could not be refreshed");
        }

        tracing::info!(mutation = %kind, "write applied");
        self.inner.relay.success(kind.success_message());
        Ok(value)
    }
}
