use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;

use tokio::sync::watch;

use super::{Action, DashboardStore, LoadingGuard, Slice, StoreError, LOAD_FAILED_MESSAGE};
use crate::api::{ApiError, ApiResult};

/// Who asked for a fetch. Background failures are logged, never shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    User,
    Background,
}

impl FetchOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Background => "background",
        }
    }
}

/// Per-slice outcome of a batch.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub applied: Vec<Slice>,
    /// Reads that succeeded but lost to newer data already in the slice.
    pub discarded: Vec<Slice>,
    pub failed: Vec<(Slice, ApiError)>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Resolves once the flag turns true; never resolves if the sender is gone.
pub(crate) async fn stopped(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}

impl DashboardStore {
    /// Read every slice in parallel and apply each result as it arrives.
    ///
    /// Failed reads leave their slice untouched. The whole batch is bounded by
    /// the fetch timeout; reads still pending then are dropped, and slices that
    /// already arrived stay applied. The batch fails as a whole only on timeout
    /// or when every read fails.
    pub async fn fetch_all(&self, origin: FetchOrigin) -> Result<FetchReport, StoreError> {
        if self.is_shut_down() {
            return Err(StoreError::Cancelled);
        }

        let _loading = LoadingGuard::new(self);
        self.dispatch(Action::SetError(None));

        let ticket = self.next_ticket();
        let mut shutdown = self.inner.shutdown.subscribe();
        let mut pending: FuturesUnordered<_> =
            Slice::ALL.into_iter().map(|slice| self.read(slice)).collect();
        let deadline = tokio::time::sleep(self.inner.options.fetch_timeout);
        tokio::pin!(deadline);

        tracing::debug!(origin = origin.as_str(), ticket, "fetching dashboard");
        let mut report = FetchReport::default();

        loop {
            tokio::select! {
                next = pending.next() => match next {
                    Some((slice, Ok(action))) => {
                        if self.apply_read(ticket, action) {
                            report.applied.push(slice);
                        } else {
                            report.discarded.push(slice);
                        }
                    }
                    Some((slice, Err(err))) => {
                        tracing::debug!(slice = %slice, error = %err, "dashboard read failed");
                        report.failed.push((slice, err));
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    tracing::debug!(applied = report.applied.len(), "dashboard fetch timed out");
                    return Err(self.batch_failed(origin, StoreError::Timeout));
                }
                _ = stopped(&mut shutdown) => {
                    tracing::debug!("dashboard fetch cancelled");
                    return Err(StoreError::Cancelled);
                }
            }
        }

        if report.applied.is_empty() && report.discarded.is_empty() {
            let count = report.failed.len();
            if let Some((_, first)) = report.failed.into_iter().next() {
                return Err(self.batch_failed(origin, StoreError::AllReadsFailed { count, first }));
            }
            return Ok(FetchReport::default());
        }

        if !report.failed.is_empty() {
            let failed: Vec<&str> = report.failed.iter().map(|(s, _)| s.as_str()).collect();
            tracing::warn!(
                origin = origin.as_str(),
                failed = ?failed,
                "some dashboard reads failed; keeping previous values"
            );
        }
        tracing::info!(
            origin = origin.as_str(),
            applied = report.applied.len(),
            discarded = report.discarded.len(),
            failed = report.failed.len(),
            "dashboard refreshed"
        );
        Ok(report)
    }

    /// Re-read `slices` after a write. Returns the first failure.
    pub(crate) async fn refresh_slices(&self, slices: &[Slice]) -> ApiResult<()> {
        let ticket = self.next_ticket();
        let results = futures::future::join_all(slices.iter().map(|s| self.read(*s))).await;
        let mut first_error = None;
        for (slice, result) in results {
            match result {
                Ok(action) => {
                    self.apply_read(ticket, action);
                }
                Err(err) => {
                    tracing::debug!(slice = %slice, error = %err, "follow-up read failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn read(&self, slice: Slice) -> BoxFuture<'static, (Slice, ApiResult<Action>)> {
        let backend = self.inner.backend.clone();
        let options = self.inner.options.clone();
        async move {
            let result = match slice {
                Slice::Summary => backend.summary().await.map(Action::SummaryLoaded),
                Slice::Investments => backend.investments().await.map(Action::InvestmentsLoaded),
                Slice::Loans => backend.loans().await.map(Action::LoansLoaded),
                Slice::RecentExpenses => backend
                    .recent_expenses(options.recent_limit)
                    .await
                    .map(Action::RecentExpensesLoaded),
                Slice::RecentIncome => backend
                    .recent_income(options.recent_limit)
                    .await
                    .map(Action::RecentIncomeLoaded),
                Slice::ExpenseAnalytics => backend
                    .expense_analytics(options.expense_months)
                    .await
                    .map(Action::ExpenseAnalyticsLoaded),
                Slice::InvestmentAnalytics => backend
                    .investment_analytics()
                    .await
                    .map(Action::InvestmentAnalyticsLoaded),
                Slice::Goals => backend
                    .goals(options.goals_limit)
                    .await
                    .map(Action::GoalsLoaded),
            };
            (slice, result)
        }
        .boxed()
    }

    fn batch_failed(&self, origin: FetchOrigin, err: StoreError) -> StoreError {
        match origin {
            FetchOrigin::Background => {
                tracing::warn!(error = %err, "background refresh failed");
            }
            FetchOrigin::User => {
                tracing::warn!(error = %err, "dashboard load failed");
                self.dispatch(Action::SetError(Some(LOAD_FAILED_MESSAGE.to_string())));
                let session_ended = err.api_error().is_some_and(ApiError::is_unauthorized);
                if !err.is_timeout() && !session_ended {
                    self.inner.relay.error(LOAD_FAILED_MESSAGE);
                }
            }
        }
        err
    }
}
