//! The aggregation store: single source of truth for dashboard data.
//!
//! State changes only through [`DashboardStore::dispatch`], which runs the pure
//! [`reduce`] function and publishes the result on a `watch` channel.
//!
//! Every read carries a ticket from a monotonically increasing counter. A slice
//! only accepts a response whose ticket is newer than the one it last applied,
//! so an older overlapping fetch can never roll a slice back.

mod fetch;
mod mutations;
mod state;

pub use fetch::{FetchOrigin, FetchReport};
pub use mutations::MutationKind;
pub use state::{reduce, Action, DashboardState, Slice, RECENT_ACTIVITY_LIMIT};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::api::{ApiError, FinanceBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::notify::NotificationRelay;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The batch did not settle within the fetch timeout.
    #[error("Request timeout")]
    Timeout,

    #[error("All {count} dashboard reads failed: {first}")]
    AllReadsFailed {
        count: usize,
        #[source]
        first: ApiError,
    },

    #[error("Dashboard store was shut down")]
    Cancelled,

    #[error("{}", kind.failure_message())]
    Mutation {
        kind: MutationKind,
        #[source]
        source: ApiError,
    },
}

impl StoreError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// The request error behind a failed mutation.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::AllReadsFailed { first, .. } => Some(first),
            Self::Mutation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Query sizes and the batch timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub recent_limit: usize,
    pub expense_months: u32,
    pub goals_limit: usize,
    pub fetch_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            recent_limit: RECENT_ACTIVITY_LIMIT,
            expense_months: 6,
            goals_limit: 5,
            fetch_timeout: Duration::from_secs(15),
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recent_limit: config.dashboard.recent_limit,
            expense_months: config.dashboard.expense_months,
            goals_limit: config.dashboard.goals_limit,
            fetch_timeout: config.refresh.fetch_timeout,
        }
    }
}

struct StoreInner {
    backend: Arc<dyn FinanceBackend>,
    relay: NotificationRelay,
    clock: Arc<dyn Clock>,
    options: StoreOptions,
    state: watch::Sender<DashboardState>,
    versions: Mutex<HashMap<Slice, u64>>,
    tickets: AtomicU64,
    shutdown: watch::Sender<bool>,
}

/// Cheaply cloneable handle to the dashboard store.
#[derive(Clone)]
pub struct DashboardStore {
    inner: Arc<StoreInner>,
}

/// Non-owning handle, for callbacks held by objects the store itself owns.
#[derive(Clone)]
pub struct WeakDashboardStore {
    inner: Weak<StoreInner>,
}

impl WeakDashboardStore {
    pub fn upgrade(&self) -> Option<DashboardStore> {
        self.inner.upgrade().map(|inner| DashboardStore { inner })
    }
}

impl std::fmt::Debug for DashboardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardStore")
            .field("options", &self.inner.options)
            .field("loading", &self.is_loading())
            .finish()
    }
}

impl DashboardStore {
    pub fn new(backend: Arc<dyn FinanceBackend>, relay: NotificationRelay) -> Self {
        Self::with_options(backend, relay, StoreOptions::default())
    }

    pub fn with_options(
        backend: Arc<dyn FinanceBackend>,
        relay: NotificationRelay,
        options: StoreOptions,
    ) -> Self {
        Self::with_clock(backend, relay, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        backend: Arc<dyn FinanceBackend>,
        relay: NotificationRelay,
        options: StoreOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(DashboardState::with_recent_limit(options.recent_limit));
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(StoreInner {
                backend,
                relay,
                clock,
                options,
                state,
                versions: Mutex::new(HashMap::new()),
                tickets: AtomicU64::new(0),
                shutdown,
            }),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    pub fn relay(&self) -> &NotificationRelay {
        &self.inner.relay
    }

    pub fn snapshot(&self) -> DashboardState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.inner.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.state.borrow().last_updated
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Run `action` through the reducer and publish the new state.
    pub fn dispatch(&self, action: Action) {
        let now = self.inner.clock.now();
        self.inner.state.send_modify(|state| {
            let previous = std::mem::take(state);
            *state = reduce(previous, action, now);
        });
    }

    pub fn downgrade(&self) -> WeakDashboardStore {
        WeakDashboardStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Clear all data and invalidate every in-flight read.
    pub fn reset(&self) {
        let ticket = self.next_ticket();
        let mut versions = self.lock_versions();
        for slice in Slice::ALL {
            versions.insert(slice, ticket);
        }
        self.dispatch(Action::Reset);
    }

    /// Cancel in-flight fetches and refuse new ones.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
        tracing::debug!("dashboard store shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    pub(crate) fn next_ticket(&self) -> u64 {
        self.inner.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a read result unless the slice already holds newer data.
    pub(crate) fn apply_read(&self, ticket: u64, action: Action) -> bool {
        let Some(slice) = action.slice() else {
            self.dispatch(action);
            return true;
        };
        let mut versions = self.lock_versions();
        let current = versions.get(&slice).copied().unwrap_or(0);
        if ticket <= current {
            tracing::debug!(slice = %slice, ticket, current, "discarding stale response");
            return false;
        }
        versions.insert(slice, ticket);
        self.dispatch(action);
        true
    }

    /// Apply a confirmed write; reads issued before this point can no longer overwrite it.
    pub(crate) fn apply_write(&self, action: Action) {
        let ticket = self.next_ticket();
        let mut versions = self.lock_versions();
        if let Some(slice) = action.slice() {
            versions.insert(slice, ticket);
        }
        self.dispatch(action);
    }

    fn lock_versions(&self) -> std::sync::MutexGuard<'_, HashMap<Slice, u64>> {
        self.inner.versions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Holds one unit of the in-flight count for as long as it lives.
pub(crate) struct LoadingGuard<'a> {
    store: &'a DashboardStore,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn new(store: &'a DashboardStore) -> Self {
        store.dispatch(Action::FetchStarted);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.dispatch(Action::FetchFinished);
    }
}
