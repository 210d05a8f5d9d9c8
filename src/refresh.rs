//! Background refresh of the dashboard store.
//!
//! The controller is a task driven by `tokio::select!` over a periodic timer,
//! a trigger channel fed by the host (visibility, connectivity, manual
//! refresh) and a shutdown signal. At most one fetch it started runs at a
//! time, and no trigger starts a fetch while the store is already loading.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::session::SessionGuard;
use crate::staleness::{check_dashboard_staleness, log_dashboard_staleness, StalenessCheck};
use crate::store::{DashboardStore, FetchOrigin, FetchReport, StoreError};

/// Events the host forwards to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Periodic timer. Sent by the controller itself, but hosts may inject it.
    Tick,
    VisibilityChanged { visible: bool },
    Online,
    Offline,
    /// Explicit user request.
    Manual,
}

impl RefreshTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::VisibilityChanged { .. } => "visibility",
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    /// Timer armed, no fetch of ours running.
    Scheduled,
    Refreshing,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Loading,
    SignedOut,
    Hidden,
    Fresh,
    AlreadyOnline,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fetch(FetchOrigin),
    Skip(SkipReason),
}

/// What the controller knows when a trigger arrives.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub loading: bool,
    pub signed_in: bool,
    /// Connectivity before this trigger.
    pub online: bool,
    pub staleness: StalenessCheck,
}

/// Decide whether `trigger` should start a fetch.
pub fn decide(trigger: RefreshTrigger, ctx: &TriggerContext) -> Decision {
    if !ctx.signed_in {
        return Decision::Skip(SkipReason::SignedOut);
    }
    let origin = match trigger {
        RefreshTrigger::Tick => FetchOrigin::Background,
        RefreshTrigger::VisibilityChanged { visible: false } => {
            return Decision::Skip(SkipReason::Hidden)
        }
        RefreshTrigger::VisibilityChanged { visible: true } => {
            if !ctx.staleness.is_stale {
                return Decision::Skip(SkipReason::Fresh);
            }
            FetchOrigin::Background
        }
        RefreshTrigger::Online => {
            if ctx.online {
                return Decision::Skip(SkipReason::AlreadyOnline);
            }
            FetchOrigin::Background
        }
        RefreshTrigger::Offline => return Decision::Skip(SkipReason::Offline),
        RefreshTrigger::Manual => FetchOrigin::User,
    };
    if ctx.loading {
        return Decision::Skip(SkipReason::Loading);
    }
    Decision::Fetch(origin)
}

/// Period until the next tick, with optional random jitter, never below one second.
pub fn compute_next_delay(interval: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return interval;
    }

    let base_ms = interval.as_millis().min(u128::from(u64::MAX)) as i128;
    let jitter_ms = jitter.as_millis().min(u128::from(u64::MAX)) as i128;
    let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);

    let min_ms = 1_000_i128;
    let max_ms = i128::from(u64::MAX);
    let delay_ms = (base_ms + offset).clamp(min_ms, max_ms) as u64;
    Duration::from_millis(delay_ms)
}

pub struct RefreshController {
    store: DashboardStore,
    session: Option<Arc<SessionGuard>>,
    interval: Duration,
    staleness: Duration,
    jitter: Duration,
    fetch_on_start: bool,
    initially_online: bool,
}

impl RefreshController {
    pub fn new(store: DashboardStore) -> Self {
        Self::from_config(store, &RefreshConfig::default())
    }

    pub fn from_config(store: DashboardStore, config: &RefreshConfig) -> Self {
        Self {
            store,
            session: None,
            interval: config.interval,
            staleness: config.staleness,
            jitter: config.jitter,
            fetch_on_start: false,
            initially_online: true,
        }
    }

    /// Skip every trigger while `session` is signed out.
    pub fn with_session(mut self, session: Arc<SessionGuard>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Load the dashboard as soon as the controller starts.
    pub fn with_fetch_on_start(mut self, fetch_on_start: bool) -> Self {
        self.fetch_on_start = fetch_on_start;
        self
    }

    /// Connectivity at startup. An `Online` trigger only fetches after a
    /// known offline period, so hosts that start offline should say so here.
    pub fn with_initial_online(mut self, online: bool) -> Self {
        self.initially_online = online;
        self
    }

    /// Start the controller on the current runtime.
    pub fn spawn(self) -> RefreshHandle {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ControllerState::Idle);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(trigger_rx, state_tx, shutdown_rx));
        RefreshHandle {
            triggers: trigger_tx,
            state: state_rx,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    fn context(&self, online: bool) -> TriggerContext {
        let staleness = check_dashboard_staleness(
            self.store.last_updated(),
            self.store.now(),
            self.staleness,
        );
        TriggerContext {
            loading: self.store.is_loading(),
            signed_in: self.session.as_ref().map_or(true, |s| s.is_signed_in()),
            online,
            staleness,
        }
    }

    fn start_fetch(&self, origin: FetchOrigin) -> BoxFuture<'static, (FetchOrigin, Result<FetchReport, StoreError>)> {
        let store = self.store.clone();
        async move { (origin, store.fetch_all(origin).await) }.boxed()
    }

    async fn run(
        self,
        mut triggers: mpsc::UnboundedReceiver<RefreshTrigger>,
        state: watch::Sender<ControllerState>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut online = self.initially_online;
        let mut current: Option<BoxFuture<'static, (FetchOrigin, Result<FetchReport, StoreError>)>> =
            None;

        if self.fetch_on_start {
            current = Some(self.start_fetch(FetchOrigin::User));
            state.send_replace(ControllerState::Refreshing);
        } else {
            state.send_replace(ControllerState::Scheduled);
        }

        let tick = tokio::time::sleep(compute_next_delay(self.interval, self.jitter));
        tokio::pin!(tick);
        info!(interval = ?self.interval, staleness = ?self.staleness, "refresh controller started");

        loop {
            let trigger = tokio::select! {
                _ = &mut tick => {
                    let delay = compute_next_delay(self.interval, self.jitter);
                    tick.as_mut().reset(Instant::now() + delay);
                    RefreshTrigger::Tick
                }
                received = triggers.recv() => match received {
                    Some(trigger) => trigger,
                    None => break,
                },
                (origin, result) = settle(&mut current) => {
                    current = None;
                    match result {
                        Ok(report) => debug!(
                            origin = origin.as_str(),
                            applied = report.applied.len(),
                            failed = report.failed.len(),
                            "refresh finished"
                        ),
                        Err(err) => warn!(origin = origin.as_str(), error = %err, "refresh failed"),
                    }
                    state.send_replace(ControllerState::Scheduled);
                    continue;
                }
                _ = wait_stopped(&mut shutdown) => break,
            };

            let ctx = self.context(online);
            if matches!(trigger, RefreshTrigger::VisibilityChanged { visible: true }) {
                log_dashboard_staleness(&ctx.staleness);
            }
            match trigger {
                RefreshTrigger::Online => online = true,
                RefreshTrigger::Offline => online = false,
                _ => {}
            }

            let loading = ctx.loading || current.is_some();
            let decision = decide(trigger, &TriggerContext { loading, ..ctx });
            match decision {
                Decision::Fetch(origin) => {
                    debug!(trigger = trigger.as_str(), origin = origin.as_str(), "starting refresh");
                    current = Some(self.start_fetch(origin));
                    state.send_replace(ControllerState::Refreshing);
                }
                Decision::Skip(reason) => {
                    debug!(trigger = trigger.as_str(), reason = ?reason, "refresh skipped");
                }
            }
        }

        drop(current);
        state.send_replace(ControllerState::Stopped);
        info!("refresh controller stopped");
    }
}

async fn settle<T>(current: &mut Option<BoxFuture<'static, T>>) -> T {
    match current {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn wait_stopped(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Handle to a running [`RefreshController`]. Dropping it aborts the task.
pub struct RefreshHandle {
    triggers: mpsc::UnboundedSender<RefreshTrigger>,
    state: watch::Receiver<ControllerState>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Forward a trigger. Returns false if the controller has stopped.
    pub fn trigger(&self, trigger: RefreshTrigger) -> bool {
        self.triggers.send(trigger).is_ok()
    }

    pub fn visibility_changed(&self, visible: bool) -> bool {
        self.trigger(RefreshTrigger::VisibilityChanged { visible })
    }

    /// Ignored unless the controller last saw the host offline; see
    /// [`RefreshController::with_initial_online`].
    pub fn online(&self) -> bool {
        self.trigger(RefreshTrigger::Online)
    }

    pub fn offline(&self) -> bool {
        self.trigger(RefreshTrigger::Offline)
    }

    pub fn refresh_now(&self) -> bool {
        self.trigger(RefreshTrigger::Manual)
    }

    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.clone()
    }

    /// Stop the controller, cancelling any fetch it started, and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "refresh controller task failed");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
