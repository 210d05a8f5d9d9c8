mod support;

use std::time::Duration;

use anyhow::Result;
use finsight::api::ApiError;
use finsight::notify::Severity;
use finsight::store::{FetchOrigin, Slice, StoreError, LOAD_FAILED_MESSAGE};
use support::{populated, store_for, summary, ScriptedBackend};

#[tokio::test(start_paused = true)]
async fn fetch_all_loads_every_slice() -> Result<()> {
    let backend = ScriptedBackend::new(populated());
    let (store, relay) = store_for(backend.clone());

    let report = store.fetch_all(FetchOrigin::User).await?;

    assert_eq!(report.applied.len(), Slice::ALL.len());
    assert!(report.is_complete());
    let state = store.snapshot();
    assert_eq!(state.summary, Some(summary(500_000.0)));
    assert_eq!(state.investments.len(), 2);
    assert_eq!(state.recent_expenses.len(), 10);
    assert!(state.last_updated.is_some());
    assert!(!state.is_loading());
    assert!(state.error.is_none());
    assert!(relay.is_empty());
    assert_eq!(backend.count("recent_expenses"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_reads_keep_previous_values() -> Result<()> {
    let backend = ScriptedBackend::new(populated());
    let (store, relay) = store_for(backend.clone());
    store.fetch_all(FetchOrigin::User).await?;

    backend.update(|d| {
        d.summary = summary(1.0);
        d.investments.clear();
    });
    backend.fail("investments", ApiError::Network("connection reset".into()));

    let report = store.fetch_all(FetchOrigin::User).await?;

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, Slice::Investments);
    let state = store.snapshot();
    assert_eq!(state.summary, Some(summary(1.0)));
    assert_eq!(state.investments.len(), 2, "failed slice is left stale");
    assert!(state.error.is_none());
    assert!(relay.is_empty(), "partial failures are not announced");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timeout_bounds_the_batch_and_keeps_arrived_slices() -> Result<()> {
    let backend = ScriptedBackend::new(populated());
    backend.delay("goals", Duration::from_secs(60));
    backend.delay("loans", Duration::from_secs(20));
    let (store, relay) = store_for(backend.clone());

    let started = tokio::time::Instant::now();
    let err = store.fetch_all(FetchOrigin::User).await.unwrap_err();

    assert!(matches!(err, StoreError::Timeout));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(16));
    let state = store.snapshot();
    assert!(state.summary.is_some());
    assert!(state.loans.is_empty());
    assert_eq!(state.error.as_deref(), Some(LOAD_FAILED_MESSAGE));
    assert!(!state.is_loading());
    assert!(relay.is_empty(), "timeouts are never announced");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn user_fetch_failure_notifies_once() -> Result<()> {
    let backend = ScriptedBackend::new(populated());
    for call in [
        "summary",
        "investments",
        "loans",
        "recent_expenses",
        "recent_income",
        "expense_analytics",
        "investment_analytics",
        "goals",
    ] {
        backend.fail(call, ApiError::Network("offline".into()));
    }
    let (store, relay) = store_for(backend.clone());

    let err = store.fetch_all(FetchOrigin::User).await.unwrap_err();
    assert!(matches!(err, StoreError::AllReadsFailed { count: 8, .. }));
    assert_eq!(store.snapshot().error.as_deref(), Some(LOAD_FAILED_MESSAGE));
    let active = relay.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].severity, Severity::Error);
    assert_eq!(active[0].message, LOAD_FAILED_MESSAGE);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn background_failure_is_silent() -> Result<()> {
    let backend = ScriptedBackend::new(populated());
    for call in [
        "summary",
        "investments",
        "loans",
        "recent_expenses",
        "recent_income",
        "expense_analytics",
        "investment_analytics",
        "goals",
    ] {
        backend.fail(call, ApiError::Http {
            status: 500,
            message: "boom".into(),
        });
    }
    let (store, relay) = store_for(backend.clone());

    assert!(store.fetch_all(FetchOrigin::Background).await.is_err());
    assert!(store.snapshot().error.is_none());
    assert!(relay.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn older_batch_cannot_overwrite_newer_data() -> Result<()> {
    let backend = ScriptedBackend::new(populated());
    backend.delay("summary", Duration::from_secs(5));
    let (store, _relay) = store_for(backend.clone());

    let slow = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_all(FetchOrigin::Background).await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;

    backend.delay("summary", Duration::ZERO);
    backend.update(|d| d.summary = summary(750_000.0));
    let fast = store.fetch_all(FetchOrigin::User).await?;
    assert!(fast.applied.contains(&Slice::Summary));
    assert!(store.is_loading(), "the slow batch is still running");

    let slow = slow.await??;
    assert_eq!(slow.discarded, vec![Slice::Summary]);
    assert_eq!(store.snapshot().summary, Some(summary(750_000.0)));
    assert!(!store.is_loading());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_in_flight_fetch() -> Result<()> {
    let backend = ScriptedBackend::new(populated());
    backend.delay("summary", Duration::from_secs(10));
    let (store, _relay) = store_for(backend.clone());

    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_all(FetchOrigin::Background).await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;
    store.shutdown();

    let err = pending.await?.unwrap_err();
    assert!(matches!(err, StoreError::Cancelled));
    assert!(store.snapshot().summary.is_none());
    assert!(matches!(
        store.fetch_all(FetchOrigin::User).await,
        Err(StoreError::Cancelled)
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reset_discards_reads_issued_before_it() -> Result<()> {
    let backend = ScriptedBackend::new(populated());
    backend.delay("summary", Duration::from_secs(2));
    let (store, _relay) = store_for(backend.clone());

    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_all(FetchOrigin::Background).await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;
    store.reset();

    let report = pending.await??;
    assert_eq!(report.discarded, vec![Slice::Summary]);
    assert!(store.snapshot().summary.is_none());
    Ok(())
}
