//! Wiring between the trigger surfaces (`tick`, `watch`) and the dispatcher.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::config::DispatchConfig;
use crate::dispatcher::{QueueSummary, TickDispatcher};
use crate::error::DispatchError;
use crate::provider::{ProviderClient, TaskProvider};
use crate::queue::{TickReport, TickResponse};
use crate::store::{JobStore, StoreClient};

pub type HttpDispatcher = TickDispatcher<StoreClient, ProviderClient>;

/// Validate `config` and build a dispatcher over the HTTP clients.
///
/// Both clients share one connection pool.
pub fn build_dispatcher(config: DispatchConfig) -> Result<HttpDispatcher, DispatchError> {
    let config = config.validate()?;
    let http = reqwest::Client::new();
    let store = StoreClient::with_client(http.clone(), config.store_base_url.clone());
    let provider = ProviderClient::with_client(
        http,
        config.api_key.clone(),
        config.provider_base_url.clone(),
    );
    Ok(TickDispatcher::new(store, provider, config))
}

/// Run one tick inside the overall budget. A tick that overruns is dropped
/// wherever it was; whatever it already wrote stays written.
pub async fn run_with_budget<S, P>(
    dispatcher: &mut TickDispatcher<S, P>,
    budget_secs: u64,
) -> Result<TickReport, DispatchError>
where
    S: JobStore + 'static,
    P: TaskProvider,
{
    match tokio::time::timeout(Duration::from_secs(budget_secs), dispatcher.run()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(budget_secs, "tick exceeded its budget");
            Err(DispatchError::Timeout(budget_secs))
        }
    }
}

/// [`tick_once`] over a config that may have failed to load; a load error
/// becomes a `CONFIG` fault payload like any other.
pub async fn tick_from(loaded: Result<DispatchConfig, DispatchError>) -> TickResponse {
    match loaded {
        Ok(config) => tick_once(config).await,
        Err(e) => {
            tracing::error!(error = %e, "refusing to tick");
            TickResponse::from(Err::<TickReport, _>(e))
        }
    }
}

/// Single trigger: build, run one tick, wait for any detached archival, and
/// fold everything into the trigger payload.
///
/// Archival started before a fault is still awaited. Its outcomes only reach
/// the logs, since a fault payload carries no report.
pub async fn tick_once(config: DispatchConfig) -> TickResponse {
    let budget = config.tick_timeout_secs;
    let mut dispatcher = match build_dispatcher(config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            tracing::error!(error = %e, "refusing to tick");
            return TickResponse::from(Err::<TickReport, _>(e));
        }
    };

    // Run on its own task so a panic inside the tick becomes a fault payload.
    let handle = tokio::spawn(async move {
        let result = run_with_budget(&mut dispatcher, budget).await;
        let outcomes = dispatcher.shutdown().await;
        match result {
            Ok(mut report) => {
                for outcome in outcomes {
                    report.record_archive(outcome);
                }
                Ok(report)
            }
            Err(e) => {
                for outcome in outcomes {
                    match &outcome.error {
                        Some(error) => tracing::warn!(photo_id = %outcome.photo_id, error = %error, "archival failed after tick fault"),
                        None => tracing::info!(photo_id = %outcome.photo_id, "archived after tick fault"),
                    }
                }
                Err(e)
            }
        }
    });

    let result = handle
        .await
        .unwrap_or_else(|e| Err(DispatchError::Internal(e.to_string())));
    TickResponse::from(result)
}

pub async fn summarize(config: DispatchConfig) -> Result<QueueSummary, DispatchError> {
    build_dispatcher(config)?.summarize().await
}

/// Tick on a fixed interval until `shutdown` resolves.
///
/// A tick in progress is allowed to finish; outstanding archival is awaited
/// before returning. Fatal tick outcomes are logged and the loop carries on.
pub async fn watch(
    config: DispatchConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), DispatchError> {
    let interval = Duration::from_secs(config.tick_interval_secs.max(1));
    let budget = config.tick_timeout_secs;
    let mut dispatcher = build_dispatcher(config)?;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!(interval_secs = interval.as_secs(), budget_secs = budget, "watch started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("watch stopping");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = run_with_budget(&mut dispatcher, budget).await {
                    tracing::error!(code = e.fault_code(), error = %e, "tick failed");
                }
            }
        }
    }

    let pending = dispatcher.pending_archivals();
    if pending > 0 {
        tracing::info!(pending, "waiting for archival uploads");
    }
    for outcome in dispatcher.shutdown().await {
        if let Some(error) = &outcome.error {
            tracing::warn!(photo_id = %outcome.photo_id, error = %error, "archival failed during shutdown");
        }
    }
    Ok(())
}
