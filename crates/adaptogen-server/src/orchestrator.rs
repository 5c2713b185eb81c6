//! Request orchestration: schedule the command, then serve its latest result.
//!
//! Live requests and scheduled ticks both write to the shared result cache
//! without coordination. When a tick and a live miss for the same command
//! overlap, whichever write reaches the store last is the cached result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use adaptogen_core::{fingerprint, ExecutionResult, Fingerprint};
use adaptogen_runner::{run_command, RunnerConfig};
use adaptogen_store::{ResultCache, ResultStore, StoreError};
use serde::Serialize;
use thiserror::Error;

use crate::scheduler::{JobRegistry, JobSpec, Registration, ScheduleError};

/// A validated schedule-and-run request with keys already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub cron: String,
    pub command: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Redis,
    Live,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutcome {
    pub source: ResultSource,
    pub key: Fingerprint,
    pub result: ExecutionResult,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Orchestrator<S> {
    registry: JobRegistry,
    cache: Arc<ResultCache<S>>,
    runner: Arc<RunnerConfig>,
    shutting_down: AtomicBool,
}

impl<S: ResultStore> Orchestrator<S> {
    #[must_use]
    pub fn new(registry: JobRegistry, cache: ResultCache<S>, runner: RunnerConfig) -> Self {
        Self {
            registry,
            cache: Arc::new(cache),
            runner: Arc::new(runner),
            shutting_down: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    #[must_use]
    pub fn cache(&self) -> &ResultCache<S> {
        &self.cache
    }

    /// Make sure a recurring job exists for `key`.
    ///
    /// Each tick re-runs the command with the keys from the request that
    /// created the job and overwrites the cached result.
    ///
    /// # Errors
    ///
    /// Propagates [`ScheduleError`] from the registry.
    pub async fn ensure_scheduled(
        &self,
        key: &Fingerprint,
        request: &ScheduleRequest,
    ) -> Result<Registration, ScheduleError> {
        if self.registry.contains(key).await {
            return Ok(Registration::Existing);
        }

        let cache = Arc::clone(&self.cache);
        let runner = Arc::clone(&self.runner);
        let job_key = key.clone();
        let command: Arc<str> = request.command.as_str().into();
        let keys: Arc<[String]> = request.keys.clone().into();

        let tick = move || {
            let cache = Arc::clone(&cache);
            let runner = Arc::clone(&runner);
            let job_key = job_key.clone();
            let command = Arc::clone(&command);
            let keys = Arc::clone(&keys);
            async move {
                run_scheduled::<S>(&cache, &runner, &job_key, &command, &keys).await;
            }
        };

        let spec = JobSpec {
            cron: request.cron.clone(),
            command: request.command.clone(),
            keys: request.keys.clone(),
        };
        self.registry.ensure_scheduled(key, spec, tick).await
    }

    /// Schedule the request's command, then return its cached result or run
    /// it live and cache the outcome.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::Schedule`] if the cron expression is invalid or
    ///   the registry is stopped.
    /// - [`OrchestratorError::Store`] if the result store fails.
    pub async fn handle_request(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduleOutcome, OrchestratorError> {
        let key = fingerprint(&request.command);
        self.ensure_scheduled(&key, &request).await?;

        if let Some(result) = self.cache.get(&key).await? {
            tracing::debug!(fingerprint = %key, "orchestrator: cache hit");
            return Ok(ScheduleOutcome {
                source: ResultSource::Redis,
                key,
                result,
            });
        }

        tracing::debug!(fingerprint = %key, "orchestrator: cache miss; running live");
        let result = run_command(&self.runner, &request.command, &request.keys).await;
        self.cache.put(&key, &result).await?;
        Ok(ScheduleOutcome {
            source: ResultSource::Live,
            key,
            result,
        })
    }

    /// Stop all jobs and close the store. Runs at most once; later calls
    /// return immediately.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("orchestrator: shutdown already in progress");
            return;
        }

        self.registry.shutdown().await;

        let store = self.cache.store();
        if let Err(e) = store.quit().await {
            tracing::warn!(error = %e, "store: graceful close failed; disconnecting");
            store.disconnect().await;
        }
        tracing::info!("orchestrator: shutdown complete");
    }
}

/// One scheduled tick: run, then overwrite the cached result.
///
/// A failed cache write is logged and dropped. The next tick or live miss
/// writes again.
async fn run_scheduled<S: ResultStore>(
    cache: &ResultCache<S>,
    runner: &RunnerConfig,
    key: &Fingerprint,
    command: &str,
    keys: &[String],
) {
    tracing::info!(fingerprint = %key, "scheduler: running scheduled command");
    let result = run_command(runner, command, keys).await;
    if let Err(e) = cache.put(key, &result).await {
        tracing::error!(
            fingerprint = %key,
            error = %e,
            "scheduler: failed to cache scheduled result"
        );
    }
}
