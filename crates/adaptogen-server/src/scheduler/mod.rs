//! Recurring job registry.
//!
//! Owns one [`JobScheduler`] for the life of the process and a table of the
//! jobs registered on it, keyed by command fingerprint. The first
//! registration for a fingerprint wins: later requests for the same command
//! never add a second job or change the existing schedule.

mod cron;

use std::collections::HashMap;
use std::future::Future;

use adaptogen_core::Fingerprint;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

pub(crate) use cron::normalize_cron;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("job registry is stopped")]
    Stopped,

    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// What a recurring job runs, as supplied by the first request for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub cron: String,
    pub command: String,
    pub keys: Vec<String>,
}

/// A registered job: its scheduler handle plus the spec it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub job_id: Uuid,
    pub cron: String,
    pub command: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Existing,
}

#[derive(Default)]
struct RegistryState {
    jobs: HashMap<Fingerprint, ScheduledJob>,
    stopped: bool,
}

pub struct JobRegistry {
    scheduler: JobScheduler,
    state: Mutex<RegistryState>,
}

impl JobRegistry {
    /// Create and start the underlying scheduler with no jobs registered.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler cannot be initialised or
    /// started.
    pub async fn start() -> Result<Self, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;
        scheduler.start().await?;
        Ok(Self {
            scheduler,
            state: Mutex::new(RegistryState::default()),
        })
    }

    /// Register a recurring job for `fingerprint` unless one already exists.
    ///
    /// `tick` is invoked on every scheduled instant; each invocation's future
    /// runs to completion on the scheduler's task and nothing observes its
    /// outcome. The registry lock is held across validation and insertion so
    /// concurrent first requests for one fingerprint still create one job.
    ///
    /// # Errors
    ///
    /// - [`ScheduleError::InvalidCron`] if `spec.cron` does not parse; nothing
    ///   is registered.
    /// - [`ScheduleError::Stopped`] once [`shutdown`](Self::shutdown) has run.
    /// - [`ScheduleError::Scheduler`] if the scheduler rejects the job.
    pub async fn ensure_scheduled<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        spec: JobSpec,
        tick: F,
    ) -> Result<Registration, ScheduleError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.state.lock().await;
        if state.stopped {
            return Err(ScheduleError::Stopped);
        }
        if state.jobs.contains_key(fingerprint) {
            return Ok(Registration::Existing);
        }

        let schedule = normalize_cron(&spec.cron);
        let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| Box::pin(tick()))
            .map_err(|e| ScheduleError::InvalidCron {
                expression: spec.cron.clone(),
                reason: e.to_string(),
            })?;

        let job_id = self.scheduler.add(job).await?;
        tracing::info!(
            fingerprint = %fingerprint,
            cron = %spec.cron,
            %job_id,
            "scheduler: registered job"
        );

        state.jobs.insert(
            fingerprint.clone(),
            ScheduledJob {
                job_id,
                cron: spec.cron,
                command: spec.command,
                keys: spec.keys,
            },
        );
        Ok(Registration::Created)
    }

    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.state.lock().await.jobs.contains_key(fingerprint)
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<ScheduledJob> {
        self.state.lock().await.jobs.get(fingerprint).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_stopped(&self) -> bool {
        self.state.lock().await.stopped
    }

    /// Stop every job and the scheduler itself. Terminal: later
    /// registrations fail with [`ScheduleError::Stopped`].
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if state.stopped {
            return;
        }
        state.stopped = true;

        let count = state.jobs.len();
        for (fingerprint, job) in state.jobs.drain() {
            if let Err(e) = self.scheduler.remove(&job.job_id).await {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    job_id = %job.job_id,
                    error = %e,
                    "scheduler: failed to remove job"
                );
            }
        }

        let mut scheduler = self.scheduler.clone();
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "scheduler: shutdown reported an error");
        }
        tracing::info!(stopped = count, "scheduler: all jobs stopped");
    }
}
