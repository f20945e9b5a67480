// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Entry point for job submission.
//!
//! The [`PipelineController`] validates a request, stores the queued job and
//! spawns one [`StageOrchestrator`] task for it. After that the caller only
//! observes the job: by polling [`PipelineController::get`], by subscribing
//! to its progress topic, or by awaiting [`PipelineController::wait`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::validate_job_request;
use crate::engine::orchestrator::{PipelineServices, StageOrchestrator};
use crate::errors::{PipelineError, PipelineResult, StoreError};
use crate::model::{Job, JobConfig, JobId};
use crate::observability::messages::job::{JobRejected, JobSubmitted};
use crate::observability::messages::StructuredLog;
use crate::progress::ProgressEvent;

/// Handle on a job whose task has not finished.
struct RunningJob {
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
}

type RunningJobs = Arc<Mutex<HashMap<JobId, RunningJob>>>;

pub struct PipelineController {
    services: Arc<PipelineServices>,
    running: RunningJobs,
}

impl PipelineController {
    pub fn new(services: Arc<PipelineServices>) -> Self {
        Self {
            services,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn services(&self) -> &PipelineServices {
        &self.services
    }

    fn running(&self) -> MutexGuard<'_, HashMap<JobId, RunningJob>> {
        lock(&self.running)
    }

    /// Validate, store and launch a job. Returns as soon as the task is
    /// spawned; the job's outcome is never reported through this call.
    pub async fn submit(
        &self,
        owner_id: &str,
        prompt: &str,
        config: JobConfig,
    ) -> PipelineResult<JobId> {
        let (job_id, _) = self.launch(owner_id, prompt, config, false).await?;
        Ok(job_id)
    }

    /// Like [`submit`](Self::submit), but attaches a progress subscriber
    /// before the task starts so no event is missed.
    pub async fn submit_and_subscribe(
        &self,
        owner_id: &str,
        prompt: &str,
        config: JobConfig,
    ) -> PipelineResult<(JobId, broadcast::Receiver<ProgressEvent>)> {
        let (job_id, events) = self.launch(owner_id, prompt, config, true).await?;
        match events {
            Some(events) => Ok((job_id, events)),
            None => Ok((job_id, self.subscribe(job_id))),
        }
    }

    async fn launch(
        &self,
        owner_id: &str,
        prompt: &str,
        config: JobConfig,
        subscribe: bool,
    ) -> PipelineResult<(JobId, Option<broadcast::Receiver<ProgressEvent>>)> {
        let engines = self.services.backends.motion_names();
        if let Err(error) = validate_job_request(prompt, &config, &engines) {
            JobRejected {
                owner_id,
                error: &error,
            }
            .log();
            return Err(error.into());
        }

        let job = Job::new_queued(owner_id.to_string(), prompt.trim().to_string(), config);
        let job_id = self.services.store.create(job.clone()).await?;
        JobSubmitted {
            job_id: &job_id,
            owner_id,
            duration_secs: job.config.duration_secs,
        }
        .log();

        let events = subscribe.then(|| self.services.broadcaster.subscribe(job_id));

        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);
        self.running().insert(
            job_id,
            RunningJob {
                cancel: cancel.clone(),
                done: done_rx,
            },
        );

        let orchestrator = StageOrchestrator::new(Arc::clone(&self.services), job, cancel);
        let running = Arc::clone(&self.running);
        let services = Arc::clone(&self.services);
        tokio::spawn(async move {
            let job = orchestrator.run().await;
            lock(&running).remove(&job_id);
            // The final total is on the job record now.
            services.meter.release(job_id);
            // Closes any topic a subscriber opened after the terminal event.
            services.broadcaster.close(job_id);
            debug!(job_id = %job_id, status = %job.status, credits = job.credits_used, "Job task finished");
            // Nobody may be waiting.
            let _ = done_tx.send(true);
        });

        Ok((job_id, events))
    }

    pub async fn get(&self, job_id: JobId) -> PipelineResult<Job> {
        Ok(self.services.store.get(job_id).await?)
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> PipelineResult<Vec<Job>> {
        Ok(self.services.store.list_by_owner(owner_id).await?)
    }

    /// Attach to a job's progress topic. Late subscribers miss earlier
    /// events and should reconcile with [`get`](Self::get).
    ///
    /// A job with no running task (finished, or unknown) gets a receiver
    /// that is already closed.
    pub fn subscribe(&self, job_id: JobId) -> broadcast::Receiver<ProgressEvent> {
        // Held across the subscribe so the task epilogue closes what we open.
        let running = self.running();
        if !running.contains_key(&job_id) {
            let (_, events) = broadcast::channel(1);
            return events;
        }
        self.services.broadcaster.subscribe(job_id)
    }

    /// Signal cancellation. Returns `false` when the job exists but its task
    /// already finished.
    pub async fn cancel(&self, job_id: JobId) -> PipelineResult<bool> {
        let token = self.running().get(&job_id).map(|job| job.cancel.clone());
        if let Some(token) = token {
            token.cancel();
            return Ok(true);
        }
        self.services.store.get(job_id).await?;
        Ok(false)
    }

    /// Cancel every job that is still running.
    pub fn cancel_all(&self) -> usize {
        let running = self.running();
        for job in running.values() {
            job.cancel.cancel();
        }
        running.len()
    }

    pub fn is_running(&self, job_id: JobId) -> bool {
        self.running().contains_key(&job_id)
    }

    /// Wait for a job's task to finish and return its final record.
    pub async fn wait(&self, job_id: JobId) -> PipelineResult<Job> {
        let done = self.running().get(&job_id).map(|job| job.done.clone());
        if let Some(mut done) = done {
            // An error means the task is gone; the store has what it left.
            let _ = done.wait_for(|finished| *finished).await;
        }
        self.get(job_id).await
    }

    /// Remove a terminal job and everything tracked for it.
    pub async fn delete(&self, job_id: JobId) -> PipelineResult<()> {
        if self.is_running(job_id) {
            return Err(PipelineError::Store(StoreError::NotTerminal(job_id)));
        }
        self.services.store.delete(job_id).await?;
        self.services.meter.release(job_id);
        self.services.broadcaster.close(job_id);
        Ok(())
    }
}

fn lock(running: &RunningJobs) -> MutexGuard<'_, HashMap<JobId, RunningJob>> {
    running.lock().unwrap_or_else(PoisonError::into_inner)
}
