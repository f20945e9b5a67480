// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::{StoreError, StoreResult};
use crate::model::{Job, JobId, JobUpdate};
use crate::store::{apply_update, sort_newest_first};
use crate::traits::JobStore;

/// Process-local job store. Records are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: Job) -> StoreResult<JobId> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(job.id));
        }
        let id = job.id;
        jobs.insert(id, job);
        Ok(id)
    }

    async fn get(&self, id: JobId) -> StoreResult<Job> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: JobId, update: JobUpdate) -> StoreResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        apply_update(job, update)?;
        Ok(job.clone())
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Job>> {
        let mut owned: Vec<Job> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.owner_id == owner_id)
            .cloned()
            .collect();
        sort_newest_first(&mut owned);
        Ok(owned)
    }

    async fn delete(&self, id: JobId) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get(&id).ok_or(StoreError::NotFound(id))?;
        if !job.is_terminal() {
            return Err(StoreError::NotTerminal(id));
        }
        jobs.remove(&id);
        Ok(())
    }
}
