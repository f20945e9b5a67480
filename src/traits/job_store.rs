// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::StoreResult;
use crate::model::{Job, JobId, JobUpdate};

/// Persistence for job records.
///
/// Implementations guarantee that `update` applies a partial update
/// atomically with respect to other calls on the same job, so no caller ever
/// has to read-modify-write. Terminal jobs reject updates; they can only be
/// deleted.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: Job) -> StoreResult<JobId>;

    async fn get(&self, id: JobId) -> StoreResult<Job>;

    /// Apply `update` and return the record as stored afterwards.
    async fn update(&self, id: JobId, update: JobUpdate) -> StoreResult<Job>;

    /// All jobs of one owner, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Job>>;

    /// Remove a terminal job (archival/deletion by collaborators).
    async fn delete(&self, id: JobId) -> StoreResult<()>;
}
