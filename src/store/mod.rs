// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Job Store implementations.
//!
//! Both stores serialize all mutation of a job through [`JobStore::update`],
//! which applies a [`JobUpdate`](crate::model::JobUpdate) under a lock and
//! refuses to touch records that have reached a terminal status.

pub mod file;
pub mod memory;

pub use file::FileJobStore;
pub use memory::InMemoryJobStore;

use crate::errors::{StoreError, StoreResult};
use crate::model::{Job, JobUpdate};

/// Shared update rule: terminal records are immutable.
pub(crate) fn apply_update(job: &mut Job, update: JobUpdate) -> StoreResult<()> {
    if job.is_terminal() {
        return Err(StoreError::Immutable {
            id: job.id,
            status: job.status,
        });
    }
    job.apply(update);
    Ok(())
}

/// Newest first, ties broken by id for a stable order.
pub(crate) fn sort_newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}
