// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::model::{JobId, JobStatus};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job already exists: {0}")]
    AlreadyExists(JobId),

    /// Terminal job records only change through deletion.
    #[error("Job {id} is {status} and can no longer be updated")]
    Immutable { id: JobId, status: JobStatus },

    #[error("Job {0} has not reached a terminal state")]
    NotTerminal(JobId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
