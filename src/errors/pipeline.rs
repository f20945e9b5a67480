// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::{CompositeError, StoreError, ValidationError};
use crate::model::{JobErrorKind, Stage};

/// Job-level errors.
///
/// Returned synchronously only by submission (`Validation`) and by the
/// controller's query operations; everything raised inside a running job is
/// converted into the job's terminal status instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid job request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Quota exceeded during {stage}: {message}")]
    QuotaExceeded { stage: Stage, message: String },

    #[error("Script generation failed: {0}")]
    Script(String),

    #[error("Script generation produced no scenes")]
    NoScenes,

    #[error("Compositing failed: {0}")]
    Composite(#[from] CompositeError),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Job was cancelled")]
    Cancelled,

    #[error("Job store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Kind recorded on the job when this error ends it.
    pub fn kind(&self) -> JobErrorKind {
        match self {
            PipelineError::Validation(_) => JobErrorKind::ValidationError,
            PipelineError::QuotaExceeded { .. } => JobErrorKind::QuotaExceededError,
            PipelineError::Script(_) | PipelineError::NoScenes => JobErrorKind::ScriptError,
            PipelineError::Composite(CompositeError::Cancelled) => JobErrorKind::CancellationError,
            PipelineError::Composite(_) => JobErrorKind::CompositeError,
            PipelineError::Upload(_) => JobErrorKind::UploadError,
            PipelineError::Cancelled => JobErrorKind::CancellationError,
            PipelineError::Store(_) | PipelineError::Io(_) => JobErrorKind::InternalError,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.kind() == JobErrorKind::CancellationError
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
