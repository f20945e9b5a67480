// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AssetRef, JobErrorKind};

/// Events pushed to progress subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The job advanced. `progress` never decreases within one job.
    Progress {
        progress: u8,
        step: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// The job completed; `artifact_ref` is the uploaded output.
    Complete {
        artifact_ref: AssetRef,
        timestamp: DateTime<Utc>,
    },
    /// The job failed or was cancelled.
    Error {
        error: String,
        kind: JobErrorKind,
        timestamp: DateTime<Utc>,
    },
}

impl ProgressEvent {
    pub fn progress<S: Into<String>, M: Into<String>>(progress: u8, step: S, message: M) -> Self {
        ProgressEvent::Progress {
            progress,
            step: step.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn complete(artifact_ref: AssetRef) -> Self {
        ProgressEvent::Complete {
            artifact_ref,
            timestamp: Utc::now(),
        }
    }

    pub fn error<S: Into<String>>(kind: JobErrorKind, error: S) -> Self {
        ProgressEvent::Error {
            error: error.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Complete and error events end the job's topic.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Progress { .. })
    }

    pub fn progress_value(&self) -> Option<u8> {
        match self {
            ProgressEvent::Progress { progress, .. } => Some(*progress),
            ProgressEvent::Complete { .. } => Some(100),
            ProgressEvent::Error { .. } => None,
        }
    }
}
