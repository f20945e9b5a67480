// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by generation backends.
//!
//! Backend errors never escape the Stage Orchestrator except for
//! `QuotaExceeded`: every other variant is resolved by retrying (when
//! transient) and then substituting the stage's fallback asset.

use std::time::Duration;
use thiserror::Error;

use crate::errors::ScriptSchemaError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Network failure or 5xx-class response; retried with backoff.
    #[error("Transient backend failure: {0}")]
    Transient(String),

    /// A single call exceeded the per-call timeout; retried with backoff.
    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    /// The provider refused because the account is out of quota. Job-fatal.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Permanent rejection of this particular request (4xx-class).
    #[error("Backend rejected request: {0}")]
    Rejected(String),

    /// The provider answered but the payload could not be used.
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    /// An asynchronous provider task reached a failed terminal state.
    #[error("Backend task failed: {0}")]
    TaskFailed(String),

    /// Polling an asynchronous task hit the poll ceiling.
    #[error("Backend task still pending after {polls} polls")]
    PollLimitReached { polls: u32 },

    /// Local I/O while materializing a backend result.
    #[error("I/O error: {0}")]
    Io(String),
}

impl BackendError {
    /// Errors worth another attempt with the same request.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient(_) | BackendError::Timeout(_))
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, BackendError::QuotaExceeded(_))
    }
}

impl From<ScriptSchemaError> for BackendError {
    fn from(err: ScriptSchemaError) -> Self {
        BackendError::InvalidResponse(err.to_string())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            BackendError::Transient(err.to_string())
        } else if err.is_decode() {
            BackendError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            crate::backends::http::classify_status(status.as_u16(), err.to_string())
        } else {
            BackendError::Transient(err.to_string())
        }
    }
}

/// Result type alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;
