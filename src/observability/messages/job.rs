// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for job lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Job submission and rejection
//! * The job task starting and reaching a terminal state

use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

use crate::model::{AssetRef, JobErrorKind, JobId};
use crate::observability::messages::StructuredLog;

/// A job passed validation and was stored as queued.
///
/// # Log Level
/// `info!` - Important operational event
pub struct JobSubmitted<'a> {
    pub job_id: &'a JobId,
    pub owner_id: &'a str,
    pub duration_secs: u32,
}

impl Display for JobSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} submitted by '{}' for a {}s video",
            self.job_id, self.owner_id, self.duration_secs
        )
    }
}

impl StructuredLog for JobSubmitted<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            owner_id = self.owner_id,
            duration_secs = self.duration_secs,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "job_submitted",
            span_name = name,
            job_id = %self.job_id,
            owner_id = self.owner_id,
        )
    }
}

/// A job request was rejected before anything was stored.
///
/// # Log Level
/// `warn!` - Caller error, no job exists
pub struct JobRejected<'a> {
    pub owner_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for JobRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Job request from '{}' rejected: {}", self.owner_id, self.error)
    }
}

impl StructuredLog for JobRejected<'_> {
    fn log(&self) {
        tracing::warn!(owner_id = self.owner_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("job_rejected", span_name = name, owner_id = self.owner_id)
    }
}

/// The job's task started running. Its span wraps the whole job.
///
/// # Log Level
/// `info!` - Important operational event
pub struct JobStarted<'a> {
    pub job_id: &'a JobId,
    pub max_concurrency: usize,
}

impl Display for JobStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} started: max_concurrency={}",
            self.job_id, self.max_concurrency
        )
    }
}

impl StructuredLog for JobStarted<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("job", span_name = name, job_id = %self.job_id)
    }
}

/// # Log Level
/// `info!` - Important operational event
pub struct JobCompleted<'a> {
    pub job_id: &'a JobId,
    pub artifact: &'a AssetRef,
    pub credits_used: u64,
    pub fallback_count: usize,
    pub duration: Duration,
}

impl Display for JobCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} completed in {:?}: artifact={}, credits={}, fallbacks={}",
            self.job_id, self.duration, self.artifact, self.credits_used, self.fallback_count
        )
    }
}

impl StructuredLog for JobCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            artifact = %self.artifact,
            credits_used = self.credits_used,
            fallback_count = self.fallback_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "job_completed",
            span_name = name,
            job_id = %self.job_id,
            credits_used = self.credits_used,
        )
    }
}

/// The job ended failed or cancelled.
///
/// # Log Level
/// `error!` for failures, `info!` for cancellation
pub struct JobFailed<'a> {
    pub job_id: &'a JobId,
    pub kind: JobErrorKind,
    pub error: &'a dyn std::error::Error,
}

impl Display for JobFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Job {} ended ({:?}): {}", self.job_id, self.kind, self.error)
    }
}

impl StructuredLog for JobFailed<'_> {
    fn log(&self) {
        if self.kind == JobErrorKind::CancellationError {
            tracing::info!(job_id = %self.job_id, kind = ?self.kind, "{}", self);
        } else {
            tracing::error!(
                job_id = %self.job_id,
                kind = ?self.kind,
                error = %self.error,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "job_failed",
            span_name = name,
            job_id = %self.job_id,
            kind = ?self.kind,
        )
    }
}
