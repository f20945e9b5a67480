// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for stage events inside a running job.

use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

use crate::errors::BackendError;
use crate::model::{JobId, Stage};
use crate::observability::messages::StructuredLog;

/// # Log Level
/// `info!` - Important operational event
pub struct StageStarted<'a> {
    pub job_id: &'a JobId,
    pub stage: Stage,
    pub scene_count: usize,
}

impl Display for StageStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} stage '{}' started: {} scenes",
            self.job_id, self.stage, self.scene_count
        )
    }
}

impl StructuredLog for StageStarted<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            stage = %self.stage,
            scene_count = self.scene_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage",
            span_name = name,
            stage = %self.stage,
            scene_count = self.scene_count,
        )
    }
}

/// Every scene of the stage resolved, by success or fallback.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StageCompleted<'a> {
    pub job_id: &'a JobId,
    pub stage: Stage,
    pub scene_count: usize,
    pub fallback_count: usize,
    pub duration: Duration,
}

impl Display for StageCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} stage '{}' completed in {:?}: {} scenes, {} fallbacks",
            self.job_id, self.stage, self.duration, self.scene_count, self.fallback_count
        )
    }
}

impl StructuredLog for StageCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            stage = %self.stage,
            scene_count = self.scene_count,
            fallback_count = self.fallback_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_completed",
            span_name = name,
            stage = %self.stage,
            fallback_count = self.fallback_count,
        )
    }
}

/// # Log Level
/// `info!` - Expected when a capability is disabled
pub struct StageSkipped<'a> {
    pub job_id: &'a JobId,
    pub stage: Stage,
    pub reason: &'a str,
}

impl Display for StageSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} stage '{}' skipped: {}",
            self.job_id, self.stage, self.reason
        )
    }
}

impl StructuredLog for StageSkipped<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            stage = %self.stage,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("stage_skipped", span_name = name, stage = %self.stage)
    }
}

/// A scene's backend call failed and its fallback asset was used.
///
/// # Log Level
/// `warn!` - Degraded output, job continues
pub struct SceneFallback<'a> {
    pub job_id: &'a JobId,
    pub stage: Stage,
    pub scene_index: usize,
    pub backend: &'a str,
    pub error: &'a BackendError,
}

impl Display for SceneFallback<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} stage '{}' scene {} fell back after '{}' failed: {}",
            self.job_id, self.stage, self.scene_index, self.backend, self.error
        )
    }
}

impl StructuredLog for SceneFallback<'_> {
    fn log(&self) {
        tracing::warn!(
            job_id = %self.job_id,
            stage = %self.stage,
            scene_index = self.scene_index,
            backend = self.backend,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "scene_fallback",
            span_name = name,
            stage = %self.stage,
            scene_index = self.scene_index,
        )
    }
}

/// # Log Level
/// `info!` - Cost-relevant decision
pub struct MotionEngineSelected<'a> {
    pub job_id: &'a JobId,
    pub engine: &'a str,
    pub requested: &'a str,
    pub credits_used: u64,
    pub credit_threshold: u64,
}

impl Display for MotionEngineSelected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} motion engine '{}' selected (requested '{}', credits {} vs threshold {})",
            self.job_id, self.engine, self.requested, self.credits_used, self.credit_threshold
        )
    }
}

impl StructuredLog for MotionEngineSelected<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            engine = self.engine,
            requested = self.requested,
            credits_used = self.credits_used,
            credit_threshold = self.credit_threshold,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("motion_engine", span_name = name, engine = self.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_message_names_scene_and_backend() {
        let job_id = JobId::new();
        let error = BackendError::Transient("HTTP 503".into());
        let msg = SceneFallback {
            job_id: &job_id,
            stage: Stage::Images,
            scene_index: 2,
            backend: "image",
            error: &error,
        };
        let text = msg.to_string();
        assert!(text.contains("stage 'images' scene 2"));
        assert!(text.contains("'image' failed: Transient backend failure: HTTP 503"));
    }
}
