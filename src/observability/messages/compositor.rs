// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the render subprocess.

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;
use tracing::Span;

use crate::model::JobId;
use crate::observability::messages::StructuredLog;

/// # Log Level
/// `info!` - Important operational event
pub struct RenderStarted<'a> {
    pub job_id: &'a JobId,
    pub executable: &'a str,
    pub clip_count: usize,
    pub duration_secs: f64,
    pub output: &'a Path,
}

impl Display for RenderStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} rendering {} clips ({:.2}s) with '{}' into {}",
            self.job_id,
            self.clip_count,
            self.duration_secs,
            self.executable,
            self.output.display()
        )
    }
}

impl StructuredLog for RenderStarted<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            executable = self.executable,
            clip_count = self.clip_count,
            duration_secs = self.duration_secs,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "render",
            span_name = name,
            job_id = %self.job_id,
            clip_count = self.clip_count,
        )
    }
}

/// # Log Level
/// `info!` - Important operational event
pub struct RenderFinished<'a> {
    pub job_id: &'a JobId,
    pub output: &'a Path,
    pub duration: Duration,
}

impl Display for RenderFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} render finished in {:?}: {}",
            self.job_id,
            self.duration,
            self.output.display()
        )
    }
}

impl StructuredLog for RenderFinished<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("render_finished", span_name = name, job_id = %self.job_id)
    }
}

/// The render exited unsuccessfully; its log is kept for diagnosis.
///
/// # Log Level
/// `error!` - Job-fatal
pub struct RenderFailed<'a> {
    pub job_id: &'a JobId,
    pub exit_code: Option<i32>,
    pub log_path: &'a Path,
}

impl Display for RenderFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.exit_code {
            Some(code) => write!(
                f,
                "Job {} render exited with status {}; see {}",
                self.job_id,
                code,
                self.log_path.display()
            ),
            None => write!(
                f,
                "Job {} render was terminated by a signal; see {}",
                self.job_id,
                self.log_path.display()
            ),
        }
    }
}

impl StructuredLog for RenderFailed<'_> {
    fn log(&self) {
        tracing::error!(
            job_id = %self.job_id,
            exit_code = ?self.exit_code,
            log_path = %self.log_path.display(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("render_failed", span_name = name, job_id = %self.job_id)
    }
}
