// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for backend construction and backend calls.

use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

use crate::errors::BackendError;
use crate::observability::messages::StructuredLog;

/// Backend registry built from configuration.
///
/// # Log Level
/// `info!` - Startup event
pub struct RegistryBuilt<'a> {
    pub script: &'a str,
    pub image: &'a str,
    pub enhancer: &'a str,
    pub motion_engines: &'a [String],
    pub voice: &'a str,
    pub avatar: Option<&'a str>,
}

impl Display for RegistryBuilt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Backends ready: script='{}' image='{}' enhancer='{}' motion=[{}] voice='{}' avatar={}",
            self.script,
            self.image,
            self.enhancer,
            self.motion_engines.join(", "),
            self.voice,
            self.avatar.unwrap_or("none")
        )
    }
}

impl StructuredLog for RegistryBuilt<'_> {
    fn log(&self) {
        tracing::info!(
            script = self.script,
            image = self.image,
            motion_engines = self.motion_engines.len(),
            avatar = self.avatar.is_some(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("registry", span_name = name)
    }
}

/// A backend call failed and will be attempted again.
///
/// # Log Level
/// `warn!` - Recoverable failure
pub struct RetryScheduled<'a> {
    pub operation: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: &'a BackendError,
}

impl Display for RetryScheduled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Backend call '{}' failed on attempt {}/{}, retrying in {:?}: {}",
            self.operation, self.attempt, self.max_attempts, self.delay, self.error
        )
    }
}

impl StructuredLog for RetryScheduled<'_> {
    fn log(&self) {
        tracing::warn!(
            operation = self.operation,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            delay_ms = self.delay.as_millis() as u64,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "retry",
            span_name = name,
            operation = self.operation,
            attempt = self.attempt,
        )
    }
}
