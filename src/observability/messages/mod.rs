// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `job` - job lifecycle events
//! * `stage` - per-stage events inside one job
//! * `backend` - backend construction and call retries
//! * `compositor` - render subprocess events

use tracing::Span;

pub mod backend;
pub mod compositor;
pub mod job;
pub mod stage;

/// A log message that knows its own structured fields.
pub trait StructuredLog {
    /// Emit the message at its level with its fields attached.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
