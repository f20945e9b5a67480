// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Log messages are typed structs with a `Display` implementation instead
//! of format strings scattered through the pipeline. Each one also knows
//! which fields it carries, so `log()` emits them as structured `tracing`
//! fields and `span()` opens a span tagged with the same fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::job` - job lifecycle from submission to a terminal state
//! * `messages::stage` - stage progress, skips, fallbacks and engine selection
//! * `messages::backend` - backend registry and backend call retries
//! * `messages::compositor` - render subprocess lifecycle
//!
//! # Usage
//!
//! ```rust
//! use reelforge::model::{JobId, Stage};
//! use reelforge::observability::messages::{stage::StageStarted, StructuredLog};
//!
//! let job_id = JobId::new();
//! let msg = StageStarted {
//!     job_id: &job_id,
//!     stage: Stage::Images,
//!     scene_count: 3,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
