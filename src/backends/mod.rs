// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Generation backend implementations.
//!
//! Every capability trait in [`crate::traits`] has implementations here,
//! created from configuration by a per-backend-type factory:
//!
//! ## Local Backend
//! Deterministic in-process generators for dry runs and tests:
//! - **Script**: sentences of the prompt, one scene per slot
//! - **Image**: flat colour PPM frames seeded by the scene text
//! - **Enhance / Motion / Voice**: identity, still-hold and silence
//! - No avatar implementation
//!
//! ## HTTP Backend
//! Remote providers reached with `reqwest`:
//! - **Script**: chat-completions endpoint, answer repaired into a script
//! - **Media**: JSON endpoints answering inline (`mode: sync`) or with a task
//!   to poll (`mode: async`)
//!
//! ## Stub Backend (Test-Only)
//! Counting, failing and blocking stand-ins for engine tests. Not available
//! in production builds.
//!
//! # Architecture
//!
//! ```text
//! Configuration → Factory → Arc<dyn Capability> → BackendRegistry → Stage Orchestrator
//! ```
//!
//! Cross-cutting call behaviour lives beside the backends rather than in
//! them: [`retry::RetryPolicy`] bounds attempts and per-call time, and
//! [`polling::PollingAdapter`] turns submit-then-poll providers into a single
//! awaited call.

pub mod http;
pub mod local;
pub mod polling;
pub mod retry;
#[cfg(test)]
pub mod stub;

pub use polling::{AsyncTaskProvider, PollingAdapter, TaskStatus};
pub use retry::{RetryOn, RetryPolicy};
