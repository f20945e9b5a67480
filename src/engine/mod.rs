// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Job execution.
//!
//! [`PipelineController`] spawns one [`StageOrchestrator`] task per job. The
//! orchestrator walks the stages in order, fanning per-scene backend calls
//! out through a bounded [`WorkerPool`], and reports progress in the bands
//! laid out by [`ProgressPlan`].

pub mod controller;
pub mod fan_out;
pub mod motion_policy;
pub mod orchestrator;
pub mod plan;

#[cfg(test)]
mod integration_tests;

pub use controller::PipelineController;
pub use fan_out::WorkerPool;
pub use motion_policy::MotionPolicy;
pub use orchestrator::{OrchestratorSettings, PipelineServices, StageOrchestrator};
pub use plan::ProgressPlan;
