// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;
mod runtime;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, parse_config, BackendConfig, BackendType,
    BackendsConfig, CallMode, CompositorConfig, MotionPolicyConfig, PipelineConfig,
    PollingConfig, RetryConfig, StageWeights, StorageConfig, TitleOverlayConfig, Transition,
};
pub use registry::BackendRegistry;
pub use runtime::RuntimeBuilder;
pub use validation::{validate_job_request, validate_pipeline_config};
