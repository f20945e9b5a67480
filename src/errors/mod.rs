// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod backend;
mod build;
mod composite;
mod config;
mod pipeline;
mod registry;
mod script;
mod store;

pub use backend::{BackendError, BackendResult};
pub use build::BuildError;
pub use composite::{CompositeError, CompositeResult};
pub use config::{ConfigError, ValidationError};
pub use pipeline::{PipelineError, PipelineResult};
pub use registry::BackendBuildError;
pub use script::ScriptSchemaError;
pub use store::{StoreError, StoreResult};
