// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // generation backends
pub mod compositor;    // render graph + media tool driver
pub mod config;        // config + registry + runtime
pub mod credits;       // per-job credit metering
pub mod engine;        // orchestrator + controller
pub mod errors;        // error handling
pub mod model;         // jobs, scenes, assets
pub mod observability;
pub mod progress;      // per-job progress topics
pub mod store;         // job persistence
pub mod traits;        // capability abstractions
