// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Job, scene and asset records shared by every pipeline component.

pub mod asset;
pub mod config;
pub mod job;
pub mod script;
pub mod stage;

pub use asset::{AssetRef, AssetSlot, SyntheticAsset, PLACEHOLDER_COLOR};
pub use config::{JobConfig, MotionEngineChoice};
pub use job::{Job, JobErrorKind, JobFailure, JobId, JobStatus, JobUpdate, Scene};
pub use script::{Script, ScriptScene};
pub use stage::Stage;
