// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deterministic in-process backends for dry runs and local development.

pub mod factory;
pub mod image;
pub mod media;
pub mod script;

pub use factory::LocalBackendFactory;
pub use image::GradientImageGenerator;
pub use media::{IdentityEnhancer, SilentVoice, StillMotion};
pub use script::TemplateScriptWriter;
