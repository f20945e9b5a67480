// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validation for pipeline configuration and job requests.
//!
//! Two entry points with different audiences:
//!
//! - [`validate_pipeline_config`] runs once at load time and accumulates every
//!   problem it finds, so an operator can fix a config file in one pass.
//! - [`validate_job_request`] runs on every submission, before any backend is
//!   called, and stops at the first problem because the caller gets exactly
//!   one error back.
//!
//! # Pipeline config checks
//!
//! 1. **Worker pool**: `max_concurrency` must be at least 1
//! 2. **Stage weights**: the eight weights must add up to exactly 100
//! 3. **Motion engines**: at least one, with unique names
//! 4. **Motion policy**: `premium`/`economy` must name configured engines
//! 5. **HTTP backends**: every `type: http` backend needs an `endpoint`
//! 6. **Polling**: with any `mode: async` backend, the poll ceiling
//!    (`interval_ms` x `max_polls`) must end before `call_timeout_seconds`
//!
//! # Examples
//!
//! ```rust,ignore
//! use reelforge::config::{load_config, validate_pipeline_config};
//!
//! let cfg = load_config("pipeline.yaml")?;
//! if let Err(errors) = validate_pipeline_config(&cfg) {
//!     for error in errors {
//!         eprintln!("Validation error: {}", error);
//!     }
//! }
//! ```

use std::collections::HashSet;

use crate::config::{BackendConfig, BackendType, CallMode, PipelineConfig};
use crate::errors::ValidationError;
use crate::model::config::{
    MAX_DURATION_SECS, MAX_PROMPT_CHARS, MAX_REFERENCE_IMAGES, MIN_DURATION_SECS,
};
use crate::model::{JobConfig, MotionEngineChoice};

/// Validates a pipeline configuration, reporting every error found.
pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_concurrency == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }

    let sum = config.stage_weights.total();
    if sum != 100 {
        errors.push(ValidationError::StageWeightsSum { sum });
    }

    errors.extend(validate_motion_engines(config));
    errors.extend(validate_endpoints(config));
    errors.extend(validate_polling(config));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Motion engines must exist, be uniquely named, and cover the policy roles.
fn validate_motion_engines(config: &PipelineConfig) -> Vec<ValidationError> {
    let names = config.motion_engine_names();
    if names.is_empty() {
        return vec![ValidationError::NoMotionEngines];
    }

    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateMotionEngine {
                engine: name.clone(),
            });
        }
    }

    let roles = [
        ("premium", &config.motion_policy.premium),
        ("economy", &config.motion_policy.economy),
    ];
    for (role, engine) in roles {
        if let Some(engine) = engine {
            if !seen.contains(engine.as_str()) {
                errors.push(ValidationError::PolicyEngineMissing {
                    role,
                    engine: engine.clone(),
                });
            }
        }
    }

    errors
}

fn named_backends(config: &PipelineConfig) -> Vec<(String, &BackendConfig)> {
    let backends = &config.backends;
    let mut named: Vec<(String, &BackendConfig)> = vec![
        (backends.script.display_name("script"), &backends.script),
        (backends.image.display_name("image"), &backends.image),
        (backends.enhancer.display_name("enhancer"), &backends.enhancer),
        (backends.voice.display_name("voice"), &backends.voice),
    ];
    named.extend(
        backends
            .motion
            .iter()
            .enumerate()
            .map(|(i, b)| (b.motion_engine_name(i), b)),
    );
    if let Some(avatar) = &backends.avatar {
        named.push((avatar.display_name("avatar"), avatar));
    }
    named
}

fn validate_endpoints(config: &PipelineConfig) -> Vec<ValidationError> {
    named_backends(config)
        .into_iter()
        .filter(|(_, b)| b.backend == BackendType::Http)
        .filter(|(_, b)| b.endpoint.as_deref().map_or(true, |e| e.trim().is_empty()))
        .map(|(backend, _)| ValidationError::MissingEndpoint { backend })
        .collect()
}

/// A call timeout on a submitted task is retried with a fresh submit, so
/// the poll ceiling has to fire first.
fn validate_polling(config: &PipelineConfig) -> Option<ValidationError> {
    let polls = named_backends(config)
        .iter()
        .any(|(_, b)| b.backend == BackendType::Http && b.mode == CallMode::Async);
    let ceiling = config.polling.ceiling();
    let timeout = config.call_timeout();
    (polls && ceiling >= timeout).then(|| ValidationError::PollCeilingExceedsTimeout {
        ceiling_ms: ceiling.as_millis(),
        timeout_ms: timeout.as_millis(),
    })
}

/// Validates a job submission against the limits and the configured engines.
///
/// Returns the first problem found; nothing has been created or called yet
/// when this fails.
pub fn validate_job_request(
    prompt: &str,
    config: &JobConfig,
    motion_engines: &[String],
) -> Result<(), ValidationError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }

    let length = prompt.chars().count();
    if length > MAX_PROMPT_CHARS {
        return Err(ValidationError::PromptTooLong {
            length,
            max: MAX_PROMPT_CHARS,
        });
    }

    if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&config.duration_secs) {
        return Err(ValidationError::DurationOutOfRange {
            requested: config.duration_secs,
            min: MIN_DURATION_SECS,
            max: MAX_DURATION_SECS,
        });
    }

    if let MotionEngineChoice::Named(engine) = &config.motion_engine {
        if !motion_engines.iter().any(|name| name == engine) {
            return Err(ValidationError::UnknownMotionEngine {
                engine: engine.clone(),
            });
        }
    }

    if config.reference_images.len() > MAX_REFERENCE_IMAGES {
        return Err(ValidationError::TooManyReferenceImages {
            count: config.reference_images.len(),
            max: MAX_REFERENCE_IMAGES,
        });
    }

    Ok(())
}
