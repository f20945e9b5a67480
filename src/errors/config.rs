// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Errors found while validating pipeline configuration or a job request.
///
/// Job-request variants are raised by the Pipeline Controller before any
/// backend is called; configuration variants are raised at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The prompt is empty after trimming whitespace
    EmptyPrompt,
    /// The prompt exceeds the accepted length
    PromptTooLong {
        /// Length of the submitted prompt in characters
        length: usize,
        /// Maximum accepted length
        max: usize,
    },
    /// Requested video duration is outside the supported window
    DurationOutOfRange {
        requested: u32,
        min: u32,
        max: u32,
    },
    /// The job names a motion engine that is not configured
    UnknownMotionEngine {
        /// The engine name from the job request
        engine: String,
    },
    /// Too many reference images attached to the job
    TooManyReferenceImages { count: usize, max: usize },
    /// Stage weights must add up to exactly 100
    StageWeightsSum { sum: u32 },
    /// Worker pool size must be at least one
    ZeroConcurrency,
    /// At least one motion engine must be configured
    NoMotionEngines,
    /// Two motion engines share a name
    DuplicateMotionEngine { engine: String },
    /// The auto-selection policy refers to an engine that is not configured
    PolicyEngineMissing {
        /// Which policy role (premium/economy) is dangling
        role: &'static str,
        engine: String,
    },
    /// An HTTP backend was configured without an endpoint
    MissingEndpoint { backend: String },
    /// Polling an asynchronous task could outlast the call timeout
    PollCeilingExceedsTimeout { ceiling_ms: u128, timeout_ms: u128 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyPrompt => write!(f, "Prompt must not be empty"),
            ValidationError::PromptTooLong { length, max } => {
                write!(f, "Prompt is {} characters long, limit is {}", length, max)
            }
            ValidationError::DurationOutOfRange {
                requested,
                min,
                max,
            } => {
                write!(
                    f,
                    "Requested duration {}s is outside the supported range {}s..={}s",
                    requested, min, max
                )
            }
            ValidationError::UnknownMotionEngine { engine } => {
                write!(f, "Motion engine '{}' is not configured", engine)
            }
            ValidationError::TooManyReferenceImages { count, max } => {
                write!(f, "{} reference images supplied, limit is {}", count, max)
            }
            ValidationError::StageWeightsSum { sum } => {
                write!(f, "Stage weights must sum to 100, got {}", sum)
            }
            ValidationError::ZeroConcurrency => {
                write!(f, "max_concurrency must be at least 1")
            }
            ValidationError::NoMotionEngines => {
                write!(f, "At least one motion engine must be configured")
            }
            ValidationError::DuplicateMotionEngine { engine } => {
                write!(f, "Duplicate motion engine name: '{}'", engine)
            }
            ValidationError::PolicyEngineMissing { role, engine } => {
                write!(
                    f,
                    "motion_policy.{} refers to '{}' which is not a configured motion engine",
                    role, engine
                )
            }
            ValidationError::MissingEndpoint { backend } => {
                write!(f, "HTTP backend '{}' has no endpoint", backend)
            }
            ValidationError::PollCeilingExceedsTimeout {
                ceiling_ms,
                timeout_ms,
            } => {
                write!(
                    f,
                    "polling.interval_ms x polling.max_polls ({}ms) must be below call_timeout_seconds ({}ms)",
                    ceiling_ms, timeout_ms
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors loading a pipeline configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config file extension: '{0}' (expected yaml, yml or toml)")]
    UnsupportedFormat(String),

    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
