// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Reasons a script payload from a text-completion backend was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptSchemaError {
    #[error("Script payload is not valid JSON: {0}")]
    Malformed(String),

    #[error("Script payload has no scene list")]
    MissingScenes,

    #[error("Script payload contains no usable scenes")]
    NoUsableScenes,

    #[error("Requested duration must be positive, got {0}")]
    InvalidTargetDuration(f64),
}
