// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the compositing subprocess. Always job-fatal.
#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("Nothing to composite: timeline has no clips")]
    EmptyTimeline,

    #[error("Failed to launch compositor '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit. The log and intermediate files are left in place.
    #[error("Compositor exited with {} (log: {})", describe_exit(.code), .log_path.display())]
    Exited {
        code: Option<i32>,
        log_path: PathBuf,
    },

    #[error("Compositor reported success but produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("Compositor was terminated by cancellation")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

pub type CompositeResult<T> = Result<T, CompositeError>;
