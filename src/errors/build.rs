// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::errors::{BackendBuildError, ConfigError, StoreError};

/// Anything that stops a runtime from being assembled.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backends(#[from] BackendBuildError),

    #[error("Failed to open job store: {0}")]
    Store(#[from] StoreError),
}
