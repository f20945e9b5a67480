// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for backend registry creation and backend client instantiation.

use crate::config::BackendType;
use thiserror::Error;

/// Errors that can occur while building the backend registry
#[derive(Debug, Error)]
pub enum BackendBuildError {
    /// The capability has no implementation for this backend type
    #[error("Backend type '{backend:?}' is not implemented for the {capability} capability")]
    BackendNotImplemented {
        capability: &'static str,
        backend: BackendType,
    },

    /// Failed to create a backend client from configuration
    #[error("Failed to create {backend:?} {capability} backend: {reason}")]
    BackendCreationFailed {
        capability: &'static str,
        backend: BackendType,
        reason: String,
    },
}
