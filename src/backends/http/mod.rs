// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! HTTP backends.
//!
//! Provider wire formats vary; these clients speak a small common dialect:
//! an OpenAI-compatible chat completion endpoint for scripts, and JSON
//! media endpoints that answer with an asset URL or inline base64 data,
//! either directly (`mode: sync`) or through a task id to poll
//! (`mode: async`).

pub mod client;
pub mod factory;
pub mod media;
pub mod script;
#[cfg(test)]
pub(crate) mod test_server;

pub use client::HttpClient;
pub use factory::HttpBackendFactory;
pub use media::{
    HttpAvatarSynthesizer, HttpImageEnhancer, HttpImageGenerator, HttpMotionSynthesizer,
    HttpVoiceSynthesizer, MediaEndpoint,
};
pub use script::HttpScriptGenerator;

use crate::errors::BackendError;

/// Map a non-success HTTP status to a backend error.
///
/// 402 means the account is out of quota and ends the job; 408, 429 and
/// 5xx are worth retrying; any other 4xx is a permanent rejection.
pub fn classify_status(status: u16, message: String) -> BackendError {
    match status {
        402 => BackendError::QuotaExceeded(message),
        408 | 429 | 500..=599 => BackendError::Transient(message),
        400..=499 => BackendError::Rejected(message),
        _ => BackendError::InvalidResponse(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(classify_status(402, "pay up".into()).is_quota());
        assert!(classify_status(429, "slow down".into()).is_transient());
        assert!(classify_status(408, "timeout".into()).is_transient());
        assert!(classify_status(503, "unavailable".into()).is_transient());
        assert!(matches!(
            classify_status(400, "bad prompt".into()),
            BackendError::Rejected(_)
        ));
        assert!(matches!(
            classify_status(302, "moved".into()),
            BackendError::InvalidResponse(_)
        ));
    }
}
