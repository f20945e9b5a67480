// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;

use super::media::options_to_json;
use super::*;
use crate::backends::polling::PollingAdapter;
use crate::config::{BackendConfig, BackendType};
use crate::errors::BackendBuildError;
use crate::traits::{
    AvatarSynthesizer, ImageEnhancer, ImageGenerator, MotionSynthesizer, ScriptGenerator,
    VoiceSynthesizer,
};

/// Factory for HTTP provider clients.
///
/// Every capability needs an `endpoint`. The bearer token is read from the
/// environment variable named by `api_key_env`; a named variable that is
/// unset fails the build rather than the first request.
pub struct HttpBackendFactory {
    call_timeout: Duration,
    polling: PollingAdapter,
}

impl HttpBackendFactory {
    pub fn new(call_timeout: Duration, polling: PollingAdapter) -> Self {
        Self {
            call_timeout,
            polling,
        }
    }

    pub fn create_script_generator(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn ScriptGenerator>, BackendBuildError> {
        let client = self.client("script", config)?;
        let mut generator =
            HttpScriptGenerator::new(config.display_name("script"), client, config.model.clone());
        if let Some(temperature) = config.option_f64("temperature") {
            generator.temperature = temperature;
        }
        let mut options = Self::options("script", config)?;
        options.remove("temperature");
        generator.options = options;
        Ok(Arc::new(generator))
    }

    pub fn create_image_generator(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn ImageGenerator>, BackendBuildError> {
        Ok(Arc::new(HttpImageGenerator {
            name: config.display_name("image"),
            endpoint: self.endpoint("image", config, "image", "png")?,
        }))
    }

    pub fn create_image_enhancer(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn ImageEnhancer>, BackendBuildError> {
        Ok(Arc::new(HttpImageEnhancer {
            name: config.display_name("enhancer"),
            endpoint: self.endpoint("enhancer", config, "enhanced", "png")?,
        }))
    }

    pub fn create_motion_synthesizer(
        &self,
        config: &BackendConfig,
        name: String,
    ) -> Result<Arc<dyn MotionSynthesizer>, BackendBuildError> {
        Ok(Arc::new(HttpMotionSynthesizer {
            name,
            endpoint: self.endpoint("motion", config, "motion", "mp4")?,
        }))
    }

    pub fn create_voice_synthesizer(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn VoiceSynthesizer>, BackendBuildError> {
        Ok(Arc::new(HttpVoiceSynthesizer {
            name: config.display_name("voice"),
            endpoint: self.endpoint("voice", config, "voice", "mp3")?,
        }))
    }

    pub fn create_avatar_synthesizer(
        &self,
        config: &BackendConfig,
    ) -> Result<Arc<dyn AvatarSynthesizer>, BackendBuildError> {
        Ok(Arc::new(HttpAvatarSynthesizer {
            name: config.display_name("avatar"),
            endpoint: self.endpoint("avatar", config, "avatar", "mp4")?,
        }))
    }

    fn endpoint(
        &self,
        capability: &'static str,
        config: &BackendConfig,
        label: &'static str,
        default_extension: &str,
    ) -> Result<MediaEndpoint, BackendBuildError> {
        let mut options = Self::options(capability, config)?;
        // `extension` names the output file type, it is not a body field.
        let extension = options
            .remove("extension")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| default_extension.to_string());

        Ok(MediaEndpoint {
            client: self.client(capability, config)?,
            mode: config.mode,
            polling: self.polling.clone(),
            model: config.model.clone(),
            options,
            label,
            extension,
        })
    }

    fn client(
        &self,
        capability: &'static str,
        config: &BackendConfig,
    ) -> Result<HttpClient, BackendBuildError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| failed(capability, "no endpoint configured".to_string()))?;

        let api_key = match &config.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                failed(capability, format!("environment variable {} is not set", var))
            })?),
            None => None,
        };

        HttpClient::new(endpoint, api_key, self.call_timeout)
            .map_err(|e| failed(capability, e.to_string()))
    }

    fn options(
        capability: &'static str,
        config: &BackendConfig,
    ) -> Result<Map<String, serde_json::Value>, BackendBuildError> {
        options_to_json(&config.options)
            .map_err(|e| failed(capability, format!("options are not JSON-compatible: {}", e)))
    }
}

fn failed(capability: &'static str, reason: String) -> BackendBuildError {
    BackendBuildError::BackendCreationFailed {
        capability,
        backend: BackendType::Http,
        reason,
    }
}
