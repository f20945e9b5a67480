// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::BackendResult;
use crate::model::AssetRef;
use crate::traits::{
    EnhanceRequest, ImageEnhancer, MotionRequest, MotionSynthesizer, VoiceRequest,
    VoiceSynthesizer,
};

/// Returns the image unchanged.
#[derive(Debug, Clone)]
pub struct IdentityEnhancer {
    name: String,
}

impl IdentityEnhancer {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

#[async_trait]
impl ImageEnhancer for IdentityEnhancer {
    async fn enhance_image(&self, request: &EnhanceRequest) -> BackendResult<AssetRef> {
        Ok(request.image.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Holds the image on screen for the scene's length; the compositor adds
/// Ken Burns motion when enabled.
#[derive(Debug, Clone)]
pub struct StillMotion {
    name: String,
}

impl StillMotion {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

#[async_trait]
impl MotionSynthesizer for StillMotion {
    async fn synthesize_motion(&self, request: &MotionRequest) -> BackendResult<AssetRef> {
        Ok(AssetRef::still_hold(request.image.clone(), request.duration_secs))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Narration-length silence, for pipelines without a voice provider.
#[derive(Debug, Clone)]
pub struct SilentVoice {
    name: String,
}

impl SilentVoice {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

#[async_trait]
impl VoiceSynthesizer for SilentVoice {
    async fn synthesize_voice(&self, request: &VoiceRequest) -> BackendResult<AssetRef> {
        Ok(AssetRef::silence(request.duration_secs))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
