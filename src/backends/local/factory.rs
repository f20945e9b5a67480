// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::image::{DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH};
use super::*;
use crate::config::{BackendConfig, BackendType};
use crate::errors::BackendBuildError;
use crate::traits::{
    AvatarSynthesizer, ImageEnhancer, ImageGenerator, MotionSynthesizer, ScriptGenerator,
    VoiceSynthesizer,
};

/// Factory for in-process backends.
///
/// Every capability except avatar has a local implementation:
/// - script -> TemplateScriptWriter
/// - image -> GradientImageGenerator (`options.width`, `options.height`)
/// - enhancer -> IdentityEnhancer
/// - motion -> StillMotion
/// - voice -> SilentVoice
pub struct LocalBackendFactory;

impl LocalBackendFactory {
    pub fn create_script_generator(
        config: &BackendConfig,
    ) -> Result<Arc<dyn ScriptGenerator>, BackendBuildError> {
        Ok(Arc::new(TemplateScriptWriter::new(config.display_name("script"))))
    }

    pub fn create_image_generator(
        config: &BackendConfig,
    ) -> Result<Arc<dyn ImageGenerator>, BackendBuildError> {
        let width = config.option_u64("width").unwrap_or(DEFAULT_IMAGE_WIDTH as u64);
        let height = config.option_u64("height").unwrap_or(DEFAULT_IMAGE_HEIGHT as u64);
        let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(BackendBuildError::BackendCreationFailed {
                    capability: "image",
                    backend: BackendType::Local,
                    reason: format!("invalid image size {}x{}", width, height),
                })
            }
        };
        Ok(Arc::new(GradientImageGenerator::new(
            config.display_name("image"),
            width,
            height,
        )))
    }

    pub fn create_image_enhancer(
        config: &BackendConfig,
    ) -> Result<Arc<dyn ImageEnhancer>, BackendBuildError> {
        Ok(Arc::new(IdentityEnhancer::new(config.display_name("enhancer"))))
    }

    /// `name` is the engine name the motion policy refers to.
    pub fn create_motion_synthesizer(
        name: String,
    ) -> Result<Arc<dyn MotionSynthesizer>, BackendBuildError> {
        Ok(Arc::new(StillMotion::new(name)))
    }

    pub fn create_voice_synthesizer(
        config: &BackendConfig,
    ) -> Result<Arc<dyn VoiceSynthesizer>, BackendBuildError> {
        Ok(Arc::new(SilentVoice::new(config.display_name("voice"))))
    }

    pub fn create_avatar_synthesizer(
        _config: &BackendConfig,
    ) -> Result<Arc<dyn AvatarSynthesizer>, BackendBuildError> {
        Err(BackendBuildError::BackendNotImplemented {
            capability: "avatar",
            backend: BackendType::Local,
        })
    }
}
