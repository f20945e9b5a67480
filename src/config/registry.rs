// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::http::HttpBackendFactory;
use crate::backends::local::LocalBackendFactory;
use crate::backends::polling::PollingAdapter;
use crate::config::{BackendConfig, BackendType, PipelineConfig};
use crate::errors::BackendBuildError;
use crate::traits::{
    AvatarSynthesizer, ImageEnhancer, ImageGenerator, MotionSynthesizer, ScriptGenerator,
    VoiceSynthesizer,
};

/// The resolved backend for every capability a job can use.
///
/// Motion engines keep their configured order and names; the motion policy
/// and per-job `motion_engine` choices refer to them by name. Avatar is
/// optional: a registry without one skips the avatar stage.
///
/// # Example
/// ```ignore
/// let config = reelforge::config::load_and_validate_config("configs/local.yaml")?;
/// let registry = BackendRegistry::from_config(&config)?;
/// assert!(registry.motion_engine("cinematic").is_some());
/// ```
#[derive(Clone)]
pub struct BackendRegistry {
    pub script: Arc<dyn ScriptGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub enhancer: Arc<dyn ImageEnhancer>,
    pub motion: Vec<(String, Arc<dyn MotionSynthesizer>)>,
    pub voice: Arc<dyn VoiceSynthesizer>,
    pub avatar: Option<Arc<dyn AvatarSynthesizer>>,
}

impl BackendRegistry {
    /// Create every configured backend, failing on the first one that can't be built.
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, BackendBuildError> {
        let http = HttpBackendFactory::new(
            cfg.call_timeout(),
            PollingAdapter::from_config(&cfg.polling),
        );
        let backends = &cfg.backends;

        let script = match backends.script.backend {
            BackendType::Local => LocalBackendFactory::create_script_generator(&backends.script)?,
            BackendType::Http => http.create_script_generator(&backends.script)?,
        };
        let image = match backends.image.backend {
            BackendType::Local => LocalBackendFactory::create_image_generator(&backends.image)?,
            BackendType::Http => http.create_image_generator(&backends.image)?,
        };
        let enhancer = match backends.enhancer.backend {
            BackendType::Local => LocalBackendFactory::create_image_enhancer(&backends.enhancer)?,
            BackendType::Http => http.create_image_enhancer(&backends.enhancer)?,
        };
        let voice = match backends.voice.backend {
            BackendType::Local => LocalBackendFactory::create_voice_synthesizer(&backends.voice)?,
            BackendType::Http => http.create_voice_synthesizer(&backends.voice)?,
        };

        let motion = backends
            .motion
            .iter()
            .enumerate()
            .map(|(index, engine)| {
                let name = engine.motion_engine_name(index);
                let synthesizer = Self::motion_engine_from(&http, engine, name.clone())?;
                Ok((name, synthesizer))
            })
            .collect::<Result<Vec<_>, BackendBuildError>>()?;

        let avatar = match &backends.avatar {
            Some(config) => Some(match config.backend {
                BackendType::Local => LocalBackendFactory::create_avatar_synthesizer(config)?,
                BackendType::Http => http.create_avatar_synthesizer(config)?,
            }),
            None => None,
        };

        Ok(Self {
            script,
            image,
            enhancer,
            motion,
            voice,
            avatar,
        })
    }

    fn motion_engine_from(
        http: &HttpBackendFactory,
        config: &BackendConfig,
        name: String,
    ) -> Result<Arc<dyn MotionSynthesizer>, BackendBuildError> {
        match config.backend {
            BackendType::Local => LocalBackendFactory::create_motion_synthesizer(name),
            BackendType::Http => http.create_motion_synthesizer(config, name),
        }
    }

    /// Look up a motion engine by its configured name.
    pub fn motion_engine(&self, name: &str) -> Option<&Arc<dyn MotionSynthesizer>> {
        self.motion
            .iter()
            .find(|(engine, _)| engine == name)
            .map(|(_, synthesizer)| synthesizer)
    }

    pub fn motion_names(&self) -> Vec<String> {
        self.motion.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn has_avatar(&self) -> bool {
        self.avatar.is_some()
    }
}
