// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capability contracts for the pluggable generation backends.
//!
//! Each capability has exactly one required operation. Implementations may be
//! synchronous HTTP calls, submit-then-poll providers wrapped in
//! [`PollingAdapter`](crate::backends::polling::PollingAdapter), or in-process
//! generators; the orchestrator only ever sees these traits.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::errors::BackendResult;
use crate::model::{AssetRef, JobId, Script};

/// Where a backend call sits within its job, for naming outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneContext {
    pub job_id: JobId,
    pub scene_index: usize,
    /// Per-job scratch directory for materialized outputs.
    pub work_dir: PathBuf,
}

impl SceneContext {
    /// File path for an output of this scene, e.g. `scene-02-image.png`.
    pub fn output_path(&self, label: &str, extension: &str) -> PathBuf {
        self.work_dir
            .join(format!("scene-{:02}-{}.{}", self.scene_index, label, extension))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRequest {
    pub prompt: String,
    pub duration_secs: f64,
    pub style: String,
    pub tone: String,
    /// Preferred scene length; backends may deviate.
    pub scene_length_secs: f64,
}

impl ScriptRequest {
    pub fn suggested_scene_count(&self) -> usize {
        ((self.duration_secs / self.scene_length_secs).round() as usize).max(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub ctx: SceneContext,
    pub scene_text: String,
    pub style: String,
    pub reference_images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceRequest {
    pub ctx: SceneContext,
    pub image: AssetRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionRequest {
    pub ctx: SceneContext,
    pub image: AssetRef,
    pub scene_text: String,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceRequest {
    pub ctx: SceneContext,
    pub text: String,
    pub voice_profile: String,
    pub emotion: String,
    /// Scene length the narration should fit.
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvatarRequest {
    pub ctx: SceneContext,
    pub audio: AssetRef,
    pub image: AssetRef,
}

/// Writes the narrated script. No fallback: failure is job-fatal.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate_script(&self, request: &ScriptRequest) -> BackendResult<Script>;

    fn name(&self) -> &str;
}

/// Produces one still image per scene. Falls back to a placeholder card.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> BackendResult<AssetRef>;

    fn name(&self) -> &str;
}

/// Upscales or retouches an image. Falls back to the original image.
#[async_trait]
pub trait ImageEnhancer: Send + Sync {
    async fn enhance_image(&self, request: &EnhanceRequest) -> BackendResult<AssetRef>;

    fn name(&self) -> &str;
}

/// Animates a still into a clip. Falls back to a still-hold of the image.
#[async_trait]
pub trait MotionSynthesizer: Send + Sync {
    async fn synthesize_motion(&self, request: &MotionRequest) -> BackendResult<AssetRef>;

    fn name(&self) -> &str;
}

/// Speaks the narration. Falls back to duration-matched silence.
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    async fn synthesize_voice(&self, request: &VoiceRequest) -> BackendResult<AssetRef>;

    fn name(&self) -> &str;
}

/// Renders a talking avatar. Any failure skips the avatar stage for the job.
#[async_trait]
pub trait AvatarSynthesizer: Send + Sync {
    async fn synthesize_avatar(&self, request: &AvatarRequest) -> BackendResult<AssetRef>;

    fn name(&self) -> &str;
}
