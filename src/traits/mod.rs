// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod compositor;
pub mod generation;
pub mod job_store;

pub use compositor::{
    ArtifactStore, CompositionOutput, CompositionRequest, Compositor, RenderProgress, TimelineClip,
};
pub use generation::{
    AvatarRequest, AvatarSynthesizer, EnhanceRequest, ImageEnhancer, ImageGenerator,
    ImageRequest, MotionRequest, MotionSynthesizer, SceneContext, ScriptGenerator, ScriptRequest,
    VoiceRequest, VoiceSynthesizer,
};
pub use job_store::JobStore;
