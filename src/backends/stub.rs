// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles for every capability plus the compositor.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::errors::{BackendError, BackendResult, CompositeError, CompositeResult};
use crate::model::{AssetRef, JobId, Script, ScriptScene};
use crate::traits::{
    AvatarRequest, AvatarSynthesizer, CompositionOutput, CompositionRequest, Compositor,
    EnhanceRequest, ImageEnhancer, ImageGenerator, ImageRequest, MotionRequest,
    MotionSynthesizer, RenderProgress, ScriptGenerator, ScriptRequest, VoiceRequest,
    VoiceSynthesizer,
};

fn stub_url(kind: &str, job_id: &JobId, scene: usize, ext: &str) -> AssetRef {
    AssetRef::remote(format!("https://stub.test/{}/{}-{}.{}", job_id, kind, scene, ext))
}

/// Writes one scene per suggested slot, or an empty script.
pub struct StubScriptGenerator {
    pub empty: bool,
}

impl StubScriptGenerator {
    pub fn new() -> Self {
        Self { empty: false }
    }

    pub fn empty() -> Self {
        Self { empty: true }
    }
}

#[async_trait]
impl ScriptGenerator for StubScriptGenerator {
    async fn generate_script(&self, request: &ScriptRequest) -> BackendResult<Script> {
        if self.empty {
            return Ok(Script {
                title: "Empty".into(),
                scenes: vec![],
            });
        }
        let count = request.suggested_scene_count();
        let scenes = (0..count)
            .map(|i| ScriptScene {
                narration: format!("Line {} about {}", i + 1, request.prompt),
                visual_description: format!("shot {}", i + 1),
                emotion: "neutral".into(),
                duration_secs: request.duration_secs / count as f64,
            })
            .collect();
        Ok(Script {
            title: "Stub".into(),
            scenes,
        })
    }

    fn name(&self) -> &str {
        "stub-script"
    }
}

pub struct StubImageGenerator;

#[async_trait]
impl ImageGenerator for StubImageGenerator {
    async fn generate_image(&self, request: &ImageRequest) -> BackendResult<AssetRef> {
        Ok(stub_url("image", &request.ctx.job_id, request.ctx.scene_index, "png"))
    }

    fn name(&self) -> &str {
        "stub-image"
    }
}

/// Always fails with the configured error and counts its calls.
pub struct FailingImageGenerator {
    pub error: BackendError,
    pub calls: AtomicUsize,
}

impl FailingImageGenerator {
    pub fn new(error: BackendError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FailingImageGenerator {
    async fn generate_image(&self, _request: &ImageRequest) -> BackendResult<AssetRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    fn name(&self) -> &str {
        "failing-image"
    }
}

/// Fails the first `failures_per_scene` attempts for each scene with a
/// transient error, then succeeds.
pub struct FlakyImageGenerator {
    pub failures_per_scene: usize,
    attempts: Mutex<HashMap<usize, usize>>,
    pub calls: AtomicUsize,
}

impl FlakyImageGenerator {
    pub fn new(failures_per_scene: usize) -> Self {
        Self {
            failures_per_scene,
            attempts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FlakyImageGenerator {
    async fn generate_image(&self, request: &ImageRequest) -> BackendResult<AssetRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let seen = attempts.entry(request.ctx.scene_index).or_insert(0);
            *seen += 1;
            *seen
        };
        if attempt <= self.failures_per_scene {
            return Err(BackendError::Transient("502 Bad Gateway".into()));
        }
        Ok(stub_url("image", &request.ctx.job_id, request.ctx.scene_index, "png"))
    }

    fn name(&self) -> &str {
        "flaky-image"
    }
}

/// Counts calls and returns a distinct asset per scene.
pub struct StubEnhancer {
    pub calls: AtomicUsize,
}

impl StubEnhancer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageEnhancer for StubEnhancer {
    async fn enhance_image(&self, request: &EnhanceRequest) -> BackendResult<AssetRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(stub_url("enhanced", &request.ctx.job_id, request.ctx.scene_index, "png"))
    }

    fn name(&self) -> &str {
        "stub-enhancer"
    }
}

/// Reports each call's job on a channel, then never finishes.
pub struct BlockingEnhancer {
    pub started: mpsc::UnboundedSender<JobId>,
}

#[async_trait]
impl ImageEnhancer for BlockingEnhancer {
    async fn enhance_image(&self, request: &EnhanceRequest) -> BackendResult<AssetRef> {
        let _ = self.started.send(request.ctx.job_id);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(BackendError::Timeout(Duration::from_secs(3600)))
    }

    fn name(&self) -> &str {
        "blocking-enhancer"
    }
}

pub struct StubMotion {
    pub name: String,
    pub calls: AtomicUsize,
}

impl StubMotion {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MotionSynthesizer for StubMotion {
    async fn synthesize_motion(&self, request: &MotionRequest) -> BackendResult<AssetRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(stub_url(&self.name, &request.ctx.job_id, request.ctx.scene_index, "mp4"))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct StubVoice;

#[async_trait]
impl VoiceSynthesizer for StubVoice {
    async fn synthesize_voice(&self, request: &VoiceRequest) -> BackendResult<AssetRef> {
        Ok(stub_url("voice", &request.ctx.job_id, request.ctx.scene_index, "mp3"))
    }

    fn name(&self) -> &str {
        "stub-voice"
    }
}

/// Answers after `delay`, long past any test call timeout.
pub struct SlowVoice {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl SlowVoice {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VoiceSynthesizer for SlowVoice {
    async fn synthesize_voice(&self, request: &VoiceRequest) -> BackendResult<AssetRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(stub_url("voice", &request.ctx.job_id, request.ctx.scene_index, "mp3"))
    }

    fn name(&self) -> &str {
        "slow-voice"
    }
}

/// Succeeds except for the scene index in `fail_scene`.
pub struct StubAvatar {
    pub fail_scene: Option<usize>,
}

#[async_trait]
impl AvatarSynthesizer for StubAvatar {
    async fn synthesize_avatar(&self, request: &AvatarRequest) -> BackendResult<AssetRef> {
        if self.fail_scene == Some(request.ctx.scene_index) {
            return Err(BackendError::Rejected("no face found".into()));
        }
        Ok(stub_url("avatar", &request.ctx.job_id, request.ctx.scene_index, "mp4"))
    }

    fn name(&self) -> &str {
        "stub-avatar"
    }
}

/// Records requests, reports a few progress ticks and writes an empty output
/// file, or fails like a non-zero subprocess exit.
pub struct StubCompositor {
    pub fail: bool,
    pub requests: Mutex<Vec<CompositionRequest>>,
}

impl StubCompositor {
    pub fn new() -> Self {
        Self {
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn last_request(&self) -> Option<CompositionRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl Compositor for StubCompositor {
    async fn compose(
        &self,
        request: CompositionRequest,
        progress: RenderProgress<'_>,
        _cancel: &CancellationToken,
    ) -> CompositeResult<CompositionOutput> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        tokio::fs::create_dir_all(&request.work_dir).await?;
        if self.fail {
            let log_path = request.work_dir.join("compositor.log");
            tokio::fs::write(&log_path, "Invalid filter graph\n").await?;
            return Err(CompositeError::Exited {
                code: Some(1),
                log_path,
            });
        }

        for fraction in [0.25, 0.5, 0.75, 1.0] {
            progress(fraction);
        }
        let path = request.work_dir.join("final.mp4");
        tokio::fs::write(&path, b"stub video").await?;
        Ok(CompositionOutput {
            path,
            duration_secs: request.total_duration(),
        })
    }
}
