// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The per-job state machine.
//!
//! A [`StageOrchestrator`] owns one job from `queued` to a terminal status.
//! Stages run strictly in order:
//!
//! ```text
//! script → images → enhance → motion → voice → avatar? → composite → upload
//! ```
//!
//! Per-scene stages fan out through the job's [`WorkerPool`]. A scene whose
//! backend call fails (after retries) gets the stage's fallback asset and the
//! job carries on; the stage's slots reach the Job Store in one update once
//! every scene has resolved. Only an empty script, a quota refusal, a
//! compositor or upload failure, or cancellation end the job early.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn, Instrument};

use crate::backends::{RetryOn, RetryPolicy};
use crate::config::{BackendRegistry, PipelineConfig, StageWeights};
use crate::credits::{BillableOperation, CreditMeter};
use crate::engine::fan_out::WorkerPool;
use crate::engine::motion_policy::MotionPolicy;
use crate::engine::plan::ProgressPlan;
use crate::errors::{BackendError, BackendResult, PipelineError, PipelineResult};
use crate::model::{AssetRef, AssetSlot, Job, JobStatus, JobUpdate, Scene, Stage};
use crate::observability::messages::job::{JobCompleted, JobFailed, JobStarted};
use crate::observability::messages::stage::{
    MotionEngineSelected, SceneFallback, StageCompleted, StageSkipped, StageStarted,
};
use crate::observability::messages::StructuredLog;
use crate::progress::{ProgressBroadcaster, ProgressEvent};
use crate::traits::{
    ArtifactStore, AvatarRequest, CompositionOutput, CompositionRequest, Compositor,
    EnhanceRequest, ImageRequest, JobStore, MotionRequest, SceneContext, ScriptRequest,
    TimelineClip, VoiceRequest,
};

/// Knobs every orchestrator shares.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
    pub stage_weights: StageWeights,
    pub motion_policy: MotionPolicy,
    pub scene_length_secs: f64,
    /// Parent of the per-job working directories.
    pub work_dir: PathBuf,
    pub keep_intermediates: bool,
}

impl OrchestratorSettings {
    pub fn from_config(cfg: &PipelineConfig, motion_policy: MotionPolicy) -> Self {
        Self {
            max_concurrency: cfg.max_concurrency,
            retry: RetryPolicy::from_config(&cfg.retry, cfg.call_timeout()),
            stage_weights: cfg.stage_weights.clone(),
            motion_policy,
            scene_length_secs: cfg.scene_length_seconds,
            work_dir: cfg.storage.work_dir.clone(),
            keep_intermediates: cfg.storage.keep_intermediates,
        }
    }
}

/// Collaborators shared by all running jobs.
pub struct PipelineServices {
    pub backends: BackendRegistry,
    pub compositor: Arc<dyn Compositor>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub store: Arc<dyn JobStore>,
    pub broadcaster: Arc<ProgressBroadcaster>,
    pub meter: Arc<CreditMeter>,
    pub settings: OrchestratorSettings,
}

/// One scene's input to a fan-out stage.
enum SceneWork<R> {
    /// Call the backend; use `fallback` if the call fails.
    Call { request: R, fallback: AssetRef },
    /// Nothing to call, the slot is already known.
    Resolved(AssetSlot),
}

/// Drives one job through every stage.
pub struct StageOrchestrator {
    services: Arc<PipelineServices>,
    job: Job,
    plan: ProgressPlan,
    pool: WorkerPool,
    cancel: CancellationToken,
    work_dir: PathBuf,
    /// Highest progress value published so far.
    published: Arc<AtomicU8>,
}

impl StageOrchestrator {
    pub fn new(services: Arc<PipelineServices>, job: Job, cancel: CancellationToken) -> Self {
        let include_avatar = job.config.avatar && services.backends.has_avatar();
        let plan = ProgressPlan::new(&services.settings.stage_weights, include_avatar);
        let pool = WorkerPool::new(services.settings.max_concurrency);
        let work_dir = services.settings.work_dir.join(job.id.to_string());
        Self {
            services,
            job,
            plan,
            pool,
            cancel,
            work_dir,
            published: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Run the job to a terminal status and return the final record.
    pub async fn run(mut self) -> Job {
        let job_id = self.job.id;
        let started = JobStarted {
            job_id: &job_id,
            max_concurrency: self.pool.max_concurrency(),
        };
        let span = started.span("job");
        started.log();

        async move {
            let started_at = Instant::now();
            match self.execute().await {
                Ok(artifact) => self.complete(artifact, started_at).await,
                Err(error) => self.fail(error).await,
            }
            self.job
        }
        .instrument(span)
        .await
    }

    async fn execute(&mut self) -> PipelineResult<AssetRef> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        self.update(JobUpdate::new().status(JobStatus::Generating))
            .await?;

        self.script_stage().await?;
        self.images_stage().await?;
        self.enhance_stage().await?;
        self.motion_stage().await?;
        self.voice_stage().await?;
        self.avatar_stage().await?;
        let output = self.composite_stage().await?;
        self.upload_stage(&output).await
    }

    async fn script_stage(&mut self) -> PipelineResult<()> {
        let stage = Stage::Script;
        let started = self.begin_stage(stage, 0).await?;

        let config = &self.job.config;
        let request = ScriptRequest {
            prompt: self.job.prompt.clone(),
            duration_secs: f64::from(config.duration_secs),
            style: config.visual_style.clone(),
            tone: config.tone.clone(),
            scene_length_secs: self.services.settings.scene_length_secs,
        };
        let writer = &self.services.backends.script;
        let request = &request;
        let result = until_cancelled(
            &self.cancel,
            self.services.settings.retry.run(
                "script",
                RetryOn::TransientOrInvalid,
                || async move { writer.generate_script(request).await },
            ),
        )
        .await?;

        let script = match result {
            Ok(script) => script,
            Err(error) if error.is_quota() => {
                return Err(PipelineError::QuotaExceeded {
                    stage,
                    message: error.to_string(),
                })
            }
            Err(error) => return Err(PipelineError::Script(error.to_string())),
        };
        self.services
            .meter
            .charge(self.job.id, &BillableOperation::Script);

        if script.scenes.is_empty() {
            return Err(PipelineError::NoScenes);
        }

        let scenes: Vec<Scene> = script
            .scenes
            .into_iter()
            .enumerate()
            .map(|(index, scene)| {
                Scene::new(
                    index,
                    scene.duration_secs,
                    scene.narration,
                    scene.visual_description,
                    scene.emotion,
                )
            })
            .collect();

        self.finish_stage(
            stage,
            started,
            JobUpdate::new().title(script.title).scenes(scenes),
        )
        .await
    }

    async fn images_stage(&mut self) -> PipelineResult<()> {
        let stage = Stage::Images;
        let started = self.begin_stage(stage, self.job.scenes.len()).await?;

        let config = &self.job.config;
        let work = self
            .job
            .scenes
            .iter()
            .map(|scene| SceneWork::Call {
                request: ImageRequest {
                    ctx: self.scene_context(scene),
                    scene_text: scene.visual_description.clone(),
                    style: config.visual_style.clone(),
                    reference_images: config.reference_images.clone(),
                },
                fallback: AssetRef::placeholder_image(),
            })
            .collect();

        let backend = Arc::clone(&self.services.backends.image);
        let name = backend.name().to_string();
        let slots = self
            .fan_out(stage, &name, BillableOperation::Image, work, move |request| {
                let backend = Arc::clone(&backend);
                async move { backend.generate_image(&request).await }
            })
            .await?;

        let scenes = self.with_slots(stage, slots);
        self.finish_stage(stage, started, JobUpdate::new().scenes(scenes))
            .await
    }

    async fn enhance_stage(&mut self) -> PipelineResult<()> {
        let stage = Stage::Enhance;
        let started = self.begin_stage(stage, self.job.scenes.len()).await?;

        let work = self
            .job
            .scenes
            .iter()
            .map(|scene| {
                let image = scene
                    .image
                    .as_ref()
                    .map(|slot| slot.asset.clone())
                    .unwrap_or_else(AssetRef::placeholder_image);
                // A placeholder has nothing to enhance.
                if image.is_synthetic() {
                    SceneWork::Resolved(AssetSlot::fallback(image))
                } else {
                    SceneWork::Call {
                        request: EnhanceRequest {
                            ctx: self.scene_context(scene),
                            image: image.clone(),
                        },
                        fallback: image,
                    }
                }
            })
            .collect();

        let backend = Arc::clone(&self.services.backends.enhancer);
        let name = backend.name().to_string();
        let slots = self
            .fan_out(stage, &name, BillableOperation::Enhance, work, move |request| {
                let backend = Arc::clone(&backend);
                async move { backend.enhance_image(&request).await }
            })
            .await?;

        let scenes = self.with_slots(stage, slots);
        self.finish_stage(stage, started, JobUpdate::new().scenes(scenes))
            .await
    }

    async fn motion_stage(&mut self) -> PipelineResult<()> {
        let stage = Stage::Motion;
        let started = self.begin_stage(stage, self.job.scenes.len()).await?;

        let credits_used = self.services.meter.total(self.job.id);
        let requested = &self.job.config.motion_engine;
        let engine = self
            .services
            .settings
            .motion_policy
            .select(requested, credits_used)
            .to_string();
        MotionEngineSelected {
            job_id: &self.job.id,
            engine: &engine,
            requested: &requested.to_string(),
            credits_used,
            credit_threshold: self.services.settings.motion_policy.credit_threshold,
        }
        .log();

        let work: Vec<SceneWork<MotionRequest>> = self
            .job
            .scenes
            .iter()
            .map(|scene| {
                let image = scene
                    .best_image()
                    .cloned()
                    .unwrap_or_else(AssetRef::placeholder_image);
                let hold = AssetRef::still_hold(image.clone(), scene.duration_secs);
                if image.is_synthetic() {
                    SceneWork::Resolved(AssetSlot::fallback(hold))
                } else {
                    SceneWork::Call {
                        request: MotionRequest {
                            ctx: self.scene_context(scene),
                            image,
                            scene_text: scene.visual_description.clone(),
                            duration_secs: scene.duration_secs,
                        },
                        fallback: hold,
                    }
                }
            })
            .collect();

        let slots = match self.services.backends.motion_engine(&engine).cloned() {
            Some(backend) => {
                self.fan_out(
                    stage,
                    &engine,
                    BillableOperation::Motion(engine.clone()),
                    work,
                    move |request| {
                        let backend = Arc::clone(&backend);
                        async move { backend.synthesize_motion(&request).await }
                    },
                )
                .await?
            }
            None => {
                warn!(job_id = %self.job.id, engine = %engine, "Motion engine not registered, holding stills");
                work.into_iter()
                    .map(|item| match item {
                        SceneWork::Call { fallback, .. } => AssetSlot::fallback(fallback),
                        SceneWork::Resolved(slot) => slot,
                    })
                    .collect()
            }
        };

        let scenes = self.with_slots(stage, slots);
        self.finish_stage(stage, started, JobUpdate::new().scenes(scenes))
            .await
    }

    async fn voice_stage(&mut self) -> PipelineResult<()> {
        let stage = Stage::Voice;
        let started = self.begin_stage(stage, self.job.scenes.len()).await?;

        let config = &self.job.config;
        let work = self
            .job
            .scenes
            .iter()
            .map(|scene| {
                let silence = AssetRef::silence(scene.duration_secs);
                // Nothing to say is not a failure.
                if scene.narration_text.trim().is_empty() {
                    SceneWork::Resolved(AssetSlot::generated(silence))
                } else {
                    SceneWork::Call {
                        request: VoiceRequest {
                            ctx: self.scene_context(scene),
                            text: scene.narration_text.clone(),
                            voice_profile: config.voice_profile.clone(),
                            emotion: scene.emotion_tag.clone(),
                            duration_secs: scene.duration_secs,
                        },
                        fallback: silence,
                    }
                }
            })
            .collect();

        let backend = Arc::clone(&self.services.backends.voice);
        let name = backend.name().to_string();
        let slots = self
            .fan_out(stage, &name, BillableOperation::Voice, work, move |request| {
                let backend = Arc::clone(&backend);
                async move { backend.synthesize_voice(&request).await }
            })
            .await?;

        let scenes = self.with_slots(stage, slots);
        self.finish_stage(stage, started, JobUpdate::new().scenes(scenes))
            .await
    }

    /// Optional stage. It either produces an avatar clip for every scene or
    /// leaves them all empty; a partial avatar track is never composited.
    /// Clips that were generated before the track was dropped stay charged:
    /// the provider billed for them either way.
    async fn avatar_stage(&mut self) -> PipelineResult<()> {
        let stage = Stage::Avatar;
        if !self.job.config.avatar {
            return Ok(());
        }
        let backend = match self.services.backends.avatar.clone() {
            Some(backend) => backend,
            None => {
                StageSkipped {
                    job_id: &self.job.id,
                    stage,
                    reason: "no avatar backend is configured",
                }
                .log();
                return Ok(());
            }
        };
        let started = self.begin_stage(stage, self.job.scenes.len()).await?;

        let inputs: Option<Vec<(AssetRef, AssetRef)>> = self
            .job
            .scenes
            .iter()
            .map(|scene| {
                let audio = scene.audio.as_ref()?.asset.clone();
                let image = scene.best_image()?.clone();
                (!audio.is_synthetic() && !image.is_synthetic()).then_some((audio, image))
            })
            .collect();
        let inputs = match inputs {
            Some(inputs) => inputs,
            None => {
                StageSkipped {
                    job_id: &self.job.id,
                    stage,
                    reason: "a scene has no generated narration or image",
                }
                .log();
                return self.finish_stage(stage, started, JobUpdate::new()).await;
            }
        };

        let work = self
            .job
            .scenes
            .iter()
            .zip(inputs)
            .map(|(scene, (audio, image))| SceneWork::Call {
                request: AvatarRequest {
                    ctx: self.scene_context(scene),
                    audio,
                    image: image.clone(),
                },
                fallback: image,
            })
            .collect();

        let name = backend.name().to_string();
        let slots = self
            .fan_out(stage, &name, BillableOperation::Avatar, work, move |request| {
                let backend = Arc::clone(&backend);
                async move { backend.synthesize_avatar(&request).await }
            })
            .await?;

        let update = if slots.iter().any(|slot| slot.is_fallback) {
            StageSkipped {
                job_id: &self.job.id,
                stage,
                reason: "avatar generation failed for at least one scene",
            }
            .log();
            JobUpdate::new()
        } else {
            JobUpdate::new().scenes(self.with_slots(stage, slots))
        };
        self.finish_stage(stage, started, update).await
    }

    async fn composite_stage(&mut self) -> PipelineResult<CompositionOutput> {
        let stage = Stage::Composite;
        let started = self.begin_stage(stage, self.job.scenes.len()).await?;

        let clips = self.job.scenes.iter().map(timeline_clip).collect();
        let request = CompositionRequest {
            job_id: self.job.id,
            clips,
            title: self
                .job
                .config
                .title_overlay
                .then(|| self.job.title.clone())
                .flatten(),
            with_music: self.job.config.music,
            work_dir: self.work_dir.clone(),
        };

        let broadcaster = Arc::clone(&self.services.broadcaster);
        let published = Arc::clone(&self.published);
        let plan = self.plan.clone();
        let job_id = self.job.id;
        let on_progress = move |fraction: f64| {
            let value = plan.within(stage, fraction);
            if published.fetch_max(value, Ordering::SeqCst) < value {
                broadcaster.publish(
                    job_id,
                    ProgressEvent::progress(
                        value,
                        stage.label(),
                        format!("Rendering {:.0}%", fraction.clamp(0.0, 1.0) * 100.0),
                    ),
                );
            }
        };

        let compositor = Arc::clone(&self.services.compositor);
        let output = until_cancelled(
            &self.cancel,
            compositor.compose(request, &on_progress, &self.cancel),
        )
        .await??;

        self.finish_stage(stage, started, JobUpdate::new()).await?;
        Ok(output)
    }

    async fn upload_stage(&mut self, output: &CompositionOutput) -> PipelineResult<AssetRef> {
        let stage = Stage::Upload;
        let started = self.begin_stage(stage, 0).await?;

        let artifacts = Arc::clone(&self.services.artifacts);
        let artifact = until_cancelled(&self.cancel, artifacts.store(self.job.id, &output.path))
            .await?
            .map_err(|e| PipelineError::Upload(e.to_string()))?;

        self.finish_stage(stage, started, JobUpdate::new()).await?;
        Ok(artifact)
    }

    /// Run one stage's backend calls through the pool and resolve every
    /// scene to a slot, in scene order.
    async fn fan_out<R, F, Fut>(
        &self,
        stage: Stage,
        backend: &str,
        operation: BillableOperation,
        work: Vec<SceneWork<R>>,
        call: F,
    ) -> PipelineResult<Vec<AssetSlot>>
    where
        R: Send + Sync + 'static,
        F: Fn(Arc<R>) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = BackendResult<AssetRef>> + Send + 'static,
    {
        let mut slots = Vec::with_capacity(work.len());
        let mut pending = Vec::new();
        for (index, item) in work.into_iter().enumerate() {
            match item {
                SceneWork::Resolved(slot) => slots.push(slot),
                SceneWork::Call { request, fallback } => {
                    // Replaced below if the call succeeds.
                    slots.push(AssetSlot::fallback(fallback));
                    pending.push((index, Arc::new(request)));
                }
            }
        }

        let retry = self.services.settings.retry.clone();
        let operation_label = format!("{}:{}", stage, backend);
        let requests: Vec<Arc<R>> = pending.iter().map(|(_, r)| Arc::clone(r)).collect();
        let outcomes = until_cancelled(
            &self.cancel,
            self.pool.map(requests, |_, request| {
                let call = call.clone();
                let retry = retry.clone();
                let label = operation_label.clone();
                async move {
                    retry
                        .run(&label, RetryOn::Transient, || call(Arc::clone(&request)))
                        .await
                }
            }),
        )
        .await?;

        let job_id = self.job.id;
        let mut quota_error = None;
        for ((scene_index, _), outcome) in pending.into_iter().zip(outcomes) {
            let error = match outcome {
                Some(Ok(asset)) => {
                    self.services.meter.charge(job_id, &operation);
                    slots[scene_index] = AssetSlot::generated(asset);
                    continue;
                }
                Some(Err(error)) => error,
                None => BackendError::TaskFailed("scene task did not complete".into()),
            };

            SceneFallback {
                job_id: &job_id,
                stage,
                scene_index,
                backend,
                error: &error,
            }
            .log();
            self.services.meter.charge_fallback(job_id, &operation);
            if error.is_quota() && quota_error.is_none() {
                quota_error = Some(error);
            }
        }

        match quota_error {
            Some(error) => Err(PipelineError::QuotaExceeded {
                stage,
                message: error.to_string(),
            }),
            None => Ok(slots),
        }
    }

    fn scene_context(&self, scene: &Scene) -> SceneContext {
        SceneContext {
            job_id: self.job.id,
            scene_index: scene.order_index,
            work_dir: self.work_dir.clone(),
        }
    }

    /// Copy of the job's scenes with `stage`'s slot replaced.
    fn with_slots(&self, stage: Stage, slots: Vec<AssetSlot>) -> Vec<Scene> {
        let mut scenes = self.job.scenes.clone();
        for (scene, slot) in scenes.iter_mut().zip(slots) {
            if let Some(target) = scene.slot_mut(stage) {
                *target = Some(slot);
            }
        }
        scenes
    }

    async fn begin_stage(&mut self, stage: Stage, scene_count: usize) -> PipelineResult<Instant> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let progress = self.plan.start(stage);
        self.update(
            JobUpdate::new()
                .stage(stage)
                .progress(progress)
                .current_step(stage.label()),
        )
        .await?;
        self.publish_progress(stage, progress, format!("{} started", stage.label()));
        StageStarted {
            job_id: &self.job.id,
            stage,
            scene_count,
        }
        .log();
        Ok(Instant::now())
    }

    async fn finish_stage(
        &mut self,
        stage: Stage,
        started: Instant,
        update: JobUpdate,
    ) -> PipelineResult<()> {
        let progress = self.plan.end(stage);
        let credits = self.services.meter.total(self.job.id);
        self.update(update.progress(progress).credits_used(credits))
            .await?;

        let scene_count = self.job.scenes.len();
        let fallback_count = self
            .job
            .scenes
            .iter()
            .filter(|scene| scene.slot(stage).map_or(false, |slot| slot.is_fallback))
            .count();
        let message = if fallback_count > 0 {
            format!(
                "{} finished, {} of {} scenes used a fallback",
                stage.label(),
                fallback_count,
                scene_count
            )
        } else {
            format!("{} finished", stage.label())
        };
        self.publish_progress(stage, progress, message);

        StageCompleted {
            job_id: &self.job.id,
            stage,
            scene_count,
            fallback_count,
            duration: started.elapsed(),
        }
        .log();
        Ok(())
    }

    async fn update(&mut self, update: JobUpdate) -> PipelineResult<()> {
        self.job = self.services.store.update(self.job.id, update).await?;
        Ok(())
    }

    /// Publish a progress event, never going below what was already sent.
    fn publish_progress(&self, stage: Stage, progress: u8, message: String) {
        let previous = self.published.fetch_max(progress, Ordering::SeqCst);
        self.services.broadcaster.publish(
            self.job.id,
            ProgressEvent::progress(progress.max(previous), stage.label(), message),
        );
    }

    async fn complete(&mut self, artifact: AssetRef, started_at: Instant) {
        let job_id = self.job.id;
        let credits = self.services.meter.total(job_id);
        let update = JobUpdate::new()
            .status(JobStatus::Completed)
            .stage(Stage::Completed)
            .progress(100)
            .current_step(Stage::Completed.label())
            .final_artifact(artifact.clone())
            .credits_used(credits);
        if let Err(error) = self.update(update).await {
            return self.fail(error).await;
        }

        self.published.fetch_max(100, Ordering::SeqCst);
        JobCompleted {
            job_id: &job_id,
            artifact: &artifact,
            credits_used: credits,
            fallback_count: fallback_total(&self.job),
            duration: started_at.elapsed(),
        }
        .log();
        self.discard_work_dir().await;
        self.services
            .broadcaster
            .publish(job_id, ProgressEvent::complete(artifact));
    }

    async fn fail(&mut self, error: PipelineError) {
        let job_id = self.job.id;
        let kind = error.kind();
        let cancelled = error.is_cancellation();
        let (status, step) = if cancelled {
            (
                JobStatus::Cancelled,
                format!("Cancelled during {}", self.job.stage),
            )
        } else {
            (
                JobStatus::Failed,
                format!("Failed during {}: {}", self.job.stage, error),
            )
        };
        JobFailed {
            job_id: &job_id,
            kind,
            error: &error,
        }
        .log();

        let update = JobUpdate::new()
            .status(status)
            .current_step(step)
            .failure(kind, error.to_string())
            .credits_used(self.services.meter.total(job_id));
        match self.services.store.update(job_id, update.clone()).await {
            Ok(job) => self.job = job,
            Err(store_error) => {
                error!(job_id = %job_id, error = %store_error, "Could not record terminal job status");
                self.job.apply(update);
            }
        }

        // Failed jobs keep their intermediates for diagnosis.
        if cancelled {
            self.discard_work_dir().await;
        }
        self.services
            .broadcaster
            .publish(job_id, ProgressEvent::error(kind, error.to_string()));
    }

    async fn discard_work_dir(&self) {
        if self.services.settings.keep_intermediates {
            return;
        }
        match tokio::fs::remove_dir_all(&self.work_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                work_dir = %self.work_dir.display(),
                error = %e,
                "Could not remove job work directory"
            ),
        }
    }
}

/// Resolve `work` unless `cancel` fires first; the losing future is dropped.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = T>,
) -> PipelineResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        value = work => Ok(value),
    }
}

/// What the compositor gets for one scene. Missing slots fall back the same
/// way failed backend calls do.
fn timeline_clip(scene: &Scene) -> TimelineClip {
    let video = scene
        .motion_clip
        .as_ref()
        .map(|slot| slot.asset.clone())
        .unwrap_or_else(|| {
            let image = scene
                .best_image()
                .cloned()
                .unwrap_or_else(AssetRef::placeholder_image);
            AssetRef::still_hold(image, scene.duration_secs)
        });
    let audio = scene
        .audio
        .as_ref()
        .map(|slot| slot.asset.clone())
        .unwrap_or_else(|| AssetRef::silence(scene.duration_secs));

    TimelineClip {
        scene_index: scene.order_index,
        duration_secs: scene.duration_secs,
        video,
        audio,
        overlay: scene.avatar_clip.as_ref().map(|slot| slot.asset.clone()),
    }
}

fn fallback_total(job: &Job) -> usize {
    job.scenes
        .iter()
        .flat_map(|scene| {
            [
                &scene.image,
                &scene.enhanced_image,
                &scene.motion_clip,
                &scene.audio,
                &scene.avatar_clip,
            ]
        })
        .filter(|slot| slot.as_ref().map_or(false, |s| s.is_fallback))
        .count()
}
