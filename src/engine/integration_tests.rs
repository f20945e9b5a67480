// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end runs of the controller and orchestrator against stub backends
//! and a stub compositor.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{broadcast, mpsc};

use crate::backends::stub::{
    BlockingEnhancer, FailingImageGenerator, FlakyImageGenerator, SlowVoice, StubAvatar,
    StubCompositor, StubEnhancer, StubImageGenerator, StubMotion, StubScriptGenerator, StubVoice,
};
use crate::backends::RetryPolicy;
use crate::compositor::LocalArtifactStore;
use crate::config::{BackendRegistry, StageWeights};
use crate::credits::{CreditMeter, PriceTable};
use crate::engine::{MotionPolicy, OrchestratorSettings, PipelineController, PipelineServices};
use crate::errors::{BackendError, PipelineError, StoreError};
use crate::model::{
    AssetRef, Job, JobConfig, JobErrorKind, JobStatus, MotionEngineChoice, Stage,
};
use crate::progress::{ProgressBroadcaster, ProgressEvent};
use crate::store::InMemoryJobStore;
use crate::traits::MotionSynthesizer;

struct Harness {
    controller: PipelineController,
    compositor: Arc<StubCompositor>,
    premium: Arc<StubMotion>,
    economy: Arc<StubMotion>,
    dir: TempDir,
}

impl Harness {
    fn job_work_dir(&self, job: &Job) -> std::path::PathBuf {
        self.dir.path().join("work").join(job.id.to_string())
    }

    async fn run(&self, config: JobConfig) -> Job {
        let job_id = self
            .controller
            .submit("owner-1", "launch announcement", config)
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(10), self.controller.wait(job_id))
            .await
            .expect("job did not finish")
            .unwrap()
    }
}

struct HarnessBuilder {
    backends: BackendRegistry,
    compositor: Arc<StubCompositor>,
    premium: Arc<StubMotion>,
    economy: Arc<StubMotion>,
    credit_threshold: u64,
    call_timeout: Duration,
}

impl HarnessBuilder {
    fn new() -> Self {
        let premium = Arc::new(StubMotion::new("premium"));
        let economy = Arc::new(StubMotion::new("economy"));
        let backends = BackendRegistry {
            script: Arc::new(StubScriptGenerator::new()),
            image: Arc::new(StubImageGenerator),
            enhancer: Arc::new(StubEnhancer::new()),
            motion: vec![
                (
                    "premium".to_string(),
                    premium.clone() as Arc<dyn MotionSynthesizer>,
                ),
                (
                    "economy".to_string(),
                    economy.clone() as Arc<dyn MotionSynthesizer>,
                ),
            ],
            voice: Arc::new(StubVoice),
            avatar: None,
        };
        Self {
            backends,
            compositor: Arc::new(StubCompositor::new()),
            premium,
            economy,
            credit_threshold: 40,
            call_timeout: Duration::from_secs(5),
        }
    }

    fn build(self) -> Harness {
        let dir = TempDir::new().unwrap();
        let settings = OrchestratorSettings {
            max_concurrency: 2,
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                call_timeout: self.call_timeout,
            },
            stage_weights: StageWeights::default(),
            motion_policy: MotionPolicy {
                premium: "premium".to_string(),
                economy: "economy".to_string(),
                credit_threshold: self.credit_threshold,
            },
            scene_length_secs: 4.0,
            work_dir: dir.path().join("work"),
            keep_intermediates: false,
        };
        let services = PipelineServices {
            backends: self.backends,
            compositor: self.compositor.clone(),
            artifacts: Arc::new(LocalArtifactStore::new(dir.path().join("artifacts"), "mp4")),
            store: Arc::new(InMemoryJobStore::new()),
            broadcaster: Arc::new(ProgressBroadcaster::default()),
            meter: Arc::new(CreditMeter::new(PriceTable::default())),
            settings,
        };
        Harness {
            controller: PipelineController::new(Arc::new(services)),
            compositor: self.compositor,
            premium: self.premium,
            economy: self.economy,
            dir,
        }
    }
}

fn twelve_seconds() -> JobConfig {
    JobConfig {
        duration_secs: 12,
        motion_engine: MotionEngineChoice::Auto,
        avatar: false,
        music: false,
        ..JobConfig::default()
    }
}

async fn collect_events(mut events: broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut seen = Vec::new();
    loop {
        match tokio::time::timeout(Duration::from_secs(10), events.recv()).await {
            Ok(Ok(event)) => {
                let terminal = event.is_terminal();
                seen.push(event);
                if terminal {
                    return seen;
                }
            }
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(broadcast::error::RecvError::Closed)) => return seen,
            Err(_) => panic!("no terminal event within 10s"),
        }
    }
}

#[tokio::test]
async fn test_launch_announcement_completes() {
    let harness = HarnessBuilder::new().build();
    let job = harness.run(twelve_seconds()).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.stage, Stage::Completed);
    assert_eq!(job.progress, 100);
    assert!(job.failure.is_none());
    assert_eq!(job.scenes.len(), 3);
    for (index, scene) in job.scenes.iter().enumerate() {
        assert_eq!(scene.order_index, index);
        assert!((scene.duration_secs - 4.0).abs() < 1e-9);
        for stage in [Stage::Images, Stage::Enhance, Stage::Motion, Stage::Voice] {
            let slot = scene.slot(stage).expect("slot filled");
            assert!(!slot.is_fallback, "{} slot of scene {} fell back", stage, index);
        }
        assert!(scene.avatar_clip.is_none());
    }

    let artifact = job.final_artifact.clone().expect("artifact");
    let path = artifact.as_path().expect("local artifact");
    assert_eq!(path.extension().unwrap(), "mp4");
    assert!(path.exists());

    // script 1 + 3 images x2 + 3 enhancements x1 + 3 premium motions x5 + 3 voices x1
    assert_eq!(job.credits_used, 28);
    assert_eq!(harness.premium.calls(), 3);
    assert_eq!(harness.economy.calls(), 0);
    assert_eq!(harness.compositor.calls(), 1);
    assert!(!harness.job_work_dir(&job).exists());

    let request = harness.compositor.last_request().unwrap();
    assert_eq!(request.clips.len(), 3);
    assert!(request.title.is_none());
    assert!(request
        .clips
        .iter()
        .all(|clip| matches!(clip.video, AssetRef::Remote { .. })));
}

#[tokio::test]
async fn test_failing_image_backend_uses_placeholders() {
    let failing = Arc::new(FailingImageGenerator::new(BackendError::Transient(
        "503 Service Unavailable".into(),
    )));
    let enhancer = Arc::new(StubEnhancer::new());
    let mut builder = HarnessBuilder::new();
    builder.backends.image = failing.clone();
    builder.backends.enhancer = enhancer.clone();
    let harness = builder.build();

    let job = harness.run(twelve_seconds()).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.final_artifact.is_some());
    assert_eq!(job.scenes.len(), 3);
    for scene in &job.scenes {
        let image = scene.image.as_ref().unwrap();
        assert!(image.is_fallback);
        assert_eq!(image.asset, AssetRef::placeholder_image());

        // Nothing to enhance or animate in a colour card.
        assert!(scene.enhanced_image.as_ref().unwrap().is_fallback);
        let motion = scene.motion_clip.as_ref().unwrap();
        assert!(motion.is_fallback);
        assert_eq!(
            motion.asset,
            AssetRef::still_hold(AssetRef::placeholder_image(), scene.duration_secs)
        );
        assert!(!scene.audio.as_ref().unwrap().is_fallback);
    }
    // Two attempts per scene.
    assert_eq!(failing.calls(), 6);
    assert_eq!(enhancer.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(harness.premium.calls(), 0);
    // script 1 + 3 voices
    assert_eq!(job.credits_used, 4);
}

#[tokio::test]
async fn test_transient_image_failure_recovers_on_retry() {
    let flaky = Arc::new(FlakyImageGenerator::new(1));
    let mut builder = HarnessBuilder::new();
    builder.backends.image = flaky.clone();
    let harness = builder.build();

    let job = harness.run(twelve_seconds()).await;

    assert_eq!(job.status, JobStatus::Completed);
    for scene in &job.scenes {
        let image = scene.image.as_ref().unwrap();
        assert!(!image.is_fallback);
        assert!(matches!(image.asset, AssetRef::Remote { .. }));
        assert!(!scene.motion_clip.as_ref().unwrap().is_fallback);
    }
    assert_eq!(flaky.calls(), 6);
    // Each image is charged once despite the failed first attempt.
    assert_eq!(job.credits_used, 28);
}

#[tokio::test]
async fn test_voice_timeout_falls_back_to_silence() {
    let voice = Arc::new(SlowVoice::new(Duration::from_secs(30)));
    let mut builder = HarnessBuilder::new();
    builder.backends.voice = voice.clone();
    builder.call_timeout = Duration::from_millis(50);
    let harness = builder.build();

    let job = harness.run(twelve_seconds()).await;

    assert_eq!(job.status, JobStatus::Completed);
    for scene in &job.scenes {
        let audio = scene.audio.as_ref().unwrap();
        assert!(audio.is_fallback);
        assert_eq!(audio.asset, AssetRef::silence(scene.duration_secs));
    }
    // Timeouts are retried once per scene.
    assert_eq!(voice.calls.load(std::sync::atomic::Ordering::SeqCst), 6);
    // No voice charges: 28 - 3.
    assert_eq!(job.credits_used, 25);
}

#[tokio::test]
async fn test_finished_job_releases_meter_and_topic() {
    let harness = HarnessBuilder::new().build();
    let job = harness.run(twelve_seconds()).await;
    assert_eq!(job.credits_used, 28);

    let services = harness.controller.services();
    assert_eq!(services.meter.total(job.id), 0);

    let mut late = harness.controller.subscribe(job.id);
    assert!(matches!(
        late.recv().await,
        Err(broadcast::error::RecvError::Closed)
    ));
    assert_eq!(services.broadcaster.subscriber_count(job.id), 0);

    // The record keeps the final total.
    assert_eq!(harness.controller.get(job.id).await.unwrap().credits_used, 28);
}

#[tokio::test]
async fn test_compositor_failure_fails_job_and_keeps_scenes() {
    let mut builder = HarnessBuilder::new();
    builder.compositor = Arc::new(StubCompositor::failing());
    let harness = builder.build();

    let job = harness.run(twelve_seconds()).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.final_artifact.is_none());
    let failure = job.failure.as_ref().unwrap();
    assert_eq!(failure.kind, JobErrorKind::CompositeError);
    assert!(job.current_step.starts_with("Failed during composite"));

    let stored = harness.controller.get(job.id).await.unwrap();
    assert_eq!(stored.scenes.len(), 3);
    assert!(stored
        .scenes
        .iter()
        .all(|scene| scene.motion_clip.is_some() && scene.audio.is_some()));
    assert!(harness.job_work_dir(&job).join("compositor.log").exists());
}

#[tokio::test]
async fn test_cancel_before_motion_never_composites() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let mut builder = HarnessBuilder::new();
    builder.backends.enhancer = Arc::new(BlockingEnhancer {
        started: started_tx,
    });
    let harness = builder.build();

    let job_id = harness
        .controller
        .submit("owner-1", "launch announcement", twelve_seconds())
        .await
        .unwrap();
    assert_eq!(started_rx.recv().await, Some(job_id));
    assert!(harness.controller.cancel(job_id).await.unwrap());

    let job = tokio::time::timeout(Duration::from_secs(10), harness.controller.wait(job_id))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.failure.as_ref().unwrap().kind, JobErrorKind::CancellationError);
    assert_eq!(job.current_step, "Cancelled during enhance");
    assert!(job.final_artifact.is_none());
    assert!(job.scenes.iter().all(|scene| scene.image.is_some()));
    assert!(job.scenes.iter().all(|scene| scene.enhanced_image.is_none()));
    assert_eq!(harness.premium.calls(), 0);
    assert_eq!(harness.compositor.calls(), 0);
    assert!(!harness.job_work_dir(&job).exists());

    // The task is gone; cancelling again is a no-op.
    assert!(!harness.controller.cancel(job_id).await.unwrap());
}

#[tokio::test]
async fn test_progress_events_never_decrease() {
    let harness = HarnessBuilder::new().build();
    let (_job_id, events) = harness
        .controller
        .submit_and_subscribe("owner-1", "launch announcement", twelve_seconds())
        .await
        .unwrap();

    let events = collect_events(events).await;
    let values: Vec<u8> = events.iter().filter_map(|e| e.progress_value()).collect();
    assert!(values.len() > 10);
    assert!(values.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", values);
    assert!(matches!(events.last(), Some(ProgressEvent::Complete { .. })));

    let rendering = events.iter().any(|event| match event {
        ProgressEvent::Progress { step, message, .. } => {
            step == Stage::Composite.label() && message.starts_with("Rendering")
        }
        _ => false,
    });
    assert!(rendering, "no compositor progress was forwarded");
}

#[tokio::test]
async fn test_quota_error_fails_job() {
    let mut builder = HarnessBuilder::new();
    builder.backends.image = Arc::new(FailingImageGenerator::new(BackendError::QuotaExceeded(
        "monthly image quota used".into(),
    )));
    let harness = builder.build();

    let (job_id, events) = harness
        .controller
        .submit_and_subscribe("owner-1", "launch announcement", twelve_seconds())
        .await
        .unwrap();
    let events = collect_events(events).await;
    let job = harness.controller.wait(job_id).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.failure.as_ref().unwrap().kind,
        JobErrorKind::QuotaExceededError
    );
    assert_eq!(harness.compositor.calls(), 0);
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Error {
            kind: JobErrorKind::QuotaExceededError,
            ..
        })
    ));
}

#[tokio::test]
async fn test_empty_script_is_fatal() {
    let mut builder = HarnessBuilder::new();
    builder.backends.script = Arc::new(StubScriptGenerator::empty());
    let harness = builder.build();

    let job = harness.run(twelve_seconds()).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.failure.as_ref().unwrap().kind, JobErrorKind::ScriptError);
    assert!(job.scenes.is_empty());
    assert!(job.current_step.contains("no scenes"));
}

#[tokio::test]
async fn test_avatar_overlay_when_every_scene_succeeds() {
    let mut builder = HarnessBuilder::new();
    builder.backends.avatar = Some(Arc::new(StubAvatar { fail_scene: None }));
    let harness = builder.build();

    let job = harness
        .run(JobConfig {
            avatar: true,
            ..twelve_seconds()
        })
        .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job
        .scenes
        .iter()
        .all(|scene| scene.avatar_clip.as_ref().map_or(false, |s| !s.is_fallback)));
    let request = harness.compositor.last_request().unwrap();
    assert!(request.clips.iter().all(|clip| clip.overlay.is_some()));
}

#[tokio::test]
async fn test_partial_avatar_failure_skips_stage() {
    let mut builder = HarnessBuilder::new();
    builder.backends.avatar = Some(Arc::new(StubAvatar {
        fail_scene: Some(1),
    }));
    let harness = builder.build();

    let job = harness
        .run(JobConfig {
            avatar: true,
            ..twelve_seconds()
        })
        .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.scenes.iter().all(|scene| scene.avatar_clip.is_none()));
    let request = harness.compositor.last_request().unwrap();
    assert!(request.clips.iter().all(|clip| clip.overlay.is_none()));
    // The two avatar clips that were generated are still billed.
    assert_eq!(job.credits_used, 28 + 2 * 4);
}

#[tokio::test]
async fn test_avatar_requested_without_backend() {
    let harness = HarnessBuilder::new().build();
    let job = harness
        .run(JobConfig {
            avatar: true,
            ..twelve_seconds()
        })
        .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.scenes.iter().all(|scene| scene.avatar_clip.is_none()));
}

#[tokio::test]
async fn test_auto_motion_switches_to_economy_past_threshold() {
    let mut builder = HarnessBuilder::new();
    // 10 credits are spent before motion starts.
    builder.credit_threshold = 5;
    let harness = builder.build();

    let job = harness.run(twelve_seconds()).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(harness.premium.calls(), 0);
    assert_eq!(harness.economy.calls(), 3);
}

#[tokio::test]
async fn test_named_motion_engine_ignores_policy() {
    let harness = HarnessBuilder::new().build();
    let job = harness
        .run(JobConfig {
            motion_engine: MotionEngineChoice::Named("economy".into()),
            ..twelve_seconds()
        })
        .await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(harness.premium.calls(), 0);
    assert_eq!(harness.economy.calls(), 3);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_storage() {
    let harness = HarnessBuilder::new().build();

    let short = harness
        .controller
        .submit(
            "owner-1",
            "launch announcement",
            JobConfig {
                duration_secs: 1,
                ..twelve_seconds()
            },
        )
        .await;
    assert!(matches!(short, Err(PipelineError::Validation(_))));

    let unknown_engine = harness
        .controller
        .submit(
            "owner-1",
            "launch announcement",
            JobConfig {
                motion_engine: MotionEngineChoice::Named("warp".into()),
                ..twelve_seconds()
            },
        )
        .await;
    assert!(matches!(unknown_engine, Err(PipelineError::Validation(_))));

    let empty = harness
        .controller
        .submit("owner-1", "   ", twelve_seconds())
        .await;
    assert!(matches!(empty, Err(PipelineError::Validation(_))));

    assert!(harness
        .controller
        .list_by_owner("owner-1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_list_and_delete_finished_jobs() {
    let harness = HarnessBuilder::new().build();
    let first = harness.run(twelve_seconds()).await;
    let second = harness.run(twelve_seconds()).await;

    let jobs = harness.controller.list_by_owner("owner-1").await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(harness
        .controller
        .list_by_owner("someone-else")
        .await
        .unwrap()
        .is_empty());

    harness.controller.delete(first.id).await.unwrap();
    assert!(matches!(
        harness.controller.get(first.id).await,
        Err(PipelineError::Store(StoreError::NotFound(_)))
    ));
    assert_eq!(
        harness.controller.get(second.id).await.unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn test_cancel_all_stops_running_jobs() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let mut builder = HarnessBuilder::new();
    builder.backends.enhancer = Arc::new(BlockingEnhancer {
        started: started_tx,
    });
    let harness = builder.build();

    let job_id = harness
        .controller
        .submit("owner-1", "launch announcement", twelve_seconds())
        .await
        .unwrap();
    started_rx.recv().await;

    assert!(harness.controller.is_running(job_id));
    assert_eq!(harness.controller.cancel_all(), 1);
    let job = harness.controller.wait(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(!harness.controller.is_running(job_id));
}
