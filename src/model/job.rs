// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

use crate::model::asset::{AssetRef, AssetSlot};
use crate::model::config::JobConfig;
use crate::model::stage::Stage;

/// Opaque job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(JobId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Generating,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Generating => "generating",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a job-fatal error, recorded on the terminal record so
/// pollers (and billing) can tell failure modes apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    ValidationError,
    QuotaExceededError,
    ScriptError,
    CompositeError,
    UploadError,
    CancellationError,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: JobErrorKind,
    pub message: String,
}

/// One narrated segment of the target video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: Uuid,
    pub order_index: usize,
    pub duration_secs: f64,
    pub narration_text: String,
    pub visual_description: String,
    pub emotion_tag: String,
    pub image: Option<AssetSlot>,
    pub enhanced_image: Option<AssetSlot>,
    pub motion_clip: Option<AssetSlot>,
    pub audio: Option<AssetSlot>,
    pub avatar_clip: Option<AssetSlot>,
}

impl Scene {
    pub fn new(
        order_index: usize,
        duration_secs: f64,
        narration_text: String,
        visual_description: String,
        emotion_tag: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_index,
            duration_secs,
            narration_text,
            visual_description,
            emotion_tag,
            image: None,
            enhanced_image: None,
            motion_clip: None,
            audio: None,
            avatar_clip: None,
        }
    }

    /// The slot a given stage writes, if the stage is per-scene.
    pub fn slot(&self, stage: Stage) -> Option<&AssetSlot> {
        match stage {
            Stage::Images => self.image.as_ref(),
            Stage::Enhance => self.enhanced_image.as_ref(),
            Stage::Motion => self.motion_clip.as_ref(),
            Stage::Voice => self.audio.as_ref(),
            Stage::Avatar => self.avatar_clip.as_ref(),
            _ => None,
        }
    }

    pub fn slot_mut(&mut self, stage: Stage) -> Option<&mut Option<AssetSlot>> {
        match stage {
            Stage::Images => Some(&mut self.image),
            Stage::Enhance => Some(&mut self.enhanced_image),
            Stage::Motion => Some(&mut self.motion_clip),
            Stage::Voice => Some(&mut self.audio),
            Stage::Avatar => Some(&mut self.avatar_clip),
            _ => None,
        }
    }

    /// Best image available for this scene, preferring the enhanced one.
    pub fn best_image(&self) -> Option<&AssetRef> {
        self.enhanced_image
            .as_ref()
            .or(self.image.as_ref())
            .map(|slot| &slot.asset)
    }
}

/// One generation request and its accumulated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub owner_id: String,
    pub prompt: String,
    pub config: JobConfig,
    pub status: JobStatus,
    pub stage: Stage,
    pub progress: u8,
    pub current_step: String,
    pub title: Option<String>,
    pub scenes: Vec<Scene>,
    pub final_artifact: Option<AssetRef>,
    pub credits_used: u64,
    pub failure: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new queued job.
    pub fn new_queued(owner_id: String, prompt: String, config: JobConfig) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            owner_id,
            prompt,
            config,
            status: JobStatus::Queued,
            stage: Stage::Queued,
            progress: 0,
            current_step: Stage::Queued.label().to_string(),
            title: None,
            scenes: Vec::new(),
            final_artifact: None,
            credits_used: 0,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Sum of scene durations in seconds.
    pub fn scripted_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_secs).sum()
    }

    /// Apply a partial update. Progress never moves backwards.
    pub fn apply(&mut self, update: JobUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(stage) = update.stage {
            self.stage = stage;
        }
        if let Some(progress) = update.progress {
            self.progress = self.progress.max(progress.min(100));
        }
        if let Some(step) = update.current_step {
            self.current_step = step;
        }
        if let Some(title) = update.title {
            self.title = Some(title);
        }
        if let Some(scenes) = update.scenes {
            self.scenes = scenes;
        }
        if let Some(artifact) = update.final_artifact {
            self.final_artifact = Some(artifact);
        }
        if let Some(credits) = update.credits_used {
            self.credits_used = credits;
        }
        if let Some(failure) = update.failure {
            self.failure = Some(failure);
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update to a job record; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub stage: Option<Stage>,
    pub progress: Option<u8>,
    pub current_step: Option<String>,
    pub title: Option<String>,
    pub scenes: Option<Vec<Scene>>,
    pub final_artifact: Option<AssetRef>,
    pub credits_used: Option<u64>,
    pub failure: Option<JobFailure>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn current_step<S: Into<String>>(mut self, step: S) -> Self {
        self.current_step = Some(step.into());
        self
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn scenes(mut self, scenes: Vec<Scene>) -> Self {
        self.scenes = Some(scenes);
        self
    }

    pub fn final_artifact(mut self, artifact: AssetRef) -> Self {
        self.final_artifact = Some(artifact);
        self
    }

    pub fn credits_used(mut self, credits: u64) -> Self {
        self.credits_used = Some(credits);
        self
    }

    pub fn failure(mut self, kind: JobErrorKind, message: String) -> Self {
        self.failure = Some(JobFailure { kind, message });
        self
    }
}
