// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::errors::CompositeResult;
use crate::model::{AssetRef, JobId};

/// One scene's worth of material on the output timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineClip {
    pub scene_index: usize,
    pub duration_secs: f64,
    pub video: AssetRef,
    pub audio: AssetRef,
    /// Avatar clip shown picture-in-picture over `video`.
    pub overlay: Option<AssetRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositionRequest {
    pub job_id: JobId,
    pub clips: Vec<TimelineClip>,
    pub title: Option<String>,
    pub with_music: bool,
    /// Directory receiving the output, graph description and log.
    pub work_dir: PathBuf,
}

impl CompositionRequest {
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.duration_secs).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositionOutput {
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// Fraction of the render completed, in `0.0..=1.0`.
pub type RenderProgress<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Muxes per-scene clips and audio into one artifact.
#[async_trait]
pub trait Compositor: Send + Sync {
    async fn compose(
        &self,
        request: CompositionRequest,
        progress: RenderProgress<'_>,
        cancel: &CancellationToken,
    ) -> CompositeResult<CompositionOutput>;
}

/// Final resting place for finished artifacts (the upload stage).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn store(&self, job_id: JobId, local: &Path) -> std::io::Result<AssetRef>;
}
