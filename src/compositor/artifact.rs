// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::model::{AssetRef, JobId};
use crate::traits::ArtifactStore;

/// Publishes finished videos into a local directory as `<job_id>.<ext>`.
///
/// The copy lands under a temporary name first and is renamed into place,
/// so a reader never sees a partial artifact.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
    container: String,
}

impl LocalArtifactStore {
    pub fn new<P: Into<PathBuf>>(root: P, container: &str) -> Self {
        Self {
            root: root.into(),
            container: container.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, job_id: JobId, local: &Path) -> PathBuf {
        let extension = local
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.container.clone());
        self.root.join(format!("{}.{}", job_id, extension))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn store(&self, job_id: JobId, local: &Path) -> std::io::Result<AssetRef> {
        tokio::fs::create_dir_all(&self.root).await?;
        let target = self.artifact_path(job_id, local);
        let temp = target.with_extension("partial");

        tokio::fs::copy(local, &temp).await?;
        tokio::fs::rename(&temp, &target).await?;
        Ok(AssetRef::file(target))
    }
}
