// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::errors::{StoreError, StoreResult};
use crate::model::{Job, JobId, JobUpdate};
use crate::store::{apply_update, sort_newest_first};
use crate::traits::JobStore;

/// Job store keeping one JSON document per job under a directory.
///
/// Writes go to a temporary file that is renamed over the record, so a
/// reader never observes a half-written job. A single writer lock makes
/// `update` atomic for this process.
#[derive(Debug)]
pub struct FileJobStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileJobStore {
    pub async fn open(root: PathBuf) -> StoreResult<Self> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: JobId) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    async fn read_record(&self, id: JobId) -> StoreResult<Job> {
        match tokio::fs::read(self.record_path(id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_record(&self, job: &Job) -> StoreResult<()> {
        let target = self.record_path(job.id);
        let temp = target.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(job)?;

        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&temp, &target).await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn create(&self, job: Job) -> StoreResult<JobId> {
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(self.record_path(job.id)).await? {
            return Err(StoreError::AlreadyExists(job.id));
        }
        self.write_record(&job).await?;
        Ok(job.id)
    }

    async fn get(&self, id: JobId) -> StoreResult<Job> {
        self.read_record(id).await
    }

    async fn update(&self, id: JobId, update: JobUpdate) -> StoreResult<Job> {
        let _guard = self.write_lock.lock().await;
        let mut job = self.read_record(id).await?;
        apply_update(&mut job, update)?;
        self.write_record(&job).await?;
        Ok(job)
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Job>> {
        let mut owned = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Job>(&bytes) {
                Ok(job) if job.owner_id == owner_id => owned.push(job),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable job record"),
            }
        }
        sort_newest_first(&mut owned);
        Ok(owned)
    }

    async fn delete(&self, id: JobId) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let job = self.read_record(id).await?;
        if !job.is_terminal() {
            return Err(StoreError::NotTerminal(id));
        }
        tokio::fs::remove_file(self.record_path(id)).await?;
        Ok(())
    }
}
