// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::compositor::{FfmpegCompositor, LocalArtifactStore};
use crate::config::{validate_pipeline_config, BackendRegistry, PipelineConfig};
use crate::credits::CreditMeter;
use crate::engine::{MotionPolicy, OrchestratorSettings, PipelineController, PipelineServices};
use crate::errors::{BuildError, ConfigError, ValidationError};
use crate::observability::messages::backend::RegistryBuilt;
use crate::observability::messages::StructuredLog;
use crate::progress::ProgressBroadcaster;
use crate::store::{FileJobStore, InMemoryJobStore};
use crate::traits::JobStore;

/// Pipeline runtime builder - assembles a ready [`PipelineController`] from configuration.
///
/// The builder validates the configuration, builds every configured backend,
/// opens the job store (a [`FileJobStore`] when `storage.jobs_dir` is set,
/// in-memory otherwise) and wires the compositor, artifact store, progress
/// broadcaster and credit meter into one set of shared services.
///
/// # Examples
///
/// ```ignore
/// use reelforge::config::{load_config, RuntimeBuilder};
///
/// let config = load_config("configs/local.yaml")?;
/// let controller = RuntimeBuilder::from_config(&config).await?;
/// let job_id = controller.submit("owner-1", "launch announcement", Default::default()).await?;
/// let job = controller.wait(job_id).await?;
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    pub async fn from_config(cfg: &PipelineConfig) -> Result<PipelineController, BuildError> {
        validate_pipeline_config(cfg).map_err(ConfigError::Invalid)?;

        let services = Self::services(cfg).await?;
        Ok(PipelineController::new(Arc::new(services)))
    }

    /// Everything a controller needs, without the controller.
    pub async fn services(cfg: &PipelineConfig) -> Result<PipelineServices, BuildError> {
        let backends = BackendRegistry::from_config(cfg)?;
        let engines = backends.motion_names();
        let motion_policy = MotionPolicy::from_config(&cfg.motion_policy, &engines)
            .ok_or_else(|| ConfigError::Invalid(vec![ValidationError::NoMotionEngines]))?;

        RegistryBuilt {
            script: backends.script.name(),
            image: backends.image.name(),
            enhancer: backends.enhancer.name(),
            motion_engines: &engines,
            voice: backends.voice.name(),
            avatar: backends.avatar.as_ref().map(|avatar| avatar.name()),
        }
        .log();

        let store: Arc<dyn JobStore> = match &cfg.storage.jobs_dir {
            Some(dir) => Arc::new(FileJobStore::open(dir.clone()).await?),
            None => Arc::new(InMemoryJobStore::new()),
        };

        Ok(PipelineServices {
            backends,
            compositor: Arc::new(FfmpegCompositor::new(cfg.compositor.clone())),
            artifacts: Arc::new(LocalArtifactStore::new(
                cfg.storage.artifacts_dir.clone(),
                &cfg.compositor.container,
            )),
            store,
            broadcaster: Arc::new(ProgressBroadcaster::default()),
            meter: Arc::new(CreditMeter::new(cfg.credits.clone())),
            settings: OrchestratorSettings::from_config(cfg, motion_policy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    fn local_config(dir: &TempDir, jobs_dir: bool) -> PipelineConfig {
        let root = dir.path().display();
        let jobs = if jobs_dir {
            format!("  jobs_dir: {}/jobs\n", root)
        } else {
            String::new()
        };
        let yaml = format!(
            r#"
storage:
  work_dir: {root}/work
  artifacts_dir: {root}/artifacts
{jobs}backends:
  script: {{ type: local }}
  image: {{ type: local }}
  enhancer: {{ type: local }}
  motion:
    - {{ type: local, name: cinematic }}
    - {{ type: local, name: quick }}
  voice: {{ type: local }}
"#
        );
        parse_config(&yaml, "yaml").unwrap()
    }

    #[tokio::test]
    async fn test_builds_local_runtime() {
        let dir = TempDir::new().unwrap();
        let controller = RuntimeBuilder::from_config(&local_config(&dir, false))
            .await
            .unwrap();

        let settings = &controller.services().settings;
        assert_eq!(settings.motion_policy.premium, "cinematic");
        assert_eq!(settings.motion_policy.economy, "quick");
        assert_eq!(settings.work_dir, dir.path().join("work"));
    }

    #[tokio::test]
    async fn test_file_store_when_jobs_dir_set() {
        let dir = TempDir::new().unwrap();
        RuntimeBuilder::from_config(&local_config(&dir, true))
            .await
            .unwrap();
        assert!(dir.path().join("jobs").is_dir());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = local_config(&dir, false);
        config.max_concurrency = 0;

        let result = RuntimeBuilder::from_config(&config).await;
        match result {
            Err(BuildError::Config(ConfigError::Invalid(errors))) => {
                assert!(errors.contains(&ValidationError::ZeroConcurrency));
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected a validation error"),
        }
    }
}
