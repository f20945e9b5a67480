// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::compositor::progress::ProgressTracker;
use crate::compositor::render_graph::RenderGraph;
use crate::config::CompositorConfig;
use crate::errors::{CompositeError, CompositeResult};
use crate::observability::messages::compositor::{RenderFailed, RenderFinished, RenderStarted};
use crate::observability::messages::StructuredLog;
use crate::traits::{CompositionOutput, CompositionRequest, Compositor, RenderProgress};

/// Filter graph file written into the job work dir.
pub const FILTER_SCRIPT_FILE: &str = "filter_graph.txt";
/// The media tool's stderr, kept for diagnosis.
pub const LOG_FILE: &str = "compositor.log";

/// Renders the timeline with an external ffmpeg-compatible executable.
///
/// The filter graph goes to [`FILTER_SCRIPT_FILE`] rather than the command
/// line, stdout carries the `-progress` stream and stderr is redirected to
/// [`LOG_FILE`]. Nothing in the work dir is removed on failure.
#[derive(Debug, Clone)]
pub struct FfmpegCompositor {
    config: CompositorConfig,
}

impl FfmpegCompositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn compose(
        &self,
        request: CompositionRequest,
        progress: RenderProgress<'_>,
        cancel: &CancellationToken,
    ) -> CompositeResult<CompositionOutput> {
        let graph = RenderGraph::build(&request, &self.config)?;
        let work_dir = &request.work_dir;
        tokio::fs::create_dir_all(work_dir).await?;

        let script_path = work_dir.join(FILTER_SCRIPT_FILE);
        tokio::fs::write(&script_path, &graph.filter).await?;
        let output = work_dir.join(format!("final.{}", self.config.container));
        let log_path = work_dir.join(LOG_FILE);
        let log_file = std::fs::File::create(&log_path)?;

        let args = graph.command_args(&self.config, &script_path, &output);
        debug!(job_id = %request.job_id, args = ?args, "Compositor command line");

        let mut command = Command::new(&self.config.executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(log_file))
            .kill_on_drop(true);

        RenderStarted {
            job_id: &request.job_id,
            executable: &self.config.executable,
            clip_count: request.clips.len(),
            duration_secs: graph.duration_secs,
            output: &output,
        }
        .log();
        let started = Instant::now();

        let mut child = command.spawn().map_err(|source| CompositeError::Spawn {
            executable: self.config.executable.clone(),
            source,
        })?;
        let stdout = child.stdout.take();
        let mut tracker = ProgressTracker::new(graph.duration_secs);

        let finished = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            status = wait_with_progress(&mut child, stdout, &mut tracker, progress) => Some(status),
        };

        let status = match finished {
            Some(status) => status?,
            None => {
                if let Err(e) = child.kill().await {
                    warn!(job_id = %request.job_id, error = %e, "Could not kill compositor");
                }
                return Err(CompositeError::Cancelled);
            }
        };

        if !status.success() {
            RenderFailed {
                job_id: &request.job_id,
                exit_code: status.code(),
                log_path: &log_path,
            }
            .log();
            return Err(CompositeError::Exited {
                code: status.code(),
                log_path,
            });
        }
        if !file_exists(&output).await {
            return Err(CompositeError::MissingOutput(output));
        }

        progress(1.0);
        RenderFinished {
            job_id: &request.job_id,
            output: &output,
            duration: started.elapsed(),
        }
        .log();
        Ok(CompositionOutput {
            path: output,
            duration_secs: graph.duration_secs,
        })
    }
}

/// Forward progress lines until stdout closes, then reap the process.
async fn wait_with_progress(
    child: &mut Child,
    stdout: Option<ChildStdout>,
    tracker: &mut ProgressTracker,
    progress: RenderProgress<'_>,
) -> std::io::Result<ExitStatus> {
    if let Some(stdout) = stdout {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(fraction) = tracker.observe(&line) {
                progress(fraction);
            }
        }
    }
    child.wait().await
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::Transition;
    use crate::model::{AssetRef, JobId};
    use crate::traits::TimelineClip;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Install a shell script standing in for ffmpeg.
    fn fake_tool(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn compositor(executable: String) -> FfmpegCompositor {
        FfmpegCompositor::new(CompositorConfig {
            executable,
            transition: Transition::None,
            ..CompositorConfig::default()
        })
    }

    fn request(work_dir: PathBuf) -> CompositionRequest {
        CompositionRequest {
            job_id: JobId::new(),
            clips: (0..2)
                .map(|i| TimelineClip {
                    scene_index: i,
                    duration_secs: 4.0,
                    video: AssetRef::placeholder_image(),
                    audio: AssetRef::silence(4.0),
                    overlay: None,
                })
                .collect(),
            title: None,
            with_music: false,
            work_dir,
        }
    }

    #[tokio::test]
    async fn test_successful_render_reports_progress() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(
            dir.path(),
            r#"for last; do :; done
echo "out_time_us=2000000"
echo "progress=continue"
echo "out_time_us=4000000"
echo "progress=end"
printf 'video' > "$last""#,
        );
        let work_dir = dir.path().join("job");
        let seen = Mutex::new(Vec::new());
        let on_progress = |fraction: f64| seen.lock().unwrap().push(fraction);

        let output = compositor(tool)
            .compose(request(work_dir.clone()), &on_progress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.path, work_dir.join("final.mp4"));
        assert_eq!(output.duration_secs, 8.0);
        assert_eq!(*seen.lock().unwrap(), vec![0.25, 0.5, 1.0, 1.0]);
        let filter = std::fs::read_to_string(work_dir.join(FILTER_SCRIPT_FILE)).unwrap();
        assert!(filter.contains("concat=n=2"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_log() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), "echo 'Invalid filter graph' >&2\nexit 3");
        let work_dir = dir.path().join("job");

        let result = compositor(tool)
            .compose(request(work_dir.clone()), &|_: f64| {}, &CancellationToken::new())
            .await;

        match result {
            Err(CompositeError::Exited { code, log_path }) => {
                assert_eq!(code, Some(3));
                assert_eq!(log_path, work_dir.join(LOG_FILE));
                let log = std::fs::read_to_string(log_path).unwrap();
                assert!(log.contains("Invalid filter graph"));
            }
            other => panic!("expected Exited, got {:?}", other),
        }
        assert!(work_dir.join(FILTER_SCRIPT_FILE).exists());
    }

    #[tokio::test]
    async fn test_success_without_output_is_an_error() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), "exit 0");

        let result = compositor(tool)
            .compose(request(dir.path().join("job")), &|_: f64| {}, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CompositeError::MissingOutput(_))));
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_process() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), "sleep 30");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = compositor(tool)
            .compose(request(dir.path().join("job")), &|_: f64| {}, &cancel)
            .await;

        assert!(matches!(result, Err(CompositeError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let dir = TempDir::new().unwrap();
        let result = compositor("/nonexistent/ffmpeg".into())
            .compose(request(dir.path().join("job")), &|_: f64| {}, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CompositeError::Spawn { .. })));
    }
}
