// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::consts::*;
use crate::credits::PriceTable;
use crate::errors::ConfigError;
use crate::model::Stage;

/// Main configuration structure for the generation pipeline.
///
/// Everything except `backends` has a default, so a minimal file only has to
/// say which backend implements each capability.
///
/// # Example
/// ```yaml
/// max_concurrency: 4
/// call_timeout_seconds: 120
/// motion_policy:
///   premium: cinematic
///   economy: quick
///   credit_threshold: 40
/// compositor:
///   executable: ffmpeg
///   transition: fade
/// backends:
///   script: { type: local }
///   image: { type: local }
///   enhancer: { type: local }
///   motion:
///     - { type: local, name: cinematic }
///     - { type: local, name: quick }
///   voice: { type: local }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_seconds: u64,
    #[serde(default = "default_scene_length")]
    pub scene_length_seconds: f64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub stage_weights: StageWeights,
    #[serde(default)]
    pub motion_policy: MotionPolicyConfig,
    #[serde(default)]
    pub credits: PriceTable,
    #[serde(default)]
    pub compositor: CompositorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub backends: BackendsConfig,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_call_timeout() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

fn default_scene_length() -> f64 {
    DEFAULT_SCENE_LENGTH_SECS
}

impl PipelineConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds.max(1))
    }

    /// Names of the configured motion engines, in declaration order.
    pub fn motion_engine_names(&self) -> Vec<String> {
        self.backends
            .motion
            .iter()
            .enumerate()
            .map(|(i, b)| b.motion_engine_name(i))
            .collect()
    }
}

/// Retry policy for transient backend failures.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call, including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

/// Submit-then-poll settings for asynchronous backends.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_polls: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl PollingConfig {
    /// Longest an asynchronous task is waited on after submission.
    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.interval_ms.saturating_mul(u64::from(self.max_polls.max(1))))
    }
}

/// Share of the 0..=100 progress range owned by each stage.
///
/// # Example
/// ```yaml
/// stage_weights:
///   script: 10
///   images: 15
///   enhance: 10
///   motion: 15
///   voice: 15
///   avatar: 15
///   composite: 15
///   upload: 5
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageWeights {
    pub script: u32,
    pub images: u32,
    pub enhance: u32,
    pub motion: u32,
    pub voice: u32,
    pub avatar: u32,
    pub composite: u32,
    pub upload: u32,
}

impl Default for StageWeights {
    fn default() -> Self {
        Self {
            script: 10,
            images: 15,
            enhance: 10,
            motion: 15,
            voice: 15,
            avatar: 15,
            composite: 15,
            upload: 5,
        }
    }
}

impl StageWeights {
    pub fn weight(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Script => self.script,
            Stage::Images => self.images,
            Stage::Enhance => self.enhance,
            Stage::Motion => self.motion,
            Stage::Voice => self.voice,
            Stage::Avatar => self.avatar,
            Stage::Composite => self.composite,
            Stage::Upload => self.upload,
            Stage::Queued | Stage::Completed => 0,
        }
    }

    pub fn total(&self) -> u32 {
        Stage::WORKING.iter().map(|s| self.weight(*s)).sum()
    }
}

/// How `motion_engine: auto` picks an engine.
///
/// Below `credit_threshold` credits spent the job uses `premium`; at or
/// above it, `economy`. Unset engines default to the first and last entries
/// of `backends.motion`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionPolicyConfig {
    pub premium: Option<String>,
    pub economy: Option<String>,
    pub credit_threshold: u64,
}

impl Default for MotionPolicyConfig {
    fn default() -> Self {
        Self {
            premium: None,
            economy: None,
            credit_threshold: DEFAULT_MOTION_CREDIT_THRESHOLD,
        }
    }
}

/// Cross-fade style between scenes.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Hard cuts; clips are concatenated.
    None,
    Fade,
    Dissolve,
    WipeLeft,
    SlideLeft,
}

impl Transition {
    /// Name of the matching ffmpeg `xfade` transition.
    pub fn xfade_name(&self) -> Option<&'static str> {
        match self {
            Transition::None => None,
            Transition::Fade => Some("fade"),
            Transition::Dissolve => Some("dissolve"),
            Transition::WipeLeft => Some("wipeleft"),
            Transition::SlideLeft => Some("slideleft"),
        }
    }
}

/// Settings for the external media tool.
///
/// # Example
/// ```yaml
/// compositor:
///   executable: /usr/bin/ffmpeg
///   width: 1920
///   height: 1080
///   transition: dissolve
///   transition_seconds: 0.5
///   music_track: assets/bed.mp3
///   encoder_args: ["-c:v", "libx265", "-crf", "26"]
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompositorConfig {
    pub executable: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub transition: Transition,
    pub transition_seconds: f64,
    /// Slow zoom on still images.
    pub ken_burns: bool,
    pub title_overlay: TitleOverlayConfig,
    /// Output file extension.
    pub container: String,
    /// Replaces the default encoder arguments when non-empty.
    pub encoder_args: Vec<String>,
    /// Background music mixed under the narration when a job asks for music.
    pub music_track: Option<PathBuf>,
    pub music_volume: f64,
    /// Width of the avatar overlay relative to the frame width.
    pub avatar_scale: f64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_COMPOSITOR_EXECUTABLE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            transition: Transition::Fade,
            transition_seconds: 0.5,
            ken_burns: true,
            title_overlay: TitleOverlayConfig::default(),
            container: DEFAULT_CONTAINER.to_string(),
            encoder_args: Vec::new(),
            music_track: None,
            music_volume: 0.15,
            avatar_scale: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TitleOverlayConfig {
    pub font_size: u32,
    pub font_color: String,
    /// How long the title stays on screen.
    pub seconds: f64,
    pub font_file: Option<PathBuf>,
}

impl Default for TitleOverlayConfig {
    fn default() -> Self {
        Self {
            font_size: 64,
            font_color: "white".to_string(),
            seconds: 3.0,
            font_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Parent of the per-job scratch directories.
    pub work_dir: PathBuf,
    /// Where uploaded artifacts land.
    pub artifacts_dir: PathBuf,
    /// Persist job records here; in-memory when unset.
    pub jobs_dir: Option<PathBuf>,
    /// Keep scratch directories of cancelled jobs.
    pub keep_intermediates: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("reelforge-data/work"),
            artifacts_dir: PathBuf::from("reelforge-data/artifacts"),
            jobs_dir: None,
            keep_intermediates: false,
        }
    }
}

/// Which backend implements each capability.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendsConfig {
    pub script: BackendConfig,
    pub image: BackendConfig,
    pub enhancer: BackendConfig,
    /// Motion engines; `auto` selection and per-job names refer to these.
    pub motion: Vec<BackendConfig>,
    pub voice: BackendConfig,
    #[serde(default)]
    pub avatar: Option<BackendConfig>,
}

/// Configuration for one backend.
///
/// # Example
/// ```yaml
/// type: http
/// name: cinematic
/// endpoint: https://motion.example.com/v1/animate
/// api_key_env: MOTION_API_KEY
/// mode: async
/// options:
///   fps: 24
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub backend: BackendType,
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the bearer token.
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub mode: CallMode,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

impl BackendConfig {
    /// A local backend with no options, for tests and defaults.
    pub fn local(name: Option<&str>) -> Self {
        Self {
            backend: BackendType::Local,
            name: name.map(str::to_string),
            endpoint: None,
            model: None,
            api_key_env: None,
            mode: CallMode::Sync,
            options: HashMap::new(),
        }
    }

    pub fn display_name(&self, capability: &str) -> String {
        self.name.clone().unwrap_or_else(|| capability.to_string())
    }

    pub(crate) fn motion_engine_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("motion-{}", index))
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    pub fn option_f64(&self, key: &str) -> Option<f64> {
        self.options.get(key).and_then(|v| v.as_f64())
    }

    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(|v| v.as_u64())
    }
}

/// How a backend is implemented.
///
/// # Variants
/// * `Local` - Deterministic in-process generator
/// * `Http` - Remote provider reached over HTTP
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    Local,
    Http,
}

/// Whether an HTTP backend answers inline or hands back a task to poll.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum CallMode {
    #[default]
    Sync,
    Async,
}

/// Parse a config from text in the given format (`yaml`, `yml` or `toml`).
pub fn parse_config(content: &str, format: &str) -> Result<PipelineConfig, ConfigError> {
    match format.to_ascii_lowercase().as_str() {
        "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
        "toml" => Ok(toml::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a config file, choosing the parser by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string();
    let content = fs::read_to_string(path)?;
    parse_config(&content, &format)
}

/// Load a config file and reject it unless it validates.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_pipeline_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
