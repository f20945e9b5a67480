// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Shortest video a job may request, in seconds.
pub const MIN_DURATION_SECS: u32 = 5;
/// Longest video a job may request, in seconds.
pub const MAX_DURATION_SECS: u32 = 600;
/// Upper bound on prompt length, in characters.
pub const MAX_PROMPT_CHARS: usize = 4000;
/// Upper bound on reference images attached to one job.
pub const MAX_REFERENCE_IMAGES: usize = 4;

/// Which motion engine a job wants.
///
/// `Auto` defers the choice to the orchestrator's credit policy; a named
/// engine must match one configured in `backends.motion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MotionEngineChoice {
    Auto,
    Named(String),
}

impl From<String> for MotionEngineChoice {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("auto") || value.trim().is_empty() {
            MotionEngineChoice::Auto
        } else {
            MotionEngineChoice::Named(value.trim().to_string())
        }
    }
}

impl From<MotionEngineChoice> for String {
    fn from(value: MotionEngineChoice) -> Self {
        value.to_string()
    }
}

impl Display for MotionEngineChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionEngineChoice::Auto => write!(f, "auto"),
            MotionEngineChoice::Named(name) => write!(f, "{}", name),
        }
    }
}

impl Default for MotionEngineChoice {
    fn default() -> Self {
        MotionEngineChoice::Auto
    }
}

/// Per-job generation options supplied at submission time.
///
/// # Example
/// ```yaml
/// duration_secs: 12
/// visual_style: cinematic
/// voice_profile: warm-female
/// motion_engine: auto
/// avatar: false
/// music: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub duration_secs: u32,
    pub visual_style: String,
    pub voice_profile: String,
    pub tone: String,
    pub motion_engine: MotionEngineChoice,
    pub avatar: bool,
    pub music: bool,
    pub title_overlay: bool,
    pub reference_images: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30,
            visual_style: "cinematic".to_string(),
            voice_profile: "default".to_string(),
            tone: "engaging".to_string(),
            motion_engine: MotionEngineChoice::Auto,
            avatar: false,
            music: false,
            title_overlay: false,
            reference_images: Vec::new(),
        }
    }
}
