// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Ordered phases of the generation pipeline.
///
/// `Queued` and `Completed` bracket the working stages; every other variant
/// produces one asset type for every scene (or, for `Composite` and `Upload`,
/// one artifact for the whole job).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Queued,
    Script,
    Images,
    Enhance,
    Motion,
    Voice,
    Avatar,
    Composite,
    Upload,
    Completed,
}

impl Stage {
    /// Working stages in execution order.
    pub const WORKING: [Stage; 8] = [
        Stage::Script,
        Stage::Images,
        Stage::Enhance,
        Stage::Motion,
        Stage::Voice,
        Stage::Avatar,
        Stage::Composite,
        Stage::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Queued => "queued",
            Stage::Script => "script",
            Stage::Images => "images",
            Stage::Enhance => "enhance",
            Stage::Motion => "motion",
            Stage::Voice => "voice",
            Stage::Avatar => "avatar",
            Stage::Composite => "composite",
            Stage::Upload => "upload",
            Stage::Completed => "completed",
        }
    }

    /// Human-readable label used for `current_step`.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Queued => "Waiting to start",
            Stage::Script => "Writing script",
            Stage::Images => "Generating scene images",
            Stage::Enhance => "Enhancing images",
            Stage::Motion => "Animating scenes",
            Stage::Voice => "Synthesizing narration",
            Stage::Avatar => "Rendering avatar",
            Stage::Composite => "Compositing video",
            Stage::Upload => "Uploading video",
            Stage::Completed => "Completed",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
