// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::StageWeights;
use crate::model::Stage;

/// Maps each working stage to its band of the 0..=100 progress scale.
///
/// Bands follow [`Stage::WORKING`] order. When the avatar stage is not going
/// to run, its weight moves to `composite` and `upload` in proportion to
/// their own weights, so a job without an avatar still ends its composite
/// band at the same place relative to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPlan {
    bands: Vec<(Stage, u8, u8)>,
}

impl ProgressPlan {
    pub fn new(weights: &StageWeights, include_avatar: bool) -> Self {
        let mut effective: Vec<(Stage, u32)> = Stage::WORKING
            .iter()
            .map(|stage| (*stage, weights.weight(*stage)))
            .collect();

        if !include_avatar {
            let avatar = weights.avatar;
            let composite = weights.composite;
            let upload = weights.upload;
            let to_upload = if composite + upload == 0 {
                0
            } else {
                avatar * upload / (composite + upload)
            };
            for (stage, weight) in effective.iter_mut() {
                match stage {
                    Stage::Avatar => *weight = 0,
                    Stage::Composite => *weight += avatar - to_upload,
                    Stage::Upload => *weight += to_upload,
                    _ => {}
                }
            }
        }

        let total: u32 = effective.iter().map(|(_, w)| *w).sum::<u32>().max(1);
        let mut cumulative = 0u32;
        let mut bands = Vec::with_capacity(effective.len());
        for (stage, weight) in effective {
            let start = (cumulative * 100 / total) as u8;
            cumulative += weight;
            let end = (cumulative * 100 / total) as u8;
            bands.push((stage, start, end));
        }
        if let Some(last) = bands.last_mut() {
            last.2 = 100;
        }

        Self { bands }
    }

    /// `(start, end)` of a stage's band. `Queued` is `(0, 0)` and
    /// `Completed` is `(100, 100)`.
    pub fn band(&self, stage: Stage) -> (u8, u8) {
        match stage {
            Stage::Queued => (0, 0),
            Stage::Completed => (100, 100),
            _ => self
                .bands
                .iter()
                .find(|(s, _, _)| *s == stage)
                .map(|(_, start, end)| (*start, *end))
                .unwrap_or((0, 0)),
        }
    }

    pub fn start(&self, stage: Stage) -> u8 {
        self.band(stage).0
    }

    pub fn end(&self, stage: Stage) -> u8 {
        self.band(stage).1
    }

    /// Progress `fraction` of the way through `stage`'s band.
    pub fn within(&self, stage: Stage, fraction: f64) -> u8 {
        let (start, end) = self.band(stage);
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        start + ((end - start) as f64 * fraction).floor() as u8
    }
}
