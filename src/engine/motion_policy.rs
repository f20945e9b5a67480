// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::MotionPolicyConfig;
use crate::model::MotionEngineChoice;

/// Chooses the motion engine for a job.
///
/// A named choice is used as is. `auto` picks `premium` while the job has
/// spent less than `credit_threshold` credits and `economy` from then on,
/// which caps how much one long job can spend on motion.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPolicy {
    pub premium: String,
    pub economy: String,
    pub credit_threshold: u64,
}

impl MotionPolicy {
    /// `None` when there are no motion engines to choose from.
    pub fn from_config(config: &MotionPolicyConfig, engines: &[String]) -> Option<Self> {
        let premium = config.premium.clone().or_else(|| engines.first().cloned())?;
        let economy = config.economy.clone().or_else(|| engines.last().cloned())?;
        Some(Self {
            premium,
            economy,
            credit_threshold: config.credit_threshold,
        })
    }

    pub fn select<'a>(&'a self, choice: &'a MotionEngineChoice, credits_used: u64) -> &'a str {
        match choice {
            MotionEngineChoice::Named(name) => name,
            MotionEngineChoice::Auto if credits_used < self.credit_threshold => &self.premium,
            MotionEngineChoice::Auto => &self.economy,
        }
    }
}
