// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// A billable backend invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BillableOperation {
    Script,
    Image,
    Enhance,
    /// Motion is priced per engine.
    Motion(String),
    Voice,
    Avatar,
}

impl Display for BillableOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BillableOperation::Script => write!(f, "script"),
            BillableOperation::Image => write!(f, "image"),
            BillableOperation::Enhance => write!(f, "enhance"),
            BillableOperation::Motion(engine) => write!(f, "motion:{}", engine),
            BillableOperation::Voice => write!(f, "voice"),
            BillableOperation::Avatar => write!(f, "avatar"),
        }
    }
}

/// Static credit cost of each operation.
///
/// # Example
/// ```yaml
/// credits:
///   script: 1
///   image: 2
///   motion:
///     premium: 10
///     economy: 3
///   default_motion: 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTable {
    pub script: u64,
    pub image: u64,
    pub enhance: u64,
    pub voice: u64,
    pub avatar: u64,
    /// Per-engine motion prices, keyed by configured engine name.
    pub motion: HashMap<String, u64>,
    /// Price of an engine missing from `motion`.
    pub default_motion: u64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            script: 1,
            image: 2,
            enhance: 1,
            voice: 1,
            avatar: 4,
            motion: HashMap::new(),
            default_motion: 5,
        }
    }
}

impl PriceTable {
    pub fn price(&self, operation: &BillableOperation) -> u64 {
        match operation {
            BillableOperation::Script => self.script,
            BillableOperation::Image => self.image,
            BillableOperation::Enhance => self.enhance,
            BillableOperation::Motion(engine) => self
                .motion
                .get(engine)
                .copied()
                .unwrap_or(self.default_motion),
            BillableOperation::Voice => self.voice,
            BillableOperation::Avatar => self.avatar,
        }
    }
}
