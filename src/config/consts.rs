// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default size of the per-stage worker pool
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
/// Default timeout for a single backend call, including polling (seconds)
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 300;
/// Preferred scene length handed to the script writer (seconds)
pub const DEFAULT_SCENE_LENGTH_SECS: f64 = 4.0;

/// Default attempts per backend call, the first one included
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 8_000;

/// Default interval between polls of an asynchronous backend task
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
/// Default poll ceiling before an asynchronous task is treated as failed.
/// Interval times ceiling must stay below the call timeout.
pub const DEFAULT_MAX_POLLS: u32 = 120;

/// Credits spent after which `auto` motion selection switches to the economy engine
pub const DEFAULT_MOTION_CREDIT_THRESHOLD: u64 = 40;

pub const DEFAULT_COMPOSITOR_EXECUTABLE: &str = "ffmpeg";
pub const DEFAULT_WIDTH: u32 = 1080;
pub const DEFAULT_HEIGHT: u32 = 1920;
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_CONTAINER: &str = "mp4";
