// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod broadcaster;
pub mod event;

pub use broadcaster::ProgressBroadcaster;
pub use event::ProgressEvent;
