// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Final assembly of a job's scenes into one video.
//!
//! * `render_graph` - inputs and filter graph for a timeline
//! * `progress` - parser for the media tool's `-progress` stream
//! * `ffmpeg` - [`FfmpegCompositor`], the subprocess driver
//! * `artifact` - [`LocalArtifactStore`], where finished videos are published

pub mod artifact;
pub mod ffmpeg;
pub mod progress;
pub mod render_graph;

pub use artifact::LocalArtifactStore;
pub use ffmpeg::FfmpegCompositor;
pub use render_graph::RenderGraph;
