// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Translation of a [`CompositionRequest`] into ffmpeg inputs and a
//! `filter_complex` script.
//!
//! Every clip is normalized to the canonical frame (scale, pad, fps, pixel
//! format) and trimmed to its scene duration before the clips are joined,
//! so inputs of any size or length line up. Synthetic assets become lavfi
//! sources:
//!
//! | Asset | Input |
//! |---|---|
//! | colour card | `color=c=<colour>:s=WxH:r=fps` |
//! | silence | `anullsrc=r=44100:cl=stereo` |
//! | still hold | the image looped for the scene duration |

use std::fmt::Write as _;
use std::path::Path;

use crate::config::CompositorConfig;
use crate::errors::{CompositeError, CompositeResult};
use crate::model::{AssetRef, SyntheticAsset, PLACEHOLDER_COLOR};
use crate::traits::{CompositionRequest, TimelineClip};

const SAMPLE_RATE: u32 = 44_100;
/// Zoom reached at the end of a Ken Burns still.
const KEN_BURNS_MAX_ZOOM: f64 = 1.15;
/// Gap between the avatar overlay and the frame edge, in pixels.
const OVERLAY_MARGIN: u32 = 24;

const DEFAULT_ENCODER_ARGS: [&str; 10] = [
    "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "aac", "-b:a", "192k",
];

/// The inputs and filter graph for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderGraph {
    /// Arguments for each `-i` input, in input-index order, `-i` included.
    pub inputs: Vec<Vec<String>>,
    /// Contents of the `-filter_complex_script` file.
    pub filter: String,
    pub video_out: String,
    pub audio_out: String,
    /// Length of the rendered timeline after transitions.
    pub duration_secs: f64,
}

/// What kind of visual input a clip starts from.
enum VisualSource {
    Video(String),
    Still(String),
    Color(String),
}

impl RenderGraph {
    pub fn build(request: &CompositionRequest, config: &CompositorConfig) -> CompositeResult<Self> {
        if request.clips.is_empty() {
            return Err(CompositeError::EmptyTimeline);
        }
        let mut builder = GraphBuilder::new(config);
        for (index, clip) in request.clips.iter().enumerate() {
            builder.add_clip(index, clip);
        }
        let (video, audio, duration_secs) = builder.join(&request.clips);
        let video = match &request.title {
            Some(title) if !title.trim().is_empty() => builder.add_title(&video, title),
            _ => video,
        };
        let audio = match (&config.music_track, request.with_music) {
            (Some(track), true) => builder.add_music(&audio, track, duration_secs),
            _ => audio,
        };

        Ok(Self {
            inputs: builder.inputs,
            filter: builder.filters.join(";\n"),
            video_out: video,
            audio_out: audio,
            duration_secs,
        })
    }

    /// Full argument list for the media tool.
    pub fn command_args(
        &self,
        config: &CompositorConfig,
        filter_script: &Path,
        output: &Path,
    ) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-y", "-nostats", "-progress", "pipe:1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for input in &self.inputs {
            args.extend(input.iter().cloned());
        }
        args.push("-filter_complex_script".into());
        args.push(filter_script.to_string_lossy().into_owned());
        args.extend([
            "-map".to_string(),
            format!("[{}]", self.video_out),
            "-map".to_string(),
            format!("[{}]", self.audio_out),
        ]);
        if config.encoder_args.is_empty() {
            args.extend(DEFAULT_ENCODER_ARGS.iter().map(|s| s.to_string()));
        } else {
            args.extend(config.encoder_args.iter().cloned());
        }
        args.push("-t".into());
        args.push(format_secs(self.duration_secs));
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

struct GraphBuilder<'a> {
    config: &'a CompositorConfig,
    inputs: Vec<Vec<String>>,
    filters: Vec<String>,
}

impl<'a> GraphBuilder<'a> {
    fn new(config: &'a CompositorConfig) -> Self {
        Self {
            config,
            inputs: Vec::new(),
            filters: Vec::new(),
        }
    }

    fn add_input(&mut self, args: Vec<String>) -> usize {
        self.inputs.push(args);
        self.inputs.len() - 1
    }

    fn frame_size(&self) -> String {
        format!("{}x{}", self.config.width, self.config.height)
    }

    fn add_clip(&mut self, index: usize, clip: &TimelineClip) {
        let duration = format_secs(clip.duration_secs);
        let (w, h, fps) = (self.config.width, self.config.height, self.config.fps);

        let video = match visual_source(&clip.video) {
            VisualSource::Video(locator) => {
                let input = self.add_input(vec!["-i".into(), locator]);
                format!(
                    "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}"
                )
            }
            VisualSource::Still(locator) => {
                let input = self.add_input(vec![
                    "-loop".into(),
                    "1".into(),
                    "-framerate".into(),
                    fps.to_string(),
                    "-t".into(),
                    duration.clone(),
                    "-i".into(),
                    locator,
                ]);
                if self.config.ken_burns {
                    let frames = (clip.duration_secs * f64::from(fps)).ceil().max(1.0);
                    let step = (KEN_BURNS_MAX_ZOOM - 1.0) / frames;
                    format!(
                        "[{input}:v]scale={sw}:{sh}:force_original_aspect_ratio=increase,\
                         crop={sw}:{sh},\
                         zoompan=z='min(1+{step:.6}*on,{KEN_BURNS_MAX_ZOOM})':\
                         x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={w}x{h}:fps={fps},\
                         setsar=1",
                        sw = w * 2,
                        sh = h * 2,
                    )
                } else {
                    format!(
                        "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}"
                    )
                }
            }
            VisualSource::Color(color) => {
                let input = self.add_input(vec![
                    "-f".into(),
                    "lavfi".into(),
                    "-t".into(),
                    duration.clone(),
                    "-i".into(),
                    format!("color=c={}:s={}:r={}", color, self.frame_size(), fps),
                ]);
                format!("[{input}:v]setsar=1")
            }
        };
        self.filters.push(format!(
            "{video},format=yuv420p,trim=duration={duration},setpts=PTS-STARTPTS[v{index}]"
        ));

        let audio_input = match clip.audio.locator() {
            Some(locator) => self.add_input(vec!["-i".into(), locator]),
            None => self.add_input(vec![
                "-f".into(),
                "lavfi".into(),
                "-t".into(),
                duration.clone(),
                "-i".into(),
                format!("anullsrc=r={}:cl=stereo", SAMPLE_RATE),
            ]),
        };
        // apad then atrim makes short narration fill the scene and cuts long narration.
        self.filters.push(format!(
            "[{audio_input}:a]aformat=sample_rates={SAMPLE_RATE}:channel_layouts=stereo,\
             apad,atrim=duration={duration},asetpts=PTS-STARTPTS[a{index}]"
        ));

        if let Some(locator) = clip.overlay.as_ref().and_then(AssetRef::locator) {
            let input = self.add_input(vec!["-i".into(), locator]);
            let overlay_width = ((f64::from(w) * self.config.avatar_scale).round() as u32).max(2);
            self.filters.push(format!(
                "[{input}:v]scale={overlay_width}:-2,setpts=PTS-STARTPTS[ov{index}]"
            ));
            self.filters.push(format!(
                "[v{index}][ov{index}]overlay=W-w-{OVERLAY_MARGIN}:H-h-{OVERLAY_MARGIN}:\
                 eof_action=pass[vo{index}]"
            ));
        }
    }

    fn clip_label(clip: &TimelineClip, index: usize) -> String {
        if clip.overlay.as_ref().and_then(AssetRef::locator).is_some() {
            format!("vo{}", index)
        } else {
            format!("v{}", index)
        }
    }

    /// Join the per-clip streams. Returns the video label, the audio label
    /// and the resulting duration.
    fn join(&mut self, clips: &[TimelineClip]) -> (String, String, f64) {
        let total: f64 = clips.iter().map(|c| c.duration_secs).sum();
        let shortest = clips
            .iter()
            .map(|c| c.duration_secs)
            .fold(f64::INFINITY, f64::min);
        let fade = self.config.transition_seconds.min(shortest / 2.0).max(0.0);

        match self.config.transition.xfade_name() {
            Some(transition) if clips.len() > 1 && fade > 0.0 => {
                let mut video = Self::clip_label(&clips[0], 0);
                let mut audio = "a0".to_string();
                let mut elapsed = clips[0].duration_secs;
                for (index, clip) in clips.iter().enumerate().skip(1) {
                    let offset = elapsed - index as f64 * fade;
                    let next_video = format!("vx{}", index);
                    let next_audio = format!("ax{}", index);
                    self.filters.push(format!(
                        "[{video}][{label}]xfade=transition={transition}:duration={fade}:offset={offset}[{next_video}]",
                        label = Self::clip_label(clip, index),
                        fade = format_secs(fade),
                        offset = format_secs(offset),
                    ));
                    self.filters.push(format!(
                        "[{audio}][a{index}]acrossfade=d={fade}[{next_audio}]",
                        fade = format_secs(fade),
                    ));
                    elapsed += clip.duration_secs;
                    video = next_video;
                    audio = next_audio;
                }
                let duration = total - (clips.len() - 1) as f64 * fade;
                (video, audio, duration)
            }
            _ => {
                let mut pads = String::new();
                for (index, clip) in clips.iter().enumerate() {
                    let _ = write!(pads, "[{}][a{}]", Self::clip_label(clip, index), index);
                }
                self.filters.push(format!(
                    "{pads}concat=n={}:v=1:a=1[vcat][acat]",
                    clips.len()
                ));
                ("vcat".to_string(), "acat".to_string(), total)
            }
        }
    }

    fn add_title(&mut self, video: &str, title: &str) -> String {
        let overlay = &self.config.title_overlay;
        let mut filter = format!(
            "[{video}]drawtext=text='{}':fontcolor={}:fontsize={}:\
             x=(w-text_w)/2:y=(h-text_h)/2:enable='between(t,0,{})'",
            escape_drawtext(title),
            overlay.font_color,
            overlay.font_size,
            format_secs(overlay.seconds),
        );
        if let Some(font) = &overlay.font_file {
            let _ = write!(filter, ":fontfile='{}'", escape_drawtext(&font.to_string_lossy()));
        }
        filter.push_str("[vtitle]");
        self.filters.push(filter);
        "vtitle".to_string()
    }

    fn add_music(&mut self, audio: &str, track: &Path, duration_secs: f64) -> String {
        let input = self.add_input(vec![
            "-stream_loop".into(),
            "-1".into(),
            "-i".into(),
            track.to_string_lossy().into_owned(),
        ]);
        self.filters.push(format!(
            "[{input}:a]aformat=sample_rates={SAMPLE_RATE}:channel_layouts=stereo,\
             volume={},atrim=duration={}[music]",
            self.config.music_volume,
            format_secs(duration_secs),
        ));
        self.filters.push(format!(
            "[{audio}][music]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[amix]"
        ));
        "amix".to_string()
    }
}

fn visual_source(asset: &AssetRef) -> VisualSource {
    match asset {
        AssetRef::File { .. } | AssetRef::Remote { .. } => match asset.locator() {
            Some(locator) => VisualSource::Video(locator),
            None => VisualSource::Color(PLACEHOLDER_COLOR.to_string()),
        },
        AssetRef::Synthetic { asset } => match asset {
            SyntheticAsset::ColorCard { color } => VisualSource::Color(color.clone()),
            SyntheticAsset::StillHold { image, .. } => match image.locator() {
                Some(locator) => VisualSource::Still(locator),
                None => visual_source(image),
            },
            SyntheticAsset::Silence { .. } => VisualSource::Color(PLACEHOLDER_COLOR.to_string()),
        },
    }
}

/// Escape text for a single-quoted drawtext value.
fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            // A quote cannot appear inside a quoted filter value.
            '\'' => escaped.push('\u{2019}'),
            '\\' | ':' | '%' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_secs(secs: f64) -> String {
    let formatted = format!("{:.3}", secs.max(0.0));
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
