// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scripts produced by the script-writing backend, and the strict schema every
//! script response is validated against.
//!
//! Text-completion models return loosely shaped JSON (sometimes wrapped in a
//! markdown fence, sometimes with renamed keys, often with durations that do
//! not add up). [`Script::from_completion`] parses that text into a [`Script`]
//! with defaulting and repair, or rejects it so the caller can retry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ScriptSchemaError;

/// Shortest scene we will accept after repair, in seconds.
pub const MIN_SCENE_SECS: f64 = 1.0;

const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_EMOTION: &str = "neutral";

const SCENE_LIST_KEYS: [&str; 3] = ["scenes", "segments", "shots"];
const NARRATION_KEYS: [&str; 5] = ["narration", "narration_text", "voiceover", "text", "script"];
const VISUAL_KEYS: [&str; 4] = ["visual_description", "visual", "image_prompt", "description"];
const EMOTION_KEYS: [&str; 3] = ["emotion", "emotion_tag", "mood"];
const DURATION_KEYS: [&str; 3] = ["duration", "duration_secs", "seconds"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptScene {
    pub narration: String,
    pub visual_description: String,
    pub emotion: String,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub title: String,
    pub scenes: Vec<ScriptScene>,
}

impl Script {
    /// Parse and repair a raw completion into a script lasting `target_secs`.
    pub fn from_completion(raw: &str, target_secs: f64) -> Result<Script, ScriptSchemaError> {
        let body = strip_fences(raw);
        let value: Value =
            serde_json::from_str(body).map_err(|e| ScriptSchemaError::Malformed(e.to_string()))?;

        let object = match &value {
            Value::Object(map) => map,
            // A bare array is accepted as the scene list.
            Value::Array(_) => {
                return Script::from_parts(DEFAULT_TITLE.to_string(), scene_entries(&value)?, target_secs)
            }
            _ => return Err(ScriptSchemaError::MissingScenes),
        };

        let title = string_field(object, &["title", "name"])
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let list = SCENE_LIST_KEYS
            .iter()
            .find_map(|key| object.get(*key))
            .ok_or(ScriptSchemaError::MissingScenes)?;

        Script::from_parts(title, scene_entries(list)?, target_secs)
    }

    /// Apply duration repair to an already-typed script.
    ///
    /// Scenes past what `target_secs` can hold at [`MIN_SCENE_SECS`] each are
    /// dropped from the end; every kept scene lasts at least that long.
    pub fn normalized(mut self, target_secs: f64) -> Result<Script, ScriptSchemaError> {
        if !(target_secs > 0.0) {
            return Err(ScriptSchemaError::InvalidTargetDuration(target_secs));
        }
        self.scenes
            .retain(|s| !s.narration.trim().is_empty() || !s.visual_description.trim().is_empty());
        if self.scenes.is_empty() {
            return Err(ScriptSchemaError::NoUsableScenes);
        }
        self.scenes.truncate(scene_capacity(target_secs));
        rescale_durations(&mut self.scenes, target_secs);
        Ok(self)
    }

    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_secs).sum()
    }

    fn from_parts(
        title: String,
        scenes: Vec<ScriptScene>,
        target_secs: f64,
    ) -> Result<Script, ScriptSchemaError> {
        Script { title, scenes }.normalized(target_secs)
    }
}

fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = trimmed.find(|c| c == '{' || c == '[');
    let end = trimmed.rfind(|c| c == '}' || c == ']');
    match (start, end) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn scene_entries(list: &Value) -> Result<Vec<ScriptScene>, ScriptSchemaError> {
    let items = list.as_array().ok_or(ScriptSchemaError::MissingScenes)?;
    Ok(items.iter().filter_map(scene_from_value).collect())
}

fn scene_from_value(value: &Value) -> Option<ScriptScene> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(ScriptScene {
            narration: text.trim().to_string(),
            visual_description: text.trim().to_string(),
            emotion: DEFAULT_EMOTION.to_string(),
            duration_secs: 0.0,
        }),
        Value::Object(map) => {
            let narration = string_field(map, &NARRATION_KEYS).unwrap_or_default();
            let visual = string_field(map, &VISUAL_KEYS).unwrap_or_else(|| narration.clone());
            if narration.is_empty() && visual.is_empty() {
                return None;
            }
            Some(ScriptScene {
                narration,
                visual_description: visual,
                emotion: string_field(map, &EMOTION_KEYS)
                    .map(|e| e.to_lowercase())
                    .unwrap_or_else(|| DEFAULT_EMOTION.to_string()),
                duration_secs: number_field(map, &DURATION_KEYS).unwrap_or(0.0),
            })
        }
        _ => None,
    }
}

fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn number_field(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|key| map.get(*key)).find_map(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('s').parse::<f64>().ok(),
        _ => None,
    })
}

/// Most scenes `target` seconds can hold.
fn scene_capacity(target: f64) -> usize {
    ((target / MIN_SCENE_SECS).floor() as usize).max(1)
}

/// Fill missing durations, then hand every scene the floor plus a share of
/// the remaining time proportional to its requested length.
fn rescale_durations(scenes: &mut [ScriptScene], target: f64) {
    let count = scenes.len() as f64;
    let known: f64 = scenes
        .iter()
        .filter(|s| s.duration_secs.is_finite() && s.duration_secs > 0.0)
        .map(|s| s.duration_secs)
        .sum();
    let missing = scenes
        .iter()
        .filter(|s| !(s.duration_secs.is_finite() && s.duration_secs > 0.0))
        .count();

    if missing > 0 {
        let share = ((target - known) / missing as f64).max(target / count);
        for scene in scenes.iter_mut() {
            if !(scene.duration_secs.is_finite() && scene.duration_secs > 0.0) {
                scene.duration_secs = share;
            }
        }
    }

    let weights: Vec<f64> = scenes
        .iter()
        .map(|s| s.duration_secs.clamp(MIN_SCENE_SECS, target.max(MIN_SCENE_SECS)))
        .collect();
    let weight_total: f64 = weights.iter().sum();

    // Only a single scene shorter than the floor can leave nothing spare.
    let spare = target - count * MIN_SCENE_SECS;
    let (floor, spare) = if spare >= 0.0 {
        (MIN_SCENE_SECS, spare)
    } else {
        (target / count, 0.0)
    };
    for (scene, weight) in scenes.iter_mut().zip(&weights) {
        scene.duration_secs = round_centis(floor + spare * weight / weight_total);
    }

    // Rounding drift goes on the longest scene so the sum is exact and the
    // floor holds.
    let rounded: f64 = scenes.iter().map(|s| s.duration_secs).sum();
    if let Some(longest) = scenes
        .iter_mut()
        .max_by(|a, b| a.duration_secs.total_cmp(&b.duration_secs))
    {
        longest.duration_secs = round_centis(longest.duration_secs + (target - rounded));
    }
}

fn round_centis(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
