// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::BackendResult;
use crate::model::{Script, ScriptScene};
use crate::traits::{ScriptGenerator, ScriptRequest};

const MAX_TITLE_CHARS: usize = 60;
const EMOTIONS: [&str; 3] = ["excited", "curious", "confident"];

/// Builds a script from the prompt's own sentences.
///
/// One scene per suggested scene slot: the prompt's sentences are used in
/// order, and slots past the last sentence get a templated line about the
/// prompt's topic.
#[derive(Debug, Clone)]
pub struct TemplateScriptWriter {
    name: String,
}

impl TemplateScriptWriter {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

fn sentences(prompt: &str) -> Vec<String> {
    prompt
        .split(|c| matches!(c, '.' | '!' | '?' | '\n'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{}.", s))
        .collect()
}

fn title_for(topic: &str) -> String {
    let title: String = topic.chars().take(MAX_TITLE_CHARS).collect();
    let mut chars = title.trim_end_matches('.').chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Untitled".to_string(),
    }
}

#[async_trait]
impl ScriptGenerator for TemplateScriptWriter {
    async fn generate_script(&self, request: &ScriptRequest) -> BackendResult<Script> {
        let lines = sentences(&request.prompt);
        let topic = lines
            .first()
            .cloned()
            .unwrap_or_else(|| request.prompt.trim().to_string());
        let count = request.suggested_scene_count();

        let scenes = (0..count)
            .map(|i| {
                let narration = lines.get(i).cloned().unwrap_or_else(|| {
                    format!("Part {} of {}: {}", i + 1, count, topic.trim_end_matches('.'))
                });
                ScriptScene {
                    visual_description: format!(
                        "{} shot, {} mood: {}",
                        request.style, request.tone, narration
                    ),
                    narration,
                    emotion: EMOTIONS[i % EMOTIONS.len()].to_string(),
                    duration_secs: 0.0,
                }
            })
            .collect();

        let script = Script {
            title: title_for(&topic),
            scenes,
        };
        Ok(script.normalized(request.duration_secs)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str, duration_secs: f64) -> ScriptRequest {
        ScriptRequest {
            prompt: prompt.to_string(),
            duration_secs,
            style: "cinematic".to_string(),
            tone: "upbeat".to_string(),
            scene_length_secs: 4.0,
        }
    }

    #[tokio::test]
    async fn test_scene_count_follows_duration() {
        let writer = TemplateScriptWriter::new("script".into());
        let script = writer
            .generate_script(&request("launch announcement", 12.0))
            .await
            .unwrap();

        assert_eq!(script.title, "Launch announcement");
        assert_eq!(script.scenes.len(), 3);
        assert!(script
            .scenes
            .iter()
            .all(|s| (s.duration_secs - 4.0).abs() < 0.01));
        assert_eq!(script.scenes[0].narration, "launch announcement.");
        assert!(script.scenes[1].narration.starts_with("Part 2 of 3"));
    }

    #[tokio::test]
    async fn test_uses_prompt_sentences_in_order() {
        let writer = TemplateScriptWriter::new("script".into());
        let script = writer
            .generate_script(&request("Meet Nova. It plans your week! Try it today?", 12.0))
            .await
            .unwrap();

        let narration: Vec<&str> = script.scenes.iter().map(|s| s.narration.as_str()).collect();
        assert_eq!(
            narration,
            vec!["Meet Nova.", "It plans your week.", "Try it today."]
        );
        assert!(script.scenes[0].visual_description.contains("cinematic"));
    }
}
