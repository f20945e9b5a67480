// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::backends::http::HttpClient;
use crate::errors::{BackendError, BackendResult};
use crate::model::Script;
use crate::traits::{ScriptGenerator, ScriptRequest};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f64 = 0.7;

const SYSTEM_PROMPT: &str = "You write scripts for short narrated videos. \
Answer with a single JSON object and nothing else, shaped as \
{\"title\": string, \"scenes\": [{\"narration\": string, \"visual_description\": string, \
\"emotion\": string, \"duration\": number}]}. Narration is what the voice says; \
visual_description is one concrete shot an image model can draw.";

/// Script writer backed by a chat-completions style endpoint.
///
/// The completion text goes through [`Script::from_completion`], so loosely
/// shaped answers are repaired and unusable ones come back as
/// `InvalidResponse` for the retry policy to deal with.
#[derive(Debug, Clone)]
pub struct HttpScriptGenerator {
    pub name: String,
    pub client: HttpClient,
    pub model: Option<String>,
    pub temperature: f64,
    pub options: Map<String, Value>,
}

impl HttpScriptGenerator {
    pub fn new(name: String, client: HttpClient, model: Option<String>) -> Self {
        Self {
            name,
            client,
            model,
            temperature: DEFAULT_TEMPERATURE,
            options: Map::new(),
        }
    }

    fn user_prompt(request: &ScriptRequest) -> String {
        format!(
            "Write a {:.0}-second video script in about {} scenes.\n\
             Visual style: {}\nTone: {}\nScene durations must add up to {:.0} seconds.\n\n\
             Topic:\n{}",
            request.duration_secs,
            request.suggested_scene_count(),
            request.style,
            request.tone,
            request.duration_secs,
            request.prompt.trim()
        )
    }

    fn request_body(&self, request: &ScriptRequest) -> Value {
        let mut body = json!({
            "model": self.model.as_deref().unwrap_or(DEFAULT_MODEL),
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::user_prompt(request)},
            ],
        });
        if let Value::Object(map) = &mut body {
            for (key, value) in &self.options {
                map.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        body
    }
}

fn completion_text(payload: &Value) -> Option<&str> {
    let choice = payload.get("choices")?.get(0)?;
    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .or_else(|| choice.get("text"))
        .and_then(Value::as_str)
}

#[async_trait]
impl ScriptGenerator for HttpScriptGenerator {
    async fn generate_script(&self, request: &ScriptRequest) -> BackendResult<Script> {
        let payload = self
            .client
            .post_json(self.client.endpoint(), &self.request_body(request))
            .await?;
        let text = completion_text(&payload).ok_or_else(|| {
            BackendError::InvalidResponse("completion has no message content".into())
        })?;
        Ok(Script::from_completion(text, request.duration_secs)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::http::test_server::{CannedResponse, TestServer};
    use std::time::Duration;

    fn request() -> ScriptRequest {
        ScriptRequest {
            prompt: "Announce our harbour tour app.".into(),
            duration_secs: 12.0,
            style: "cinematic".into(),
            tone: "upbeat".into(),
            scene_length_secs: 4.0,
        }
    }

    fn completion(content: &str) -> CannedResponse {
        CannedResponse::json(
            200,
            json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]}),
        )
    }

    fn generator(server: &TestServer) -> HttpScriptGenerator {
        let client =
            HttpClient::new(server.url("/v1/chat/completions"), None, Duration::from_secs(5))
                .unwrap();
        HttpScriptGenerator::new("writer".into(), client, Some("script-model".into()))
    }

    #[tokio::test]
    async fn test_parses_completion_into_script() {
        let content = r#"{"title": "Harbour Tours", "scenes": [
            {"narration": "Set sail.", "visual_description": "boat at dawn", "emotion": "calm", "duration": 6},
            {"narration": "Book today.", "visual_description": "app screen", "emotion": "excited", "duration": 6}
        ]}"#;
        let server = TestServer::start(vec![completion(content)]).await;

        let script = generator(&server).generate_script(&request()).await.unwrap();
        assert_eq!(script.title, "Harbour Tours");
        assert_eq!(script.scenes.len(), 2);

        let body = server.requests()[0].json();
        assert_eq!(body["model"], "script-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("harbour tour app"));
    }

    #[tokio::test]
    async fn test_unusable_completion_is_invalid_response() {
        let server = TestServer::start(vec![completion("I cannot help with that.")]).await;
        let result = generator(&server).generate_script(&request()).await;
        assert!(matches!(result, Err(BackendError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_missing_choices_is_invalid_response() {
        let server = TestServer::start(vec![CannedResponse::json(200, json!({"id": "x"}))]).await;
        let result = generator(&server).generate_script(&request()).await;
        assert!(matches!(result, Err(BackendError::InvalidResponse(_))));
    }
}
