// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::backends::http::HttpClient;
use crate::backends::polling::{AsyncTaskProvider, PollingAdapter, TaskStatus};
use crate::config::CallMode;
use crate::errors::{BackendError, BackendResult};
use crate::model::AssetRef;
use crate::traits::{
    AvatarRequest, AvatarSynthesizer, EnhanceRequest, ImageEnhancer, ImageGenerator, ImageRequest,
    MotionRequest, MotionSynthesizer, SceneContext, VoiceRequest, VoiceSynthesizer,
};

const URL_KEYS: [&str; 6] = [
    "url",
    "output_url",
    "video_url",
    "audio_url",
    "image_url",
    "output",
];
const INLINE_KEYS: [&str; 4] = ["b64_json", "image_base64", "audio_base64", "video_base64"];
const TASK_ID_KEYS: [&str; 3] = ["id", "task_id", "job_id"];
const SUCCEEDED: [&str; 5] = ["succeeded", "success", "completed", "complete", "done"];
const FAILED: [&str; 5] = ["failed", "failure", "error", "cancelled", "canceled"];

/// One media endpoint: how to reach it and what its outputs look like.
#[derive(Debug, Clone)]
pub struct MediaEndpoint {
    pub client: HttpClient,
    pub mode: CallMode,
    pub polling: PollingAdapter,
    pub model: Option<String>,
    /// Extra body fields from the backend's `options`.
    pub options: Map<String, Value>,
    /// Output file label, e.g. `motion` in `scene-03-motion.mp4`.
    pub label: &'static str,
    /// Extension for inline (base64) outputs.
    pub extension: String,
}

impl MediaEndpoint {
    /// Send one generation request and resolve it to an asset.
    pub async fn generate(&self, body: Value, ctx: &SceneContext) -> BackendResult<AssetRef> {
        let body = self.with_defaults(body);
        match self.mode {
            CallMode::Sync => {
                let payload = self.client.post_json(self.client.endpoint(), &body).await?;
                asset_from_payload(&payload, ctx, self.label, &self.extension).await
            }
            CallMode::Async => {
                let task = MediaTask {
                    endpoint: self,
                    ctx,
                };
                self.polling.run(&task, &body).await
            }
        }
    }

    fn with_defaults(&self, mut body: Value) -> Value {
        if let Value::Object(map) = &mut body {
            if let Some(model) = &self.model {
                map.entry("model").or_insert_with(|| json!(model));
            }
            for (key, value) in &self.options {
                map.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        body
    }
}

/// Convert backend `options` into JSON body fields.
pub(crate) fn options_to_json(
    options: &HashMap<String, serde_yaml::Value>,
) -> Result<Map<String, Value>, serde_json::Error> {
    options
        .iter()
        .map(|(k, v)| Ok((k.clone(), serde_json::to_value(v)?)))
        .collect()
}

struct MediaTask<'a> {
    endpoint: &'a MediaEndpoint,
    ctx: &'a SceneContext,
}

#[async_trait]
impl<'a> AsyncTaskProvider for MediaTask<'a> {
    type Request = Value;
    type Output = AssetRef;

    async fn submit(&self, request: &Value) -> BackendResult<String> {
        let client = &self.endpoint.client;
        let payload = client.post_json(client.endpoint(), request).await?;
        task_id(&payload)
            .ok_or_else(|| BackendError::InvalidResponse("submit response has no task id".into()))
    }

    async fn poll(&self, task_id: &str) -> BackendResult<TaskStatus<AssetRef>> {
        let client = &self.endpoint.client;
        let payload = client.get_json(&client.resource_url(task_id)).await?;
        let status = payload
            .get("status")
            .or_else(|| payload.get("state"))
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if SUCCEEDED.contains(&status.as_str()) {
            let asset =
                asset_from_payload(&payload, self.ctx, self.endpoint.label, &self.endpoint.extension)
                    .await?;
            Ok(TaskStatus::Succeeded(asset))
        } else if FAILED.contains(&status.as_str()) {
            let reason = ["error", "message", "detail"]
                .iter()
                .find_map(|k| payload.get(*k).and_then(Value::as_str))
                .unwrap_or(status.as_str())
                .to_string();
            Ok(TaskStatus::Failed(reason))
        } else {
            Ok(TaskStatus::Pending)
        }
    }
}

fn task_id(payload: &Value) -> Option<String> {
    TASK_ID_KEYS
        .iter()
        .filter_map(|k| payload.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Find the produced asset in a provider response.
///
/// Looks at the top level, `data[0]`, `output` and `result` for either an
/// asset URL or inline base64 content; inline content is written into the
/// job's work directory.
pub(crate) async fn asset_from_payload(
    payload: &Value,
    ctx: &SceneContext,
    label: &str,
    extension: &str,
) -> BackendResult<AssetRef> {
    let candidates = [
        Some(payload),
        payload.get("data").and_then(|d| d.get(0)),
        payload.get("output").filter(|o| o.is_object()),
        payload.get("result").filter(|o| o.is_object()),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Some(url) = URL_KEYS
            .iter()
            .filter_map(|k| candidate.get(*k))
            .find_map(url_value)
        {
            return Ok(AssetRef::remote(url));
        }

        if let Some(encoded) = INLINE_KEYS
            .iter()
            .find_map(|k| candidate.get(*k).and_then(Value::as_str))
        {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| BackendError::InvalidResponse(format!("bad base64 payload: {}", e)))?;
            let path = ctx.output_path(label, extension);
            tokio::fs::write(&path, bytes).await?;
            return Ok(AssetRef::file(path));
        }
    }

    Err(BackendError::InvalidResponse(
        "response carries neither an asset URL nor inline data".into(),
    ))
}

/// A URL string, or the first URL of an array of them.
fn url_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("http://") || s.starts_with("https://") => {
            Some(s.clone())
        }
        Value::Array(items) => items.iter().find_map(url_value),
        _ => None,
    }
}

/// Request fields carrying an input asset: `<field>_url` for remote assets,
/// `<field>_base64` with the file contents for local ones.
pub(crate) async fn asset_fields(field: &str, asset: &AssetRef) -> BackendResult<Map<String, Value>> {
    let mut fields = Map::new();
    match asset {
        AssetRef::Remote { url } => {
            fields.insert(format!("{}_url", field), json!(url));
        }
        AssetRef::File { path } => {
            let bytes = tokio::fs::read(path).await?;
            fields.insert(format!("{}_base64", field), json!(STANDARD.encode(bytes)));
        }
        AssetRef::Synthetic { .. } => {
            return Err(BackendError::Rejected(format!(
                "{} input {} is synthetic and has no content to send",
                field, asset
            )))
        }
    }
    Ok(fields)
}

fn merge(mut body: Value, fields: Map<String, Value>) -> Value {
    if let Value::Object(map) = &mut body {
        map.extend(fields);
    }
    body
}

#[derive(Debug, Clone)]
pub struct HttpImageGenerator {
    pub name: String,
    pub endpoint: MediaEndpoint,
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate_image(&self, request: &ImageRequest) -> BackendResult<AssetRef> {
        let body = json!({
            "prompt": format!("{}, {} style", request.scene_text, request.style),
            "style": request.style,
            "reference_images": request.reference_images,
            "n": 1,
        });
        self.endpoint.generate(body, &request.ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct HttpImageEnhancer {
    pub name: String,
    pub endpoint: MediaEndpoint,
}

#[async_trait]
impl ImageEnhancer for HttpImageEnhancer {
    async fn enhance_image(&self, request: &EnhanceRequest) -> BackendResult<AssetRef> {
        let body = merge(json!({}), asset_fields("image", &request.image).await?);
        self.endpoint.generate(body, &request.ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct HttpMotionSynthesizer {
    pub name: String,
    pub endpoint: MediaEndpoint,
}

#[async_trait]
impl MotionSynthesizer for HttpMotionSynthesizer {
    async fn synthesize_motion(&self, request: &MotionRequest) -> BackendResult<AssetRef> {
        let body = merge(
            json!({
                "prompt": request.scene_text,
                "duration": request.duration_secs,
            }),
            asset_fields("image", &request.image).await?,
        );
        self.endpoint.generate(body, &request.ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct HttpVoiceSynthesizer {
    pub name: String,
    pub endpoint: MediaEndpoint,
}

#[async_trait]
impl VoiceSynthesizer for HttpVoiceSynthesizer {
    async fn synthesize_voice(&self, request: &VoiceRequest) -> BackendResult<AssetRef> {
        let body = json!({
            "text": request.text,
            "voice": request.voice_profile,
            "emotion": request.emotion,
            "target_duration": request.duration_secs,
        });
        self.endpoint.generate(body, &request.ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
pub struct HttpAvatarSynthesizer {
    pub name: String,
    pub endpoint: MediaEndpoint,
}

#[async_trait]
impl AvatarSynthesizer for HttpAvatarSynthesizer {
    async fn synthesize_avatar(&self, request: &AvatarRequest) -> BackendResult<AssetRef> {
        let mut fields = asset_fields("audio", &request.audio).await?;
        fields.extend(asset_fields("image", &request.image).await?);
        self.endpoint.generate(merge(json!({}), fields), &request.ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
