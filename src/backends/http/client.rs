// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backends::http::classify_status;
use crate::errors::{BackendError, BackendResult};

/// Longest response body excerpt carried in an error message.
const MAX_ERROR_BODY: usize = 512;

/// JSON-over-HTTP client bound to one provider endpoint.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// URL of a sub-resource, e.g. a task under the endpoint.
    pub fn resource_url(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), id)
    }

    pub async fn post_json(&self, url: &str, body: &Value) -> BackendResult<Value> {
        debug!(url, "POST");
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        Self::read_json(request.send().await?).await
    }

    pub async fn get_json(&self, url: &str) -> BackendResult<Value> {
        debug!(url, "GET");
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        Self::read_json(request.send().await?).await
    }

    async fn read_json(response: reqwest::Response) -> BackendResult<Value> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(classify_status(
                status.as_u16(),
                format!("HTTP {}: {}", status, excerpt),
            ));
        }
        serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("response is not JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::http::test_server::{CannedResponse, TestServer};
    use serde_json::json;

    fn client_for(server: &TestServer) -> HttpClient {
        HttpClient::new(server.url("/v1/things"), Some("secret".into()), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_sends_bearer_and_parses_json() {
        let server = TestServer::start(vec![CannedResponse::json(200, json!({"ok": true}))]).await;
        let client = client_for(&server);

        let value = client
            .post_json(client.endpoint(), &json!({"prompt": "hi"}))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].head.starts_with("POST /v1/things"));
        assert!(requests[0]
            .head
            .to_ascii_lowercase()
            .contains("authorization: bearer secret"));
        assert_eq!(requests[0].json()["prompt"], "hi");
    }

    #[tokio::test]
    async fn test_error_statuses_are_classified() {
        let server = TestServer::start(vec![
            CannedResponse::json(402, json!({"error": "insufficient credits"})),
            CannedResponse::json(503, json!({"error": "busy"})),
        ])
        .await;
        let client = client_for(&server);

        let quota = client.get_json(&client.resource_url("a")).await.unwrap_err();
        assert!(quota.is_quota());
        let busy = client.get_json(&client.resource_url("b")).await.unwrap_err();
        assert!(busy.is_transient());
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid() {
        let server = TestServer::start(vec![CannedResponse::text(200, "<html>")]).await;
        let client = client_for(&server);
        assert!(matches!(
            client.get_json(client.endpoint()).await,
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_resource_url() {
        let client = HttpClient::new(
            "https://motion.example.com/v1/tasks/".into(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.resource_url("abc"),
            "https://motion.example.com/v1/tasks/abc"
        );
    }
}
