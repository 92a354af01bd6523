//! Model client abstraction and the provider-backed implementation.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::config::ModelConfig;
use crate::error::{ColloquyError, Result};
use crate::message::{ModelResponse, Turn};
use crate::tool::ToolSpec;

/// Remote capability the agent loop drives: one transcript in, one
/// structured response out. Failures propagate; the loop never retries.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        tools: &[ToolSpec],
        transcript: &[Turn],
    ) -> Result<ModelResponse>;
}

fn coalesce_error(status: reqwest::StatusCode, body: &str) -> ColloquyError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ColloquyError::Upstream(format!("rate limit exceeded: {body}"));
    }
    ColloquyError::Upstream(format!("request failed with {status}: {body}"))
}

/// Client for the Anthropic Messages API. Turns and tool specs serialize
/// directly into the wire format, and the response body deserializes into
/// [`ModelResponse`].
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    model: String,
    max_tokens: u32,
    api_key: String,
    endpoint: String,
}

impl AnthropicClient {
    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| ColloquyError::Config("missing model api key".into()))?;
        let endpoint = cfg
            .endpoint
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com/v1/messages".to_string());
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .map_err(|err| ColloquyError::Upstream(format!("http client error: {err}")))?,
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            api_key,
            endpoint,
        })
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(
        &self,
        system: &str,
        tools: &[ToolSpec],
        transcript: &[Turn],
    ) -> Result<ModelResponse> {
        let mut payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": transcript,
        });
        if !tools.is_empty() {
            payload["tools"] = serde_json::to_value(tools)?;
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await
            .map_err(|err| ColloquyError::Upstream(format!("request error: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(coalesce_error(status, &body));
        }

        resp.json::<ModelResponse>()
            .await
            .map_err(|err| ColloquyError::Upstream(format!("response parse error: {err}")))
    }
}

/// Deterministic client for tests: pops canned responses front to back.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ModelResponse>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        _system: &str,
        _tools: &[ToolSpec],
        _transcript: &[Turn],
    ) -> Result<ModelResponse> {
        self.responses
            .lock()
            .expect("scripted model lock")
            .pop_front()
            .ok_or_else(|| ColloquyError::Upstream("scripted model has no responses left".into()))
    }
}
