//! OpenAI-compatible HTTP vision backend.
//!
//! Works with any chat-completions endpoint that accepts image content
//! parts (OpenAI cloud, OpenRouter, Ollama in compatibility mode, vLLM).
//! Authentication is a bearer credential supplied externally; the timeout
//! is deliberately generous since vision-capable responses are slow.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use fovea_core::defaults;
use fovea_core::{Error, Result, VisionBackend};

/// Configuration for the HTTP vision backend.
#[derive(Debug, Clone)]
pub struct HttpVisionConfig {
    /// Base URL of the endpoint (without the `/chat/completions` suffix).
    pub base_url: String,
    /// Bearer credential (optional for local endpoints).
    pub api_key: Option<String>,
    /// Vision-capable model identifier.
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpVisionConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::VISION_BASE_URL.to_string(),
            api_key: None,
            model: defaults::VISION_MODEL.to_string(),
            timeout_secs: defaults::VISION_TIMEOUT_SECS,
        }
    }
}

impl From<&fovea_core::ApiConfig> for HttpVisionConfig {
    fn from(api: &fovea_core::ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            api_key: api.api_key.clone(),
            model: api.model.clone(),
            timeout_secs: api.timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// HTTP vision backend over an OpenAI-compatible chat-completions API.
pub struct HttpVisionBackend {
    client: Client,
    config: HttpVisionConfig,
}

impl HttpVisionBackend {
    pub fn new(config: HttpVisionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        info!(
            base_url = %config.base_url,
            model = %config.model,
            timeout_secs = config.timeout_secs,
            "Initializing vision backend"
        );
        Ok(Self { client, config })
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl VisionBackend for HttpVisionBackend {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image_base64: &str,
        media_type: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                serde_json::json!({"role": "system", "content": system_prompt}),
                serde_json::json!({
                    "role": "user",
                    "content": [
                        {"type": "text", "text": user_prompt},
                        {
                            "type": "image_url",
                            "image_url": {
                                "url": format!("data:{};base64,{}", media_type, image_base64)
                            }
                        }
                    ]
                }),
            ],
            max_tokens: defaults::VISION_MAX_TOKENS,
            temperature: 0.0,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Vision request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "Vision API returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            Error::InvalidResponse(format!("Failed to parse vision response: {}", e))
        })?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::InvalidResponse("completion had no content".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let mut req = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(defaults::HEALTH_CHECK_TIMEOUT_SECS));
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        match req.send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
