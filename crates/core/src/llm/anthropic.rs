use crate::config::Settings;
use crate::llm::error::ProviderHttpError;
use crate::llm::{Prompt, Provider, TextGenerator};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    async fn create_message(&self, req: CreateMessageRequest<'_>) -> anyhow::Result<CreateMessageResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            return Err(ProviderHttpError::new(Provider::Anthropic, status, text).into());
        }

        serde_json::from_str::<CreateMessageResponse>(&text)
            .with_context(|| format!("failed to decode Anthropic response: {text}"))
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            match block {
                ContentBlock::Text { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                ContentBlock::Unknown => {}
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl TextGenerator for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate(&self, prompt: &Prompt) -> anyhow::Result<String> {
        let req = CreateMessageRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
            system: Some(&prompt.system),
            messages: vec![Message {
                role: "user",
                content: &prompt.user,
            }],
        };

        let res = self.create_message(req).await?;
        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(
                max_tokens = self.max_tokens,
                "Anthropic stop_reason=max_tokens; output may be truncated"
            );
        }
        Ok(Self::response_text(&res))
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    /// Thinking, tool use and any other block type.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_text_blocks_and_skips_others() {
        let res: CreateMessageResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "{\"why_client_fit\":"},
                {"type": "server_tool_use", "id": "x"},
                {"type": "text", "text": "\"fits\"}"},
            ],
            "stop_reason": "end_turn",
        }))
        .unwrap();

        assert_eq!(
            AnthropicClient::response_text(&res),
            "{\"why_client_fit\":\n\"fits\"}"
        );
    }

    #[test]
    fn request_serializes_system_and_temperature() {
        let req = CreateMessageRequest {
            model: "m",
            max_tokens: 10,
            temperature: TEMPERATURE,
            system: Some("be careful"),
            messages: vec![Message {
                role: "user",
                content: "hi",
            }],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["system"], "be careful");
        assert_eq!(v["messages"][0]["role"], "user");
        assert!((v["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }
}
