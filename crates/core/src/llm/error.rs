use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Non-success reply from a provider endpoint, with the body kept for diagnostics.
#[derive(Debug, Clone)]
pub struct ProviderHttpError {
    pub provider: Provider,
    pub status: u16,
    pub body: String,
    /// The body, when it parsed as JSON.
    pub body_json: Option<Value>,
}

impl ProviderHttpError {
    pub fn new(provider: Provider, status: reqwest::StatusCode, body: String) -> Self {
        let body_json = serde_json::from_str(&body).ok();
        Self {
            provider,
            status: status.as_u16(),
            body,
            body_json,
        }
    }

    /// `error.message` (both providers use that envelope), else the error type, if any.
    pub fn provider_message(&self) -> Option<&str> {
        let error = self.body_json.as_ref()?.get("error")?;
        error
            .get("message")
            .or_else(|| error.get("type"))
            .and_then(Value::as_str)
    }
}

impl fmt::Display for ProviderHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} returned HTTP {}", self.provider, self.status)?;
        if let Some(msg) = self.provider_message() {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderHttpError {}
