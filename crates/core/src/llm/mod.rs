use crate::config::Settings;
use std::fmt;
use std::sync::Arc;

pub mod anthropic;
pub mod error;
pub mod json;
pub mod openai;

/// A single-turn instruction for the generative component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
    Unavailable,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAI => "openai",
            Provider::Unavailable => "unavailable",
        })
    }
}

/// Free-text generation. The returned text is expected, but never guaranteed, to contain
/// a JSON object.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, prompt: &Prompt) -> anyhow::Result<String>;
}

/// Stand-in used when no provider is configured. Every call fails, so every rationale
/// degrades to fallback content.
#[derive(Debug, Clone, Default)]
pub struct UnavailableGenerator;

#[async_trait::async_trait]
impl TextGenerator for UnavailableGenerator {
    fn provider(&self) -> Provider {
        Provider::Unavailable
    }

    async fn generate(&self, _prompt: &Prompt) -> anyhow::Result<String> {
        anyhow::bail!("no generative provider configured")
    }
}

/// Picks the provider named by `LLM_PROVIDER`, else the first one with an API key.
/// Returns `None` when nothing is configured.
pub fn generator_from_settings(
    settings: &Settings,
) -> anyhow::Result<Option<Arc<dyn TextGenerator>>> {
    let requested = settings.llm_provider.as_deref();
    let provider = match requested {
        Some("anthropic") => Some(Provider::Anthropic),
        Some("openai") => Some(Provider::OpenAI),
        Some(other) => anyhow::bail!("unsupported LLM_PROVIDER: {other}"),
        None if settings.anthropic_api_key.is_some() => Some(Provider::Anthropic),
        None if settings.openai_api_key.is_some() => Some(Provider::OpenAI),
        None => None,
    };

    let generator: Arc<dyn TextGenerator> = match provider {
        Some(Provider::Anthropic) => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
        Some(Provider::OpenAI) => Arc::new(openai::OpenAiClient::from_settings(settings)?),
        Some(Provider::Unavailable) | None => return Ok(None),
    };
    Ok(Some(generator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(provider: Option<&str>, anthropic: Option<&str>, openai: Option<&str>) -> Settings {
        Settings {
            anthropic_api_key: anthropic.map(str::to_string),
            openai_api_key: openai.map(str::to_string),
            llm_provider: provider.map(str::to_string),
            sentry_dsn: None,
            catalog_path: PathBuf::from("catalog.csv"),
            docs_dir: PathBuf::from("docs"),
            index_path: PathBuf::from("index.json"),
        }
    }

    #[test]
    fn no_keys_means_no_generator() {
        assert!(generator_from_settings(&settings(None, None, None))
            .unwrap()
            .is_none());
    }

    #[test]
    fn first_configured_key_wins() {
        let g = generator_from_settings(&settings(None, Some("a"), Some("o")))
            .unwrap()
            .unwrap();
        assert_eq!(g.provider(), Provider::Anthropic);

        let g = generator_from_settings(&settings(None, None, Some("o")))
            .unwrap()
            .unwrap();
        assert_eq!(g.provider(), Provider::OpenAI);
    }

    #[test]
    fn explicit_provider_requires_its_key() {
        assert!(generator_from_settings(&settings(Some("openai"), Some("a"), None)).is_err());
        assert!(generator_from_settings(&settings(Some("mistral"), Some("a"), None)).is_err());
    }

    #[tokio::test]
    async fn unavailable_generator_always_fails() {
        let prompt = Prompt {
            system: "s".to_string(),
            user: "u".to_string(),
        };
        assert!(UnavailableGenerator.generate(&prompt).await.is_err());
    }
}
