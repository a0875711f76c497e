pub mod catalog;
pub mod domain;
pub mod llm;
pub mod matching;
pub mod pipeline;
pub mod rationale;
pub mod retrieval;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_CATALOG_PATH: &str = "data/opportunities.csv";
    const DEFAULT_DOCS_DIR: &str = "data/docs";
    const DEFAULT_INDEX_PATH: &str = "data/index.json";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub anthropic_api_key: Option<String>,
        pub openai_api_key: Option<String>,
        pub llm_provider: Option<String>,
        pub sentry_dsn: Option<String>,
        pub catalog_path: PathBuf,
        pub docs_dir: PathBuf,
        pub index_path: PathBuf,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                openai_api_key: non_empty_var("OPENAI_API_KEY"),
                llm_provider: non_empty_var("LLM_PROVIDER").map(|s| s.to_ascii_lowercase()),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                catalog_path: path_var("CATALOG_PATH", DEFAULT_CATALOG_PATH),
                docs_dir: path_var("DOCS_DIR", DEFAULT_DOCS_DIR),
                index_path: path_var("INDEX_PATH", DEFAULT_INDEX_PATH),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn path_var(key: &str, default: &str) -> PathBuf {
        non_empty_var(key)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(default))
    }
}
