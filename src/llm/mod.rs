//! Language-model backends
//!
//! Every backend implements [`LanguageModel`]: a chat-style completion taking a
//! system instruction and user content. Which variant runs is decided once, by
//! `llm.provider` in the configuration.

pub mod ollama;
pub mod openai;
pub mod prompts;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use ollama::OllamaChat;
pub use openai::OpenAiChat;
pub use prompts::PromptTemplate;

use crate::config::AppConfig;
use crate::errors::PostRagError;
use crate::errors::Result;

/// Supported language-model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Hosted `OpenAI` chat completions
    OpenAI,
    /// Locally-run model served by Ollama
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = PostRagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(PostRagError::InvalidConfiguration(format!(
                "unknown LLM provider '{other}' (expected openai or ollama)"
            ))),
        }
    }
}

/// Per-request generation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Chat-style completion capability.
///
/// Errors: `GenerationUnavailable` on backend failure, `GenerationTimeout` when
/// the HTTP client gives up waiting.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(
        &self,
        system_instruction: &str,
        user_content: &str,
        params: &CompletionParams,
    ) -> Result<String>;

    fn provider(&self) -> LlmProvider;
}

/// Build the configured backend
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn LanguageModel>> {
    let timeout = config.llm_timeout();
    let model: Arc<dyn LanguageModel> = match config.llm.provider.parse::<LlmProvider>()? {
        LlmProvider::OpenAI => {
            let api_key = config.llm.openai_api_key.clone().ok_or_else(|| {
                PostRagError::InvalidConfiguration(
                    "OpenAI provider requires llm.openai_api_key or OPENAI_API_KEY".to_string(),
                )
            })?;
            Arc::new(OpenAiChat::new(&config.llm.openai_endpoint, api_key, timeout)?)
        }
        LlmProvider::Ollama => Arc::new(OllamaChat::new(&config.llm.ollama_endpoint, timeout)?),
    };
    Ok(model)
}

/// Map a reqwest failure onto the generation error taxonomy
pub(crate) fn request_error(e: &reqwest::Error, timeout: Duration) -> PostRagError {
    if e.is_timeout() {
        PostRagError::GenerationTimeout(timeout)
    } else {
        PostRagError::GenerationUnavailable(format!("request failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("Ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!(matches!(
            "mistral".parse::<LlmProvider>(),
            Err(PostRagError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_from_config_selects_variant() {
        let mut config = AppConfig::default();
        config.llm.provider = "ollama".to_string();
        assert_eq!(from_config(&config).unwrap().provider(), LlmProvider::Ollama);

        config.llm.provider = "openai".to_string();
        config.llm.openai_api_key = Some("sk-test".to_string());
        assert_eq!(from_config(&config).unwrap().provider(), LlmProvider::OpenAI);
    }

    #[test]
    fn test_openai_without_key_fails_fast() {
        let mut config = AppConfig::default();
        config.llm.provider = "openai".to_string();
        config.llm.openai_api_key = None;
        assert!(matches!(
            from_config(&config),
            Err(PostRagError::InvalidConfiguration(_))
        ));
    }
}
