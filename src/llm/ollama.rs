//! Ollama chat backend (`/api/chat`, non-streaming)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::request_error;
use super::CompletionParams;
use super::LanguageModel;
use super::LlmProvider;
use crate::errors::PostRagError;
use crate::errors::Result;

pub struct OllamaChat {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: ChatOptions,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl OllamaChat {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PostRagError::GenerationUnavailable(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaChat {
    async fn complete(
        &self,
        system_instruction: &str,
        user_content: &str,
        params: &CompletionParams,
    ) -> Result<String> {
        let url = format!("{}/api/chat", self.endpoint);
        debug!("Calling Ollama chat: model={}", params.model);

        let request = ChatRequest {
            model: &params.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(&e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PostRagError::GenerationUnavailable(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PostRagError::GenerationUnavailable(format!("Failed to parse response: {e}")))?;

        debug!("Ollama response: {} chars", parsed.message.content.len());
        Ok(parsed.message.content.trim().to_string())
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Ollama
    }
}
