//! `OpenAI` chat completions backend

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

pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(endpoint: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PostRagError::GenerationUnavailable(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    async fn complete(
        &self,
        system_instruction: &str,
        user_content: &str,
        params: &CompletionParams,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling OpenAI chat completions: model={}", params.model);

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
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PostRagError::GenerationUnavailable(format!("Failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| PostRagError::GenerationUnavailable("No completion in response".to_string()))
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAI
    }
}
