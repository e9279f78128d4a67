//! Embedding API clients for the HTTP providers

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::EmbeddingConfig;
use super::EmbeddingProvider;
use super::Encoder;
use crate::errors::PostRagError;
use crate::errors::Result;

/// Client for generating embeddings from a remote provider
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    dimension: usize,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors
    /// - `InvalidConfiguration` for the in-process hashing provider
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if !config.provider.is_remote() {
            return Err(PostRagError::InvalidConfiguration(
                "hashing provider has no HTTP client; use HashingEncoder".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PostRagError::ModelUnavailable(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            provider: config.provider,
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            dimension: config.dimension,
            client,
        })
    }

    /// Embed using the sentence-transformers sidecar
    async fn generate_sentence_transformers(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct EncodeRequest<'a> {
            model: &'a str,
            texts: [&'a str; 1],
        }

        #[derive(Deserialize)]
        struct EncodeResponse {
            embeddings: Vec<Vec<f32>>,
        }

        let url = format!("{}/encode", self.endpoint);
        debug!("Calling sentence-transformers encode API: {}", url);

        let request = EncodeRequest {
            model: &self.model,
            texts: [text],
        };
        let response: EncodeResponse = self.post_json(&url, &request, None).await?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| PostRagError::ModelUnavailable("No embedding in response".to_string()))
    }

    /// Embed using `OpenAI` API
    async fn generate_openai(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PostRagError::InvalidConfiguration("OpenAI API key not provided".to_string())
        })?;

        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: &'a str,
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {}", url);

        let request = OpenAIRequest {
            input: text,
            model: &self.model,
        };
        let response: OpenAIResponse = self.post_json(&url, &request, Some(api_key)).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| PostRagError::ModelUnavailable("No embedding in response".to_string()))
    }

    /// Embed using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };
        let response: OllamaResponse = self.post_json(&url, &request, None).await?;

        Ok(response.embedding)
    }

    async fn post_json<B, R>(&self, url: &str, body: &B, bearer: Option<&str>) -> Result<R>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = bearer {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PostRagError::ModelUnavailable(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PostRagError::ModelUnavailable(format!(
                "{:?} embeddings API error ({status}): {error_text}",
                self.provider
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PostRagError::ModelUnavailable(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl Encoder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self.provider {
            EmbeddingProvider::SentenceTransformers => {
                self.generate_sentence_transformers(text).await
            }
            EmbeddingProvider::OpenAI => self.generate_openai(text).await,
            EmbeddingProvider::Ollama => self.generate_ollama(text).await,
            EmbeddingProvider::Hashing => Err(PostRagError::InvalidConfiguration(
                "hashing provider has no HTTP client".to_string(),
            )),
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
