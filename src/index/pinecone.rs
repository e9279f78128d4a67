//! Pinecone REST client (control plane describe + data plane query/upsert)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::IndexMatch;
use super::VectorIndexClient;
use crate::config::IndexConfig;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::models::Document;
use crate::models::Metadata;

const API_VERSION: &str = "2024-07";

pub struct PineconeIndex {
    client: Client,
    host: String,
    api_key: String,
    index_name: String,
    namespace: Option<String>,
    dimension: Option<usize>,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
    dimension: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Deserialize)]
struct PineconeMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a Metadata,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

impl PineconeIndex {
    /// Connect to the configured index.
    ///
    /// Without a configured `host` the index is described through the control
    /// plane, which also yields its dimension.
    ///
    /// # Errors
    /// - `InvalidConfiguration` when no API key is available
    /// - `IndexNotFound` when the control plane does not know the index
    /// - `IndexUnavailable` on transport or authentication failures
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            PostRagError::InvalidConfiguration(
                "Pinecone API key not provided (index.api_key or PINECONE_API_KEY)".to_string(),
            )
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PostRagError::IndexUnavailable(format!("HTTP client build failed: {e}")))?;

        let (host, dimension) = match &config.host {
            Some(host) => (normalize_host(host), None),
            None => {
                let described =
                    describe_index(&client, &config.control_plane, &api_key, &config.index_name)
                        .await?;
                (normalize_host(&described.host), described.dimension)
            }
        };

        info!(
            "Connected to Pinecone index '{}' at {} (dimension: {:?})",
            config.index_name, host, dimension
        );

        Ok(Self {
            client,
            host,
            api_key,
            index_name: config.index_name.clone(),
            namespace: config.namespace.clone(),
            dimension,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }
}

async fn describe_index(
    client: &Client,
    control_plane: &str,
    api_key: &str,
    index_name: &str,
) -> Result<DescribeIndexResponse> {
    let url = format!("{}/indexes/{index_name}", control_plane.trim_end_matches('/'));
    debug!("Describing Pinecone index: {}", url);

    let response = client
        .get(&url)
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await
        .map_err(|e| transport_error(&e))?;

    let response = check_status(response, index_name).await?;
    response
        .json()
        .await
        .map_err(|e| PostRagError::IndexUnavailable(format!("Failed to parse describe response: {e}")))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn transport_error(e: &reqwest::Error) -> PostRagError {
    if e.is_timeout() {
        PostRagError::IndexUnavailable(format!("request timed out: {e}"))
    } else {
        PostRagError::IndexUnavailable(format!("request failed: {e}"))
    }
}

/// Map HTTP status codes onto the index error taxonomy
fn status_error(status: StatusCode, body: &str, index_name: &str) -> PostRagError {
    match status {
        StatusCode::NOT_FOUND => PostRagError::IndexNotFound(index_name.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            PostRagError::IndexUnavailable(format!("authentication failed ({status}): {body}"))
        }
        _ => PostRagError::IndexUnavailable(format!("Pinecone API error ({status}): {body}")),
    }
}

async fn check_status(response: reqwest::Response, index_name: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(status_error(status, &body, index_name))
}

#[async_trait]
impl VectorIndexClient for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .request("/query")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let response = check_status(response, &self.index_name).await?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| PostRagError::IndexUnavailable(format!("Failed to parse query response: {e}")))?;

        debug!("Pinecone returned {} matches (top_k={})", parsed.matches.len(), top_k);

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| IndexMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn upsert(&self, documents: &[Document]) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let request = UpsertRequest {
            vectors: documents
                .iter()
                .map(|doc| UpsertVector {
                    id: &doc.id,
                    values: &doc.embedding,
                    metadata: &doc.metadata,
                })
                .collect(),
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .request("/vectors/upsert")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let response = check_status(response, &self.index_name).await?;

        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| PostRagError::IndexUnavailable(format!("Failed to parse upsert response: {e}")))?;
        Ok(parsed.upserted_count)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("reddit-genai-abc123.svc.aped-4627-b74a.pinecone.io"),
            "https://reddit-genai-abc123.svc.aped-4627-b74a.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "", "reddit-genai"),
            PostRagError::IndexNotFound(name) if name == "reddit-genai"
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "bad key", "reddit-genai"),
            PostRagError::IndexUnavailable(_)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "", "reddit-genai"),
            PostRagError::IndexUnavailable(_)
        ));
    }

    #[test]
    fn test_query_request_wire_format() {
        let request = QueryRequest {
            vector: &[0.5, 0.25],
            top_k: 50,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 50);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_query_response_without_metadata() {
        let parsed: QueryResponse =
            serde_json::from_str(r#"{"matches":[{"id":"12","score":0.83}],"namespace":""}"#)
                .unwrap();
        assert_eq!(parsed.matches.len(), 1);
        assert!(parsed.matches[0].metadata.is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_invalid_configuration() {
        let config = IndexConfig {
            api_key: None,
            ..IndexConfig::default()
        };
        assert!(matches!(
            PineconeIndex::connect(&config).await,
            Err(PostRagError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_index_unavailable() {
        let config = IndexConfig {
            api_key: Some("test-key".to_string()),
            host: Some("http://127.0.0.1:9".to_string()),
            timeout_secs: 1,
            ..IndexConfig::default()
        };
        let index = PineconeIndex::connect(&config).await.unwrap();
        assert!(matches!(
            index.query(&[0.1, 0.2], 5).await,
            Err(PostRagError::IndexUnavailable(_))
        ));
    }
}
