//! Qdrant-backed similarity index.
//!
//! Queries are embedded with an OpenAI-compatible `/embeddings` endpoint and
//! searched against a single cosine collection over the Qdrant REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::ContextIndexConfig;
use crate::retrieval::fallback::ReferenceDocument;
use crate::retrieval::{ContextKind, SimilarityIndex};

pub const EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const EMBEDDING_DIMENSIONS: usize = 1536;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Async embeddings client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
        })
    }

    pub async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input,
        };
        let resp = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("OpenAI embeddings request failed ({}): {}", status, body);
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .await
            .context("failed to parse OpenAI embedding response")?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .context("OpenAI returned no embedding")?;
        anyhow::ensure!(
            embedding.len() == EMBEDDING_DIMENSIONS,
            "embedding has {} dimensions, collection expects {}",
            embedding.len(),
            EMBEDDING_DIMENSIONS
        );
        Ok(embedding)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct QdrantIndex {
    client: Client,
    base_url: String,
    collection: String,
    embedder: OpenAiEmbedder,
}

impl QdrantIndex {
    pub fn new(config: &ContextIndexConfig) -> Result<Self> {
        anyhow::ensure!(
            config.qdrant_url.starts_with("http://") || config.qdrant_url.starts_with("https://"),
            "Qdrant URL must be an http(s) URL"
        );
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.qdrant_api_key {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key.trim()).context("invalid Qdrant API key")?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .context("failed to build Qdrant HTTP client")?;

        Ok(Self {
            client,
            base_url: config.qdrant_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            embedder: OpenAiEmbedder::new(&config.openai_api_key, &config.openai_base_url)?,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    /// Creates the collection (cosine, embedding-sized vectors) if it does not exist.
    pub async fn ensure_collection(&self) -> Result<()> {
        let resp = self.client.get(self.collection_url()).send().await?;
        match resp.status() {
            status if status.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            status => {
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("Qdrant collection lookup failed ({}): {}", status, body);
            }
        }

        let body = json!({
            "vectors": { "size": EMBEDDING_DIMENSIONS, "distance": "Cosine" }
        });
        let resp = self
            .client
            .put(self.collection_url())
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Qdrant collection create failed ({}): {}", status, body);
        }

        info!("Created Qdrant collection {}", self.collection);
        Ok(())
    }

    /// Embeds and upserts the reference corpus.
    pub async fn seed(&self, documents: &[ReferenceDocument]) -> Result<usize> {
        let mut points = Vec::with_capacity(documents.len());
        for doc in documents {
            let vector = self.embedder.embed(doc.text).await?;
            points.push(json!({
                "id": Uuid::new_v4(),
                "vector": vector,
                "payload": {
                    "text": doc.text,
                    "doc_type": doc.kind.doc_type(),
                    "category": doc.category,
                }
            }));
        }

        let url = format!("{}/points?wait=true", self.collection_url());
        let resp = self
            .client
            .put(url)
            .json(&json!({ "points": points }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Qdrant upsert failed ({}): {}", status, body);
        }

        info!(
            "Seeded {} reference documents into {}",
            points.len(),
            self.collection
        );
        Ok(points.len())
    }
}

#[async_trait]
impl SimilarityIndex for QdrantIndex {
    async fn search(
        &self,
        query: &str,
        kind: ContextKind,
        limit: usize,
    ) -> Result<Vec<String>> {
        let vector = self.embedder.embed(query).await?;
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
            "filter": {
                "must": [{ "key": "doc_type", "match": { "value": kind.doc_type() } }]
            }
        });

        let url = format!("{}/points/search", self.collection_url());
        let resp = self.client.post(url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Qdrant search failed ({}): {}", status, body);
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .context("failed to parse Qdrant search response")?;
        Ok(parsed.into_texts())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    payload: Option<PointPayload>,
}

#[derive(Debug, Deserialize)]
struct PointPayload {
    #[serde(default)]
    text: Option<String>,
}

impl SearchResponse {
    fn into_texts(self) -> Vec<String> {
        self.result
            .into_iter()
            .filter_map(|p| p.payload.and_then(|payload| payload.text))
            .collect()
    }
}
