//! Pinecone vector store backend.
//!
//! Provides [`PineconeVectorStore`] which implements [`VectorStore`] against
//! the Pinecone data plane REST API using `reqwest`. Chunk text and metadata
//! are stored as flat Pinecone metadata; the text lives under the `text` key.
//!
//! # Example
//!
//! ```rust,ignore
//! use jarvis_rag::pinecone::PineconeVectorStore;
//!
//! let client = reqwest::Client::new();
//! let host = PineconeVectorStore::resolve_host(&client, "pc-key", "jarvis").await?;
//! let store = PineconeVectorStore::new("pc-key", "jarvis", host)?.with_client(client);
//! store.upsert(&chunks).await?;
//! let results = store.search(&query_embedding, 3).await?;
//! ```

use std::collections::HashMap;
use std::ops::Range;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::batch::split_by_budget;
use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// The Pinecone control plane, used to look up an index's data plane host.
pub const PINECONE_CONTROL_PLANE: &str = "https://api.pinecone.io";

const API_VERSION: &str = "2024-07";

/// Maximum number of vectors sent in one upsert request.
const UPSERT_BATCH_SIZE: usize = 100;

/// Serialized size budget of the vectors in one upsert request. Pinecone
/// rejects upsert bodies over 2 MB.
const MAX_UPSERT_BYTES: usize = 1_900_000;

/// Metadata key holding the chunk text.
const TEXT_KEY: &str = "text";

/// Metadata key holding the parent document id.
const DOCUMENT_ID_KEY: &str = "document_id";

/// A [`VectorStore`] backed by a [Pinecone](https://www.pinecone.io/) index.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    host: String,
    namespace: Option<String>,
}

impl PineconeVectorStore {
    /// Create a store for an index whose data plane host is already known.
    ///
    /// `host` may be given with or without the `https://` scheme.
    pub fn new(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let index_name = index_name.into();
        let host = normalize_host(&host.into());

        let mut missing = Vec::new();
        if api_key.is_empty() {
            missing.push("PINECONE_API_KEY".to_string());
        }
        if index_name.is_empty() {
            missing.push("PINECONE_INDEX_NAME".to_string());
        }
        if !missing.is_empty() {
            return Err(RagError::MissingConfig { keys: missing });
        }
        if host.is_empty() {
            return Err(RagError::ConfigError("Pinecone index host must not be empty".into()));
        }

        Ok(Self { client: reqwest::Client::new(), api_key, index_name, host, namespace: None })
    }

    /// Use an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Read and write a namespace other than the default one.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into()).filter(|ns: &String| !ns.is_empty());
        self
    }

    /// The data plane host this store talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Look up the data plane host of `index_name` through the control plane.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the index does not exist or
    /// the request fails.
    pub async fn resolve_host(
        client: &reqwest::Client,
        api_key: &str,
        index_name: &str,
    ) -> Result<String> {
        Self::resolve_host_at(client, PINECONE_CONTROL_PLANE, api_key, index_name).await
    }

    /// [`resolve_host`](Self::resolve_host) against an explicit control plane URL.
    pub async fn resolve_host_at(
        client: &reqwest::Client,
        control_plane: &str,
        api_key: &str,
        index_name: &str,
    ) -> Result<String> {
        debug!(backend = "pinecone", index = index_name, "describing index");

        let url = format!("{}/indexes/{index_name}", control_plane.trim_end_matches('/'));
        let response = client
            .get(url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| map_err(format!("describe index request failed: {e}")))?;

        let description: IndexDescription = parse_response(response, "describe index").await?;
        Ok(normalize_host(&description.host))
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        self.client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = "pinecone", path, error = %e, "request failed");
                map_err(format!("request to {path} failed: {e}"))
            })
    }
}

fn map_err(message: String) -> RagError {
    RagError::VectorStoreError { backend: "pinecone".to_string(), message }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() || host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

async fn parse_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(backend = "pinecone", operation, %status, "API error");
        return Err(map_err(format!("{operation} returned {status}: {body}")));
    }

    response.json().await.map_err(|e| map_err(format!("failed to parse {operation} response: {e}")))
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [Vector<'a>],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct Vector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
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
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl<'a> Vector<'a> {
    fn from_chunk(chunk: &'a Chunk) -> Self {
        let mut metadata: Map<String, Value> =
            chunk.metadata.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();
        metadata.insert(TEXT_KEY.to_string(), Value::String(chunk.text.clone()));
        metadata.insert(DOCUMENT_ID_KEY.to_string(), Value::String(chunk.document_id.clone()));
        Self { id: &chunk.id, values: &chunk.embedding, metadata }
    }
}

/// Group vectors into upsert requests bounded by count and serialized size.
fn upsert_batches(vectors: &[Vector<'_>]) -> Result<Vec<Range<usize>>> {
    let sizes = vectors
        .iter()
        .map(|v| serde_json::to_vec(v).map(|bytes| bytes.len() + 1))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| map_err(format!("failed to encode vectors: {e}")))?;
    Ok(split_by_budget(&sizes, UPSERT_BATCH_SIZE, MAX_UPSERT_BYTES))
}

impl Match {
    fn into_search_result(self) -> SearchResult {
        let mut text = String::new();
        let mut document_id = None;
        let mut metadata = HashMap::new();

        for (key, value) in self.metadata {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            match key.as_str() {
                TEXT_KEY => text = value,
                DOCUMENT_ID_KEY => document_id = Some(value),
                _ => {
                    metadata.insert(key, value);
                }
            }
        }

        let document_id = document_id
            .or_else(|| metadata.get(crate::document::SOURCE_KEY).cloned())
            .unwrap_or_default();

        SearchResult {
            chunk: Chunk { id: self.id, text, embedding: Vec::new(), metadata, document_id },
            score: self.score,
        }
    }
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let vectors: Vec<Vector<'_>> = chunks.iter().map(Vector::from_chunk).collect();
        let batches = upsert_batches(&vectors)?;

        let mut upserted = 0;
        for range in &batches {
            let request = UpsertRequest {
                vectors: &vectors[range.clone()],
                namespace: self.namespace.as_deref(),
            };
            let response = self.post("/vectors/upsert", &request).await?;
            let body: UpsertResponse = parse_response(response, "upsert").await?;
            upserted += body.upserted_count;
        }

        debug!(
            backend = "pinecone",
            index = %self.index_name,
            count = upserted,
            requests = batches.len(),
            "upserted chunks"
        );
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let request = QueryRequest {
            vector: embedding,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self.post("/query", &request).await?;
        let body: QueryResponse = parse_response(response, "query").await?;

        debug!(backend = "pinecone", index = %self.index_name, matches = body.matches.len(), "query completed");
        Ok(body.matches.into_iter().map(Match::into_search_result).collect())
    }
}
