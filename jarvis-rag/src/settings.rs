//! Service credentials and endpoints, read from the environment.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::assistant::Assistant;
use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::openai::{
    DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, OPENAI_API_BASE, OpenAIChatModel,
    OpenAIEmbeddingProvider,
};
use crate::pinecone::PineconeVectorStore;
use crate::pipeline::RagPipeline;

/// Settings that must be present for ingestion or querying to work.
pub const REQUIRED_KEYS: [&str; 4] =
    ["OPENAI_API_KEY", "PINECONE_API_KEY", "PINECONE_ENVIRONMENT", "PINECONE_INDEX_NAME"];

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Credentials and endpoints for the hosted services.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub openai_api_key: String,
    pub pinecone_api_key: String,
    /// Pinecone environment / region the index lives in.
    pub pinecone_environment: String,
    pub pinecone_index_name: String,
    /// Data plane host; resolved from the control plane when absent.
    pub pinecone_host: Option<String>,
    pub pinecone_namespace: Option<String>,
    pub openai_model: String,
    pub embedding_model: String,
    pub openai_base_url: String,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &"<redacted>")
            .field("pinecone_api_key", &"<redacted>")
            .field("pinecone_environment", &self.pinecone_environment)
            .field("pinecone_index_name", &self.pinecone_index_name)
            .field("pinecone_host", &self.pinecone_host)
            .field("pinecone_namespace", &self.pinecone_namespace)
            .field("openai_model", &self.openai_model)
            .field("embedding_model", &self.embedding_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::MissingConfig`] naming every absent required
    /// variable, or [`RagError::ConfigError`] for an unparsable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<String> =
            REQUIRED_KEYS.iter().filter(|key| get(key).is_none()).map(|key| key.to_string()).collect();
        if !missing.is_empty() {
            return Err(RagError::MissingConfig { keys: missing });
        }
        let required = |key: &str| get(key).unwrap_or_default();

        let request_timeout = match get("JARVIS_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                RagError::ConfigError(format!(
                    "JARVIS_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY"),
            pinecone_api_key: required("PINECONE_API_KEY"),
            pinecone_environment: required("PINECONE_ENVIRONMENT"),
            pinecone_index_name: required("PINECONE_INDEX_NAME"),
            pinecone_host: get("PINECONE_HOST"),
            pinecone_namespace: get("PINECONE_NAMESPACE"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: get("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            request_timeout,
        })
    }

    /// Build the HTTP client shared by every service client.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))
    }

    /// Connect to the Pinecone index, resolving its host if needed.
    pub async fn vector_store(&self, client: &reqwest::Client) -> Result<PineconeVectorStore> {
        let host = match &self.pinecone_host {
            Some(host) => host.clone(),
            None => {
                PineconeVectorStore::resolve_host(
                    client,
                    &self.pinecone_api_key,
                    &self.pinecone_index_name,
                )
                .await?
            }
        };

        let mut store =
            PineconeVectorStore::new(&self.pinecone_api_key, &self.pinecone_index_name, host)?
                .with_client(client.clone());
        if let Some(namespace) = &self.pinecone_namespace {
            store = store.with_namespace(namespace);
        }

        info!(
            index = %self.pinecone_index_name,
            environment = %self.pinecone_environment,
            host = store.host(),
            "connected to pinecone"
        );
        Ok(store)
    }

    /// The OpenAI embedding provider.
    pub fn embedding_provider(&self, client: &reqwest::Client) -> Result<OpenAIEmbeddingProvider> {
        Ok(OpenAIEmbeddingProvider::new(&self.openai_api_key)?
            .with_client(client.clone())
            .with_base_url(&self.openai_base_url)
            .with_model(&self.embedding_model))
    }

    /// The OpenAI chat model.
    pub fn chat_model(&self, client: &reqwest::Client) -> Result<OpenAIChatModel> {
        Ok(OpenAIChatModel::new(&self.openai_api_key)?
            .with_client(client.clone())
            .with_base_url(&self.openai_base_url)
            .with_model(&self.openai_model))
    }

    /// Build a pipeline wired to the hosted embedding model and index.
    pub async fn pipeline(&self, client: &reqwest::Client, config: RagConfig) -> Result<RagPipeline> {
        let store = self.vector_store(client).await?;
        RagPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(self.embedding_provider(client)?))
            .vector_store(Arc::new(store))
            .build()
    }

    /// Build an assistant whose clients share one HTTP client.
    pub async fn assistant(&self, config: RagConfig) -> Result<Assistant> {
        let client = self.http_client()?;
        let pipeline = self.pipeline(&client, config).await?;
        let model = self.chat_model(&client)?;
        Ok(Assistant::new(Arc::new(pipeline), Arc::new(model)))
    }
}
