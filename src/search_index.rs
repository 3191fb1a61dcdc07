use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// The persisted form of a chunk inside the search index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexRecord {
    pub page_content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Per-call retrieval options. Immutable; callers construct one per search.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Maximum number of hits to return.
    pub size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { size: 1 }
    }
}

/// Keyword search index over chunk records.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create the index if absent; never fails on an already-existing index.
    async fn ensure_index(&self, name: &str) -> Result<()>;

    /// Write one record. A failure affects only this call.
    async fn index(&self, name: &str, record: &IndexRecord) -> Result<()>;

    /// Keyword match against `page_content`, up to `options.size` hits in
    /// the backend's relevance order.
    async fn search(
        &self,
        name: &str,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<IndexRecord>>;
}

/// `SearchIndex` backed by an OpenSearch-compatible REST endpoint.
pub struct OpenSearchIndex {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl OpenSearchIndex {
    pub fn new(base_url: &str, username: Option<String>, password: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        }
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: IndexRecord,
}

#[async_trait]
impl SearchIndex for OpenSearchIndex {
    async fn ensure_index(&self, name: &str) -> Result<()> {
        let url = format!("{}/{name}", self.base_url);

        // Existence check precedes creation so a present index is a no-op.
        let head = self
            .authed(self.client.head(&url))
            .send()
            .await
            .context("failed to reach the search backend")?;
        if head.status() == StatusCode::OK {
            info!("Index '{name}' already exists.");
            return Ok(());
        }

        let create = self
            .authed(self.client.put(&url))
            .send()
            .await
            .context("failed to reach the search backend")?;
        if !create.status().is_success() {
            bail!(
                "failed to create index '{name}': {} {}",
                create.status(),
                create.text().await.unwrap_or_default()
            );
        }
        info!("Index '{name}' created.");
        Ok(())
    }

    async fn index(&self, name: &str, record: &IndexRecord) -> Result<()> {
        let url = format!("{}/{name}/_doc", self.base_url);
        let resp = self
            .authed(self.client.post(&url))
            .json(record)
            .send()
            .await
            .context("failed to reach the search backend")?;
        if !resp.status().is_success() {
            bail!(
                "failed to index record into '{name}': {} {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<IndexRecord>> {
        let url = format!("{}/{name}/_search", self.base_url);
        let body = json!({
            "size": options.size,
            "query": {
                "match": {
                    "page_content": query,
                }
            }
        });

        let resp = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .context("failed to reach the search backend")?;
        if !resp.status().is_success() {
            bail!(
                "search against '{name}' failed: {} {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .context("failed to parse search response")?;
        Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
    }
}
