//! Pinecone knowledge store.
//!
//! Talks to the Pinecone REST API directly. The control plane lists,
//! creates and describes indexes; the data plane (the index host) takes
//! upserts and queries. Records are stored with `text` and `type` metadata
//! so indexes written by LangChain's Pinecone integration stay readable.

use super::KnowledgeStore;
use crate::config::VectorStoreConfig;
use crate::embedding::Embedder;
use crate::llm::{LlmHttpConfig, build_http_client, error_kind};
use crate::models::{CaseRecord, CaseType};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Pinecone API version header value.
const API_VERSION: &str = "2024-07";

/// Vectors per upsert request.
const UPSERT_BATCH_SIZE: usize = 100;

/// Delay between readiness polls.
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Metadata key holding the case text.
const TEXT_KEY: &str = "text";

/// Metadata key holding the case type.
const TYPE_KEY: &str = "type";

/// Knowledge store backed by a Pinecone serverless index.
pub struct PineconeStore {
    api_key: SecretString,
    index_name: String,
    /// Data-plane base URL, e.g. `https://errors-abc123.svc.pinecone.io`.
    host: String,
    embedder: Arc<dyn Embedder>,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for PineconeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeStore")
            .field("index_name", &self.index_name)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl PineconeStore {
    /// Connects to the configured index, creating it if absent.
    ///
    /// A failure while creating the index or waiting for it to become ready
    /// is logged as a warning and connection continues. Listing indexes and
    /// resolving the index host must succeed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API key or index name is missing,
    /// or [`Error::OperationFailed`] if the control plane cannot be reached
    /// or the index host cannot be resolved.
    pub fn connect(
        config: &VectorStoreConfig,
        embedder: Arc<dyn Embedder>,
        http: LlmHttpConfig,
    ) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or_else(|| Error::Config("PINECONE_API_KEY must be set".to_string()))?;
        let index_name = config
            .index_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::Config("PINECONE_INDEX_NAME must be set".to_string()))?;

        let client = build_http_client(http);
        let control = ControlPlane {
            base_url: config.controller_url.trim_end_matches('/').to_string(),
            api_key: &api_key,
            client: &client,
        };

        let existing = control.list_indexes()?;
        if !existing.iter().any(|i| i.name == index_name) {
            tracing::info!(index = %index_name, "Index not found, creating it");
            let created = control
                .create_index(&index_name, config.dimensions, config.region())
                .and_then(|()| {
                    control.wait_until_ready(
                        &index_name,
                        Duration::from_secs(config.ready_timeout_secs),
                    )
                });
            if let Err(e) = created {
                tracing::warn!(
                    index = %index_name,
                    error = %e,
                    "Could not create index; it may already exist or permission was denied"
                );
            }
        }

        let description = control.describe_index(&index_name)?;
        let host = description
            .host
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| Error::OperationFailed {
                operation: "pinecone_describe_index".to_string(),
                cause: format!("index '{index_name}' has no host"),
            })?;

        if let Some(dimension) = description.dimension
            && dimension != embedder.dimensions()
        {
            tracing::warn!(
                index = %index_name,
                index_dimension = dimension,
                embedder_dimension = embedder.dimensions(),
                "Index dimension differs from embedder dimension"
            );
        }

        tracing::debug!(index = %index_name, host = %host, "Connected to Pinecone index");

        Ok(Self {
            api_key,
            index_name,
            host: data_plane_url(&host),
            embedder,
            client,
        })
    }

    /// Returns the index name.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        operation: &str,
    ) -> Result<R> {
        let response = self
            .client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", self.api_key.expose_secret())
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .map_err(|e| transport_error(operation, &e))?;
        read_json(response, operation)
    }

    fn upsert_batch(&self, records: &[CaseRecord]) -> Result<usize> {
        let texts: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        let vectors: Vec<UpsertVector> = records
            .iter()
            .zip(embeddings)
            .map(|(record, values)| UpsertVector {
                id: Uuid::new_v4().to_string(),
                values,
                metadata: record_metadata(record),
            })
            .collect();

        let response: UpsertResponse = self.post(
            "/vectors/upsert",
            &UpsertRequest { vectors: &vectors },
            "pinecone_upsert",
        )?;
        Ok(response.upserted_count.unwrap_or(vectors.len()))
    }
}

impl KnowledgeStore for PineconeStore {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    fn upsert(&self, records: &[CaseRecord]) -> Result<usize> {
        let mut written = 0;
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            written += self.upsert_batch(batch)?;
        }
        if written > 0 {
            tracing::info!(store = "pinecone", index = %self.index_name, written, "Upserted cases");
        }
        Ok(written)
    }

    fn query(&self, text: &str, k: usize) -> Result<Vec<CaseRecord>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(text)?;
        let response: QueryResponse = self.post(
            "/query",
            &QueryRequest {
                vector: &vector,
                top_k: k,
                include_metadata: true,
            },
            "pinecone_query",
        )?;

        Ok(response
            .matches
            .into_iter()
            .filter_map(|m| {
                let record = match_to_record(m.metadata.as_ref());
                if record.is_none() {
                    tracing::warn!(id = %m.id, "Skipping match without text metadata");
                }
                record
            })
            .take(k)
            .collect())
    }
}

/// Control-plane client used during connection.
struct ControlPlane<'a> {
    base_url: String,
    api_key: &'a SecretString,
    client: &'a reqwest::blocking::Client,
}

impl ControlPlane<'_> {
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("Api-Key", self.api_key.expose_secret())
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        let operation = "pinecone_list_indexes";
        let response = self
            .request(reqwest::Method::GET, "/indexes")
            .send()
            .map_err(|e| transport_error(operation, &e))?;
        let list: IndexList = read_json(response, operation)?;
        Ok(list.indexes)
    }

    fn create_index(&self, name: &str, dimension: usize, region: &str) -> Result<()> {
        let operation = "pinecone_create_index";
        let body = CreateIndexRequest {
            name,
            dimension,
            metric: "cosine",
            spec: IndexSpec {
                serverless: ServerlessSpec { cloud: "aws", region },
            },
        };
        let response = self
            .request(reqwest::Method::POST, "/indexes")
            .json(&body)
            .send()
            .map_err(|e| transport_error(operation, &e))?;
        let _: Value = read_json(response, operation)?;
        Ok(())
    }

    fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let operation = "pinecone_describe_index";
        let response = self
            .request(reqwest::Method::GET, &format!("/indexes/{name}"))
            .send()
            .map_err(|e| transport_error(operation, &e))?;
        read_json(response, operation)
    }

    fn wait_until_ready(&self, name: &str, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            if self.describe_index(name)?.status.is_some_and(|s| s.ready) {
                tracing::info!(index = %name, "Index is ready");
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(Error::OperationFailed {
                    operation: "pinecone_wait_ready".to_string(),
                    cause: format!("index '{name}' not ready after {}s", timeout.as_secs()),
                });
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }
}

/// Prefixes a bare index host with `https://`.
fn data_plane_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn record_metadata(record: &CaseRecord) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(TEXT_KEY.to_string(), Value::String(record.content.clone()));
    metadata.insert(
        TYPE_KEY.to_string(),
        Value::String(record.case_type().as_str().to_string()),
    );
    metadata
}

/// Rebuilds a record from match metadata.
///
/// Returns `None` without text; a missing or unknown type reads as
/// `initial_data`.
fn match_to_record(metadata: Option<&Map<String, Value>>) -> Option<CaseRecord> {
    let metadata = metadata?;
    let text = metadata.get(TEXT_KEY)?.as_str()?;
    let case_type = metadata
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .and_then(CaseType::parse)
        .unwrap_or_default();
    Some(CaseRecord::new(text, case_type))
}

fn transport_error(operation: &str, e: &reqwest::Error) -> Error {
    let kind = error_kind(e);
    tracing::error!(
        store = "pinecone",
        operation,
        error = %e,
        error_kind = kind,
        "Pinecone request failed"
    );
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("{kind} error: {e}"),
    }
}

fn read_json<R: DeserializeOwned>(
    response: reqwest::blocking::Response,
    operation: &str,
) -> Result<R> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        tracing::error!(
            store = "pinecone",
            operation,
            status = %status,
            "Pinecone API returned error status"
        );
        return Err(Error::OperationFailed {
            operation: operation.to_string(),
            cause: format!("API returned status: {status} - {body}"),
        });
    }

    response.json().map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [UpsertVector],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use serde_json::json;

    #[test]
    fn test_data_plane_url() {
        assert_eq!(
            data_plane_url("errors-abc.svc.pinecone.io"),
            "https://errors-abc.svc.pinecone.io"
        );
        assert_eq!(data_plane_url("http://127.0.0.1:1234/"), "http://127.0.0.1:1234");
    }

    #[test]
    fn test_record_metadata_layout() {
        let metadata = record_metadata(&CaseRecord::success_case("fixed it"));
        assert_eq!(metadata.get("text"), Some(&json!("fixed it")));
        assert_eq!(metadata.get("type"), Some(&json!("success_case")));
    }

    #[test]
    fn test_match_to_record() {
        let with_type = json!({"text": "case", "type": "manual_test_case"});
        let record = match_to_record(with_type.as_object());
        assert_eq!(
            record.map(|r| r.case_type()),
            Some(CaseType::ManualTestCase)
        );

        let unknown_type = json!({"text": "case", "type": "imported"});
        let record = match_to_record(unknown_type.as_object());
        assert_eq!(record.map(|r| r.case_type()), Some(CaseType::InitialData));

        let no_text = json!({"type": "success_case"});
        assert!(match_to_record(no_text.as_object()).is_none());
        assert!(match_to_record(None).is_none());
    }

    #[test]
    fn test_query_request_serialization() {
        let vector = [0.5_f32, 0.5];
        let request = QueryRequest {
            vector: &vector,
            top_k: 3,
            include_metadata: true,
        };
        let json = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(json["topK"], 3);
        assert_eq!(json["includeMetadata"], true);
    }

    #[test]
    fn test_connect_requires_credentials() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(8));

        let missing_key = VectorStoreConfig {
            index_name: Some("errors".to_string()),
            ..VectorStoreConfig::default()
        };
        let result = PineconeStore::connect(&missing_key, Arc::clone(&embedder), LlmHttpConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));

        let missing_index = VectorStoreConfig {
            api_key: Some(SecretString::from("pc-key".to_string())),
            ..VectorStoreConfig::default()
        };
        let result = PineconeStore::connect(&missing_index, embedder, LlmHttpConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
