//! Query identity, cached query state and the dehydrated snapshot that
//! carries a server-side cache to a client.

use crate::rpc::{ErrorCode, Procedure, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub mod client;
pub mod transport;

pub use client::{ClientError, QueryClient, QueryResult};

/// Identity of a query: procedure path plus input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryKey {
    pub path: Vec<String>,
    pub input: Value,
}

impl QueryKey {
    pub fn new(path: &str, input: Value) -> QueryKey {
        QueryKey {
            path: path.split('.').map(String::from).collect(),
            input,
        }
    }

    /// The only way keys are built on both sides of a dehydrate/hydrate pair.
    pub fn for_procedure<P: Procedure>(input: &P::Input) -> Result<QueryKey, serde_json::Error> {
        Ok(QueryKey::new(P::PATH, serde_json::to_value(input)?))
    }

    /// Canonical JSON of the key. Object keys come out sorted, so equal
    /// inputs always hash the same regardless of field order.
    pub fn hash(&self) -> String {
        serde_json::json!([self.path, { "input": self.input, "type": "query" }]).to_string()
    }

    pub fn procedure_path(&self) -> String {
        self.path.join(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pending,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl From<&RpcError> for QueryError {
    fn from(err: &RpcError) -> Self {
        QueryError {
            message: err.message.clone(),
            code: Some(err.code),
            http_status: Some(err.http_status()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub status: QueryStatus,
    /// Transformed procedure output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
    /// Milliseconds since the unix epoch.
    pub data_updated_at: i64,
}

impl QueryState {
    pub fn success(data: Value) -> QueryState {
        QueryState {
            status: QueryStatus::Success,
            data: Some(data),
            error: None,
            data_updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn error(error: QueryError) -> QueryState {
        QueryState {
            status: QueryStatus::Error,
            data: None,
            error: Some(error),
            data_updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQuery {
    pub query_key: QueryKey,
    pub query_hash: String,
    pub state: QueryState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DehydratedState {
    pub queries: Vec<DehydratedQuery>,
}

#[derive(Debug, Clone)]
pub struct CachedQuery {
    pub key: QueryKey,
    pub state: QueryState,
}

/// Query results keyed by [`QueryKey::hash`].
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, CachedQuery>>,
}

impl QueryCache {
    pub async fn get(&self, key: &QueryKey) -> Option<CachedQuery> {
        self.entries.read().await.get(&key.hash()).cloned()
    }

    pub async fn set(&self, key: QueryKey, state: QueryState) {
        self.entries
            .write()
            .await
            .insert(key.hash(), CachedQuery { key, state });
    }

    /// Snapshot of every successful query, ordered by hash.
    pub async fn dehydrate(&self) -> DehydratedState {
        let entries = self.entries.read().await;

        let mut queries = entries
            .iter()
            .filter(|(_, cached)| cached.state.status == QueryStatus::Success)
            .map(|(hash, cached)| DehydratedQuery {
                query_key: cached.key.clone(),
                query_hash: hash.clone(),
                state: cached.state.clone(),
            })
            .collect::<Vec<_>>();
        queries.sort_by(|a, b| a.query_hash.cmp(&b.query_hash));

        DehydratedState { queries }
    }

    /// Seeds the cache from a snapshot. Entries already cached win unless the
    /// snapshot's copy is newer. Returns how many entries were written.
    pub async fn hydrate(&self, state: &DehydratedState) -> usize {
        let mut entries = self.entries.write().await;
        let mut written = 0;

        for query in &state.queries {
            let hash = query.query_key.hash();
            if hash != query.query_hash {
                tracing::warn!(
                    path = %query.query_key.procedure_path(),
                    query_hash = %query.query_hash,
                    expected = %hash,
                    "Skipping dehydrated query with mismatched hash"
                );
                continue;
            }

            let is_newer = entries
                .get(&hash)
                .map_or(true, |cached| {
                    cached.state.data_updated_at < query.state.data_updated_at
                });
            if is_newer {
                entries.insert(
                    hash,
                    CachedQuery {
                        key: query.query_key.clone(),
                        state: query.state.clone(),
                    },
                );
                written += 1;
            }
        }

        written
    }
}
