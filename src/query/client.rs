use super::{QueryCache, QueryError, QueryKey, QueryState, QueryStatus};
use super::transport::Transport;
use crate::query::DehydratedState;
use crate::rpc::{ErrorCode, Procedure};
use crate::transformer::Transformer;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("{message}")]
    Rpc {
        message: String,
        code: Option<ErrorCode>,
        http_status: Option<u16>,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode query data: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Rpc { http_status, .. } => *http_status,
            ClientError::Transport(_) | ClientError::Decode(_) => None,
        }
    }
}

impl From<QueryError> for ClientError {
    fn from(err: QueryError) -> Self {
        ClientError::Rpc {
            message: err.message,
            code: err.code,
            http_status: err.http_status,
        }
    }
}

impl From<&ClientError> for QueryError {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Rpc {
                message,
                code,
                http_status,
            } => QueryError {
                message: message.clone(),
                code: *code,
                http_status: *http_status,
            },
            other => QueryError {
                message: other.to_string(),
                code: None,
                http_status: None,
            },
        }
    }
}

/// Where a query stands from the component's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    Loading,
    Error(ClientError),
    Success(T),
}

/// Client-side query cache. Hydrated entries answer queries without going
/// through the transport; misses are fetched once and cached.
pub struct QueryClient {
    transport: Option<Arc<dyn Transport>>,
    transformer: Transformer,
    cache: QueryCache,
}

impl QueryClient {
    pub fn new(transport: impl Transport + 'static, transformer: Transformer) -> QueryClient {
        QueryClient {
            transport: Some(Arc::new(transport)),
            transformer,
            cache: QueryCache::default(),
        }
    }

    /// A client that can only answer from its cache, for rendering on the
    /// server from a dehydrated snapshot.
    pub fn detached(transformer: Transformer) -> QueryClient {
        QueryClient {
            transport: None,
            transformer,
            cache: QueryCache::default(),
        }
    }

    pub async fn hydrate(&self, state: &DehydratedState) -> usize {
        self.cache.hydrate(state).await
    }

    /// Reads the cache only.
    pub async fn peek<P: Procedure>(&self, input: &P::Input) -> QueryResult<P::Output> {
        let key = match QueryKey::for_procedure::<P>(input) {
            Ok(it) => it,
            Err(err) => return QueryResult::Error(ClientError::Decode(err.to_string())),
        };

        match self.cache.get(&key).await {
            Some(cached) => self.decode_state::<P>(cached.state),
            None => QueryResult::Loading,
        }
    }

    /// Resolves from a cached success, otherwise fetches through the
    /// transport and caches the outcome.
    pub async fn query<P: Procedure>(&self, input: &P::Input) -> QueryResult<P::Output> {
        let cached = self.peek::<P>(input).await;
        if matches!(cached, QueryResult::Success(_)) {
            return cached;
        }
        let Some(transport) = self.transport.as_ref() else {
            return cached;
        };

        let key = match QueryKey::for_procedure::<P>(input) {
            Ok(it) => it,
            Err(err) => return QueryResult::Error(ClientError::Decode(err.to_string())),
        };
        let encoded_input = match self.transformer.serialize(input) {
            Ok(it) => it,
            Err(err) => return QueryResult::Error(ClientError::Decode(err.to_string())),
        };

        tracing::debug!(path = P::PATH, "Fetching query");
        let state = match transport.query(P::PATH, encoded_input).await {
            Ok(data) => QueryState::success(data),
            Err(err) => QueryState::error((&err).into()),
        };
        self.cache.set(key, state.clone()).await;

        self.decode_state::<P>(state)
    }

    fn decode_state<P: Procedure>(&self, state: QueryState) -> QueryResult<P::Output> {
        match state.status {
            QueryStatus::Success => {
                let Some(data) = state.data else {
                    return QueryResult::Error(ClientError::Decode(
                        "successful query without data".to_owned(),
                    ));
                };
                match self.transformer.deserialize::<P::Output>(data) {
                    Ok(it) => QueryResult::Success(it),
                    Err(err) => QueryResult::Error(ClientError::Decode(err.to_string())),
                }
            }
            QueryStatus::Error => QueryResult::Error(match state.error {
                Some(err) => err.into(),
                None => ClientError::Decode("failed query without error".to_owned()),
            }),
            QueryStatus::Pending => QueryResult::Loading,
        }
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("detached", &self.transport.is_none())
            .field("transformer", &self.transformer)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::{test_post, BoxFuture};
    use crate::rpc::post::{ById, PostById};
    use crate::rpc::RpcError;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a fixed post and counts every call it receives.
    #[derive(Debug, Clone, Default)]
    struct CountingTransport {
        calls: Arc<AtomicUsize>,
    }

    impl Transport for CountingTransport {
        fn query<'a>(
            &'a self,
            path: &'a str,
            input: Value,
        ) -> BoxFuture<'a, Result<Value, ClientError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(path, "post.byId");

                let input: ById = Transformer::Tagged.deserialize(input).unwrap();
                if input.id == "abc123" {
                    Ok(Transformer::Tagged.serialize(&test_post()).unwrap())
                } else {
                    let err = RpcError::not_found(format!("No post with id '{}'", input.id));
                    Err(ClientError::from(QueryError::from(&err)))
                }
            })
        }
    }

    async fn snapshot_with_post() -> DehydratedState {
        let cache = QueryCache::default();
        let key = QueryKey::for_procedure::<PostById>(&ById { id: "abc123".into() }).unwrap();
        cache
            .set(
                key,
                QueryState::success(Transformer::Tagged.serialize(&test_post()).unwrap()),
            )
            .await;
        cache.dehydrate().await
    }

    #[tokio::test]
    async fn hydrated_query_skips_the_transport() {
        let transport = CountingTransport::default();
        let client = QueryClient::new(transport.clone(), Transformer::Tagged);
        assert_eq!(client.hydrate(&snapshot_with_post().await).await, 1);

        let result = client
            .query::<PostById>(&ById { id: "abc123".into() })
            .await;

        assert_eq!(result, QueryResult::Success(test_post()));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn miss_fetches_once_then_caches() {
        let transport = CountingTransport::default();
        let client = QueryClient::new(transport.clone(), Transformer::Tagged);
        let input = ById { id: "abc123".into() };

        assert_eq!(client.peek::<PostById>(&input).await, QueryResult::Loading);
        assert_eq!(
            client.query::<PostById>(&input).await,
            QueryResult::Success(test_post())
        );
        assert_eq!(
            client.query::<PostById>(&input).await,
            QueryResult::Success(test_post())
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_post_settles_as_not_found() {
        let transport = CountingTransport::default();
        let client = QueryClient::new(transport.clone(), Transformer::Tagged);
        let input = ById { id: "missing".into() };

        let QueryResult::Error(err) = client.query::<PostById>(&input).await else {
            panic!("expected an error");
        };
        assert_eq!(err.http_status(), Some(404));
        assert_eq!(err.to_string(), "No post with id 'missing'");

        // cached errors are retried rather than served
        let _ = client.query::<PostById>(&input).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            client.peek::<PostById>(&input).await,
            QueryResult::Error(_)
        ));
    }

    #[tokio::test]
    async fn detached_client_stays_loading_on_miss() {
        let client = QueryClient::detached(Transformer::Tagged);

        assert_eq!(
            client
                .query::<PostById>(&ById { id: "missing".into() })
                .await,
            QueryResult::Loading
        );
    }

    #[tokio::test]
    async fn mismatched_transformer_surfaces_a_decode_error() {
        let client = QueryClient::detached(Transformer::Json);
        client.hydrate(&snapshot_with_post().await).await;

        let result = client
            .peek::<PostById>(&ById { id: "abc123".into() })
            .await;

        assert!(matches!(result, QueryResult::Error(ClientError::Decode(_))));
    }

    #[test]
    fn only_rpc_errors_carry_a_status() {
        assert_eq!(ClientError::Transport("down".into()).http_status(), None);
        assert_eq!(
            ClientError::Rpc {
                message: "gone".into(),
                code: Some(ErrorCode::NotFound),
                http_status: Some(404),
            }
            .http_status(),
            Some(404)
        );
    }
}
