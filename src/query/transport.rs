use super::{ClientError, QueryError};
use crate::blog::BoxFuture;
use crate::rpc::{AppRouter, Context, ErrorCode};
use crate::store::PostStore;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// How a [`super::QueryClient`] reaches procedures on a cache miss. Inputs
/// and outputs are already transformer-encoded.
pub trait Transport: Send + Sync {
    fn query<'a>(
        &'a self,
        path: &'a str,
        input: Value,
    ) -> BoxFuture<'a, Result<Value, ClientError>>;
}

/// Calls `GET {base}/api/trpc/{path}?input=...`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> HttpTransport {
        HttpTransport {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Envelope {
    Result { data: Value },
    Error(ErrorBody),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    data: Option<ErrorData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorData {
    code: Option<ErrorCode>,
    http_status: Option<u16>,
}

impl Transport for HttpTransport {
    fn query<'a>(
        &'a self,
        path: &'a str,
        input: Value,
    ) -> BoxFuture<'a, Result<Value, ClientError>> {
        Box::pin(async move {
            let url = format!(
                "{}/api/trpc/{path}?input={}",
                self.base_url,
                urlencoding::encode(&input.to_string())
            );

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|err| ClientError::Transport(err.to_string()))?;
            let status = response.status();

            let envelope = response.json::<Envelope>().await.map_err(|err| {
                ClientError::Transport(format!("unexpected response ({status}): {err}"))
            })?;

            match envelope {
                Envelope::Result { data } => Ok(data),
                Envelope::Error(body) => {
                    let data = body.data.unwrap_or(ErrorData {
                        code: None,
                        http_status: None,
                    });
                    Err(ClientError::Rpc {
                        message: body.message,
                        code: data.code,
                        http_status: data.http_status.or(Some(status.as_u16())),
                    })
                }
            }
        })
    }
}

/// Calls the router in process with a fresh context per query.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    router: Arc<AppRouter>,
    store: Arc<dyn PostStore>,
}

impl LocalTransport {
    pub fn new(router: Arc<AppRouter>, store: Arc<dyn PostStore>) -> LocalTransport {
        LocalTransport { router, store }
    }
}

impl Transport for LocalTransport {
    fn query<'a>(
        &'a self,
        path: &'a str,
        input: Value,
    ) -> BoxFuture<'a, Result<Value, ClientError>> {
        Box::pin(async move {
            let ctx = Context::new(self.store.clone());
            self.router
                .call(path, ctx, input)
                .await
                .map_err(|err| QueryError::from(&err).into())
        })
    }
}
