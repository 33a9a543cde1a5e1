use crate::blog::BoxFuture;
use crate::transformer::Transformer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod context;
pub mod error;
pub mod post;

pub use context::{create_context, Context};
pub use error::{ErrorCode, RpcError};

/// A named, typed procedure callable through the [`AppRouter`].
pub trait Procedure: Send + Sync + 'static {
    /// Dotted path, e.g. `post.byId`.
    const PATH: &'static str;
    type Input: Serialize + DeserializeOwned + Send + 'static;
    type Output: Serialize + DeserializeOwned + Send + 'static;

    fn call(ctx: Context, input: Self::Input) -> BoxFuture<'static, Result<Self::Output, RpcError>>;
}

type Handler =
    Arc<dyn Fn(Context, Value) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

/// Procedures keyed by path. Inputs and outputs cross this boundary encoded
/// with the router's transformer.
pub struct AppRouter {
    transformer: Transformer,
    procedures: BTreeMap<&'static str, Handler>,
}

impl AppRouter {
    pub fn new(transformer: Transformer) -> Self {
        Self {
            transformer,
            procedures: BTreeMap::new(),
        }
    }

    pub fn procedure<P: Procedure>(mut self) -> Self {
        let transformer = self.transformer;
        let handler: Handler = Arc::new(
            move |ctx: Context, raw_input: Value| -> BoxFuture<'static, Result<Value, RpcError>> {
                Box::pin(async move {
                    let input = transformer
                        .deserialize::<P::Input>(raw_input)
                        .map_err(|err| RpcError::bad_request(format!("Invalid input: {err}")))?;
                    let output = P::call(ctx, input).await?;

                    transformer.serialize(&output).map_err(|err| {
                        RpcError::internal(format!("Could not encode output: {err}"))
                    })
                })
            },
        );

        self.procedures.insert(P::PATH, handler);
        self
    }

    pub fn transformer(&self) -> Transformer {
        self.transformer
    }

    pub async fn call(&self, path: &str, ctx: Context, input: Value) -> Result<Value, RpcError> {
        let handler = self
            .procedures
            .get(path)
            .ok_or_else(|| RpcError::not_found(format!("No procedure at path '{path}'")))?;

        handler(ctx, input).await
    }
}

impl std::fmt::Debug for AppRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRouter")
            .field("transformer", &self.transformer)
            .field("procedures", &self.procedures.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub fn app_router(transformer: Transformer) -> AppRouter {
    AppRouter::new(transformer).procedure::<post::PostById>()
}
