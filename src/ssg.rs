//! Server-side prefetch helpers: run procedures ahead of render and hand the
//! results to the client as a dehydrated cache.

use crate::query::{DehydratedState, QueryCache, QueryError, QueryKey, QueryState};
use crate::rpc::{AppRouter, Context, Procedure, RpcError};
use std::sync::Arc;

#[derive(Debug)]
pub struct SsgHelpers {
    router: Arc<AppRouter>,
    ctx: Context,
    cache: QueryCache,
}

impl SsgHelpers {
    pub fn new(router: Arc<AppRouter>, ctx: Context) -> SsgHelpers {
        SsgHelpers {
            router,
            ctx,
            cache: QueryCache::default(),
        }
    }

    /// Runs a procedure, caches its outcome and returns the typed result.
    pub async fn fetch<P: Procedure>(&self, input: &P::Input) -> Result<P::Output, RpcError> {
        let transformer = self.router.transformer();
        let key = QueryKey::for_procedure::<P>(input)
            .map_err(|err| RpcError::bad_request(format!("Invalid input: {err}")))?;
        let encoded_input = transformer
            .serialize(input)
            .map_err(|err| RpcError::bad_request(format!("Invalid input: {err}")))?;

        match self.router.call(P::PATH, self.ctx.clone(), encoded_input).await {
            Ok(data) => {
                self.cache.set(key, QueryState::success(data.clone())).await;
                transformer
                    .deserialize(data)
                    .map_err(|err| RpcError::internal(format!("Could not decode output: {err}")))
            }
            Err(err) => {
                self.cache
                    .set(key, QueryState::error(QueryError::from(&err)))
                    .await;
                Err(err)
            }
        }
    }

    /// Like [`SsgHelpers::fetch`], but only populates the cache. Never fails.
    pub async fn prefetch<P: Procedure>(&self, input: &P::Input) {
        if let Err(err) = self.fetch::<P>(input).await {
            tracing::debug!(
                request_id = %self.ctx.request_id,
                path = P::PATH,
                code = ?err.code,
                "Prefetch failed: {err}"
            );
        }
    }

    pub async fn dehydrate(&self) -> DehydratedState {
        self.cache.dehydrate().await
    }
}
