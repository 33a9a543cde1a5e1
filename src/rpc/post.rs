use super::{Context, Procedure, RpcError};
use crate::blog::{BoxFuture, Post, PostID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ById {
    pub id: PostID,
}

/// `post.byId`
pub struct PostById;

impl Procedure for PostById {
    const PATH: &'static str = "post.byId";
    type Input = ById;
    type Output = Post;

    fn call(ctx: Context, input: ById) -> BoxFuture<'static, Result<Post, RpcError>> {
        Box::pin(async move {
            match ctx.store.by_id(&input.id).await {
                Ok(Some(post)) => Ok(post),
                Ok(None) => Err(RpcError::not_found(format!(
                    "No post with id '{}'",
                    input.id
                ))),
                Err(err) => {
                    tracing::error!(
                        request_id = %ctx.request_id,
                        post_id = %input.id,
                        "Error reading post: {err}"
                    );
                    Err(RpcError::internal("Error reading post"))
                }
            }
        })
    }
}
