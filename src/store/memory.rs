use super::{PostStore, StoreError};
use crate::blog::{BoxFuture, Post, PostID};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: HashMap<PostID, Post>,
}

impl MemoryStore {
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> MemoryStore {
        MemoryStore {
            posts: posts
                .into_iter()
                .map(|post| (post.id.clone(), post))
                .collect(),
        }
    }

    /// A couple of posts to serve with `serve --seed`.
    pub fn demo() -> MemoryStore {
        let at = |secs: i64| {
            chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0).unwrap_or_default()
        };

        MemoryStore::with_posts([
            Post {
                id: "abc123".to_owned(),
                title: "Hello".to_owned(),
                text: "World".to_owned(),
                created_at: at(1_672_531_200),
            },
            Post {
                id: "second".to_owned(),
                title: "Prefetching".to_owned(),
                text: "This post was rendered from the server's dehydrated cache.".to_owned(),
                created_at: at(1_700_000_000),
            },
        ])
    }
}

impl PostStore for MemoryStore {
    fn by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Post>, StoreError>> {
        Box::pin(std::future::ready(Ok(self.posts.get(id).cloned())))
    }
}
