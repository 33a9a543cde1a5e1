use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub type PostID = String;
pub type RequestID = String;

pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub const STORE_PATH: &str = "/home/shared/frith-store/blog";
pub const LISTEN_ADDRESS: &str = "0.0.0.0:8010";

pub const REQUEST_ID_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostID,
    pub title: String,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub fn get_random_hex_string<const LEN: usize>() -> String {
    let mut bytes = [0u8; LEN];
    rand_chacha::ChaCha20Rng::from_entropy().fill_bytes(&mut bytes);

    bytes.iter().fold(String::new(), |mut output, b| {
        let _ = write!(output, "{b:02x}");
        output
    })
}

#[cfg(test)]
pub(crate) fn test_post() -> Post {
    use chrono::TimeZone;

    Post {
        id: "abc123".to_owned(),
        title: "Hello".to_owned(),
        text: "World".to_owned(),
        created_at: chrono::Utc
            .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
            .single()
            .expect("date should be unambiguous"),
    }
}
