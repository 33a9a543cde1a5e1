//! Encoding of procedure inputs, outputs and cached query data.
//!
//! Values are always decoded into the procedure's typed `Input`/`Output`, so
//! non-JSON types such as `DateTime<Utc>` come back typed rather than as the
//! strings they travel as. Server and client must agree on the variant.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TAGGED_VERSION: u64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transformer {
    /// Values travel as plain JSON.
    Json,
    /// Values travel as `{"json": value, "meta": {"v": 1}}`.
    #[default]
    Tagged,
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("expected a tagged payload but got untagged JSON")]
    Untagged,
    #[error("unsupported tagged payload version {0}")]
    Version(u64),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Transformer {
    pub fn serialize<T: Serialize>(self, value: &T) -> Result<Value, TransformError> {
        let json = serde_json::to_value(value)?;

        Ok(match self {
            Transformer::Json => json,
            Transformer::Tagged => serde_json::json!({
                "json": json,
                "meta": { "v": TAGGED_VERSION },
            }),
        })
    }

    pub fn deserialize<T: DeserializeOwned>(self, value: Value) -> Result<T, TransformError> {
        let json = match self {
            Transformer::Json => value,
            Transformer::Tagged => untag(value)?,
        };

        Ok(serde_json::from_value(json)?)
    }
}

fn untag(value: Value) -> Result<Value, TransformError> {
    let Value::Object(mut payload) = value else {
        return Err(TransformError::Untagged);
    };
    if payload.len() != 2 {
        return Err(TransformError::Untagged);
    }

    let version = payload
        .get("meta")
        .and_then(|meta| meta.get("v"))
        .and_then(Value::as_u64)
        .ok_or(TransformError::Untagged)?;
    if version != TAGGED_VERSION {
        return Err(TransformError::Version(version));
    }

    payload.remove("json").ok_or(TransformError::Untagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::{test_post, Post};

    #[test]
    fn tagged_post_keeps_its_date_through_text() {
        let post = test_post();

        let encoded = Transformer::Tagged.serialize(&post).unwrap();
        let text = serde_json::to_string(&encoded).unwrap();
        let decoded: Post = Transformer::Tagged
            .deserialize(serde_json::from_str(&text).unwrap())
            .unwrap();

        assert_eq!(decoded.created_at, post.created_at);
        assert_eq!(decoded, post);
    }

    #[test]
    fn tagged_payload_shape() {
        let encoded = Transformer::Tagged.serialize(&"hi").unwrap();
        assert_eq!(encoded, serde_json::json!({"json": "hi", "meta": {"v": 1}}));
    }

    #[test]
    fn tagged_decoder_rejects_untagged_values() {
        let plain = Transformer::Json.serialize(&test_post()).unwrap();

        let err = Transformer::Tagged.deserialize::<Post>(plain).unwrap_err();
        assert!(matches!(err, TransformError::Untagged));
    }

    #[test]
    fn plain_decoder_rejects_tagged_values() {
        let tagged = Transformer::Tagged.serialize(&test_post()).unwrap();

        let err = Transformer::Json.deserialize::<Post>(tagged).unwrap_err();
        assert!(matches!(err, TransformError::Json(_)));
    }

    #[test]
    fn unknown_tag_version() {
        let value = serde_json::json!({"json": 1, "meta": {"v": 7}});

        let err = Transformer::Tagged.deserialize::<u32>(value).unwrap_err();
        assert!(matches!(err, TransformError::Version(7)));
    }

    #[test]
    fn config_names() {
        let parsed: Transformer = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(parsed, Transformer::Json);
        assert_eq!(Transformer::default(), Transformer::Tagged);
    }
}
