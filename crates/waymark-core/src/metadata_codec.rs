//! Encoding of tracker metadata into marker payloads.
//!
//! Metadata is serialized to JSON and base64-encoded into the single
//! non-whitespace payload token of the marker line. The caller's metadata
//! type is the schema: decoding deserializes into it, so a payload missing
//! required fields fails outright rather than being defaulted.

use std::marker::PhantomData;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates the stages at which a marker payload can fail to decode.
pub enum MetadataDecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("payload is not valid metadata JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Codec pairing one metadata type with the marker payload encoding.
pub struct MetadataCodec<M> {
    _metadata: PhantomData<fn() -> M>,
}

impl<M> MetadataCodec<M>
where
    M: Serialize,
{
    /// Serializes `meta` to JSON and base64-encodes it into a payload token.
    pub fn encode(meta: &M) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(meta)?;
        Ok(BASE64.encode(json))
    }
}

impl<M> MetadataCodec<M>
where
    M: DeserializeOwned,
{
    /// Decodes a payload token back into metadata.
    ///
    /// Base64, UTF-8, JSON syntax, and the shape of `M` are all enforced;
    /// the first failing stage is reported.
    pub fn decode(payload: &str) -> Result<M, MetadataDecodeError> {
        let bytes = BASE64.decode(payload)?;
        let json = String::from_utf8(bytes)?;
        Ok(serde_json::from_str(&json)?)
    }
}
