//! Codec trait and implementations for serializing frames.
//!
//! A codec converts between Rust types and frame bytes. The rest of the
//! server only depends on the [`Codec`] trait, so the wire encoding can
//! change (compact binary, compression) without touching the gateway or
//! the engine. [`JsonCodec`] is the default and matches the documented
//! JSON protocol.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;
#[cfg(feature = "json")]
use crate::types::ClientFrame;

/// A codec that can encode frames to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec is shared across every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into frame bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes frame bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] for the JSON wire protocol (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(feature = "json")]
impl JsonCodec {
    /// Decodes an inbound frame, distinguishing "not JSON at all" from
    /// "valid JSON we don't recognize".
    ///
    /// The distinction drives the error message the sender gets back:
    /// malformed bytes → [`ProtocolError::Decode`] ("invalid JSON"),
    /// well-formed JSON with an unknown or missing `type` tag →
    /// [`ProtocolError::UnknownType`]. A known tag with bad fields is a
    /// decode failure — the client spoke the right frame badly.
    pub fn decode_client(
        &self,
        data: &[u8],
    ) -> Result<ClientFrame, ProtocolError> {
        let err = match serde_json::from_slice::<ClientFrame>(data) {
            Ok(frame) => return Ok(frame),
            Err(e) => e,
        };

        match serde_json::from_slice::<serde_json::Value>(data) {
            Ok(value) => {
                let tag = value.get("type").and_then(|t| t.as_str());
                match tag {
                    Some(tag) if ClientFrame::is_known_tag(tag) => {
                        Err(ProtocolError::Decode(err))
                    }
                    Some(tag) => {
                        Err(ProtocolError::UnknownType(tag.to_string()))
                    }
                    None => Err(ProtocolError::UnknownType(
                        "(missing)".to_string(),
                    )),
                }
            }
            Err(_) => Err(ProtocolError::Decode(err)),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
