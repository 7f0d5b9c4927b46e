//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding frames.
///
/// The `Decode`/`UnknownType` split is deliberate: both are recoverable
/// and both are answered with a single `error` frame to the sender, but
/// the messages differ and clients rely on them when debugging.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound frame failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The inbound bytes were not a well-formed frame.
    #[cfg(feature = "json")]
    #[error("invalid JSON format: {0}")]
    Decode(serde_json::Error),

    /// The inbound frame was well-formed but carried a `type` tag this
    /// protocol doesn't know.
    #[error("unknown message type: {0}")]
    UnknownType(String),
}
