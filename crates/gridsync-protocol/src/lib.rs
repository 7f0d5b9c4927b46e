//! Wire protocol for Gridsync.
//!
//! This crate defines the "language" spoken over a persistent
//! connection:
//!
//! - **Types** ([`ClientFrame`], [`ServerFrame`], [`PlayerId`]) — the
//!   frame structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding, including the malformed-bytes vs unknown-tag split
//!   that decides which error message a client sees.
//!
//! The protocol layer sits between transport (raw frames) and the game
//! engine. It doesn't know about connections or grids — it only knows
//! how to serialize and deserialize frames.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientFrame, PlayerId, ServerFrame};

/// Milliseconds since the Unix epoch.
///
/// Every outbound frame carries one of these. Wall-clock rather than
/// monotonic time because the values cross the wire and end up in
/// client logs.
pub fn timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
