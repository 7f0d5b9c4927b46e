//! Unified error type for the Gridsync server.

use gridsync_engine::EngineError;
use gridsync_protocol::ProtocolError;
use gridsync_registry::RegistryError;
use gridsync_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gridsync` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GridsyncError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (unknown or dead connection).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An engine-level error (rejected move, engine gone).
    #[error(transparent)]
    Engine(#[from] EngineError),
}
