//! Unified error type for the smarthub client.

use smarthub_protocol::ProtocolError;
use smarthub_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Every variant is fatal: the session stops and the process exits with a
/// failure code. Record-level decoding problems never get this far, and an
/// unresponsive device is evicted rather than reported as an error.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The exchange with the hub itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound packet could not be built.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The hub answered with something other than 200 or 204.
    #[error("hub terminated the session with status {status}")]
    Terminated { status: u16 },

    /// The hub address given on the command line is unusable.
    #[error("invalid hub address: {0}")]
    InvalidAddress(String),

    /// The configuration file couldn't be read or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}
