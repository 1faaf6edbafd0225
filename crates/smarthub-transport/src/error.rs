/// Errors that can occur in the transport layer.
///
/// All of them are fatal to a session: the client never retries a failed
/// exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint URL could not be parsed or has an unsupported scheme.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Sending the request failed (connection refused, timeout, ...).
    #[error("request failed: {0}")]
    RequestFailed(#[source] std::io::Error),

    /// The server answered but the body could not be read.
    #[error("reading response failed: {0}")]
    ResponseFailed(#[source] std::io::Error),
}
