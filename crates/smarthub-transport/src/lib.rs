//! Transport abstraction layer for smarthub.
//!
//! The hub speaks a store-and-forward protocol: every exchange is one
//! request carrying a Base64 text body, answered by a status code and at
//! most one line of text. [`Transport`] captures exactly that, so the
//! session controller can run against HTTP in production and a scripted
//! fake in tests.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpTransport`] via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpTransport;

/// Status the hub answers with while the session should continue.
pub const STATUS_OK: u16 = 200;
/// Status the hub answers with when the simulation is over.
pub const STATUS_NO_CONTENT: u16 = 204;

/// What came back from one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// The first line of the response body, if there was one.
    pub body: Option<String>,
}

impl TransportResponse {
    /// Builds a response from raw body text, keeping only its first line.
    pub fn from_text(status: u16, text: &str) -> Self {
        Self {
            status,
            body: text.lines().next().map(str::to_owned),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// `true` when the hub signalled a clean end of session.
    pub fn is_finished(&self) -> bool {
        self.status == STATUS_NO_CONTENT
    }
}

/// Posts one request body and returns the hub's answer.
pub trait Transport: Send + Sync {
    /// Sends `body` and waits for the response.
    ///
    /// A non-200 status is *not* an error at this layer; only failing to
    /// complete the exchange is.
    async fn post(&self, body: &str) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport> Transport for &T {
    async fn post(&self, body: &str) -> Result<TransportResponse, TransportError> {
        (**self).post(body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_keeps_first_line_only() {
        let r = TransportResponse::from_text(200, "AAAA\nBBBB\n");
        assert_eq!(r.body.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_from_text_handles_crlf() {
        let r = TransportResponse::from_text(200, "AAAA\r\nBBBB");
        assert_eq!(r.body.as_deref(), Some("AAAA"));
    }

    #[test]
    fn test_from_text_empty_body_is_none() {
        let r = TransportResponse::from_text(204, "");
        assert_eq!(r.body, None);
        assert!(r.is_finished());
        assert!(!r.is_ok());
    }

    #[test]
    fn test_status_predicates() {
        assert!(TransportResponse::from_text(200, "x").is_ok());
        let err = TransportResponse::from_text(500, "x");
        assert!(!err.is_ok());
        assert!(!err.is_finished());
    }
}
