//! HTTP transport implementation using `reqwest`.

use std::io;
use std::time::Duration;

use reqwest::{Client, Url};

use crate::{Transport, TransportError, TransportResponse};

/// A [`Transport`] that POSTs each body to a fixed URL.
///
/// The request body is the Base64 text as-is. The response body is read
/// in full and trimmed to its first line.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Creates a transport with no request timeout.
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        Self::with_timeout(endpoint, None)
    }

    /// Creates a transport whose requests give up after `timeout`.
    ///
    /// This is only a connection-level safety net. Session timing is driven
    /// by the hub's own clock.
    pub fn with_timeout(
        endpoint: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TransportError::InvalidEndpoint(format!(
                "{endpoint}: unsupported scheme {}",
                endpoint.scheme()
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            TransportError::RequestFailed(io::Error::other(e))
        })?;

        tracing::debug!(%endpoint, ?timeout, "HTTP transport ready");
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn post(&self, body: &str) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .body(body.to_owned())
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    io::ErrorKind::TimedOut
                } else {
                    io::ErrorKind::ConnectionRefused
                };
                TransportError::RequestFailed(io::Error::new(kind, e))
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            TransportError::ResponseFailed(io::Error::new(
                io::ErrorKind::InvalidData,
                e,
            ))
        })?;

        tracing::trace!(status, sent = body.len(), received = text.len(), "exchange complete");
        Ok(TransportResponse::from_text(status, &text))
    }
}
