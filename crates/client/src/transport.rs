//! The transport seam between the protocol engine and the network.
//!
//! The engine never performs I/O itself: every framed request is handed
//! to a [`Transport`] together with the session URL, and the raw
//! response bytes come back. Retry and timeout policy live entirely in
//! the transport implementation; a failed exchange leaves the session's
//! ephemeral key untouched, so retrying a single request is always
//! safe from the session's perspective.

use bytes::Bytes;

/// Errors surfaced by a [`Transport`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP layer failed (connection refused, non-2xx status, ...).
    #[error("transport error: {0}")]
    Http(String),

    /// The request timed out.
    #[error("transport timed out")]
    Timeout,

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A blocking request/response channel to the device bridge.
///
/// `payload` is the exact framed envelope to POST; the returned bytes
/// are the device's envelope, unmodified. Implementations must not
/// reorder or pipeline requests: the protocol re-keys after every
/// response, so there is exactly one request in flight per session.
pub trait Transport {
    /// Send one framed request and return the raw response bytes.
    fn request(&mut self, url: &str, payload: &[u8]) -> Result<Bytes, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn request(&mut self, url: &str, payload: &[u8]) -> Result<Bytes, TransportError> {
        (**self).request(url, payload)
    }
}
