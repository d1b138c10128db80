//! HTTP transport: one GET, status plus raw body.
//!
//! The engine talks to the network only through [`Transport`], so tests can
//! script responses without a server.

pub mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::{HttpTransport, TransportError};
#[cfg(test)]
pub(crate) use scripted::ScriptedTransport;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

/// Status code and undecoded body of one physical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET to `url` with `params` appended as the query string.
    ///
    /// Any received status is `Ok`; only connection-level failures are errors.
    async fn get(
        &self,
        url: &Url,
        params: &[(String, String)],
    ) -> std::result::Result<RawResponse, TransportError>;
}
