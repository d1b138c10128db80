//! Deterministic in-memory transport for tests.

use super::{RawResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use url::Url;

/// A GET issued against a [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub url: String,
    pub params: Vec<(String, String)>,
}

/// Replays queued responses in order and records every call it receives.
///
/// Once the queue runs dry every further call fails with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<std::result::Result<RawResponse, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(RawResponse::new(status, body.into())));
        self
    }

    /// Queue `count` copies of the same response.
    pub fn respond_times(self, count: usize, status: u16, body: &str) -> Self {
        (0..count).fold(self, |t, _| t.respond(status, body))
    }

    pub fn fail_connection(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    fn push(&self, entry: std::result::Result<RawResponse, String>) {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(entry);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &Url,
        params: &[(String, String)],
    ) -> std::result::Result<RawResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(RecordedCall {
                url: url.to_string(),
                params: params.to_vec(),
            });
        let next = self
            .script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        match next {
            Some(Ok(resp)) => Ok(resp),
            Some(Err(msg)) => Err(TransportError::Other(msg)),
            None => Err(TransportError::Other("script exhausted".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok, block_on};

    #[test]
    fn replays_in_order_then_runs_dry() {
        let transport = ScriptedTransport::new()
            .respond(502, "")
            .fail_connection("reset")
            .respond(200, "<items/>");
        let url = Url::parse("https://example.test/xmlapi2/thing").unwrap();
        let params = vec![("id".to_string(), "13".to_string())];

        let first = assert_ok!(block_on(transport.get(&url, &params)));
        assert_eq!(first.status, 502);
        assert_err!(block_on(transport.get(&url, &params)));
        let third = assert_ok!(block_on(transport.get(&url, &params)));
        assert_eq!(&third.body[..], b"<items/>");
        assert_eq!(transport.remaining(), 0);
        assert_err!(block_on(transport.get(&url, &[])));

        let calls = transport.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].url, "https://example.test/xmlapi2/thing");
        assert_eq!(calls[0].params, params);
        assert!(calls[3].params.is_empty());
    }
}
