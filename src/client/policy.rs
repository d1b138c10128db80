use crate::config::RetrySettings;
use crate::transport::RawResponse;
use crate::{Error, ErrorContext, Result};
use std::time::Duration;

/// Attempt budget and backoff schedule shared by every retryable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        Self {
            max_attempts: s.max_attempts.max(1),
            base_backoff: Duration::from_millis(s.base_backoff_ms),
            max_backoff: Duration::from_millis(s.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            max_backoff,
        }
    }

    /// Sleep before retry number `retry` (0-based): `base × 2^retry`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// What one physical attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Ok,
    RateLimited,
    BadGateway,
    Unexpected(u16),
}

impl Outcome {
    pub(crate) fn of(status: u16) -> Self {
        match status {
            200 => Outcome::Ok,
            429 => Outcome::RateLimited,
            502 => Outcome::BadGateway,
            other => Outcome::Unexpected(other),
        }
    }
}

/// Turn a 429 body into the matching error.
///
/// The body is expected to be `<error><message>…</message></error>`.
pub(crate) fn rate_limit_error(resp: &RawResponse) -> Error {
    let text = match std::str::from_utf8(&resp.body) {
        Ok(t) => t,
        Err(e) => return malformed_body(e.to_string()),
    };
    let doc = match roxmltree::Document::parse(text) {
        Ok(d) => d,
        Err(e) => return malformed_body(e.to_string()),
    };
    let root = doc.root_element();
    if root.tag_name().name() != "error" {
        return Error::UnexpectedErrorDocument {
            root: root.tag_name().name().to_string(),
        };
    }
    let message = crate::model::xml::child_text(root, "message").unwrap_or_default();
    Error::RateLimited { message }
}

fn malformed_body(details: String) -> Error {
    Error::malformed_with_context(
        "unparsable rate-limit response",
        ErrorContext::new()
            .with_details(details)
            .with_source("rate_limit_body"),
    )
}

/// Parse a response body as XML and hand the root to `build`.
pub(crate) fn parse_document<T>(
    body: &[u8],
    build: impl FnOnce(roxmltree::Node<'_, '_>) -> Result<T>,
) -> Result<T> {
    let text = std::str::from_utf8(body).map_err(|e| {
        Error::malformed_with_context(
            "response body is not UTF-8",
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("xml_parser"),
        )
    })?;
    let doc = roxmltree::Document::parse(text)?;
    build(doc.root_element())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy::new(5, Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(p.backoff(0), Duration::from_secs(1));
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(2), Duration::from_secs(4));
        assert_eq!(p.backoff(3), Duration::from_secs(5));
        assert_eq!(p.backoff(64), Duration::from_secs(5));
    }

    #[test]
    fn status_classification() {
        assert_eq!(Outcome::of(200), Outcome::Ok);
        assert_eq!(Outcome::of(429), Outcome::RateLimited);
        assert_eq!(Outcome::of(502), Outcome::BadGateway);
        assert_eq!(Outcome::of(404), Outcome::Unexpected(404));
        assert_eq!(Outcome::of(503), Outcome::Unexpected(503));
    }

    #[test]
    fn rate_limit_bodies() {
        let ok = RawResponse::new(
            429,
            "<error>\n  <message>Rate limit exceeded.</message>\n</error>",
        );
        assert!(matches!(
            rate_limit_error(&ok),
            Error::RateLimited { message } if message == "Rate limit exceeded."
        ));

        let no_message = RawResponse::new(429, "<error/>");
        assert!(matches!(
            rate_limit_error(&no_message),
            Error::RateLimited { message } if message.is_empty()
        ));

        let html = RawResponse::new(429, "<html><body>busy</body></html>");
        assert!(matches!(
            rate_limit_error(&html),
            Error::UnexpectedErrorDocument { root } if root == "html"
        ));

        let garbage = RawResponse::new(429, "Too many requests");
        assert!(matches!(rate_limit_error(&garbage), Error::Malformed { .. }));
    }

    #[test]
    fn document_parsing_errors_are_malformed() {
        let err = parse_document(b"<items>", |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
        let err = parse_document(&[0xff, 0xfe], |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
        assert_eq!(parse_document(b"<items/>", |r| Ok(r.tag_name().name().len())).unwrap(), 5);
    }
}
