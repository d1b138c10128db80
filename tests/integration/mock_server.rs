//! Mock HTTP server setup for integration tests

use bgg_fetch::resilience::DelayEstimatorConfig;
use bgg_fetch::{FetchConfig, FetchEngine, FetchEngineBuilder, RetryPolicy};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::path::Path;
use std::time::Duration;

/// Test fixture that owns a mock server and builds engines pointed at it.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Engine with real HTTP, millisecond backoff and pacing, caching under `cache_dir`.
    pub fn engine(&self, cache_dir: Option<&Path>) -> FetchEngine {
        let mut config = FetchConfig::default();
        config.http_timeout_secs = 5;
        config.cache_dir = cache_dir.map(Path::to_path_buf);

        FetchEngineBuilder::from_config(config)
            .base_url_override(&self.base_url)
            .retry_policy(RetryPolicy::new(
                5,
                Duration::from_millis(1),
                Duration::from_millis(5),
            ))
            .estimator_config(
                DelayEstimatorConfig::new().with_initial_upper_bound(Duration::from_millis(10)),
            )
            .build()
            .expect("engine builds")
    }

    /// GET `path` answering `status` with an XML body, expected `hits` times.
    pub async fn mock_xml(
        &mut self,
        path: &str,
        query: Vec<(&str, &str)>,
        status: usize,
        body: &str,
        hits: usize,
    ) -> Mock {
        let matchers = query
            .into_iter()
            .map(|(k, v)| Matcher::UrlEncoded(k.into(), v.into()))
            .collect();
        self.server
            .mock("GET", path)
            .match_query(Matcher::AllOf(matchers))
            .with_status(status)
            .with_header("content-type", "text/xml; charset=utf-8")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}

pub const CATAN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
  <item type="boardgame" id="13">
    <name type="primary" sortindex="1" value="CATAN" />
    <yearpublished value="1995" />
    <minplayers value="3" />
    <maxplayers value="4" />
  </item>
</items>"#;

pub const RATE_LIMITED: &str =
    "<error>\n  <message>Rate limit exceeded.</message>\n</error>";

/// A `<plays>` page holding `count` plays of thing 13, ids from `first_id`.
pub fn plays_page(page: u32, total: u32, first_id: u64, count: usize) -> String {
    let plays: String = (0..count as u64)
        .map(|i| {
            format!(
                r#"<play id="{}" date="2023-05-01" quantity="1" length="45" incomplete="0" nowinstats="0" userid="1234" location="Home"><item name="CATAN" objecttype="thing" objectid="13"><subtypes><subtype value="boardgame" /></subtypes></item></play>"#,
                first_id + i
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><plays username="" userid="0" total="{total}" page="{page}" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">{plays}</plays>"#
    )
}
