//! Fetch engine over real HTTP: status handling, retries and the disk cache.

use crate::integration::mock_server::{MockServerFixture, CATAN, RATE_LIMITED};
use bgg_fetch::request::ThingFlag;
use bgg_fetch::{Error, GeekListRequest, SearchRequest, ThingRequest};
use std::time::Duration;

#[tokio::test]
async fn test_thing_is_fetched_then_served_from_disk() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_xml("/xmlapi2/thing", vec![("id", "13")], 200, CATAN, 1)
        .await;
    let cache_dir = tempfile::tempdir().unwrap();
    let engine = fixture.engine(Some(cache_dir.path()));

    let (first, stats) = engine
        .fetch_with_stats(&ThingRequest::single(13))
        .await
        .unwrap();
    assert_eq!(first[0].primary_name(), Some("CATAN"));
    assert_eq!(first[0].player_count(), Some((3, 4)));
    assert!(!stats.from_cache);
    assert!(cache_dir.path().join("thing").join("13.xml.gz").exists());

    // A fresh engine over the same directory never touches the network.
    let engine = fixture.engine(Some(cache_dir.path()));
    let (second, stats) = engine
        .fetch_with_stats(&ThingRequest::single(13))
        .await
        .unwrap();
    assert!(stats.from_cache);
    assert_eq!(first, second);
    assert_eq!(engine.cache().cached_keys("thing").await.unwrap(), vec!["13"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_flagged_thing_uses_its_own_cache_entry() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_xml(
            "/xmlapi2/thing",
            vec![("id", "13"), ("stats", "1")],
            200,
            CATAN,
            1,
        )
        .await;
    let cache_dir = tempfile::tempdir().unwrap();
    let engine = fixture.engine(Some(cache_dir.path()));

    ThingRequest::single(13)
        .with_flag(ThingFlag::Stats)
        .query_first(&engine)
        .await
        .unwrap();
    assert!(cache_dir.path().join("thing").join("13_stats.xml.gz").exists());
    assert!(!cache_dir.path().join("thing").join("13.xml.gz").exists());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bad_gateway_then_success() {
    let mut fixture = MockServerFixture::new().await;
    let failing = fixture
        .mock_xml(
            "/xmlapi2/thing",
            vec![("id", "13")],
            502,
            "<html>Bad Gateway</html>",
            2,
        )
        .await;
    let ok = fixture
        .mock_xml("/xmlapi2/thing", vec![("id", "13")], 200, CATAN, 1)
        .await;
    let engine = fixture.engine(None);

    let (things, stats) = engine
        .fetch_with_stats(&ThingRequest::single(13))
        .await
        .unwrap();
    assert_eq!(things.len(), 1);
    assert_eq!(stats.attempts, 3);
    assert_eq!(
        engine.estimator_snapshot("thing").unwrap().lower_bound,
        Duration::ZERO
    );
    failing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_feeds_the_estimator() {
    let mut fixture = MockServerFixture::new().await;
    let limited = fixture
        .mock_xml("/xmlapi2/thing", vec![("id", "13")], 429, RATE_LIMITED, 1)
        .await;
    let ok = fixture
        .mock_xml("/xmlapi2/thing", vec![("id", "13")], 200, CATAN, 1)
        .await;
    let engine = fixture.engine(None);

    engine.fetch(&ThingRequest::single(13)).await.unwrap();
    let snap = engine.estimator_snapshot("thing").unwrap();
    assert_eq!(snap.upper_bound, Duration::from_millis(10));
    assert_eq!(snap.delay, Duration::from_millis(5));
    limited.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_persistent_rate_limit_gives_up_after_five_attempts() {
    let mut fixture = MockServerFixture::new().await;
    let limited = fixture
        .mock_xml("/xmlapi2/thing", vec![("id", "13")], 429, RATE_LIMITED, 5)
        .await;
    let engine = fixture.engine(None);

    let err = engine.fetch(&ThingRequest::single(13)).await.unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 5, .. }));
    assert!(matches!(
        err.last_attempt_error(),
        Error::RateLimited { message } if message == "Rate limit exceeded."
    ));
    assert!(engine.estimator_snapshot("thing").unwrap().lower_bound > Duration::ZERO);
    limited.assert_async().await;
}

#[tokio::test]
async fn test_html_rate_limit_page_is_fatal() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_xml(
            "/xmlapi2/thing",
            vec![("id", "13")],
            429,
            "<html><body>Too many requests</body></html>",
            1,
        )
        .await;
    let engine = fixture.engine(None);

    let err = engine.fetch(&ThingRequest::single(13)).await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedErrorDocument { .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_truncated_document_is_not_cached() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_xml("/xmlapi2/thing", vec![("id", "13")], 200, "<items><item type=", 5)
        .await;
    let cache_dir = tempfile::tempdir().unwrap();
    let engine = fixture.engine(Some(cache_dir.path()));

    let err = engine.fetch(&ThingRequest::single(13)).await.unwrap_err();
    assert!(matches!(err.last_attempt_error(), Error::Malformed { .. }));
    assert!(!cache_dir.path().join("thing").join("13.xml.gz").exists());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_is_never_cached() {
    let mut fixture = MockServerFixture::new().await;
    let body = r#"<items total="1"><item type="boardgame" id="13"><name type="primary" value="CATAN"/><yearpublished value="1995"/></item></items>"#;
    let mock = fixture
        .mock_xml(
            "/xmlapi2/search",
            vec![("query", "Catan"), ("type", "boardgame"), ("exact", "1")],
            200,
            body,
            2,
        )
        .await;
    let cache_dir = tempfile::tempdir().unwrap();
    let engine = fixture.engine(Some(cache_dir.path()));

    let request = SearchRequest::new("Catan").of_types(["boardgame"]);
    for _ in 0..2 {
        let results = engine.fetch(&request).await.unwrap();
        assert_eq!(results.items[0].id, 13);
        assert_eq!(results.items[0].year_published, Some(1995));
    }
    assert_eq!(engine.cache().stats().bypassed, 4);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_geeklist_uses_the_v1_api() {
    let mut fixture = MockServerFixture::new().await;
    let body = r#"<?xml version="1.0" encoding="utf-8"?>
<geeklist id="7" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
  <postdate>Mon, 01 Jan 2024 10:00:00 +0000</postdate>
  <postdate_timestamp>1704103200</postdate_timestamp>
  <editdate>Tue, 02 Jan 2024 10:00:00 +0000</editdate>
  <editdate_timestamp>1704189600</editdate_timestamp>
  <thumbs>3</thumbs>
  <numitems>1</numitems>
  <username>alice</username>
  <title>Favourites</title>
  <description>Games I like.</description>
  <item id="100" objecttype="thing" subtype="boardgame" objectid="13" objectname="CATAN" username="alice" postdate="Mon, 01 Jan 2024 10:00:00 +0000" editdate="Mon, 01 Jan 2024 10:00:00 +0000" thumbs="1" imageid="0">
    <body>Classic.</body>
  </item>
</geeklist>"#;
    let mock = fixture
        .mock_xml("/xmlapi/geeklist/7", vec![], 200, body, 1)
        .await;
    let engine = fixture.engine(None);

    let list = engine.fetch(&GeekListRequest::new(7)).await.unwrap();
    assert_eq!(list.title, "Favourites");
    let ids: Vec<u64> = list
        .items_of("thing", "boardgame")
        .map(|i| i.object_id)
        .collect();
    assert_eq!(ids, vec![13]);
    mock.assert_async().await;
}
