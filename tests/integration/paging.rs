//! Paging over HTTP with per-page disk caching.

use crate::integration::mock_server::{plays_page, MockServerFixture};
use bgg_fetch::{Error, PlaysRequest};
use futures::StreamExt;

#[tokio::test]
async fn test_all_pages_are_fetched_and_cached() {
    let mut fixture = MockServerFixture::new().await;
    let mut mocks = Vec::new();
    for (page, first, count) in [("1", 0, 100), ("2", 100, 100), ("3", 200, 50)] {
        let body = plays_page(page.parse().unwrap(), 250, first, count);
        mocks.push(
            fixture
                .mock_xml("/xmlapi2/plays", vec![("id", "13"), ("page", page)], 200, &body, 1)
                .await,
        );
    }
    let cache_dir = tempfile::tempdir().unwrap();
    let engine = fixture.engine(Some(cache_dir.path()));

    let plays = engine
        .plays(PlaysRequest::for_thing(13))
        .collect_items()
        .await
        .unwrap();
    assert_eq!(plays.len(), 250);
    assert_eq!(plays.first().unwrap().id, 0);
    assert_eq!(plays.last().unwrap().id, 249);
    assert!(plays.iter().all(|p| p.item.object_id == 13));

    let plays_dir = cache_dir.path().join("plays").join("13");
    for page in ["0001", "0002", "0003"] {
        assert!(plays_dir.join(format!("{page}.xml.gz")).exists(), "page {page}");
    }
    assert_eq!(
        engine.cache().cached_keys("plays").await.unwrap(),
        vec!["13"]
    );

    // Replaying from the cache issues no further requests.
    let again = engine
        .plays(PlaysRequest::for_thing(13))
        .collect_items()
        .await
        .unwrap();
    assert_eq!(again, plays);
    for mock in &mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_filtered_plays_bypass_the_cache() {
    let mut fixture = MockServerFixture::new().await;
    let body = plays_page(1, 3, 0, 3);
    let mock = fixture
        .mock_xml(
            "/xmlapi2/plays",
            vec![("id", "13"), ("username", "alice"), ("page", "1")],
            200,
            &body,
            2,
        )
        .await;
    let cache_dir = tempfile::tempdir().unwrap();
    let engine = fixture.engine(Some(cache_dir.path()));

    for _ in 0..2 {
        let plays = engine
            .plays(PlaysRequest::for_thing(13).username("alice"))
            .collect_items()
            .await
            .unwrap();
        assert_eq!(plays.len(), 3);
    }
    assert!(!cache_dir.path().join("plays").exists());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_failing_page_ends_the_stream() {
    let mut fixture = MockServerFixture::new().await;
    let body = plays_page(1, 500, 0, 100);
    let first = fixture
        .mock_xml("/xmlapi2/plays", vec![("id", "13"), ("page", "1")], 200, &body, 1)
        .await;
    let second = fixture
        .mock_xml("/xmlapi2/plays", vec![("id", "13"), ("page", "2")], 404, "", 5)
        .await;
    let engine = fixture.engine(None);

    let pages: Vec<_> = engine
        .plays(PlaysRequest::for_thing(13))
        .into_stream()
        .collect()
        .await;
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].as_ref().unwrap().items.len(), 100);
    assert!(matches!(
        pages[1].as_ref().unwrap_err().last_attempt_error(),
        Error::FatalProtocol { status: 404 }
    ));
    first.assert_async().await;
    second.assert_async().await;
}
