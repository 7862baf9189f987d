//! Navigator driven end to end over the extraction client.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::FakeBackend;
use smartread::content::ContentTransformer;
use smartread::navigation::{Navigation, NavigationTiming, Navigator, Rejection};
use smartread::repository::DocumentCache;
use smartread::services::{ExtractionClient, Intent, Viewer};
use smartread::Error;

const PAPER: &str = "https://example.com/paper.pdf";

async fn navigator(backend: &Arc<FakeBackend>, settle: Duration) -> (Navigator, DocumentCache) {
    let cache = DocumentCache::in_memory();
    let client = Arc::new(ExtractionClient::new(backend.clone(), cache.clone()));
    let timing = NavigationTiming {
        settle_delay: settle,
        ..NavigationTiming::default()
    };
    (Navigator::new(client, timing).await, cache)
}

#[tokio::test]
async fn navigation_records_last_page_and_settles() {
    let backend = Arc::new(FakeBackend::new(5));
    let (nav, cache) = navigator(&backend, Duration::from_millis(250)).await;
    nav.open(PAPER).await.unwrap();

    let Navigation::Loaded(page) = nav.request_page(2).await.unwrap() else {
        panic!("page 2 should load");
    };
    assert_eq!(page.current_page, 2);
    assert_eq!(nav.current_page(), Some(2));
    assert_eq!(cache.last_page().await.unwrap(), Some(2));

    // Settling: re-entry rejected without a request.
    assert_eq!(
        nav.next().await.unwrap(),
        Navigation::Rejected(Rejection::Busy)
    );
    assert_eq!(backend.calls().len(), 2);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(matches!(
        nav.next().await.unwrap(),
        Navigation::Loaded(p) if p.current_page == 3
    ));
    assert_eq!(cache.last_page().await.unwrap(), Some(3));
}

#[tokio::test]
async fn concurrent_request_is_rejected_while_one_is_in_flight() {
    let backend = Arc::new(FakeBackend::new(5).gated(PAPER));
    let (nav, _cache) = navigator(&backend, Duration::ZERO).await;

    let (opened, ()) = tokio::join!(nav.open(PAPER), async {
        backend.entered.notified().await;
        backend.release.notify_one();
    });
    opened.unwrap();

    let (first, second) = tokio::join!(nav.request_page(2), async {
        backend.entered.notified().await;
        assert_eq!(nav.current_page(), Some(2));
        let second = nav.request_page(3).await;
        backend.release.notify_one();
        second
    });

    assert!(matches!(first.unwrap(), Navigation::Loaded(p) if p.current_page == 2));
    assert_eq!(second.unwrap(), Navigation::Rejected(Rejection::Busy));
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn failed_page_rolls_indicator_back() {
    let backend = Arc::new(FakeBackend::new(5).failing_page(4));
    let (nav, cache) = navigator(&backend, Duration::ZERO).await;
    nav.open(PAPER).await.unwrap();

    let err = nav.request_page(4).await.unwrap_err();
    assert!(err.is_remote());
    assert_eq!(nav.current_page(), Some(1));
    assert_eq!(cache.last_page().await.unwrap(), Some(1));

    let content = nav.client().current().await.unwrap();
    assert_eq!(content.current_page, 1);
}

#[tokio::test]
async fn out_of_range_and_edge_navigation_make_no_request() {
    let backend = Arc::new(FakeBackend::new(2));
    let (nav, _cache) = navigator(&backend, Duration::ZERO).await;
    nav.open(PAPER).await.unwrap();

    assert_eq!(
        nav.previous().await.unwrap(),
        Navigation::Rejected(Rejection::SamePage)
    );
    assert_eq!(
        nav.request_page(3).await.unwrap(),
        Navigation::Rejected(Rejection::OutOfRange)
    );
    assert_eq!(
        nav.request_page(0).await.unwrap(),
        Navigation::Rejected(Rejection::OutOfRange)
    );
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn navigation_requires_an_open_document() {
    let backend = Arc::new(FakeBackend::new(2));
    let (nav, _cache) = navigator(&backend, Duration::ZERO).await;

    assert!(matches!(nav.request_page(2).await, Err(Error::NoActiveDocument)));
    assert!(matches!(nav.next().await, Err(Error::NoActiveDocument)));

    nav.open(PAPER).await.unwrap();
    nav.reset().await;
    assert!(nav.current_page().is_none());
    assert!(matches!(nav.request_page(2).await, Err(Error::NoActiveDocument)));
}

#[tokio::test]
async fn rendered_page_exposes_highlight_and_image_regions() {
    let backend = Arc::new(FakeBackend::new(3));
    let (nav, _cache) = navigator(&backend, Duration::ZERO).await;
    nav.open(PAPER).await.unwrap();
    let Navigation::Loaded(payload) = nav.request_page(2).await.unwrap() else {
        panic!("page 2 should load");
    };

    let mut viewer = Viewer::new();
    let page = viewer.render(&ContentTransformer::default(), &payload);
    assert!(page.html.contains("<math"));
    assert!(page.html.contains(r#"src="https://cdn.example.com/img-2.jpeg""#));

    let intents: Vec<Intent> = page.regions.iter().map(|r| r.intent()).collect();
    assert_eq!(
        intents,
        vec![
            Intent::HighlightClicked("0".to_string()),
            Intent::ImageClicked("https://cdn.example.com/img-2.jpeg".to_string()),
        ]
    );

    viewer.dispatch(intents[0].clone());
    let panel = viewer.panel(&payload).unwrap();
    assert_eq!(panel.articles[0].title, "Background for page 2");
    assert!(viewer.content_blurred());
}
