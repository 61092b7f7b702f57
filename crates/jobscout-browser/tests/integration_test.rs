use jobscout_browser::{BrowserEngine, LaunchOptions, PageDriver};
use std::time::{Duration, Instant};

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_browser_engine_creation() {
    let engine = BrowserEngine::new().await;
    assert!(engine.is_ok(), "Failed to create browser engine");
    engine.unwrap().close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_navigation_and_lookup() {
    let engine = BrowserEngine::new().await.unwrap();

    let landed = engine.navigate("https://example.com").await.unwrap();
    assert!(landed.starts_with("https://example.com"));
    assert!(!engine.page_title().await.unwrap().is_empty());

    let headings = engine.locate("h1").await.unwrap();
    assert_eq!(headings.len(), 1);
    assert!(!engine.read_text(&headings[0]).await.unwrap().is_empty());

    let links = engine.locate("a").await.unwrap();
    assert!(engine.attribute(&links[0], "href").await.unwrap().is_some());

    assert!(engine.wait_for("table.absent", 500).await.is_err());
    engine.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_rate_limiting() {
    let mut options = LaunchOptions::randomized();
    options.min_navigation_interval = Duration::from_millis(1500);
    let engine = BrowserEngine::launch(options).await.unwrap();

    engine.navigate("https://example.com").await.unwrap();

    // Second navigation to the same host is delayed, not rejected
    let started = Instant::now();
    assert!(engine.navigate("https://example.com/page2").await.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(1000));
    engine.close().await.unwrap();
}
