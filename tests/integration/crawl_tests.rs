//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the full
//! generate, fetch, extract and download cycle end-to-end.

use img_harvest::config::{parse_config, Config};
use img_harvest::crawler::{destination_path, run_crawl, Coordinator};
use img_harvest::output::{ChannelObserver, CrawlEvent, CrawlObserver, ProgressEvent};
use img_harvest::state::{DownloadStatus, RunState};
use img_harvest::{DownloadResult, HarvestError, ImageDescriptor, RunStatistics};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Observer that keeps every notification for later assertions
///
/// Clones share the recorded notifications.
#[derive(Clone, Default)]
struct RecordingObserver {
    progress: Arc<Mutex<Vec<ProgressEvent>>>,
    found: Arc<Mutex<Vec<ImageDescriptor>>>,
    finished: Arc<Mutex<Vec<Vec<DownloadResult>>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl CrawlObserver for RecordingObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        self.progress.lock().unwrap().push(event.clone());
    }

    fn on_images_found(&self, images: &[ImageDescriptor]) {
        self.found.lock().unwrap().extend_from_slice(images);
    }

    fn on_finished(&self, results: &[DownloadResult]) {
        self.finished.lock().unwrap().push(results.to_vec());
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(url: String, save_path: &Path) -> Config {
    let mut config = Config::new(url);
    config.save_path = save_path.to_path_buf();
    config.concurrent = 2;
    config
}

async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, route: &str, bytes: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .mount(server)
        .await;
}

fn saved_path(save_root: &Path, image_url: &str, filename: &str) -> std::path::PathBuf {
    let url = url::Url::parse(image_url).expect("Failed to parse image URL");
    destination_path(save_root, &url, filename, true)
}

#[tokio::test]
async fn test_full_crawl_over_url_range() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/1/page.html", r#"<img src="/img/one.png" alt="one">"#).await;
    // Same image again plus a relative one
    mount_page(
        &server,
        "/2/page.html",
        r#"<img src="/img/one.png"><img src="two.jpg">"#,
    )
    .await;
    mount_page(&server, "/3/page.html", r#"<img data-src="/img/three.gif">"#).await;

    Mock::given(method("GET"))
        .and(path("/img/one.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 100]))
        .expect(1)
        .mount(&server)
        .await;
    mount_image(&server, "/2/two.jpg", vec![2u8; 200]).await;
    mount_image(&server, "/img/three.gif", vec![3u8; 300]).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(format!("{}/{{}}/page.html", base), dir.path());
    config.repeat_enabled = true;
    config.start_value = 1;
    config.end_value = 3;
    config.step_value = 1;

    let observer = RecordingObserver::default();
    let mut coordinator = Coordinator::new(config).with_observer(observer.clone());
    let results = coordinator.crawl().await.unwrap();

    assert_eq!(coordinator.state(), RunState::Completed);
    assert_eq!(results.len(), 3);
    assert!(results
        .iter()
        .all(|r| r.success && r.status == DownloadStatus::Downloaded));

    let mut urls: Vec<_> = results.iter().map(|r| r.url.clone()).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/2/two.jpg", base),
            format!("{}/img/one.png", base),
            format!("{}/img/three.gif", base),
        ]
    );

    let one = saved_path(dir.path(), &format!("{}/img/one.png", base), "one.png");
    assert_eq!(std::fs::read(&one).unwrap(), vec![1u8; 100]);
    let three = saved_path(dir.path(), &format!("{}/img/three.gif", base), "three.gif");
    assert_eq!(std::fs::metadata(&three).unwrap().len(), 300);

    let stats = RunStatistics::from_results(&results);
    assert_eq!(stats.success, 3);
    assert_eq!(stats.total_bytes, 600);

    // Cross-page dedup: observers only ever see each URL once
    assert_eq!(observer.found.lock().unwrap().len(), 3);
    assert_eq!(observer.finished.lock().unwrap().len(), 1);
    assert!(observer.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_phases() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/1", r#"<img src="/a.png">"#).await;
    mount_page(&server, "/2", r#"<img src="/b.png">"#).await;
    mount_image(&server, "/a.png", vec![0u8; 8]).await;
    mount_image(&server, "/b.png", vec![0u8; 8]).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(format!("{}/{{}}", base), dir.path());
    config.repeat_enabled = true;
    config.start_value = 1;
    config.end_value = 2;

    let observer = RecordingObserver::default();
    let mut coordinator = Coordinator::new(config).with_observer(observer.clone());
    coordinator.crawl().await.unwrap();

    let events = observer.progress.lock().unwrap();
    assert_eq!(events.first().unwrap().percent, 0);
    assert_eq!(events.last().unwrap().percent, 100);

    let start_download = events
        .iter()
        .position(|e| e.message.starts_with("Starting download"))
        .expect("download phase event");
    assert_eq!(events[start_download].percent, 50);
    assert!(events[..start_download].iter().all(|e| e.percent <= 50));
    assert!(events[start_download..]
        .iter()
        .all(|e| (50..=100).contains(&e.percent)));
}

#[tokio::test]
async fn test_image_failures_are_isolated() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/gallery",
        r#"<img src="/ok.png"><img src="/missing.png"><img src="/broken.png">"#,
    )
    .await;
    mount_image(&server, "/ok.png", vec![7u8; 42]).await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(format!("{}/gallery", base), dir.path());

    let observer = RecordingObserver::default();
    let results = run_crawl(config, observer.clone()).await.unwrap();

    assert_eq!(results.len(), 3);

    let find = |suffix: &str| {
        results
            .iter()
            .find(|r| r.url.ends_with(suffix))
            .expect("result for every image")
    };

    assert!(find("/ok.png").success);

    let missing = find("/missing.png");
    assert!(!missing.success);
    assert_eq!(missing.status, DownloadStatus::Failed);
    assert!(missing.error.as_deref().unwrap().contains("404"));

    let broken = find("/broken.png");
    assert!(!broken.success);
    assert!(broken.error.as_deref().unwrap().contains("HTTP 500"));

    let finished = observer.finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].len(), 3);
}

#[tokio::test]
async fn test_failed_page_does_not_abort_run() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/1", r#"<img src="/a.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "/3", r#"<img src="/c.png">"#).await;
    mount_image(&server, "/a.png", vec![1u8; 4]).await;
    mount_image(&server, "/c.png", vec![3u8; 4]).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(format!("{}/{{}}", base), dir.path());
    config.repeat_enabled = true;
    config.start_value = 1;
    config.end_value = 3;

    let mut coordinator = Coordinator::new(config);
    let results = coordinator.crawl().await.unwrap();

    assert_eq!(coordinator.state(), RunState::Completed);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    assert_eq!(coordinator.progress().processed_urls, 3);
    assert!(coordinator.diagnostics().contains("HTTP 503"));
}

#[tokio::test]
async fn test_existing_file_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/gallery", r#"<img src="/cat.png">"#).await;
    mount_image(&server, "/cat.png", b"fresh bytes".to_vec()).await;

    let dir = tempfile::tempdir().unwrap();
    let existing = saved_path(dir.path(), &format!("{}/cat.png", base), "cat.png");
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, b"old").unwrap();

    let config = create_test_config(format!("{}/gallery", base), dir.path());
    let mut coordinator = Coordinator::new(config);
    let results = coordinator.crawl().await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].status, DownloadStatus::SkippedExists);
    assert_eq!(results[0].status.as_str(), "skipped (already exists)");
    assert_eq!(results[0].size, 3);
    assert_eq!(std::fs::read(&existing).unwrap(), b"old");
}

#[tokio::test]
async fn test_url_cap_rejected_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(format!("{}/{{}}", server.uri()), dir.path());
    config.repeat_enabled = true;
    config.start_value = 1;
    config.end_value = 1001;

    let observer = RecordingObserver::default();
    let mut coordinator = Coordinator::new(config).with_observer(observer.clone());
    let err = coordinator.crawl().await.unwrap_err();

    assert!(matches!(err, HarvestError::Config(_)));
    assert_eq!(coordinator.state(), RunState::Failed);
    assert_eq!(observer.errors.lock().unwrap().len(), 1);
    assert!(observer.finished.lock().unwrap().is_empty());
    assert!(observer.progress.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_stop_before_start_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<img src="/a.png">"#))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(format!("{}/gallery", server.uri()), dir.path());

    let observer = RecordingObserver::default();
    let mut coordinator = Coordinator::new(config).with_observer(observer.clone());
    coordinator.handle().stop();

    let results = coordinator.crawl().await.unwrap();

    assert!(results.is_empty());
    assert_eq!(coordinator.state(), RunState::Cancelled);
    assert!(observer.finished.lock().unwrap().is_empty());
    assert!(observer.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_selectors_limit_extraction() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/gallery",
        r#"<html><body>
            <header><img src="/logo.png"></header>
            <div class="gallery">
                <img src="/photos/a.jpg" title="A">
                <img data-original="/photos/b.webp">
            </div>
        </body></html>"#,
    )
    .await;
    mount_image(&server, "/photos/a.jpg", vec![1u8; 10]).await;
    mount_image(&server, "/photos/b.webp", vec![2u8; 10]).await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(format!("{}/gallery", base), dir.path());
    config.selectors = vec!["div.gallery img".to_string(), "[[broken".to_string()];

    let mut coordinator = Coordinator::new(config);
    let results = coordinator.crawl().await.unwrap();

    assert_eq!(results.len(), 2);
    let found = coordinator.found_images();
    assert_eq!(found[0].url, format!("{}/photos/a.jpg", base));
    assert_eq!(found[0].title, "A");
    assert_eq!(found[0].selector, "div.gallery img");
    assert_eq!(found[1].url, format!("{}/photos/b.webp", base));
    assert!(coordinator.diagnostics().contains("[[broken"));
}

#[tokio::test]
async fn test_channel_observer_receives_run_events() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/gallery", r#"<img src="/a.png">"#).await;
    mount_image(&server, "/a.png", vec![9u8; 16]).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(format!("{}/gallery", base), dir.path());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let results = run_crawl(config, ChannelObserver::new(tx)).await.unwrap();
    assert_eq!(results.len(), 1);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(
        events.first(),
        Some(CrawlEvent::Progress(ProgressEvent { percent: 0, .. }))
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, CrawlEvent::ImagesFound(images) if images.len() == 1)));
    match events.last() {
        Some(CrawlEvent::Finished(finished)) => assert_eq!(finished, &results),
        other => panic!("expected Finished last, got {:?}", other),
    }
    assert!(!events.iter().any(|e| matches!(e, CrawlEvent::Error(_))));
}

#[tokio::test]
async fn test_crawl_from_toml_config() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/gallery", r#"<img src="/a.png"><img src="/b.png">"#).await;
    mount_image(&server, "/a.png", vec![1u8; 5]).await;
    mount_image(&server, "/b.png", vec![2u8; 5]).await;

    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        r#"
url = "{}/gallery"
save_path = {:?}
create_subfolder = false
filename_pattern = 2
concurrent = 1
"#,
        base,
        dir.path().to_string_lossy()
    );
    let config = parse_config(&toml).unwrap();

    let results = run_crawl(config, img_harvest::output::NullObserver)
        .await
        .unwrap();

    // Index prefixes follow dispatch order: a.png then b.png
    assert_eq!(results[0].filename.as_deref(), Some("0000_a.png"));
    assert_eq!(results[1].filename.as_deref(), Some("0001_b.png"));
    assert!(dir.path().join("0000_a.png").exists());
    assert!(dir.path().join("0001_b.png").exists());
}

#[tokio::test]
async fn test_stop_during_fetch_drains_in_flight_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path_regex(r"^/page/\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<img src="/img/shared.png">"#)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/shared.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(format!("{}/page/{{}}", base), dir.path());
    config.repeat_enabled = true;
    config.start_value = 1;
    config.end_value = 10;

    let observer = RecordingObserver::default();
    let mut coordinator = Coordinator::new(config).with_observer(observer.clone());

    let handle = coordinator.handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();
    });

    let results = coordinator.crawl().await.unwrap();

    let page_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/page/"))
        .count();

    // Only the pages already holding a permit were requested
    assert!(page_requests >= 1);
    assert!(page_requests < 10);

    assert!(results.is_empty());
    assert_eq!(coordinator.state(), RunState::Cancelled);
    assert_eq!(coordinator.progress().processed_urls, 10);
    // In-flight pages finished and were still extracted
    assert_eq!(coordinator.found_images().len(), 1);
    assert!(observer.finished.lock().unwrap().is_empty());
    assert!(observer.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_stop_during_download_returns_partial_results() {
    let server = MockServer::start().await;
    let base = server.uri();

    let html: String = (0..20)
        .map(|i| format!(r#"<img src="/img/{}.png">"#, i))
        .collect();
    mount_page(&server, "/gallery", &html).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/\d+\.png$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![5u8; 32])
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(format!("{}/gallery", base), dir.path());
    config.download_concurrent = Some(2);

    let observer = RecordingObserver::default();
    let mut coordinator = Coordinator::new(config).with_observer(observer.clone());

    let handle = coordinator.handle();
    tokio::spawn(async move {
        while handle.progress().found_images < 20 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();
    });

    let results = coordinator.crawl().await.unwrap();

    // Every discovered image still gets exactly one record
    assert_eq!(results.len(), 20);
    assert_eq!(coordinator.state(), RunState::Cancelled);

    let image_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/img/"))
        .count();
    let saved = results.iter().filter(|r| r.success).count();
    let cancelled: Vec<_> = results
        .iter()
        .filter(|r| r.error.as_deref() == Some("Download cancelled"))
        .collect();

    assert!(saved >= 1);
    assert_eq!(saved, image_requests);
    assert_eq!(saved + cancelled.len(), 20);
    assert!(cancelled
        .iter()
        .all(|r| !r.success && r.status == DownloadStatus::Failed));

    assert!(observer.finished.lock().unwrap().is_empty());
    assert!(observer.errors.lock().unwrap().is_empty());
    assert!(observer
        .progress
        .lock()
        .unwrap()
        .iter()
        .all(|e| e.percent < 100));
}
