//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small documentation site and run
//! the full discover-extract-write cycle into a temporary directory.

mod support;

use doc_mirror::crawler::Coordinator;
use doc_mirror::output::WriterDispatcher;
use doc_mirror::paths::PlatformPolicy;
use doc_mirror::render::RenderError;
use doc_mirror::state::FailureCategory;
use doc_mirror::DocsError;
use std::path::Path;
use std::time::Duration;
use support::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GETTING_STARTED: &str =
    "Install the editor, create a project from a template and open the level viewport.";
const BLUEPRINTS: &str =
    "Blueprints are a visual scripting system that lets designers build gameplay logic.";
const MATERIALS: &str =
    "Materials control how the surface of a mesh reacts to light in the rendered scene.";

/// Serves a sitemap with three documentation pages
async fn mount_three_pages(server: &MockServer) {
    let base = server.uri();
    mount_xml(
        server,
        "/sitemap.xml",
        urlset(&[
            format!("{}/docs/getting-started/", base),
            format!("{}/docs/blueprints/", base),
            format!("{}/docs/materials/", base),
        ]),
    )
    .await;
    mount_html(
        server,
        "/docs/getting-started/",
        doc_page("Getting Started", GETTING_STARTED),
    )
    .await;
    mount_html(server, "/docs/blueprints/", doc_page("Blueprints", BLUEPRINTS)).await;
    mount_html(server, "/docs/materials/", doc_page("Materials", MATERIALS)).await;
}

fn temp_files(dir: &Path) -> Vec<String> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap().filter_map(|entry| entry.ok()) {
        let path = entry.path();
        if path.is_dir() {
            found.extend(temp_files(&path));
        } else if path.to_string_lossy().ends_with(".tmp") {
            found.push(path.display().to_string());
        }
    }
    found
}

#[tokio::test]
async fn test_full_crawl_two_pages() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[
            format!("{}/docs/getting-started/", base),
            format!("{}/docs/blueprints/", base),
        ]),
    )
    .await;
    mount_html(
        &server,
        "/docs/getting-started/",
        doc_page("Getting Started", GETTING_STARTED),
    )
    .await;
    mount_html(&server, "/docs/blueprints/", doc_page("Blueprints", BLUEPRINTS)).await;

    let (mut coordinator, _) = coordinator(test_config(&base, output.path()));
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.total_processed, 2);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 0);
    assert!((summary.success_rate() - 100.0).abs() < 0.01);

    let first = output.path().join("docs/getting-started/Getting_Started.pdf");
    let second = output.path().join("docs/blueprints/Blueprints.pdf");
    assert!(first.is_file(), "missing {}", first.display());
    assert!(second.is_file(), "missing {}", second.display());
    assert!(std::fs::read(&first).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_duplicate_titles_get_suffixes() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[
            format!("{}/docs/guide/intro.html", base),
            format!("{}/docs/guide/setup.html", base),
        ]),
    )
    .await;
    mount_html(
        &server,
        "/docs/guide/intro.html",
        doc_page("Getting Started", GETTING_STARTED),
    )
    .await;
    mount_html(
        &server,
        "/docs/guide/setup.html",
        doc_page("Getting Started", BLUEPRINTS),
    )
    .await;

    let (mut coordinator, _) = coordinator(test_config(&base, output.path()));
    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.successful, 2);

    let dir = output.path().join("docs/guide");
    assert!(dir.join("Getting_Started.pdf").is_file());
    assert!(dir.join("Getting_Started_1.pdf").is_file());
}

#[tokio::test]
async fn test_failed_page_is_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    let missing = format!("{}/docs/missing/", base);
    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/docs/getting-started/", base), missing.clone()]),
    )
    .await;
    mount_html(
        &server,
        "/docs/getting-started/",
        doc_page("Getting Started", GETTING_STARTED),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/missing/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (mut coordinator, _) = coordinator(test_config(&base, output.path()));
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.total_processed, 2);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_urls.len(), 1);
    assert_eq!(summary.failed_urls[0].0, missing);
    assert_eq!(
        summary.failures_by_category.get(&FailureCategory::Network),
        Some(&1)
    );

    let results = coordinator.results();
    assert!(results.is_failed(&missing));
    assert!(!results.is_succeeded(&missing));
}

#[tokio::test]
async fn test_short_page_fails_after_retries() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/docs/stub/", base)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/stub/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Soon</body></html>"))
        .expect(2)
        .mount(&server)
        .await;

    let (mut coordinator, _) = coordinator(test_config(&base, output.path()));
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(
        summary.failures_by_category.get(&FailureCategory::Parsing),
        Some(&1)
    );
}

#[tokio::test]
async fn test_html_fallback_counts_as_success() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/docs/getting-started/", base)]),
    )
    .await;
    mount_html(
        &server,
        "/docs/getting-started/",
        doc_page("Getting Started", GETTING_STARTED),
    )
    .await;

    let config = test_config(&base, output.path());
    let client = client(&config);
    let renderer = http_renderer(&client);
    let writer = WriterDispatcher::new(Some(Box::new(FakePdfWriter { fail: true })), 0)
        .with_retry(fast_retry());
    let mut coordinator =
        Coordinator::from_parts(config, client, renderer, writer, PlatformPolicy::unix());

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.html_fallbacks, 1);

    let html = output.path().join("docs/getting-started/Getting_Started.html");
    let saved = std::fs::read_to_string(html).unwrap();
    assert!(saved.contains(GETTING_STARTED));
    assert!(!saved.contains("Copyright Example"));
}

#[tokio::test]
async fn test_limit_caps_processed_pages() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[
            format!("{}/docs/getting-started/", base),
            format!("{}/docs/blueprints/", base),
        ]),
    )
    .await;
    mount_html(
        &server,
        "/docs/getting-started/",
        doc_page("Getting Started", GETTING_STARTED),
    )
    .await;

    let (coordinator, _) = coordinator(test_config(&base, output.path()));
    let mut coordinator = coordinator.with_limit(Some(1));
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.total_processed, 1);
    assert_eq!(summary.successful, 1);
}

#[tokio::test]
async fn test_nothing_to_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    let (mut coordinator, renderer) = coordinator(test_config(&base, output.path()));
    let result = coordinator.run().await;

    match result {
        Err(DocsError::NothingToCrawl { base_url }) => assert_eq!(base_url, base),
        other => panic!("expected NothingToCrawl, got {:?}", other.map(|s| s.total_processed)),
    }

    // The renderer session is closed on the error path too
    let closed = renderer.lock().await.navigate(&base).await;
    assert!(matches!(closed, Err(RenderError::Closed)));
}

#[tokio::test]
async fn test_interrupt_stops_after_current_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();
    mount_three_pages(&server).await;

    let mut config = test_config(&base, output.path());
    config.crawler.politeness_delay_ms = 500;
    let (mut coordinator, renderer) = coordinator(config);

    let first = output.path().join("docs/getting-started/Getting_Started.pdf");
    let watched = first.clone();
    let shutdown = async move {
        while !watched.exists() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };

    let result = coordinator.run_until(shutdown).await;
    assert!(matches!(result, Err(DocsError::Interrupted)));

    let summary = coordinator.summary().unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.total_processed, 1);
    assert_eq!(summary.successful, 1);
    assert!(first.is_file());
    assert!(!output.path().join("docs/blueprints").exists());
    assert!(!output.path().join("docs/materials").exists());

    let closed = renderer.lock().await.navigate(&base).await;
    assert!(matches!(closed, Err(RenderError::Closed)));
}

#[tokio::test]
async fn test_interrupt_finishes_page_in_flight() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();
    mount_three_pages(&server).await;

    let (mut coordinator, renderer) = coordinator(test_config(&base, output.path()));
    let result = coordinator.run_until(std::future::ready(())).await;
    assert!(matches!(result, Err(DocsError::Interrupted)));

    let summary = coordinator.summary().unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.successful, 1);
    assert!(output
        .path()
        .join("docs/getting-started/Getting_Started.pdf")
        .is_file());
    assert!(temp_files(output.path()).is_empty());

    let closed = renderer.lock().await.navigate(&base).await;
    assert!(matches!(closed, Err(RenderError::Closed)));
}
