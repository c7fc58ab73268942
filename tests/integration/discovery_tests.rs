//! Integration tests for URL discovery
//!
//! Each test serves a sitemap layout from wiremock and checks which tier
//! produced the URLs and in what order.

mod support;

use doc_mirror::config::Config;
use doc_mirror::crawler::{Discovery, Tier, TierOutcome};
use support::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHALLENGE_PAGE: &str =
    "<html><head><title>Just a moment...</title></head><body>Checking your browser</body></html>";

fn discovery(base: &str, output: &TempDir) -> Discovery {
    discovery_with(test_config(base, output.path()))
}

fn discovery_with(config: Config) -> Discovery {
    let client = client(&config);
    let renderer = http_renderer(&client);
    Discovery::new(&config, client, renderer)
}

/// Serves `body` as an HTML page at `route`, at most `times` times when given
fn html_response(route: &str, body: String, times: Option<u64>) -> Mock {
    let mock = Mock::given(method("GET")).and(path(route)).respond_with(
        ResponseTemplate::new(200)
            .set_body_string(body)
            .insert_header("content-type", "text/html"),
    );
    match times {
        Some(n) => mock.up_to_n_times(n),
        None => mock,
    }
}

#[tokio::test]
async fn test_sitemap_with_three_entries() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    let urls = vec![
        format!("{}/docs/a/", base),
        format!("{}/docs/b/", base),
        format!("{}/docs/c/", base),
    ];
    mount_xml(&server, "/sitemap.xml", urlset(&urls)).await;

    let found = discovery(&base, &output).discover().await;
    assert_eq!(found, urls);
}

#[tokio::test]
async fn test_sitemap_index_is_followed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_xml(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{}/sitemap-guides.xml", base),
            format!("{}/sitemap-api.xml", base),
        ]),
    )
    .await;
    mount_xml(
        &server,
        "/sitemap-guides.xml",
        urlset(&[format!("{}/docs/guides/intro/", base)]),
    )
    .await;
    mount_xml(
        &server,
        "/sitemap-api.xml",
        urlset(&[
            format!("{}/docs/api/actors/", base),
            format!("{}/docs/guides/intro/", base),
        ]),
    )
    .await;

    let found = discovery(&base, &output).discover().await;
    assert_eq!(
        found,
        vec![
            format!("{}/docs/guides/intro/", base),
            format!("{}/docs/api/actors/", base),
        ]
    );
}

#[tokio::test]
async fn test_self_referencing_index_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_xml(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{}/sitemap.xml", base),
            format!("{}/sitemap-pages.xml", base),
        ]),
    )
    .await;
    mount_xml(
        &server,
        "/sitemap-pages.xml",
        urlset(&[format!("{}/docs/only/", base)]),
    )
    .await;

    let found = discovery(&base, &output).discover().await;
    assert_eq!(found, vec![format!("{}/docs/only/", base)]);
}

#[tokio::test]
async fn test_out_of_scope_urls_are_dropped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[
            format!("{}/blog/release-notes/", base),
            format!("{}/docs/lighting/#overview", base),
            format!("{}/docs/lighting/", base),
        ]),
    )
    .await;

    let found = discovery(&base, &output).discover().await;
    assert_eq!(found, vec![format!("{}/docs/lighting/", base)]);
}

#[tokio::test]
async fn test_forbidden_sitemap_falls_through_to_navigation() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(403).set_body_string("403 Forbidden"))
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/docs/",
        r#"<html><body>
        <nav>
          <a href="/docs/getting-started/">Getting Started</a>
          <a href="/docs/blueprints/">Blueprints</a>
          <a href="/pricing/">Pricing</a>
        </nav>
        <main><a href="/docs/getting-started/">Start here</a></main>
        </body></html>"#
            .to_string(),
    )
    .await;

    let discovery = discovery(&base, &output);
    assert!(matches!(
        discovery.run_tier(Tier::Sitemap).await,
        TierOutcome::Failed(_)
    ));

    let found = discovery.discover().await;
    assert_eq!(
        found,
        vec![
            format!("{}/docs/getting-started/", base),
            format!("{}/docs/blueprints/", base),
        ]
    );
}

#[tokio::test]
async fn test_error_page_with_success_status_is_not_a_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    mount_html(
        &server,
        "/sitemap.xml",
        CHALLENGE_PAGE.to_string(),
    )
    .await;

    let discovery = discovery(&base, &output);
    assert!(matches!(
        discovery.run_tier(Tier::Sitemap).await,
        TierOutcome::Failed(_)
    ));
    assert!(matches!(
        discovery.run_tier(Tier::RenderedSitemap).await,
        TierOutcome::Failed(_)
    ));
    assert!(discovery.discover().await.is_empty());
}

#[tokio::test]
async fn test_rendered_sitemap_with_embedded_xml() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    let xml = urlset(&[format!("{}/docs/materials/", base)]);
    let viewer = format!(
        "<html><body><pre>{}</pre></body></html>",
        xml.replace('<', "&lt;").replace('>', "&gt;")
    );
    mount_html(&server, "/sitemap.xml", viewer).await;

    let discovery = discovery(&base, &output);
    match discovery.run_tier(Tier::RenderedSitemap).await {
        TierOutcome::Found(urls) => {
            assert_eq!(urls, vec![format!("{}/docs/materials/", base)])
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_transient_sitemap_failure_is_retried() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&[format!("{}/docs/retry/", base)]),
    )
    .await;

    let discovery = discovery(&base, &output);
    match discovery.run_tier(Tier::Sitemap).await {
        TierOutcome::Found(urls) => assert_eq!(urls, vec![format!("{}/docs/retry/", base)]),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_rendered_error_page_gets_one_more_attempt() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    html_response("/sitemap.xml", CHALLENGE_PAGE.to_string(), None)
        .expect(2)
        .mount(&server)
        .await;

    let mut config = test_config(&base, output.path());
    config.retry.max_attempts = 3;
    let discovery = discovery_with(config);

    assert!(matches!(
        discovery.run_tier(Tier::RenderedSitemap).await,
        TierOutcome::Failed(_)
    ));
    server.verify().await;
}

#[tokio::test]
async fn test_rendered_sitemap_recovers_after_error_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = TempDir::new().unwrap();

    let xml = urlset(&[format!("{}/docs/landscapes/", base)]);
    let viewer = format!(
        "<html><body><pre>{}</pre></body></html>",
        xml.replace('<', "&lt;").replace('>', "&gt;")
    );
    html_response("/sitemap.xml", CHALLENGE_PAGE.to_string(), Some(1))
        .expect(1)
        .mount(&server)
        .await;
    html_response("/sitemap.xml", viewer, None)
        .expect(1)
        .mount(&server)
        .await;

    let discovery = discovery(&base, &output);
    match discovery.run_tier(Tier::RenderedSitemap).await {
        TierOutcome::Found(urls) => {
            assert_eq!(urls, vec![format!("{}/docs/landscapes/", base)])
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    server.verify().await;
}
