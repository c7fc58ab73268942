//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use doc_mirror::config::{parse_config, Config};
use doc_mirror::crawler::{build_http_client, Coordinator, RetryPolicy};
use doc_mirror::output::{DocumentWriter, WriterDispatcher, WriterError, WriterResult};
use doc_mirror::paths::PlatformPolicy;
use doc_mirror::render::{share, HttpRenderer, SharedRenderer};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a validated configuration pointing at a mock site
pub fn test_config(base_url: &str, output_dir: &Path) -> Config {
    parse_config(&format!(
        r#"
[crawler]
base-url = "{}"
docs-path = "/docs/"
politeness-delay-ms = 0
page-load-timeout-secs = 5

[retry]
max-attempts = 2
base-delay-ms = 1
max-delay-ms = 5

[output]
output-dir = '{}'
min-free-space-mb = 0

[writer]
strategy = "html"
"#,
        base_url,
        output_dir.display()
    ))
    .expect("test config should be valid")
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(1))
}

pub fn client(config: &Config) -> Client {
    build_http_client(&config.user_agent, config.crawler.page_load_timeout())
        .expect("client should build")
}

pub fn http_renderer(client: &Client) -> SharedRenderer {
    share(Box::new(HttpRenderer::new(client.clone(), Duration::from_secs(5))))
}

/// PDF writer that emits a tiny fake PDF, or always fails
pub struct FakePdfWriter {
    pub fail: bool,
}

#[async_trait]
impl DocumentWriter for FakePdfWriter {
    fn name(&self) -> &'static str {
        "fake-pdf"
    }

    async fn render(&self, html: &str) -> WriterResult<Vec<u8>> {
        if self.fail {
            return Err(WriterError::RenderFailed("fake writer failure".to_string()));
        }
        Ok(format!("%PDF-1.4\n% {} bytes of html\n%%EOF", html.len()).into_bytes())
    }
}

pub fn pdf_dispatcher() -> WriterDispatcher {
    WriterDispatcher::new(Some(Box::new(FakePdfWriter { fail: false })), 0).with_retry(fast_retry())
}

/// Coordinator over the HTTP renderer and the fake PDF writer
pub fn coordinator(config: Config) -> (Coordinator, SharedRenderer) {
    let client = client(&config);
    let renderer = http_renderer(&client);
    let coordinator = Coordinator::from_parts(
        config,
        client,
        renderer.clone(),
        pdf_dispatcher(),
        PlatformPolicy::unix(),
    );
    (coordinator, renderer)
}

/// A urlset listing `urls`
pub fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|url| format!("  <url><loc>{}</loc></url>\n", url))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        entries
    )
}

/// A sitemap index pointing at `sitemaps`
pub fn sitemap_index(sitemaps: &[String]) -> String {
    let entries: String = sitemaps
        .iter()
        .map(|url| format!("  <sitemap><loc>{}</loc></sitemap>\n", url))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>",
        entries
    )
}

/// A documentation page with chrome around a main region
pub fn doc_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body>
<header>Example Docs</header>
<nav><a href="/docs/">Home</a></nav>
<main>
<h1>{title}</h1>
<p>{body}</p>
</main>
<footer>Copyright Example</footer>
</body>
</html>"#
    )
}

pub async fn mount_xml(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .mount(server)
        .await;
}

pub async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}
