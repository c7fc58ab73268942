//! Integration tests for path building and artifact writing
//!
//! These tests drive the path builder and the writer dispatcher together
//! against temporary directories.

mod support;

use doc_mirror::output::{ArtifactTarget, WriteOutcome, WriterDispatcher};
use doc_mirror::paths::{sanitize_with, PathBuilder, PlatformPolicy};
use std::path::Path;
use support::*;
use tempfile::TempDir;

fn builder(base: &Path, policy: PlatformPolicy) -> PathBuilder {
    PathBuilder::new(base, policy).with_retry(fast_retry())
}

fn temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect()
}

async fn write_page(
    builder: &PathBuilder,
    dispatcher: &WriterDispatcher,
    url: &str,
    title: &str,
) -> WriteOutcome {
    let dir = builder.build(url).await;
    let policy = builder.policy();
    let name = sanitize_with(title, policy.max_filename_len, policy);
    let stem = builder.unique_stem(&dir, &name);
    let target = ArtifactTarget::plan(builder, &dir, &stem);
    dispatcher.write("<main><p>content</p></main>", title, &target).await
}

#[tokio::test]
async fn test_unavailable_writer_produces_html() {
    let output = TempDir::new().unwrap();
    let builder = builder(output.path(), PlatformPolicy::unix());
    let dispatcher = WriterDispatcher::new(None, 0).with_retry(fast_retry());

    let outcome = write_page(
        &builder,
        &dispatcher,
        "https://docs.example.com/5.3/en-US/lighting/",
        "Lighting: Overview",
    )
    .await;

    assert!(outcome.is_success());
    let path = outcome.path().unwrap().to_path_buf();
    assert_eq!(path.extension().unwrap(), "html");
    assert!(path.starts_with(output.path().join("5.3/en-US/lighting")));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(!name.contains(':'));
    assert!(std::fs::read_to_string(&path)
        .unwrap()
        .contains("<title>Lighting: Overview</title>"));
}

#[tokio::test]
async fn test_failing_writer_leaves_no_temp_files() {
    let output = TempDir::new().unwrap();
    let builder = builder(output.path(), PlatformPolicy::unix());
    let dispatcher =
        WriterDispatcher::new(Some(Box::new(FakePdfWriter { fail: true })), 0).with_retry(fast_retry());

    let outcome = write_page(
        &builder,
        &dispatcher,
        "https://docs.example.com/docs/materials/",
        "Materials",
    )
    .await;

    assert!(matches!(outcome, WriteOutcome::Fallback { .. }));
    let dir = output.path().join("docs/materials");
    assert!(dir.join("Materials.html").is_file());
    assert!(!dir.join("Materials.pdf").exists());
    assert!(temp_files(&dir).is_empty());
}

#[tokio::test]
async fn test_insufficient_space_falls_back_to_html() {
    let output = TempDir::new().unwrap();
    let builder = builder(output.path(), PlatformPolicy::unix());
    let dispatcher = WriterDispatcher::new(Some(Box::new(FakePdfWriter { fail: false })), u64::MAX)
        .with_retry(fast_retry());

    let outcome = write_page(
        &builder,
        &dispatcher,
        "https://docs.example.com/docs/audio/",
        "Audio",
    )
    .await;

    match outcome {
        WriteOutcome::Fallback { path, reason } => {
            assert_eq!(path, output.path().join("docs/audio/Audio.html"));
            assert!(reason.contains("disk space"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_html_artifact_blocks_name_reuse() {
    let output = TempDir::new().unwrap();
    let builder = builder(output.path(), PlatformPolicy::unix());
    let html_only = WriterDispatcher::new(None, 0).with_retry(fast_retry());
    let pdf = pdf_dispatcher();
    let url = "https://docs.example.com/docs/niagara/";

    let first = write_page(&builder, &html_only, url, "Niagara").await;
    let second = write_page(&builder, &pdf, url, "Niagara").await;

    let dir = output.path().join("docs/niagara");
    assert_eq!(first.path(), Some(dir.join("Niagara.html").as_path()));
    assert_eq!(second, WriteOutcome::Primary(dir.join("Niagara_1.pdf")));
}

#[tokio::test]
async fn test_traversal_and_reserved_names_stay_inside_output() {
    let output = TempDir::new().unwrap();
    let builder = builder(output.path(), PlatformPolicy::windows());
    let dispatcher = pdf_dispatcher();

    let outcome = write_page(
        &builder,
        &dispatcher,
        "https://docs.example.com/docs/%2E%2E/%2E%2E/etc/CON/",
        "NUL",
    )
    .await;

    let path = outcome.path().unwrap().to_path_buf();
    assert!(path.starts_with(output.path()));
    for component in path.strip_prefix(output.path()).unwrap().components() {
        let part = component.as_os_str().to_string_lossy();
        assert_ne!(part, "..");
        let stem = part.split('.').next().unwrap().to_ascii_uppercase();
        assert!(stem != "CON" && stem != "NUL", "reserved name in {}", path.display());
    }
}

#[tokio::test]
async fn test_long_titles_fit_the_path_bound() {
    let output = TempDir::new().unwrap();
    let policy = PlatformPolicy::windows();
    let max_path = policy.max_path_len;
    let builder = builder(output.path(), policy);
    let dispatcher = pdf_dispatcher();

    let deep = format!(
        "https://docs.example.com/{}/",
        (0..12)
            .map(|i| format!("section-{}-{}", i, "x".repeat(30)))
            .collect::<Vec<_>>()
            .join("/")
    );
    let title = "A very long page title ".repeat(20);

    let outcome = write_page(&builder, &dispatcher, &deep, &title).await;
    let path = outcome.path().unwrap();
    assert!(path.is_file());

    let name = path.file_stem().unwrap().to_string_lossy().into_owned();
    assert!(name.chars().count() <= 50);
    if output.path().to_string_lossy().chars().count() < 60 {
        assert!(path.to_string_lossy().chars().count() <= max_path);
    }
}

#[tokio::test]
async fn test_long_output_dir_keeps_duplicates_apart() {
    let temp = TempDir::new().unwrap();
    let pad = 150usize.saturating_sub(temp.path().to_string_lossy().chars().count() + 1);
    let output = temp.path().join("o".repeat(pad.max(1)));
    std::fs::create_dir_all(&output).unwrap();

    let builder = builder(&output, PlatformPolicy::windows());
    let dispatcher = pdf_dispatcher();
    let title = "Working with Skeletal Meshes and Animation Blueprints";
    let url = "https://docs.example.com/";

    let first = write_page(&builder, &dispatcher, url, title).await;
    let second = write_page(&builder, &dispatcher, url, title).await;

    let first = first.path().unwrap().to_path_buf();
    let second = second.path().unwrap().to_path_buf();
    assert_ne!(first, second);
    assert!(first.is_file());
    assert!(second.is_file());
    assert!(second
        .file_stem()
        .unwrap()
        .to_string_lossy()
        .ends_with("_1"));
}
