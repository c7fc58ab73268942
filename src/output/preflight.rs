//! Environment check run by `--check`

use crate::output::writer::{WriterCapabilities, WriterStrategy};
use std::path::{Path, PathBuf};

const PROBE_FILE: &str = ".doc-mirror-write-probe";

/// What the environment offers for a crawl
#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub output_dir: PathBuf,
    pub strategy: WriterStrategy,
    pub native_tool: Option<String>,
    pub renderer_pdf: bool,
    pub output_writable: bool,
    /// Free bytes in the output directory, when readable
    pub free_space: Option<u64>,
    pub min_free_space: u64,
}

impl PreflightReport {
    /// Creates the output directory if needed and probes it
    pub async fn run(capabilities: &WriterCapabilities, output_dir: &Path, min_free_space: u64) -> Self {
        let output_writable = probe_writable(output_dir).await;
        let free_space = fs2::available_space(output_dir).ok();

        Self {
            output_dir: output_dir.to_path_buf(),
            strategy: capabilities.strategy,
            native_tool: capabilities
                .native
                .as_ref()
                .map(|writer| writer.program().to_string()),
            renderer_pdf: capabilities.renderer_pdf,
            output_writable,
            free_space,
            min_free_space,
        }
    }

    /// True when a crawl can write artifacts
    ///
    /// An HTML-only strategy still counts as ready.
    pub fn is_ready(&self) -> bool {
        self.output_writable && self.free_space.map_or(true, |free| free >= self.min_free_space)
    }

    pub fn print(&self) {
        println!("=== Environment Check ===\n");

        println!("PDF writer:");
        println!("  Strategy: {}", self.strategy);
        match &self.native_tool {
            Some(tool) => println!("  Native tool: {}", tool),
            None => println!("  Native tool: not found"),
        }
        println!(
            "  Renderer print-to-PDF: {}",
            if self.renderer_pdf { "yes" } else { "no" }
        );
        println!();

        println!("Output directory: {}", self.output_dir.display());
        println!(
            "  Writable: {}",
            if self.output_writable { "yes" } else { "no" }
        );
        match self.free_space {
            Some(free) => println!(
                "  Free space: {} MiB (minimum {} MiB)",
                free / (1024 * 1024),
                self.min_free_space / (1024 * 1024)
            ),
            None => println!("  Free space: unknown"),
        }
        println!();

        println!("Ready: {}", if self.is_ready() { "yes" } else { "no" });
    }
}

async fn probe_writable(dir: &Path) -> bool {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!("Cannot create {}: {}", dir.display(), e);
        return false;
    }

    let probe = dir.join(PROBE_FILE);
    match tokio::fs::write(&probe, b"ok").await {
        Ok(()) => {
            tokio::fs::remove_file(&probe).await.ok();
            true
        }
        Err(e) => {
            tracing::warn!("Cannot write to {}: {}", dir.display(), e);
            false
        }
    }
}
