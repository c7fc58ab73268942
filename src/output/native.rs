//! PDF writers: the wkhtmltopdf command-line tool and renderer print-to-PDF

use crate::output::traits::{DocumentWriter, WriterError, WriterResult};
use crate::render::{PdfOptions, SharedRenderer};
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Margins passed to wkhtmltopdf (one inch)
const MARGIN: &str = "25.4mm";

/// Renders PDFs by piping HTML through `wkhtmltopdf`
#[derive(Debug, Clone)]
pub struct WkhtmltopdfWriter {
    program: String,
}

impl WkhtmltopdfWriter {
    /// Checks that `program` runs and answers `--version`
    pub async fn probe(program: &str) -> WriterResult<Self> {
        let status = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| not_installed(program, e))?;

        if !status.success() {
            return Err(WriterError::NotInstalled {
                tool: program.to_string(),
            });
        }

        tracing::debug!("Found native PDF tool at {}", program);
        Ok(Self {
            program: program.to_string(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl DocumentWriter for WkhtmltopdfWriter {
    fn name(&self) -> &'static str {
        "wkhtmltopdf"
    }

    async fn render(&self, html: &str) -> WriterResult<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(["--quiet", "--encoding", "utf-8", "--page-size", "Letter"])
            .args(["--margin-top", MARGIN, "--margin-bottom", MARGIN])
            .args(["--margin-left", MARGIN, "--margin-right", MARGIN])
            .args(["-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| not_installed(&self.program, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| WriterError::RenderFailed("stdin was not captured".to_string()))?;
        let input = html.as_bytes().to_vec();
        // Feed stdin concurrently so a chatty child cannot block on a full pipe
        let feeder = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child.wait_with_output().await?;
        match feeder.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(WriterError::Io(e)),
            Err(e) => return Err(WriterError::RenderFailed(e.to_string())),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WriterError::RenderFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(WriterError::RenderFailed(format!(
                "{} produced no output",
                self.program
            )));
        }

        Ok(output.stdout)
    }
}

fn not_installed(program: &str, error: io::Error) -> WriterError {
    if error.kind() == io::ErrorKind::NotFound {
        WriterError::NotInstalled {
            tool: program.to_string(),
        }
    } else {
        WriterError::Io(error)
    }
}

/// Renders PDFs with the page renderer's print support
pub struct RendererPdfWriter {
    renderer: SharedRenderer,
    options: PdfOptions,
}

impl RendererPdfWriter {
    pub fn new(renderer: SharedRenderer) -> Self {
        Self {
            renderer,
            options: PdfOptions::default(),
        }
    }
}

#[async_trait]
impl DocumentWriter for RendererPdfWriter {
    fn name(&self) -> &'static str {
        "renderer-print"
    }

    async fn render(&self, html: &str) -> WriterResult<Vec<u8>> {
        let mut renderer = self.renderer.lock().await;
        let bytes = renderer
            .print_to_pdf(html, &self.options)
            .await
            .map_err(|e| WriterError::RenderFailed(e.to_string()))?;

        if bytes.is_empty() {
            return Err(WriterError::RenderFailed(format!(
                "{} renderer returned an empty document",
                renderer.name()
            )));
        }
        Ok(bytes)
    }
}
