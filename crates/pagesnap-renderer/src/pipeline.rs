//! The DOM snapshot pipeline.
//!
//! Orchestrates diagram pre-rendering and browser evaluation over a
//! caller-owned scratch directory:
//! 1. extract Mermaid blocks from the input HTML
//! 2. compile each block to a PNG (sequential, partial failures allowed)
//! 3. splice image references into the HTML at the recorded spans
//! 4. persist the spliced HTML to the scratch directory
//! 5. evaluate the page in the headless browser and capture the DOM
//!
//! The public entry point catches every pipeline error, logs it, and falls
//! back to returning the original input, so a broken page or external tool
//! degrades the document instead of stopping the surrounding pipeline.

use std::path::{Path, PathBuf};

use pagesnap_diagrams::{MermaidCompiler, extract_blocks, splice_images};

use crate::browser::{BrowserError, HeadlessBrowser};
use crate::outcome::RenderOutcome;

/// Name of the intermediate snapshot written after diagram splicing.
///
/// A diagnostic artifact: inspectable after a run, never read back.
pub const INTERMEDIATE_FILENAME: &str = "post_mermaid_translation.html";

/// Pipeline failure that degrades a render to the original input.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write {}: {source}", .path.display())]
    IntermediateWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    EvaluationFailed(#[from] BrowserError),
}

/// Renders documentation HTML to a browser-evaluated DOM snapshot.
pub struct Renderer {
    browser: HeadlessBrowser,
    compiler: MermaidCompiler,
}

impl Renderer {
    /// Create a renderer from a validated browser driver and a diagram
    /// compiler.
    #[must_use]
    pub fn new(browser: HeadlessBrowser, compiler: MermaidCompiler) -> Self {
        Self { browser, compiler }
    }

    /// Render `html`, using `scratch_dir` for intermediate artifacts.
    ///
    /// Never fails past this boundary: any pipeline error is logged and
    /// the call returns [`RenderOutcome::Degraded`] carrying the input
    /// unchanged.
    ///
    /// The scratch directory must already exist and be writable; it is
    /// consumed, never created or cleaned up. Artifact names are
    /// ordinal-based, so concurrent renders against the same scratch
    /// directory collide.
    #[must_use]
    pub fn render(&self, html: &str, scratch_dir: &Path) -> RenderOutcome {
        match self.try_render(html, scratch_dir) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Render pipeline failed");
                tracing::warn!("Falling back to unrendered input");
                RenderOutcome::Degraded {
                    html: html.to_owned(),
                    reason: e,
                }
            }
        }
    }

    fn try_render(&self, html: &str, scratch_dir: &Path) -> Result<RenderOutcome, RenderError> {
        let blocks = extract_blocks(html);
        tracing::debug!(count = blocks.len(), "Extracted diagram blocks");

        let result = self.compiler.compile_all(&blocks, scratch_dir);
        let warnings: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
        let spliced = splice_images(html, &blocks, &result.compiled);

        let page = scratch_dir.join(INTERMEDIATE_FILENAME);
        std::fs::write(&page, &spliced).map_err(|source| RenderError::IntermediateWrite {
            path: page.clone(),
            source,
        })?;

        tracing::info!(page = %page.display(), "Evaluating page in headless browser");
        let dom = self.browser.dump_dom(&page)?;

        Ok(RenderOutcome::Rendered {
            html: dom,
            warnings,
        })
    }
}
