//! `pagesnap render` command implementation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use pagesnap_config::{CliSettings, Config};
use pagesnap_diagrams::MermaidCompiler;
use pagesnap_renderer::{HeadlessBrowser, RenderOutcome, Renderer};

use crate::error::CliError;
use crate::output::Output;

/// Default scratch directory for intermediate artifacts.
const DEFAULT_SCRATCH_DIR: &str = ".pagesnap";

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// HTML document to render.
    input: PathBuf,

    /// Output file (default: stdout).
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Scratch directory for intermediate artifacts (default: .pagesnap).
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover pagesnap.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Headless browser command or path (overrides config).
    #[arg(long)]
    browser: Option<String>,

    /// Mermaid compiler command or path (overrides config).
    #[arg(long)]
    mmdc: Option<String>,

    /// Virtual time budget for the browser, in milliseconds (overrides config).
    #[arg(long)]
    virtual_time_budget_ms: Option<u32>,

    /// Enable verbose output (show pipeline progress logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, browser setup, or file I/O
    /// fails. A degraded render is not an error: the original input is
    /// written out and a warning is printed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        // Build CLI settings from args
        let cli_settings = CliSettings {
            browser_program: self.browser,
            virtual_time_budget_ms: self.virtual_time_budget_ms,
            mermaid_program: self.mmdc,
            theme: None,
            scale: None,
        };

        // Load config
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        // The render pipeline only consumes the scratch directory; its
        // lifecycle is owned here.
        let scratch_dir = self
            .scratch_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR));
        ensure_scratch_dir(&scratch_dir)?;

        let browser = HeadlessBrowser::setup(&config.browser.program)?
            .virtual_time_budget_ms(config.browser.virtual_time_budget_ms);
        let compiler = MermaidCompiler::new(&config.diagrams.program)
            .theme(&config.diagrams.theme)
            .scale(config.diagrams.scale);
        let renderer = Renderer::new(browser, compiler);

        let html = fs::read_to_string(&self.input)?;
        tracing::info!(input = %self.input.display(), "Rendering document");
        let outcome = renderer.render(&html, &scratch_dir);

        for warning in outcome.warnings() {
            output.warning(&format!("Warning: {warning}"));
        }
        if let RenderOutcome::Degraded { reason, .. } = &outcome {
            output.warning(&format!("Render degraded to original input: {reason}"));
        }

        match &self.out {
            Some(path) => {
                fs::write(path, outcome.html())?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => {
                std::io::stdout().write_all(outcome.html().as_bytes())?;
            }
        }

        if self.verbose {
            output.info(&format!(
                "Scratch artifacts in {}",
                scratch_dir.display()
            ));
        }

        Ok(())
    }
}

/// Ensure the scratch directory exists.
fn ensure_scratch_dir(dir: &Path) -> Result<(), CliError> {
    fs::create_dir_all(dir)?;
    Ok(())
}
