//! DOM snapshot rendering for pagesnap.
//!
//! This crate drives a headless browser binary to fully evaluate a
//! documentation page (scripts and styles included) and capture the
//! resulting DOM, after pre-rasterizing embedded Mermaid blocks via
//! `pagesnap-diagrams`:
//! - [`HeadlessBrowser`]: binary resolution at setup, `--dump-dom`
//!   invocation with a fixed flag set and a virtual time budget
//! - [`Renderer`]: the extract, compile, splice, persist, evaluate
//!   pipeline with a log-and-degrade boundary
//! - [`RenderOutcome`]: explicit rendered-vs-degraded signal that still
//!   always carries usable HTML
//!
//! # Example
//!
//! ```ignore
//! use pagesnap_diagrams::MermaidCompiler;
//! use pagesnap_renderer::{HeadlessBrowser, Renderer};
//!
//! let browser = HeadlessBrowser::setup("chromium-browser")?;
//! let renderer = Renderer::new(browser, MermaidCompiler::new("mmdc"));
//! let outcome = renderer.render(&html, scratch_dir);
//! let evaluated = outcome.into_html();
//! ```

mod browser;
mod outcome;
mod pipeline;

pub use browser::{
    BrowserError, DEFAULT_VIRTUAL_TIME_BUDGET_MS, HeadlessBrowser, SetupError,
};
pub use outcome::RenderOutcome;
pub use pipeline::{INTERMEDIATE_FILENAME, RenderError, Renderer};
