//! Mermaid diagram pre-rendering for pagesnap.
//!
//! This crate locates Mermaid blocks embedded in documentation HTML,
//! rasterizes each one to a PNG by invoking an external compiler, and
//! splices image references back into the HTML:
//! - [`extract_blocks`]: marker scanning with captured byte spans
//! - [`MermaidCompiler`]: sequential per-diagram subprocess invocation
//! - [`splice_images`]: offset-based substitution in a single rebuild pass
//!
//! Compilation failures are partial, not fatal: a failed block keeps its
//! original markup and is reported in
//! [`PartialCompileResult::errors`].
//!
//! # Example
//!
//! ```ignore
//! use pagesnap_diagrams::{MermaidCompiler, extract_blocks, splice_images};
//!
//! let html = r#"<pre class="mermaid"><code>graph TD;A--&gt;B;</code></pre>"#;
//! let blocks = extract_blocks(html);
//! let compiler = MermaidCompiler::new("mmdc");
//! let result = compiler.compile_all(&blocks, scratch_dir);
//! let spliced = splice_images(html, &blocks, &result.compiled);
//! ```

mod block;
mod compiler;
mod splice;

pub use block::{DiagramBlock, extract_blocks};
pub use compiler::{
    CompiledDiagram, DEFAULT_SCALE, DEFAULT_THEME, DiagramError, DiagramErrorKind,
    MermaidCompiler, PartialCompileResult,
};
pub use splice::splice_images;
