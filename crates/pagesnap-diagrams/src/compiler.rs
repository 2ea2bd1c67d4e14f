//! External Mermaid compilation.
//!
//! Each diagram block is written to a per-ordinal source file in the
//! scratch directory and compiled to a sibling PNG by invoking the Mermaid
//! CLI as a subprocess. Compilation is sequential in document order; a
//! failed block is reported per-ordinal rather than failing the batch.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::block::DiagramBlock;

/// Default visual theme passed to the compiler.
pub const DEFAULT_THEME: &str = "default";

/// Default raster scale multiplier.
pub const DEFAULT_SCALE: u32 = 4;

/// Longest stderr excerpt carried in a compile error.
const MAX_STDERR_EXCERPT: usize = 400;

/// Result of compiling a single diagram block.
#[derive(Debug)]
pub struct CompiledDiagram {
    /// Ordinal matching the originating block.
    pub ordinal: usize,
    /// Absolute path of the rasterized image in the scratch directory.
    pub image_path: PathBuf,
}

/// Single diagram compilation error.
#[derive(Debug, thiserror::Error)]
#[error("diagram {ordinal}: {kind}")]
pub struct DiagramError {
    pub ordinal: usize,
    pub kind: DiagramErrorKind,
}

/// Kind of diagram compilation error.
#[derive(Debug, thiserror::Error)]
pub enum DiagramErrorKind {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("failed to run compiler: {0}")]
    Spawn(String),
    #[error("compiler exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("compiler produced no output image")]
    MissingOutput,
}

/// Result of compiling diagrams with partial failures.
#[derive(Debug)]
pub struct PartialCompileResult {
    /// Successfully compiled diagrams.
    pub compiled: Vec<CompiledDiagram>,
    /// Errors for diagrams that failed to compile.
    pub errors: Vec<DiagramError>,
}

/// Invokes the external Mermaid compiler once per diagram block.
///
/// The compiler program is not validated up front: a missing or broken
/// binary surfaces as a per-diagram [`DiagramErrorKind::Spawn`] error and
/// the affected blocks keep their original markup.
///
/// # Example
///
/// ```ignore
/// let compiler = MermaidCompiler::new("mmdc").theme("neutral").scale(2);
/// let result = compiler.compile_all(&blocks, scratch_dir);
/// ```
#[derive(Debug, Clone)]
pub struct MermaidCompiler {
    program: PathBuf,
    theme: String,
    scale: u32,
}

impl MermaidCompiler {
    /// Create a compiler invoking the given program.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            theme: DEFAULT_THEME.to_owned(),
            scale: DEFAULT_SCALE,
        }
    }

    /// Set the visual theme passed to the compiler.
    #[must_use]
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Set the raster scale multiplier.
    #[must_use]
    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Compile all blocks sequentially in document order.
    ///
    /// Returns partial results: successfully compiled diagrams even when
    /// some fail. Failures are logged as warnings and collected in
    /// [`PartialCompileResult::errors`].
    #[must_use]
    pub fn compile_all(&self, blocks: &[DiagramBlock], scratch_dir: &Path) -> PartialCompileResult {
        let mut compiled = Vec::with_capacity(blocks.len());
        let mut errors = Vec::new();

        for block in blocks {
            match self.compile_one(block, scratch_dir) {
                Ok(diagram) => compiled.push(diagram),
                Err(error) => {
                    tracing::warn!(
                        ordinal = error.ordinal,
                        error = %error.kind,
                        "Diagram compilation failed; keeping original markup"
                    );
                    errors.push(error);
                }
            }
        }

        PartialCompileResult { compiled, errors }
    }

    /// Compile one block: persist its source, invoke the compiler, and
    /// confirm the output image exists.
    fn compile_one(
        &self,
        block: &DiagramBlock,
        scratch_dir: &Path,
    ) -> Result<CompiledDiagram, DiagramError> {
        let ordinal = block.ordinal;
        let io_err = |e: std::io::Error| DiagramError {
            ordinal,
            kind: DiagramErrorKind::Io(e.to_string()),
        };

        let source_path = scratch_dir.join(format!("diagram_{ordinal}.mmd"));
        let image_path = scratch_dir.join(format!("diagram_{ordinal}.png"));

        std::fs::write(&source_path, &block.source).map_err(io_err)?;

        let output = Command::new(&self.program)
            .arg("-i")
            .arg(&source_path)
            .arg("-o")
            .arg(&image_path)
            .args(["-b", "transparent"])
            .args(["-t", &self.theme])
            .args(["-s", &self.scale.to_string()])
            .output()
            .map_err(|e| DiagramError {
                ordinal,
                kind: DiagramErrorKind::Spawn(e.to_string()),
            })?;

        if !output.status.success() {
            return Err(DiagramError {
                ordinal,
                kind: DiagramErrorKind::Failed {
                    status: output.status,
                    stderr: stderr_excerpt(&output.stderr),
                },
            });
        }

        // Exit success alone does not mean an image was produced.
        let produced = std::fs::metadata(&image_path).is_ok_and(|m| m.len() > 0);
        if !produced {
            return Err(DiagramError {
                ordinal,
                kind: DiagramErrorKind::MissingOutput,
            });
        }

        let image_path = std::path::absolute(&image_path).map_err(io_err)?;
        Ok(CompiledDiagram {
            ordinal,
            image_path,
        })
    }
}

/// Trimmed, length-bounded stderr text for error messages.
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= MAX_STDERR_EXCERPT {
        return text.to_owned();
    }
    let mut end = MAX_STDERR_EXCERPT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn block(ordinal: usize, source: &str) -> DiagramBlock {
        DiagramBlock {
            ordinal,
            source: source.to_owned(),
            span: 0..0,
        }
    }

    /// Write an executable shell script standing in for the compiler.
    #[cfg(unix)]
    fn fake_compiler(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-mmdc");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Script body that scans `-o <path>` and writes a fake PNG there.
    #[cfg(unix)]
    const WRITE_OUTPUT: &str = r#"
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
printf 'PNG' > "$out"
"#;

    #[cfg(unix)]
    #[test]
    fn test_compile_all_success() {
        let scratch = tempfile::tempdir().unwrap();
        let program = fake_compiler(scratch.path(), WRITE_OUTPUT);
        let compiler = MermaidCompiler::new(&program);

        let blocks = [block(1, "graph TD;A-->B;"), block(2, "graph LR;C-->D;")];
        let result = compiler.compile_all(&blocks, scratch.path());

        assert!(result.errors.is_empty());
        assert_eq!(result.compiled.len(), 2);
        assert_eq!(result.compiled[0].ordinal, 1);
        assert_eq!(result.compiled[1].ordinal, 2);
        assert!(result.compiled[0].image_path.is_absolute());
        assert!(result.compiled[0].image_path.ends_with("diagram_1.png"));
        assert!(result.compiled[1].image_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_writes_unescaped_source_file() {
        let scratch = tempfile::tempdir().unwrap();
        let program = fake_compiler(scratch.path(), WRITE_OUTPUT);
        let compiler = MermaidCompiler::new(&program);

        // Source arrives already unescaped from extraction.
        let blocks = [block(1, "graph TD;A-->B;")];
        compiler.compile_all(&blocks, scratch.path());

        let source = std::fs::read_to_string(scratch.path().join("diagram_1.mmd")).unwrap();
        assert_eq!(source, "graph TD;A-->B;");
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_nonzero_exit_is_error() {
        let scratch = tempfile::tempdir().unwrap();
        let program = fake_compiler(scratch.path(), "echo 'parse error' >&2\nexit 1");
        let compiler = MermaidCompiler::new(&program);

        let result = compiler.compile_all(&[block(1, "not mermaid")], scratch.path());

        assert!(result.compiled.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].ordinal, 1);
        match &result.errors[0].kind {
            DiagramErrorKind::Failed { stderr, .. } => {
                assert!(stderr.contains("parse error"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_missing_output_is_error() {
        let scratch = tempfile::tempdir().unwrap();
        // Exits 0 without writing anything.
        let program = fake_compiler(scratch.path(), "exit 0");
        let compiler = MermaidCompiler::new(&program);

        let result = compiler.compile_all(&[block(1, "graph TD;A;")], scratch.path());

        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0].kind,
            DiagramErrorKind::MissingOutput
        ));
    }

    #[test]
    fn test_compile_spawn_failure_is_error() {
        let scratch = tempfile::tempdir().unwrap();
        let compiler = MermaidCompiler::new("pagesnap-no-such-compiler");

        let result = compiler.compile_all(&[block(1, "graph TD;A;")], scratch.path());

        assert!(result.compiled.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0].kind, DiagramErrorKind::Spawn(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_one_failure_does_not_affect_other_blocks() {
        let scratch = tempfile::tempdir().unwrap();
        // Fails only for the second source file.
        let body = r#"
out=""
src=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  if [ "$1" = "-i" ]; then src="$2"; shift; fi
  shift
done
case "$src" in
  *diagram_2.mmd) exit 1 ;;
esac
printf 'PNG' > "$out"
"#;
        let program = fake_compiler(scratch.path(), body);
        let compiler = MermaidCompiler::new(&program);

        let blocks = [block(1, "a"), block(2, "b"), block(3, "c")];
        let result = compiler.compile_all(&blocks, scratch.path());

        assert_eq!(result.compiled.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].ordinal, 2);
    }

    #[test]
    fn test_compile_all_empty_blocks() {
        let scratch = tempfile::tempdir().unwrap();
        let compiler = MermaidCompiler::new("pagesnap-no-such-compiler");

        let result = compiler.compile_all(&[], scratch.path());

        assert!(result.compiled.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_stderr_excerpt_truncates() {
        let long = "x".repeat(1000);
        let excerpt = stderr_excerpt(long.as_bytes());
        assert!(excerpt.len() <= MAX_STDERR_EXCERPT + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_stderr_excerpt_trims_short_input() {
        assert_eq!(stderr_excerpt(b"  oops \n"), "oops");
    }

    #[test]
    fn test_error_display_includes_ordinal() {
        let error = DiagramError {
            ordinal: 3,
            kind: DiagramErrorKind::MissingOutput,
        };
        assert_eq!(
            error.to_string(),
            "diagram 3: compiler produced no output image"
        );
    }
}
