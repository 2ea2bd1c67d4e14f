//! Headless browser driver.
//!
//! Runs the browser binary in non-interactive `--dump-dom` mode against a
//! local file and captures the serialized DOM from stdout. The binary is
//! resolved and validated once at setup; a missing binary is a fatal
//! precondition failure with no fallback rendering path.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Default synthetic clock advance given to the browser, in milliseconds.
///
/// Bounds asynchronous page work (deferred scripts, layout, font loading)
/// deterministically without wall-clock waiting.
pub const DEFAULT_VIRTUAL_TIME_BUDGET_MS: u32 = 10_000;

/// Fixed flags for every browser invocation.
///
/// Security, sandboxing, and GPU paths are disabled so local file
/// references (diagram images, stylesheets, scripts) load under
/// `--dump-dom` without a display or a web server.
const BROWSER_FLAGS: [&str; 9] = [
    "--headless",
    "--disable-web-security",
    "--no-sandbox",
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-dev-shm-usage",
    "--hide-scrollbars",
    "--allow-file-access-from-files",
    "--run-all-compositor-stages-before-draw",
];

/// Browser setup error. Fatal: there is no degraded rendering path without
/// a working browser binary.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The program did not resolve to an executable on the search path.
    #[error("no such headless browser program or not executable: \"{program}\"")]
    ProgramNotFound {
        program: String,
        #[source]
        source: which::Error,
    },
}

/// Error from a single browser invocation.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("failed to run browser: {0}")]
    Spawn(String),
    #[error("browser exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("browser output is not valid UTF-8: {0}")]
    Decode(String),
    #[error("browser produced an empty DOM dump")]
    EmptyDump,
}

/// Driver for a headless browser binary in DOM-dump mode.
#[derive(Debug, Clone)]
pub struct HeadlessBrowser {
    program: PathBuf,
    virtual_time_budget_ms: u32,
}

impl HeadlessBrowser {
    /// Resolve the program name or path and confirm it is executable.
    ///
    /// Checked once here so later render calls can assume a working
    /// binary. Failure never leaves a partially constructed driver.
    pub fn setup(program: &str) -> Result<Self, SetupError> {
        let resolved = which::which(program).map_err(|source| SetupError::ProgramNotFound {
            program: program.to_owned(),
            source,
        })?;

        Ok(Self {
            program: resolved,
            virtual_time_budget_ms: DEFAULT_VIRTUAL_TIME_BUDGET_MS,
        })
    }

    /// Set the virtual time budget, in milliseconds.
    #[must_use]
    pub fn virtual_time_budget_ms(mut self, ms: u32) -> Self {
        self.virtual_time_budget_ms = ms;
        self
    }

    /// Resolved path of the browser binary.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Fully evaluate a local page and return the dumped DOM.
    ///
    /// Blocks until the browser exits; the only bound on page work is the
    /// browser's own virtual time budget.
    pub fn dump_dom(&self, page: &Path) -> Result<String, BrowserError> {
        let output = Command::new(&self.program)
            .args(BROWSER_FLAGS)
            .arg(format!(
                "--virtual-time-budget={}",
                self.virtual_time_budget_ms
            ))
            .arg("--dump-dom")
            .arg(page)
            .output()
            .map_err(|e| BrowserError::Spawn(e.to_string()))?;

        if !output.status.success() {
            return Err(BrowserError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let dom =
            String::from_utf8(output.stdout).map_err(|e| BrowserError::Decode(e.to_string()))?;
        if dom.trim().is_empty() {
            return Err(BrowserError::EmptyDump);
        }

        Ok(dom)
    }
}
