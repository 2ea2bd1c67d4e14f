//! CLI error types.

use pagesnap_config::ConfigError;
use pagesnap_renderer::SetupError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Setup(#[from] SetupError),
}
