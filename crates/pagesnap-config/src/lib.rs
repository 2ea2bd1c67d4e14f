//! Configuration management for pagesnap.
//!
//! Parses `pagesnap.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "pagesnap.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override headless browser program.
    pub browser_program: Option<String>,
    /// Override virtual time budget in milliseconds.
    pub virtual_time_budget_ms: Option<u32>,
    /// Override Mermaid compiler program.
    pub mermaid_program: Option<String>,
    /// Override diagram theme.
    pub theme: Option<String>,
    /// Override diagram raster scale.
    pub scale: Option<u32>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Headless browser configuration.
    pub browser: BrowserConfig,
    /// Diagram compilation configuration.
    pub diagrams: DiagramsConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Headless browser configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Browser command name or path.
    pub program: String,
    /// Synthetic clock advance given to the browser, in milliseconds.
    pub virtual_time_budget_ms: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            program: "chromium-browser".to_owned(),
            virtual_time_budget_ms: 10_000,
        }
    }
}

/// Diagram compilation configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    /// Mermaid compiler command name or path.
    pub program: String,
    /// Visual theme passed to the compiler.
    pub theme: String,
    /// Raster scale multiplier.
    pub scale: u32,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            program: "mmdc".to_owned(),
            theme: "default".to_owned(),
            scale: 4,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `pagesnap.toml` in current directory and
    /// parents, falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to
    /// take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing
    /// fails, or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(program) = &settings.browser_program {
            self.browser.program.clone_from(program);
        }
        if let Some(budget) = settings.virtual_time_budget_ms {
            self.browser.virtual_time_budget_ms = budget;
        }
        if let Some(program) = &settings.mermaid_program {
            self.diagrams.program.clone_from(program);
        }
        if let Some(theme) = &settings.theme {
            self.diagrams.theme.clone_from(theme);
        }
        if let Some(scale) = settings.scale {
            self.diagrams.scale = scale;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MAX_SCALE: u32 = 10;
        const MAX_BUDGET_MS: u32 = 600_000;

        require_non_empty(&self.browser.program, "browser.program")?;
        require_non_empty(&self.diagrams.program, "diagrams.program")?;
        require_non_empty(&self.diagrams.theme, "diagrams.theme")?;

        if self.browser.virtual_time_budget_ms == 0 {
            return Err(ConfigError::Validation(
                "browser.virtual_time_budget_ms must be greater than 0".to_owned(),
            ));
        }
        if self.browser.virtual_time_budget_ms > MAX_BUDGET_MS {
            return Err(ConfigError::Validation(format!(
                "browser.virtual_time_budget_ms cannot exceed {MAX_BUDGET_MS}"
            )));
        }

        if self.diagrams.scale == 0 {
            return Err(ConfigError::Validation(
                "diagrams.scale must be greater than 0".to_owned(),
            ));
        }
        if self.diagrams.scale > MAX_SCALE {
            return Err(ConfigError::Validation(format!(
                "diagrams.scale cannot exceed {MAX_SCALE}"
            )));
        }

        Ok(())
    }
}
