//! TOML configuration for the desk: enhancement service, pipeline knobs and
//! the catalog location.
//!
//! Every field has a default, so an empty file (or no file at all) is a valid
//! configuration.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::MAX_CONTEXT_TURNS;
use crate::llm::OllamaConfig;

/// Errors from loading or saving configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(shopdesk::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(shopdesk::config::parse),
        help("Check the TOML syntax. Known sections are [llm] and [pipeline].")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(shopdesk::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ── Sections ────────────────────────────────────────────────────────────

/// `[llm]`: the optional enhancement service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Set to `false` to never contact the service.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Timeout for the one-off availability probe.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "llama3.2".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_temperature() -> f32 {
    0.7
}
fn default_probe_timeout_secs() -> u64 {
    5
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl LlmSettings {
    /// Client configuration for [`crate::llm::OllamaEnhancer`].
    pub fn ollama(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            probe_timeout_secs: self.probe_timeout_secs,
            temperature: self.temperature,
        }
    }
}

/// `[pipeline]`: orchestrator behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Recent turns forwarded to the enhancer (at most five).
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Append the data-access error text as a `Details:` line.
    #[serde(default = "default_true")]
    pub expose_error_details: bool,
}

fn default_history_window() -> usize {
    MAX_CONTEXT_TURNS
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            expose_error_details: true,
        }
    }
}

impl PipelineSettings {
    /// The configured window, clamped to [`MAX_CONTEXT_TURNS`].
    pub fn effective_history_window(&self) -> usize {
        self.history_window.min(MAX_CONTEXT_TURNS)
    }
}

// ── DeskConfig ──────────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    /// JSON catalog to serve answers from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

impl DeskConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Parse TOML text. `origin` names the source in errors.
    pub fn from_toml(content: &str, origin: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}
