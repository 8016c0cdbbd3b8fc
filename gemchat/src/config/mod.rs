//! Configuration system for the `gemchat` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/gemchat/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::completion::gemini::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT, GeminiSettings,
};
use crate::simulator::SimulatorConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    ai: AiFileConfig,
    simulation: SimulationFileConfig,
    ui: UiFileConfig,
}

/// `[ai]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AiFileConfig {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    streaming: Option<bool>,
    history_window: Option<usize>,
    temperature: Option<f32>,
    request_timeout_secs: Option<u64>,
}

/// `[simulation]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SimulationFileConfig {
    delivered_after_ms: Option<u64>,
    read_after_ms: Option<u64>,
    ai_reply_delay_ms: Option<u64>,
    reply_think_delay_ms: Option<u64>,
    reply_typing_delay_ms: Option<u64>,
    canned_reply: Option<String>,
    empty_reply_fallback: Option<String>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    timestamp_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- AI --
    /// Gemini API key; `None` means offline mode.
    pub api_key: Option<String>,
    /// Gemini model identifier.
    pub model: String,
    /// Gemini API root.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Longest wait for a response or the next streamed chunk.
    pub request_timeout: Duration,
    /// Use the scripted offline adapter even if a key is present.
    pub offline: bool,

    // -- Simulation --
    /// Lifecycle timings, reply texts, streaming and history window.
    pub simulation: SimulatorConfig,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Timestamp display format string (chrono).
    pub timestamp_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.8,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            offline: false,
            simulation: SimulatorConfig::default(),
            poll_timeout: Duration::from_millis(50),
            timestamp_format: "%H:%M".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();
        let sim_defaults = defaults.simulation;
        let sim = &file.simulation;
        let ms = |value: Option<u64>, default: Duration| value.map_or(default, Duration::from_millis);

        let streaming = !cli.no_stream && file.ai.streaming.unwrap_or(sim_defaults.streaming);

        Self {
            api_key: cli
                .api_key
                .clone()
                .or_else(|| file.ai.api_key.clone())
                .filter(|key| !key.trim().is_empty()),
            model: cli
                .model
                .clone()
                .or_else(|| file.ai.model.clone())
                .unwrap_or(defaults.model),
            base_url: file.ai.base_url.clone().unwrap_or(defaults.base_url),
            temperature: file.ai.temperature.unwrap_or(defaults.temperature),
            request_timeout: file
                .ai
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            offline: cli.offline,
            simulation: SimulatorConfig {
                delivered_after: ms(sim.delivered_after_ms, sim_defaults.delivered_after),
                read_after: ms(sim.read_after_ms, sim_defaults.read_after),
                ai_reply_delay: ms(sim.ai_reply_delay_ms, sim_defaults.ai_reply_delay),
                reply_think_delay: ms(sim.reply_think_delay_ms, sim_defaults.reply_think_delay),
                reply_typing_delay: ms(sim.reply_typing_delay_ms, sim_defaults.reply_typing_delay),
                history_window: file
                    .ai
                    .history_window
                    .unwrap_or(sim_defaults.history_window),
                streaming,
                canned_reply: sim
                    .canned_reply
                    .clone()
                    .unwrap_or(sim_defaults.canned_reply),
                empty_reply_fallback: match &sim.empty_reply_fallback {
                    // An empty string in the file disables the fallback.
                    Some(text) if text.is_empty() => None,
                    Some(text) => Some(text.clone()),
                    None => sim_defaults.empty_reply_fallback,
                },
            },
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            timestamp_format: cli
                .timestamp_format
                .clone()
                .or_else(|| file.ui.timestamp_format.clone())
                .unwrap_or(defaults.timestamp_format),
        }
    }

    /// Lifecycle settings for the simulator.
    #[must_use]
    pub fn simulator_config(&self) -> SimulatorConfig {
        self.simulation.clone()
    }

    /// Build [`GeminiSettings`] if an API key is available and offline
    /// mode is off.
    #[must_use]
    pub fn gemini_settings(&self) -> Option<GeminiSettings> {
        if self.offline {
            return None;
        }
        let api_key = self.api_key.clone()?;
        Some(GeminiSettings {
            api_key,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            request_timeout: self.request_timeout,
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal messenger with a streaming Gemini contact")]
pub struct CliArgs {
    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model identifier.
    #[arg(long, env = "GEMCHAT_MODEL")]
    pub model: Option<String>,

    /// Use the scripted offline assistant instead of the Gemini API.
    #[arg(long)]
    pub offline: bool,

    /// Request whole replies instead of streaming them.
    #[arg(long)]
    pub no_stream: bool,

    /// Path to config file (default: `~/.config/gemchat/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Timestamp display format (chrono format string).
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "GEMCHAT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/gemchat.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("gemchat").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
