use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::Paths;

/// Env vars consulted for the API key when the config file does not provide one.
pub const CREDENTIAL_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolved XDG-compliant paths (not serialized)
    #[serde(skip)]
    pub paths: Paths,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API key, usually an env reference such as "${GEMINI_API_KEY}"
    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for room renderings
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Model used for text advice
    #[serde(default = "default_advice_model")]
    pub advice_model: String,

    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for exported PNGs (default: data_dir/exports)
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" (default) or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_api_key() -> String {
    "${GEMINI_API_KEY}".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}
fn default_advice_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_aspect_ratio() -> String {
    "1:1".to_string() // square renders suit the phone layout
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_port() -> u16 {
    31415
}
fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            base_url: default_base_url(),
            image_model: default_image_model(),
            advice_model: default_advice_model(),
            aspect_ratio: default_aspect_ratio(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load from the default location, creating a commented template on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path` if given, otherwise from `{config_dir}/config.toml`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let paths = Paths::resolve()?;
        paths.ensure_dirs()?;
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.config_file());

        if !path.exists() {
            let config = Config {
                paths,
                ..Config::default()
            };
            save_template(&path)?;
            return Ok(config);
        }

        let mut config = Self::from_file(&path)?;
        config.paths = paths;
        Ok(config)
    }

    /// Parse a config file without touching the resolved paths.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Env references such as `${GEMINI_API_KEY}` are kept as written, so a
    /// saved config never holds the resolved secret.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&self.paths.config_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let paths = Paths::resolve()?;
        Ok(paths.config_file())
    }

    /// The API key for the generation service, if any.
    ///
    /// `generation.api_key` may be a literal or an env reference; a reference
    /// that does not resolve counts as absent.
    pub fn credential(&self) -> Option<String> {
        self.credential_with_env(|key| std::env::var(key))
    }

    pub fn credential_with_env<F>(&self, env_fn: F) -> Option<String>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        let configured = self.generation.api_key.trim();
        let resolved = match env_reference(configured) {
            Some(var) => env_fn(var).ok().map(|v| v.trim().to_string()),
            None => Some(configured.to_string()),
        };
        if let Some(key) = resolved.filter(|k| !k.is_empty()) {
            return Some(key);
        }

        CREDENTIAL_ENV_VARS
            .iter()
            .filter_map(|var| env_fn(var).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    /// Export directory with `~` expanded; falls back to the XDG data location.
    pub fn export_dir(&self) -> PathBuf {
        match self.export.dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => PathBuf::from(shellexpand::tilde(dir).to_string()),
            _ => self.paths.export_dir.clone(),
        }
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["generation", "api_key"] => Ok(if self.credential().is_some() {
                "(set)".to_string()
            } else {
                "(not set)".to_string()
            }),
            ["generation", "base_url"] => Ok(self.generation.base_url.clone()),
            ["generation", "image_model"] => Ok(self.generation.image_model.clone()),
            ["generation", "advice_model"] => Ok(self.generation.advice_model.clone()),
            ["generation", "aspect_ratio"] => Ok(self.generation.aspect_ratio.clone()),
            ["generation", "timeout_secs"] => Ok(self.generation.timeout_secs.to_string()),
            ["export", "dir"] => Ok(self.export_dir().display().to_string()),
            ["server", "port"] => Ok(self.server.port.to_string()),
            ["server", "bind"] => Ok(self.server.bind.clone()),
            ["logging", "level"] => Ok(self.logging.level.clone()),
            ["logging", "format"] => Ok(self.logging.format.clone()),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["generation", "api_key"] => self.generation.api_key = value.to_string(),
            ["generation", "base_url"] => self.generation.base_url = value.to_string(),
            ["generation", "image_model"] => self.generation.image_model = value.to_string(),
            ["generation", "advice_model"] => self.generation.advice_model = value.to_string(),
            ["generation", "aspect_ratio"] => self.generation.aspect_ratio = value.to_string(),
            ["generation", "timeout_secs"] => self.generation.timeout_secs = value.parse()?,
            ["export", "dir"] => self.export.dir = Some(value.to_string()),
            ["server", "port"] => self.server.port = value.parse()?,
            ["server", "bind"] => self.server.bind = value.to_string(),
            ["logging", "level"] => self.logging.level = value.to_string(),
            ["logging", "format"] => match value {
                "text" | "json" => self.logging.format = value.to_string(),
                _ => anyhow::bail!("logging.format must be \"text\" or \"json\""),
            },
            _ => anyhow::bail!("Unknown config key: {}", key),
        }

        Ok(())
    }
}

/// Variable name of a `${VAR}` or `$VAR` reference.
fn env_reference(s: &str) -> Option<&str> {
    s.strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .or_else(|| s.strip_prefix('$'))
        .filter(|var| !var.is_empty())
}

/// Write the commented template (used for first-time setup and `config init`).
pub fn save_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
    eprintln!("Created default config at {}", path.display());

    Ok(())
}

/// Default config template with helpful comments
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# MSpace Configuration
# Auto-created on first run. Edit as needed.

[generation]
# API key for the image service. Falls back to GEMINI_API_KEY, then API_KEY.
api_key = "${GEMINI_API_KEY}"
base_url = "https://generativelanguage.googleapis.com/v1beta"
image_model = "gemini-2.5-flash-image"
advice_model = "gemini-2.5-flash"
aspect_ratio = "1:1"
timeout_secs = 120

[export]
# Where exported renderings are written (default: XDG data dir/exports)
# dir = "~/Pictures/mspace"

[server]
port = 31415
bind = "127.0.0.1"

[logging]
level = "info"
# format = "json"
"#;
