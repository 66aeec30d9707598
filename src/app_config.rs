use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use url::Url;

use crate::errors::ConfigError;
use crate::language_utils::LanguagePair;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// The two languages being translated between
    #[serde(default)]
    pub languages: LanguagePair,

    /// Path prefix of the always-available shared library, excluded from closures
    #[serde(default = "default_shared_namespace")]
    pub shared_namespace: String,

    /// Model key used when none is given on the command line
    #[serde(default = "default_model_key")]
    pub default_model: String,

    /// Selectable models
    #[serde(default = "default_models")]
    pub models: Vec<ModelEntry>,

    /// Per-vendor connection settings
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,

    /// Directory receiving prompt transcripts (empty means the default)
    #[serde(default)]
    pub log_dir: String,

    /// Sampling temperature for the engine
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Engine vendor type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineVendor {
    // @vendor: Anthropic Messages API
    #[default]
    Anthropic,
    // @vendor: OpenAI-compatible chat completions
    OpenAI,
}

impl EngineVendor {
    // @returns: Capitalized vendor name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::OpenAI => "OpenAI",
        }
    }

    // @returns: Lowercase vendor identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Anthropic => "anthropic".to_string(),
            Self::OpenAI => "openai".to_string(),
        }
    }
}

impl std::fmt::Display for EngineVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

/// A model reachable through a short selector key
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelEntry {
    // @field: Selector key given on the command line
    pub key: String,

    // @field: Vendor serving the model
    pub vendor: EngineVendor,

    // @field: Vendor model identifier
    pub model: String,

    // @field: Output token ceiling
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Vendor identifier
    #[serde(rename = "type")]
    pub vendor: EngineVendor,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: File holding the API key (empty means ~/.config/<vendor>.token)
    #[serde(default = "String::new")]
    pub credential_file: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param vendor: Vendor enum
    // @returns: Provider config with defaults
    pub fn new(vendor: EngineVendor) -> Self {
        match vendor {
            EngineVendor::Anthropic => Self {
                vendor,
                endpoint: default_anthropic_endpoint(),
                credential_file: String::new(),
                timeout_secs: default_timeout_secs(),
            },
            EngineVendor::OpenAI => Self {
                vendor,
                endpoint: default_openai_endpoint(),
                credential_file: String::new(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }

    /// Where the API key for this vendor is read from
    pub fn credential_path(&self) -> PathBuf {
        if !self.credential_file.is_empty() {
            return PathBuf::from(&self.credential_file);
        }
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!("{}.token", self.vendor.to_lowercase_string()))
    }

    /// Read the API key once; whitespace around the token is ignored
    pub fn read_credential(&self) -> Result<String, ConfigError> {
        let path = self.credential_path();
        let missing = || ConfigError::MissingCredential {
            vendor: self.vendor.display_name().to_string(),
            path: path.clone(),
        };
        let token = std::fs::read_to_string(&path).map_err(|_| missing())?;
        let token = token.trim();
        if token.is_empty() {
            return Err(missing());
        }
        Ok(token.to_string())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_shared_namespace() -> String {
    "Base/".to_string()
}

fn default_model_key() -> String {
    "s".to_string()
}

fn default_models() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            key: "s".to_string(),
            vendor: EngineVendor::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: default_max_tokens(),
        },
        ModelEntry {
            key: "o".to_string(),
            vendor: EngineVendor::Anthropic,
            model: "claude-opus-4-1-20250805".to_string(),
            max_tokens: default_max_tokens(),
        },
        ModelEntry {
            key: "g".to_string(),
            vendor: EngineVendor::OpenAI,
            model: "gpt-4o".to_string(),
            max_tokens: 16_384,
        },
    ]
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(EngineVendor::Anthropic),
        ProviderConfig::new(EngineVendor::OpenAI),
    ]
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_temperature() -> f32 {
    0.0
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

impl Config {
    /// Load the configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        if config_path.exists() {
            let file = File::open(config_path)
                .with_context(|| format!("Failed to open config file: {:?}", config_path))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", config_path))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let source = &self.languages.source;
        let target = &self.languages.target;

        if source.extension.is_empty() || target.extension.is_empty() {
            return Err(ConfigError::Invalid("language extensions must not be empty".to_string()));
        }
        if source.extension == target.extension {
            return Err(ConfigError::Invalid(format!(
                "source and target share the extension '{}'",
                source.extension
            )));
        }
        if source.fence_tag.is_empty() || target.fence_tag.is_empty() {
            return Err(ConfigError::Invalid("fence tags must not be empty".to_string()));
        }

        self.model(&self.default_model)?;

        for entry in &self.models {
            let provider = self.provider(entry.vendor).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "model '{}' uses vendor '{}' which has no provider entry",
                    entry.key, entry.vendor
                ))
            })?;
            if !provider.endpoint.is_empty() {
                Url::parse(&provider.endpoint).map_err(|e| {
                    ConfigError::Invalid(format!("bad endpoint for {}: {}", provider.vendor, e))
                })?;
            }
        }

        Ok(())
    }

    /// Look up a model by its selector key
    pub fn model(&self, key: &str) -> Result<&ModelEntry, ConfigError> {
        self.models
            .iter()
            .find(|m| m.key == key)
            .ok_or_else(|| ConfigError::UnknownModel(key.to_string()))
    }

    /// Get the provider configuration for a vendor
    pub fn provider(&self, vendor: EngineVendor) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.vendor == vendor)
    }

    /// Directory that receives prompt transcripts
    pub fn transcript_dir(&self) -> PathBuf {
        if !self.log_dir.is_empty() {
            return PathBuf::from(&self.log_dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pairport")
            .join("history")
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            languages: LanguagePair::default(),
            shared_namespace: default_shared_namespace(),
            default_model: default_model_key(),
            models: default_models(),
            providers: default_providers(),
            log_dir: String::new(),
            temperature: default_temperature(),
            log_level: LogLevel::default(),
        }
    }
}
