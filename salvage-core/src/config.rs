//! Application configuration and credentials.
//!
//! `AppConfig` is an optional TOML file (`salvage.toml`); every field has a
//! default, so an empty or missing file is valid. Secrets never live in the
//! TOML file: `Credentials` reads them from the environment, after loading a
//! `.env` file if one exists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::bid::DEFAULT_BID_MULTIPLIER;
use crate::data::{EbayEnvironment, MarketplaceSettings};
use crate::llm::LlmSettings;
use crate::pricing::AiSettings;

pub const DEFAULT_CONFIG_FILE: &str = "salvage.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing credential {0} (set it in the environment or .env)")]
    MissingCredential(&'static str),
}

// ── Sections ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BidSettings {
    pub multiplier: f64,
}

impl Default for BidSettings {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_BID_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub parts_file: PathBuf,
    pub instructions_file: PathBuf,
    /// Where `bid` writes its JSON report, if anywhere.
    pub results_file: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            parts_file: PathBuf::from("parts_list.csv"),
            instructions_file: PathBuf::from("analysis_instructions.txt"),
            results_file: None,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bid: BidSettings,
    pub marketplace: MarketplaceSettings,
    pub ai: AiSettings,
    pub llm: LlmSettings,
    pub paths: PathSettings,
}

impl AppConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path if given; else `salvage.toml` in the working directory if
    /// present; else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bid.multiplier.is_finite() || self.bid.multiplier < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "bid.multiplier must be a non-negative number, got {}",
                self.bid.multiplier
            )));
        }
        let max_total = self.marketplace.max_total_price;
        if max_total.is_nan() || max_total <= 0.0 {
            return Err(ConfigError::Invalid(
                "marketplace.max_total_price must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(ConfigError::Invalid(format!(
                "ai.temperature must be within 0..=2, got {}",
                self.ai.temperature
            )));
        }
        if self.ai.max_output_tokens == 0 {
            return Err(ConfigError::Invalid("ai.max_output_tokens must be > 0".into()));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

// ── Credentials ──

/// Secrets and environment selection, read from the process environment.
#[derive(Clone, Default)]
pub struct Credentials {
    pub ebay_client_id: Option<String>,
    pub ebay_client_secret: Option<String>,
    pub ebay_environment: EbayEnvironment,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    /// Load `.env` (if any, without overriding existing variables) and read.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Re-read `.env` with override, so edits take effect mid-session.
    pub fn reload(&mut self) {
        let _ = dotenvy::dotenv_override();
        *self = Self::from_lookup(|key| std::env::var(key).ok());
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let ebay_environment = get("EBAY_ENVIRONMENT")
            .and_then(|v| match v.parse::<EbayEnvironment>() {
                Ok(env) => Some(env),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring EBAY_ENVIRONMENT; using SANDBOX");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            ebay_client_id: get("EBAY_CLIENT_ID"),
            ebay_client_secret: get("EBAY_CLIENT_SECRET"),
            ebay_environment,
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
        }
    }

    /// eBay client id and secret, or the name of the first missing one.
    pub fn require_ebay(&self) -> Result<(&str, &str), ConfigError> {
        let id = self
            .ebay_client_id
            .as_deref()
            .ok_or(ConfigError::MissingCredential("EBAY_CLIENT_ID"))?;
        let secret = self
            .ebay_client_secret
            .as_deref()
            .ok_or(ConfigError::MissingCredential("EBAY_CLIENT_SECRET"))?;
        Ok((id, secret))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("ebay_client_id", &shown(&self.ebay_client_id))
            .field("ebay_client_secret", &shown(&self.ebay_client_secret))
            .field("ebay_environment", &self.ebay_environment)
            .field("anthropic_api_key", &shown(&self.anthropic_api_key))
            .field("openai_api_key", &shown(&self.openai_api_key))
            .finish()
    }
}
