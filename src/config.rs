use anyhow::Result;
use figment::{providers::{Env, Format, Serialized, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::EnvError;
use crate::simulation::EnvironmentConfig;

const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
const ENV_PREFIX: &str = "MGE__";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub environment: EnvironmentConfig,
    #[validate(nested)]
    pub evaluation: EvaluationConfig,
}

/// Which baseline policy the runner drives the environment with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Idle,
    Charge,
    Discharge,
    Export,
    Random,
    TariffAware,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EvaluationConfig {
    #[validate(range(min = 1))]
    pub episodes: usize,
    pub policy: PolicyKind,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            episodes: 5,
            policy: PolicyKind::TariffAware,
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `MGE__`-prefixed env vars
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        let config: Config = figment.extract()?;
        config.validate().map_err(EnvError::from)?;
        Ok(config)
    }
}
