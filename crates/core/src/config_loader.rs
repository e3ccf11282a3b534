use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration from `config/Config.toml` and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed or the scoring policy is invalid.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads application configuration from a specific TOML file, then the environment.
    ///
    /// Later sources win: file, then the conventional `FINNHUB_API_KEY` / `GEMINI_API_KEY`
    /// variables, then `PULSE_`-prefixed variables nested with `__`
    /// (e.g. `PULSE_POLICY__DIRECTION_THRESHOLD=0.25`). A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed or the scoring policy is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path.as_ref())
            .extract()
            .context("failed to load configuration")?;

        config.policy.validate().context("invalid scoring policy")?;

        tracing::debug!(
            policy = %config.policy.version,
            llm = config.llm.is_configured(),
            "configuration loaded"
        );

        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(
                Env::raw()
                    .only(&["FINNHUB_API_KEY"])
                    .map(|_| "providers.finnhub_api_key".into()),
            )
            .merge(
                Env::raw()
                    .only(&["GEMINI_API_KEY"])
                    .map(|_| "llm.api_key".into()),
            )
            .merge(Env::prefixed("PULSE_").split("__"))
    }
}
