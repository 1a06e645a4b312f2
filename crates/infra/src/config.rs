//! Gateway configuration loading.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults (including the default fee schedule),
//! 2. an optional config file (`paylane.toml`, or the path in `PAYLANE_CONFIG`),
//! 3. environment variables `PAYLANE__<KEY>`, nesting with `__`
//!    (e.g. `PAYLANE__PROCESSING_DELAY_MS=0`).
//!
//! The fee schedule is validated as part of loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use paylane_core::DomainError;
use paylane_observability::LogFormat;
use paylane_payments::FeeSchedule;

const DEFAULT_CONFIG_FILE: &str = "paylane";
const CONFIG_PATH_VAR: &str = "PAYLANE_CONFIG";
const ENV_PREFIX: &str = "PAYLANE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Location of the JSON payment log.
    pub ledger_path: PathBuf,
    /// Artificial latency per processed payment.
    pub processing_delay_ms: u64,
    pub log_format: LogFormat,
    pub fees: FeeSchedule,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("payments_log.json"),
            processing_delay_ms: 2_000,
            log_format: LogFormat::Json,
            fees: FeeSchedule::default(),
        }
    }
}

impl GatewayConfig {
    /// Load from `.env`, the default or `PAYLANE_CONFIG` file, and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load with an explicit file. The file is required when given; without
    /// one, `paylane.{toml,json,yaml}` in the working directory is used if present.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let loaded: GatewayConfig = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        loaded.validated()
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        let fees = self.fees.validated()?;
        tracing::debug!(
            currencies = fees.rates.len(),
            segments = fees.segments.len(),
            "fee schedule validated"
        );
        Ok(Self { fees, ..self })
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}
