//! # Runtime Configuration
//!
//! Everything the operator binary needs, read from the environment over
//! defaults.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `RING_SIZE` | `32` | number of nodes |
//! | `RING_OWNER` | `0xaaaa…aaaa` | operator / owner address |
//! | `RING_ROOT_ID` | hex of `storage-ring` | root identity key material |
//! | `RING_BUDGET` | `10` | coins attached to each sweep |
//! | `RING_ENTRIES` | `4` | keys written per node before cleaning |
//! | `RING_IDLE_TIMEOUT_MS` | `5000` | how long to wait for a sweep to settle |
//! | `RING_LOG` | `info` | log level |

use ring_storage::domain::entities::RingConfig;
use ring_storage::service::ServiceConfig;
use shared_types::{Address, Coins, RootIdentity, COIN_DECIMALS};
use thiserror::Error;
use tracing::Level;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("{var} is invalid: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Sweeps with no value attached cannot pay for a single hop.
    #[error("RING_BUDGET must be greater than zero")]
    ZeroBudget,

    /// The zero address cannot own a ring.
    #[error("RING_OWNER must not be the zero address")]
    ZeroOwner,
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of nodes in the ring.
    pub ring_size: u32,
    /// Owner of the ring; also the operator sending every message.
    pub owner: Address,
    /// Root identity key material.
    pub root_identity: RootIdentity,
    /// Value attached to each sweep and store.
    pub budget: Coins,
    /// Keys written per node before cleaning.
    pub entries_per_node: u32,
    /// Settle timeout in milliseconds.
    pub idle_timeout_ms: u64,
    /// Log level.
    pub log_level: Level,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ring_size: 32,
            owner: Address::new([0xAA; 20]),
            root_identity: RootIdentity::new(b"storage-ring".to_vec()),
            budget: Coins::from_nano(10_000_000_000),
            entries_per_node: 4,
            idle_timeout_ms: 5000,
            log_level: Level::INFO,
        }
    }
}

impl RuntimeConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("RING_SIZE") {
            config.ring_size = parse_number("RING_SIZE", &value)?;
        }
        if let Some(value) = lookup("RING_OWNER") {
            config.owner = Address::from_hex(&value).map_err(|e| invalid("RING_OWNER", e))?;
        }
        if let Some(value) = lookup("RING_ROOT_ID") {
            config.root_identity = RootIdentity::from_hex(&value).map_err(|e| invalid("RING_ROOT_ID", e))?;
        }
        if let Some(value) = lookup("RING_BUDGET") {
            config.budget = Coins::parse_decimal(&value, COIN_DECIMALS).map_err(|e| invalid("RING_BUDGET", e))?;
        }
        if let Some(value) = lookup("RING_ENTRIES") {
            config.entries_per_node = parse_number("RING_ENTRIES", &value)?;
        }
        if let Some(value) = lookup("RING_IDLE_TIMEOUT_MS") {
            config.idle_timeout_ms = parse_number("RING_IDLE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("RING_LOG") {
            config.log_level = value.trim().parse().map_err(|e| invalid("RING_LOG", e))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that cannot drive a ring.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget.is_zero() {
            return Err(ConfigError::ZeroBudget);
        }
        if self.owner.is_zero() {
            return Err(ConfigError::ZeroOwner);
        }
        Ok(())
    }

    /// Ring configuration with the default cost schedule.
    #[must_use]
    pub fn ring_config(&self) -> RingConfig {
        RingConfig::new(self.root_identity.clone(), self.owner, self.ring_size)
    }

    /// Service configuration.
    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            idle_timeout_ms: self.idle_timeout_ms,
            ..ServiceConfig::default()
        }
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| invalid(var, e))
}

fn invalid(var: &'static str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}
