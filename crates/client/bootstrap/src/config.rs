//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use client_blockchain_evm::{ContractAddresses, EvmConfig, EvmError, EvmNetwork};
use directories::ProjectDirs;
use runtime::tx::RECEIPT_POLL_INTERVAL;
use runtime::workers::BALANCE_POLL_INTERVAL;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("no platform data directory available; set GIPIE_DATA_DIR")]
    NoDataDir,

    #[error(transparent)]
    Evm(#[from] EvmError),
}

/// Configuration required to bootstrap a client runtime.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Root for local storage and logs; platform default when unset
    pub data_dir: Option<PathBuf>,
    pub balance_poll_interval: Duration,
    pub receipt_poll_interval: Duration,
    /// Prompt the wallet on startup when no session was restored
    pub auto_connect: bool,
    pub evm: EvmConfig,
    pub contracts: ContractAddresses,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            balance_poll_interval: BALANCE_POLL_INTERVAL,
            receipt_poll_interval: RECEIPT_POLL_INTERVAL,
            auto_connect: false,
            evm: EvmConfig::new(EvmNetwork::Bsc),
            contracts: ContractAddresses::default(),
        }
    }
}

impl AppConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `GIPIE_DATA_DIR` - Storage and log root (default: platform data dir)
    /// - `GIPIE_BALANCE_POLL_SECS` - Balance refresh period (default: 10)
    /// - `GIPIE_RECEIPT_POLL_MS` - Receipt polling period (default: 1000)
    /// - `GIPIE_AUTO_CONNECT` - Request accounts on startup (default: false)
    ///
    /// Network and contract addresses come from [`EvmConfig::from_env`] and
    /// [`ContractAddresses::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_vars(|key| env::var(key).ok())?;
        config.evm = EvmConfig::from_env()?;
        config.contracts = ContractAddresses::from_env()?;
        Ok(config)
    }

    /// Apply the `GIPIE_*` settings found through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        config.data_dir = lookup("GIPIE_DATA_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        if let Some(secs) = read_env::<u64>(&lookup, "GIPIE_BALANCE_POLL_SECS")? {
            config.balance_poll_interval = Duration::from_secs(secs.max(1));
        }

        if let Some(ms) = read_env::<u64>(&lookup, "GIPIE_RECEIPT_POLL_MS")? {
            config.receipt_poll_interval = Duration::from_millis(ms.max(50));
        }

        if let Some(enable) = read_env::<bool>(&lookup, "GIPIE_AUTO_CONNECT")? {
            config.auto_connect = enable;
        }

        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_auto_connect(mut self, enable: bool) -> Self {
        self.auto_connect = enable;
        self
    }

    pub fn resolved_data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("xyz", "gipiecoin", "gipie")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn storage_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.resolved_data_dir()?.join("storage"))
    }

    pub fn log_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.resolved_data_dir()?.join("logs"))
    }
}

fn read_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = AppConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.balance_poll_interval, Duration::from_secs(10));
        assert_eq!(config.receipt_poll_interval, Duration::from_millis(1_000));
        assert!(!config.auto_connect);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_vars(vars(&[
            ("GIPIE_DATA_DIR", "/tmp/gipie"),
            ("GIPIE_BALANCE_POLL_SECS", "30"),
            ("GIPIE_RECEIPT_POLL_MS", "250"),
            ("GIPIE_AUTO_CONNECT", "true"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/gipie")));
        assert_eq!(config.balance_poll_interval, Duration::from_secs(30));
        assert_eq!(config.receipt_poll_interval, Duration::from_millis(250));
        assert!(config.auto_connect);
        assert_eq!(
            config.storage_dir().unwrap(),
            PathBuf::from("/tmp/gipie/storage")
        );
    }

    #[test]
    fn rejects_malformed_values() {
        let err = AppConfig::from_vars(vars(&[("GIPIE_AUTO_CONNECT", "yes please")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "GIPIE_AUTO_CONNECT",
                ..
            }
        ));
    }
}
