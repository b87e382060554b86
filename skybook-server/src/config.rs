//! Server configuration.
//!
//! Sources, later ones winning: built-in defaults, the YAML file named by
//! `SKYBOOK_CONFIG`, then `SKYBOOK_*` environment variables.

use serde::{Deserialize, Serialize};
use skybook_protocol::DEFAULT_PORT;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_VAR: &str = "SKYBOOK_CONFIG";

const DEFAULT_METRICS_PORT: u16 = 9090;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Where the command listener binds.
    pub bind_addr: SocketAddr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics over HTTP.
    pub enabled: bool,
    pub bind_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_METRICS_PORT),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("metrics and commands cannot share {0}")]
    AddressConflict(SocketAddr),
}

impl Config {
    /// Builds the effective configuration from the process environment.
    ///
    /// Fails if `SKYBOOK_CONFIG` names a file that cannot be read or parsed,
    /// or if an override holds an unparsable value.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_yaml::to_string(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `SKYBOOK_*` overrides fetched through `lookup`.
    ///
    /// `SKYBOOK_PORT` is applied after `SKYBOOK_BIND`, so it replaces the port
    /// of either address.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = parse_var(&lookup, "SKYBOOK_BIND")? {
            self.network.bind_addr = addr;
        }
        if let Some(port) = parse_var::<u16, _>(&lookup, "SKYBOOK_PORT")? {
            self.network.bind_addr.set_port(port);
        }
        if let Some(value) = lookup("SKYBOOK_METRICS_ENABLED") {
            self.metrics.enabled = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: "SKYBOOK_METRICS_ENABLED",
                        value,
                    })
                }
            };
        }
        if let Some(addr) = parse_var(&lookup, "SKYBOOK_METRICS_BIND")? {
            self.metrics.bind_addr = addr;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.enabled && self.metrics.bind_addr == self.network.bind_addr {
            return Err(ConfigError::AddressConflict(self.network.bind_addr));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.bind_addr, "127.0.0.1:7420".parse().unwrap());
        assert!(!config.metrics.enabled);
        assert_eq!(config.metrics.bind_addr.port(), 9090);
        config.validate().unwrap();
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("SKYBOOK_BIND", "0.0.0.0:8000"),
                ("SKYBOOK_PORT", "9001"),
                ("SKYBOOK_METRICS_ENABLED", "TRUE"),
                ("SKYBOOK_METRICS_BIND", "127.0.0.1:9100"),
            ]))
            .unwrap();

        assert_eq!(config.network.bind_addr, "0.0.0.0:9001".parse().unwrap());
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.bind_addr, "127.0.0.1:9100".parse().unwrap());
    }

    #[test]
    fn test_no_overrides_keeps_values() {
        let mut config = Config::default();
        config.apply_overrides(env(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("SKYBOOK_PORT", "seventy")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: "SKYBOOK_PORT",
                ..
            }
        ));

        let err = config
            .apply_overrides(env(&[("SKYBOOK_METRICS_ENABLED", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("SKYBOOK_METRICS_ENABLED"));
    }

    #[test]
    fn test_address_conflict() {
        let mut config = Config::default();
        config.metrics.enabled = true;
        config.metrics.bind_addr = config.network.bind_addr;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AddressConflict(_))
        ));

        // Disabled metrics never bind
        config.metrics.enabled = false;
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "network:\n  bind_addr: \"0.0.0.0:9000\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.network.bind_addr.port(), 9000);
        assert_eq!(config.metrics, MetricsConfig::default());
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skybook.yaml");

        let mut config = Config::default();
        config.metrics.enabled = true;
        config.save(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_save_failure_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("skybook.yaml");

        let err = Config::default().save(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));
        assert!(err.to_string().starts_with("cannot write config file"));
    }

    #[test]
    fn test_file_errors() {
        let err = Config::from_file("/nonexistent/skybook.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().starts_with("cannot read config file"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "network:\n  bind_addr: \"not-an-address\"").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid config file"));
    }
}
