//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "USBSWITCHD";

/// Config file name looked up in the working directory
const CONFIG_FILE_NAME: &str = "usbswitchd.toml";

/// Environment variable for an explicit config path
const CONFIG_PATH_ENV: &str = "USBSWITCHD_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `USBSWITCHD_CONFIG` environment variable (explicit path)
    /// 2. `./usbswitchd.toml` (current directory)
    /// 3. Built-in defaults (no file required)
    ///
    /// Environment variables can override config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. No config file found - will use defaults
    None
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `USBSWITCHD_<SECTION>_<KEY>`
/// For example:
/// - `USBSWITCHD_SERVER_PORT=8080`
/// - `USBSWITCHD_SERIAL_DEVICE=/dev/ttyUSB1`
/// - `USBSWITCHD_SWITCH_RESPONSE_DEADLINE_MS=5000`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Server overrides
    if let Ok(val) = std::env::var(format!("{}_SERVER_HOST", ENV_PREFIX)) {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var(format!("{}_SERVER_PORT", ENV_PREFIX)) {
        config.server.port = val.parse().map_err(|_| {
            ConfigError::env_parse(format!("{}_SERVER_PORT", ENV_PREFIX), "Invalid port number")
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_SERVER_LOG_LEVEL", ENV_PREFIX)) {
        config.server.log_level = val;
    }

    // Serial overrides
    if let Ok(val) = std::env::var(format!("{}_SERIAL_DEVICE", ENV_PREFIX)) {
        config.serial.device = val;
    }
    if let Ok(val) = std::env::var(format!("{}_SERIAL_BAUD", ENV_PREFIX)) {
        config.serial.baud = val.parse().map_err(|_| {
            ConfigError::env_parse(format!("{}_SERIAL_BAUD", ENV_PREFIX), "Invalid baud rate")
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_SERIAL_READ_TIMEOUT_MS", ENV_PREFIX)) {
        config.serial.read_timeout_ms = val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_SERIAL_READ_TIMEOUT_MS", ENV_PREFIX),
                "Invalid timeout",
            )
        })?;
    }

    // Switch overrides
    if let Ok(val) = std::env::var(format!("{}_SWITCH_RESPONSE_DEADLINE_MS", ENV_PREFIX)) {
        config.switch.response_deadline_ms = Some(val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_SWITCH_RESPONSE_DEADLINE_MS", ENV_PREFIX),
                "Invalid deadline",
            )
        })?);
    }
    if let Ok(val) = std::env::var(format!("{}_SWITCH_POLL_INTERVAL_MS", ENV_PREFIX)) {
        config.switch.poll_interval_ms = val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_SWITCH_POLL_INTERVAL_MS", ENV_PREFIX),
                "Invalid interval",
            )
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_SWITCH_SETTLE_DELAY_MS", ENV_PREFIX)) {
        config.switch.settle_delay_ms = val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_SWITCH_SETTLE_DELAY_MS", ENV_PREFIX),
                "Invalid delay",
            )
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().server.port, 5000);
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("USBSWITCHD_SERVER_PORT", "9999");
        env::set_var("USBSWITCHD_SERIAL_DEVICE", "/dev/ttyACM3");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().server.port, 9999);
        assert_eq!(loader.config().serial.device, "/dev/ttyACM3");

        env::remove_var("USBSWITCHD_SERVER_PORT");
        env::remove_var("USBSWITCHD_SERIAL_DEVICE");
    }

    #[test]
    #[serial]
    fn test_env_deadline_override() {
        env::set_var("USBSWITCHD_SWITCH_RESPONSE_DEADLINE_MS", "5000");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().switch.response_deadline_ms, Some(5000));

        env::remove_var("USBSWITCHD_SWITCH_RESPONSE_DEADLINE_MS");
    }

    #[test]
    #[serial]
    fn test_env_timing_overrides() {
        env::set_var("USBSWITCHD_SWITCH_POLL_INTERVAL_MS", "25");
        env::set_var("USBSWITCHD_SWITCH_SETTLE_DELAY_MS", "250");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().switch.poll_interval_ms, 25);
        assert_eq!(loader.config().switch.settle_delay_ms, 250);

        env::remove_var("USBSWITCHD_SWITCH_POLL_INTERVAL_MS");
        env::remove_var("USBSWITCHD_SWITCH_SETTLE_DELAY_MS");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usbswitchd.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 8080

            [serial]
            device = "COM6"
            baud = 38400
            "#,
        )
        .unwrap();

        let loader = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loader.config().server.port, 8080);
        assert_eq!(loader.config().serial.device, "COM6");
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_errors() {
        env::set_var("USBSWITCHD_SERVER_PORT", "not-a-number");

        let result = ConfigLoader::load();
        assert!(result.is_err());

        env::remove_var("USBSWITCHD_SERVER_PORT");
    }
}
