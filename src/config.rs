//! Configuration management
//!
//! Read from the `--config` path, or `airgap-ur.toml` in the working
//! directory. Missing sections and fields take their defaults; a file that
//! cannot be read or fails validation is ignored with a warning.

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_DISPLAY_INTERVAL_MS, DEFAULT_MAX_LINE_LEN};
use crate::error::{HostError, Result};
use crate::ur::EncoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// =============================================================================
// Application Configuration
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encoder: EncoderConfig,
    pub display: DisplayConfig,
    pub scanner: ScannerConfig,
}

// =============================================================================
// Display Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Delay between frames (milliseconds)
    pub interval_ms: u64,
    /// Emit frames in uppercase (QR alphanumeric mode)
    pub uppercase: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_DISPLAY_INTERVAL_MS,
            uppercase: true,
        }
    }
}

// =============================================================================
// Scanner Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Give up after this many seconds (0 = wait forever)
    pub timeout_secs: u64,
    /// Lines longer than this are discarded (bytes)
    pub max_line_len: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl Config {
    /// Reject values the encoder or host loops cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.encoder.max_fragment_len == 0 {
            return Err(HostError::ConfigValidation {
                field: "encoder.max_fragment_len",
                reason: "must be at least 1".into(),
            });
        }
        if self.display.interval_ms == 0 {
            return Err(HostError::ConfigValidation {
                field: "display.interval_ms",
                reason: "must be at least 1".into(),
            });
        }
        if self.scanner.max_line_len == 0 {
            return Err(HostError::ConfigValidation {
                field: "scanner.max_line_len",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Config file path: explicit override, else the working directory default
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Read and validate a config file
pub fn load_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| HostError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| HostError::ConfigValidation {
        field: "config",
        reason: format!("{}: {}", path.display(), e),
    })?;

    config.validate()?;
    Ok(config)
}

/// Load config, falling back to defaults on any problem
pub fn load(explicit: Option<&Path>) -> Config {
    let path = config_path(explicit);

    if explicit.is_none() && !path.exists() {
        debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            debug!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            warn!("{}, using defaults", e);
            Config::default()
        }
    }
}

/// Save config to file
pub fn save(config: &Config, path: &Path) -> Result<()> {
    // Config is always serializable (all fields are serde-compatible)
    let content = toml::to_string_pretty(config).expect("Config serialization failed");
    fs::write(path, content).map_err(|e| HostError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("airgap-ur-{}-{}.toml", name, std::process::id()))
    }

    // =========================================================================
    // Default values tests
    // =========================================================================

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.encoder.max_fragment_len, 400);
        assert_eq!(config.encoder.min_fragment_len, 10);
        assert_eq!(config.encoder.repair_ratio_bps, 10_000);
        assert_eq!(config.display.interval_ms, DEFAULT_DISPLAY_INTERVAL_MS);
        assert!(config.display.uppercase);
        assert_eq!(config.scanner.timeout_secs, 0);
        assert_eq!(config.scanner.max_line_len, DEFAULT_MAX_LINE_LEN);
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // Parsing tests
    // =========================================================================

    #[test]
    fn test_config_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_partial_sections() {
        let partial_toml = r#"
[encoder]
max_fragment_len = 200

[display]
uppercase = false
"#;

        let config: Config = toml::from_str(partial_toml).unwrap();
        assert_eq!(config.encoder.max_fragment_len, 200);
        assert!(!config.display.uppercase);
        // Rest should be defaults
        assert_eq!(config.encoder.min_fragment_len, 10);
        assert_eq!(config.display.interval_ms, DEFAULT_DISPLAY_INTERVAL_MS);
        assert_eq!(config.scanner, ScannerConfig::default());
    }

    #[test]
    fn test_config_serialize_deserialize_roundtrip() {
        let config = Config {
            encoder: EncoderConfig {
                max_fragment_len: 250,
                min_fragment_len: 20,
                repair_ratio_bps: 5_000,
            },
            display: DisplayConfig {
                interval_ms: 250,
                uppercase: false,
            },
            scanner: ScannerConfig {
                timeout_secs: 30,
                max_line_len: 4096,
            },
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored, config);
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.encoder.max_fragment_len = 0;
        assert!(matches!(
            config.validate(),
            Err(HostError::ConfigValidation {
                field: "encoder.max_fragment_len",
                ..
            })
        ));

        let mut config = Config::default();
        config.display.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scanner.max_line_len = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // File tests
    // =========================================================================

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let mut config = Config::default();
        config.display.interval_ms = 40;
        save(&config, &path).unwrap();

        assert_eq!(load_from(&path).unwrap(), config);
        assert_eq!(load(Some(&path)), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_falls_back_on_bad_file() {
        let path = temp_path("invalid");
        fs::write(&path, "[encoder]\nmax_fragment_len = \"many\"\n").unwrap();
        assert!(matches!(
            load_from(&path),
            Err(HostError::ConfigValidation { .. })
        ));
        assert_eq!(load(Some(&path)), Config::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let path = temp_path("missing");
        assert!(matches!(
            load_from(&path),
            Err(HostError::ConfigRead { .. })
        ));
        assert_eq!(load(Some(&path)), Config::default());
    }

    #[test]
    fn test_config_path_override() {
        assert_eq!(config_path(None), PathBuf::from(CONFIG_FILE_NAME));
        assert_eq!(
            config_path(Some(Path::new("/etc/x.toml"))),
            PathBuf::from("/etc/x.toml")
        );
    }
}
