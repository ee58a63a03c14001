//! TOML-based configuration for a mission run.
//!
//! The file is optional.  When it is missing every value falls back to its
//! default, and the command line can override the most common fields.
//!
//! # Example
//!
//! ```toml
//! [explorers]
//! threads = 4
//! hash_iterations = 1000
//!
//! [headquarters]
//! threads = 2
//!
//! [mission]
//! systems = 64
//! seed_prefix = "frequency"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so a file that only sets
//! `[explorers] threads = 8` is valid and keeps everything else at default.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Upper bound on planned systems; system ids must fit a [`deepspace_core::NodeId`].
pub const MAX_SYSTEMS: u32 = 1_000_000;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed correctly but cannot be used.
    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level mission configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MissionConfig {
    #[serde(default)]
    pub explorers: ExplorerConfig,
    #[serde(default)]
    pub headquarters: HeadquartersConfig,
    #[serde(default)]
    pub mission: PlanConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplorerConfig {
    /// Number of explorer threads.
    #[serde(default = "default_explorer_threads")]
    pub threads: usize,
    /// How many times each work payload is hashed.
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadquartersConfig {
    /// Number of headquarters producer threads.
    #[serde(default = "default_headquarters_threads")]
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanConfig {
    /// Number of systems to decode.
    #[serde(default = "default_systems")]
    pub systems: u32,
    /// Prefix for each system's encoded frequency.
    #[serde(default = "default_seed_prefix")]
    pub seed_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_explorer_threads() -> usize {
    4
}
fn default_hash_iterations() -> u32 {
    1000
}
fn default_headquarters_threads() -> usize {
    2
}
fn default_systems() -> u32 {
    64
}
fn default_seed_prefix() -> String {
    "frequency".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            threads: default_explorer_threads(),
            hash_iterations: default_hash_iterations(),
        }
    }
}

impl Default for HeadquartersConfig {
    fn default() -> Self {
        Self {
            threads: default_headquarters_threads(),
        }
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            systems: default_systems(),
            seed_prefix: default_seed_prefix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

impl MissionConfig {
    /// Checks every value a mission depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.explorers.threads == 0 {
            return Err(invalid("explorers.threads", "must be at least 1"));
        }
        if self.explorers.hash_iterations == 0 {
            return Err(invalid("explorers.hash_iterations", "must be at least 1"));
        }
        if self.headquarters.threads == 0 {
            return Err(invalid("headquarters.threads", "must be at least 1"));
        }
        if self.mission.systems > MAX_SYSTEMS {
            return Err(invalid(
                "mission.systems",
                format!("must not exceed {MAX_SYSTEMS}"),
            ));
        }
        self.log_level()?;
        Ok(())
    }

    /// Hash iterations as the non-zero count explorers require.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the value is zero.
    pub fn hash_iterations(&self) -> Result<NonZeroU32, ConfigError> {
        NonZeroU32::new(self.explorers.hash_iterations)
            .ok_or_else(|| invalid("explorers.hash_iterations", "must be at least 1"))
    }

    /// Parses `logging.level` into a filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown level name.
    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.logging.level)
            .map_err(|e| invalid("logging.level", format!("'{}': {e}", self.logging.level)))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads `MissionConfig` from `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<MissionConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MissionConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &MissionConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "deepspace-config-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_mission_config_default_values() {
        // Arrange / Act
        let cfg = MissionConfig::default();

        // Assert
        assert_eq!(cfg.explorers.threads, 4);
        assert_eq!(cfg.explorers.hash_iterations, 1000);
        assert_eq!(cfg.headquarters.threads, 2);
        assert_eq!(cfg.mission.systems, 64);
        assert_eq!(cfg.mission.seed_prefix, "frequency");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(MissionConfig::default().validate().is_ok());
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: MissionConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, MissionConfig::default());
    }

    #[test]
    fn test_deserialize_partial_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[explorers]
threads = 8
"#;

        // Act
        let cfg: MissionConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.explorers.threads, 8);
        assert_eq!(cfg.explorers.hash_iterations, 1000);
        assert_eq!(cfg.headquarters.threads, 2);
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_error() {
        let result: Result<MissionConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_zero_explorers() {
        let mut cfg = MissionConfig::default();
        cfg.explorers.threads = 0;

        let err = cfg.validate().expect_err("zero explorers must be rejected");

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "explorers.threads",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_zero_hash_iterations() {
        let mut cfg = MissionConfig::default();
        cfg.explorers.hash_iterations = 0;

        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "explorers.hash_iterations",
                ..
            })
        ));
        assert!(cfg.hash_iterations().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_headquarters() {
        let mut cfg = MissionConfig::default();
        cfg.headquarters.threads = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_too_many_systems() {
        let mut cfg = MissionConfig::default();
        cfg.mission.systems = MAX_SYSTEMS + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_zero_systems() {
        let mut cfg = MissionConfig::default();
        cfg.mission.systems = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut cfg = MissionConfig::default();
        cfg.logging.level = "chatty".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "logging.level",
                ..
            })
        ));
    }

    #[test]
    fn test_log_level_parses_debug() {
        let mut cfg = MissionConfig::default();
        cfg.logging.level = "debug".to_string();
        assert_eq!(cfg.log_level().expect("valid level"), LevelFilter::DEBUG);
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = scratch_dir("missing");
        let cfg = load_config(&dir.join("absent.toml")).expect("missing file is not an error");
        assert_eq!(cfg, MissionConfig::default());
    }

    #[test]
    fn test_save_then_load_restores_config() {
        // Arrange
        let dir = scratch_dir("save");
        let path = dir.join("nested").join("mission.toml");
        let mut cfg = MissionConfig::default();
        cfg.explorers.threads = 6;
        cfg.mission.seed_prefix = "alpha".to_string();

        // Act
        save_config(&path, &cfg).expect("save");
        let restored = load_config(&path).expect("load");

        // Assert
        assert_eq!(restored, cfg);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_malformed_file_returns_parse_error() {
        let dir = scratch_dir("malformed");
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("bad.toml");
        std::fs::write(&path, "[explorers\nthreads = ").expect("write");

        let result = load_config(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
