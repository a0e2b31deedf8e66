pub mod init;
mod schema;

pub use schema::{
    Config, LimitsConfig, DEFAULT_DEADLINE, DEFAULT_MAX_DISPLAY, DEFAULT_MAX_INPUT_COURSES,
    DEFAULT_MAX_SCHEDULES, DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE,
};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Get the config directory path (~/.config/schedule-optimizer/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("schedule-optimizer"))
}

/// Get the default config file path (~/.config/schedule-optimizer/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Where term tables live when the config names no `data_dir`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("schedule-optimizer"))
        .unwrap_or_else(|| PathBuf::from("terms"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path
///   (~/.config/schedule-optimizer/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly named config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
///
/// A missing file at the default location is not an error; built-in
/// defaults are returned instead.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path
        }
        None => match get_config_path() {
            Ok(path) if path.exists() => path,
            _ => {
                debug!("no config file found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    debug!(path = %config_path.display(), "loaded config");
    Ok(config)
}

/// Write a config file atomically, creating parent directories as needed.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{CombineMode, ScoringConfig};
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(dir.path().join("nope.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "min_size: [unclosed\n").unwrap();
        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("invalid YAML"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = Config {
            data_dir: Some(dir.path().join("terms")),
            term: Some("202540".to_string()),
            min_size: 3,
            scoring: Some(ScoringConfig {
                combine: Some(CombineMode::Weighted),
                ..ScoringConfig::default()
            }),
            ..Config::default()
        };
        save_config(&path, &config).unwrap();

        let loaded = load_config(Some(path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "garbage: true\n").unwrap();

        save_config(&path, &Config::default()).unwrap();
        let loaded = load_config(Some(path)).unwrap();
        assert_eq!(loaded, Config::default());
    }
}
