use crate::options::AccelerationMode;
use crate::platform::DEFAULT_BIN_DIRS;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchDefaults,

    #[serde(default)]
    pub delegate: DelegateConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub acceleration: AccelerationMode,
    pub follow_symlinks: bool,
    pub exclude: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct DelegateConfig {
    /// Directories searched, in order, for bash, find and perl.
    #[serde(default = "default_search_path")]
    pub search_path: Vec<PathBuf>,
}

fn default_search_path() -> Vec<PathBuf> {
    DEFAULT_BIN_DIRS.iter().map(PathBuf::from).collect()
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            search_path: default_search_path(),
        }
    }
}

impl Config {
    /// Load the first config file found, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("rfind/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".rfind.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(".rfind.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.search.acceleration, AccelerationMode::Pattern);
        assert!(!config.search.follow_symlinks);
        assert!(config.search.exclude.is_empty());
        assert_eq!(config.delegate.search_path, default_search_path());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[search]
acceleration = "never"
follow_symlinks = true
exclude = ["/proc", "/sys"]

[delegate]
search_path = ["/opt/gnu/bin"]
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.search.acceleration, AccelerationMode::Never);
        assert!(config.search.follow_symlinks);
        assert_eq!(
            config.search.exclude,
            vec![PathBuf::from("/proc"), PathBuf::from("/sys")]
        );
        assert_eq!(config.delegate.search_path, vec![PathBuf::from("/opt/gnu/bin")]);
    }

    #[test]
    fn test_bad_values_are_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search]\nacceleration = \"sometimes\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
        assert!(Config::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
