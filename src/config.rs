//! Persistent settings.
//!
//! Stored as JSON. A missing or unreadable file yields the defaults; the
//! daemon must come up even when its settings are broken.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::guard::GuardConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Hotkeys only act while a process with this name runs.
    pub watch_process_name: Option<String>,
    /// Ignore the watched process and always act.
    pub dev_mode: bool,
    pub auto_start: bool,
    /// Index into the connected display list.
    pub screen_index: usize,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rotkey").join("config.json"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from `path`, falling back to the defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("No settings at {}: {}", path.display(), e);
                return Config::default();
            }
        };
        match Config::from_json(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Config::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn guard(&self) -> GuardConfig {
        GuardConfig {
            watch_process_name: self.watch_process_name.clone(),
            dev_mode: self.dev_mode,
        }
    }

    /// The configured screen index if it is still valid for `display_count`
    /// displays, otherwise the first display.
    pub fn screen_index_within(&self, display_count: usize) -> usize {
        if self.screen_index < display_count {
            self.screen_index
        } else {
            tracing::warn!(
                "Screen index {} out of range for {} display(s), using 0",
                self.screen_index,
                display_count
            );
            0
        }
    }
}

/// The settings the daemon runs with, re-read whenever the file on disk
/// changes so edits take effect without a restart.
pub struct ConfigStore {
    path: Option<PathBuf>,
    config: Config,
    modified: Option<SystemTime>,
}

impl ConfigStore {
    pub fn load(path: PathBuf) -> Self {
        let modified = modified_time(&path);
        let config = Config::load_or_default(&path);
        ConfigStore {
            path: Some(path),
            config,
            modified,
        }
    }

    /// Settings that live only in memory.
    pub fn fixed(config: Config) -> Self {
        ConfigStore {
            path: None,
            config,
            modified: None,
        }
    }

    pub fn get(&self) -> &Config {
        &self.config
    }

    /// Reload the settings if the file changed since the last look.
    pub fn refresh(&mut self) -> &Config {
        if let Some(path) = &self.path {
            let modified = modified_time(path);
            if modified != self.modified {
                tracing::info!("Settings changed, reloading {}", path.display());
                self.config = Config::load_or_default(path);
                self.modified = modified;
            }
        }
        &self.config
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load_or_default(&dir.path().join("config.json"));
        assert_eq!(config, Config::default());
        assert!(!config.dev_mode);
        assert_eq!(config.watch_process_name, None);
        Ok(())
    }

    #[test]
    fn corrupt_file_yields_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, "{ \"devMode\": tru")?;
        assert_eq!(Config::load_or_default(&path), Config::default());
        Ok(())
    }

    #[test]
    fn reads_camel_case_keys() -> Result<()> {
        let config = Config::from_json(
            r#"{"watchProcessName":"Game.exe","devMode":false,"autoStart":true,"screenIndex":1,"extra":3}"#,
        )?;
        assert_eq!(
            config,
            Config {
                watch_process_name: Some("Game.exe".into()),
                dev_mode: false,
                auto_start: true,
                screen_index: 1,
            }
        );
        Ok(())
    }

    #[test]
    fn partial_file_fills_defaults() -> Result<()> {
        let config = Config::from_json(r#"{"devMode":true}"#)?;
        assert!(config.dev_mode);
        assert_eq!(config.screen_index, 0);
        Ok(())
    }

    #[test]
    fn saves_and_loads() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            watch_process_name: Some("App".into()),
            dev_mode: true,
            auto_start: false,
            screen_index: 2,
        };
        config.save(&path)?;
        assert_eq!(Config::load_or_default(&path), config);
        Ok(())
    }

    #[test]
    fn stale_screen_index_falls_back_to_first() {
        let config = Config {
            screen_index: 3,
            ..Config::default()
        };
        assert_eq!(config.screen_index_within(2), 0);
        assert_eq!(config.screen_index_within(4), 3);
    }

    #[test]
    fn store_reloads_edited_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        let mut store = ConfigStore::load(path.clone());
        assert!(!store.get().dev_mode);

        Config {
            dev_mode: true,
            ..Config::default()
        }
        .save(&path)?;
        assert!(store.refresh().dev_mode);
        Ok(())
    }
}
