use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::spinner::SpinTiming;

pub const DEFAULT_IDLE_MS: u64 = 250;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub timing: SpinTiming,
    pub seed: Option<u64>,
    /// Longest the terminal loop blocks on input while no timer is due
    pub idle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: SpinTiming::default(),
            seed: None,
            idle_ms: DEFAULT_IDLE_MS,
        }
    }
}

impl Config {
    /// Replaces out-of-range values with their defaults
    pub fn sanitized(mut self) -> Self {
        self.timing = self.timing.validated();
        if self.idle_ms == 0 {
            warn!("idle_ms must be positive, using {}", DEFAULT_IDLE_MS);
            self.idle_ms = DEFAULT_IDLE_MS;
        }
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("whirl_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.sanitized(),
            Err(e) => {
                warn!("ignoring malformed config {}: {}", self.path.display(), e);
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
