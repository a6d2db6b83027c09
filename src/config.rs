//! Runtime configuration for a probe run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ProbeError, Result};

pub const DEFAULT_WATCH_DIR: &str = "./docs";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Directory to watch, as given on the command line
    pub watch_path: PathBuf,
    /// Interval of the polling session
    pub poll_interval: Duration,
    /// Colour event categories with ANSI escapes
    pub color: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            watch_path: PathBuf::from(DEFAULT_WATCH_DIR),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            color: true,
        }
    }
}

impl ProbeConfig {
    pub fn with_watch_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.watch_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Checks the target is an existing directory and returns its absolute form.
    pub fn resolve_watch_path(&self) -> Result<PathBuf> {
        let path = &self.watch_path;
        if !path.exists() {
            return Err(ProbeError::DirectoryNotFound(path.clone()));
        }
        if !path.is_dir() {
            return Err(ProbeError::NotADirectory(path.clone()));
        }
        Ok(path.canonicalize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(ProbeError::InvalidConfig(
                "poll interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
