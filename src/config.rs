// src/config.rs

use crate::error::{Result, TimelineError};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "git-timeline.toml";

/// Settings of the project-wide line estimate
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlocSettings {
    /// Code files whose content is read per commit
    pub sample_size: usize,
    /// Estimated total lines per code line (blank lines on top of code)
    pub total_lines_factor: f64,
}

impl Default for TlocSettings {
    fn default() -> Self {
        Self {
            sample_size: 10,
            total_lines_factor: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineConfig {
    /// Commits loaded per refresh
    pub limit: usize,
    pub tloc: TlocSettings,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            tloc: TlocSettings::default(),
        }
    }
}

impl TimelineConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: TimelineConfig =
            toml::from_str(content).map_err(|e| TimelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` if given (it must exist), otherwise `git-timeline.toml`
    /// under `repo_root` when present, otherwise defaults.
    pub fn load(repo_root: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let content = std::fs::read_to_string(path)?;
            debug!("Loaded config from {}", path.display());
            return Self::from_toml(&content);
        }

        match repo_root.map(|root| root.join(CONFIG_FILE_NAME)) {
            Some(path) if path.is_file() => {
                let content = std::fs::read_to_string(&path)?;
                debug!("Loaded config from {}", path.display());
                Self::from_toml(&content)
            }
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(TimelineError::Config("limit must be at least 1".into()));
        }
        if self.tloc.sample_size == 0 {
            return Err(TimelineError::Config("tloc.sample_size must be at least 1".into()));
        }
        let factor = self.tloc.total_lines_factor;
        if factor.is_nan() || factor < 1.0 {
            return Err(TimelineError::Config(format!(
                "tloc.total_lines_factor must be at least 1.0, got {}",
                factor
            )));
        }
        Ok(())
    }
}
