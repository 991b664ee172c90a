//! `.scancode.toml` configuration files
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments (--duration, --jobs, etc.)
//! 2. Project config (./.scancode.toml)
//! 3. User config (~/.scancode.toml)
//! 4. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working and home directories
pub const CONFIG_FILE_NAME: &str = ".scancode.toml";

/// Written by `scancode config init`
pub const DEFAULT_CONFIG: &str = r#"# Scancode Configuration File

# Defaults for animate, inspect and batch
[animation]
# Length of one wiggle cycle in seconds
# duration = 2.5

# Stagger between consecutive bars in seconds
# delay_step = 0.06

# Untagged rects up to this size are treated as bars
# max_bar_width = 50.0
# max_bar_height = 200.0

# Defaults for the batch command
[batch]
# Animate files on a worker pool
# parallel = false

# Worker count (implies parallel)
# jobs = 4

# Keep going after a file fails
# continue_on_error = false
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Default animation parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationConfig>,

    /// Default settings for batch command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_step: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bar_width: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bar_height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Use a worker pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    /// Number of workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Continue on errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML text; errors keep their line/column information
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// `~/.scancode.toml`, if the home directory is known
    pub fn user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// `./.scancode.toml`
    pub fn project_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// Find and load configuration files
    /// Returns (`user_config`, `project_config`)
    pub fn discover_configs() -> (Option<Self>, Option<Self>) {
        let user_config = Self::user_path().and_then(|path| Self::load_optional(&path, "user"));
        let project_config = Self::load_optional(&Self::project_path(), "project");
        (user_config, project_config)
    }

    /// Effective configuration from both locations
    pub fn load() -> Self {
        let (user_config, project_config) = Self::discover_configs();
        Self::merge(user_config, project_config)
    }

    fn load_optional(path: &Path, kind: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!(
                    "{} Failed to load {kind} config from {}: {e:#}",
                    "Warning:".yellow().bold(),
                    path.display(),
                );
                None
            }
        }
    }

    /// Merge configs field by field, project values winning over user values
    pub fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let user = user_config.unwrap_or_default();
        let project = project_config.unwrap_or_default();

        let animation = match (user.animation, project.animation) {
            (None, None) => None,
            (user, project) => {
                let user = user.unwrap_or_default();
                let project = project.unwrap_or_default();
                Some(AnimationConfig {
                    duration: project.duration.or(user.duration),
                    delay_step: project.delay_step.or(user.delay_step),
                    max_bar_width: project.max_bar_width.or(user.max_bar_width),
                    max_bar_height: project.max_bar_height.or(user.max_bar_height),
                })
            }
        };

        let batch = match (user.batch, project.batch) {
            (None, None) => None,
            (user, project) => {
                let user = user.unwrap_or_default();
                let project = project.unwrap_or_default();
                Some(BatchConfig {
                    parallel: project.parallel.or(user.parallel),
                    jobs: project.jobs.or(user.jobs),
                    continue_on_error: project.continue_on_error.or(user.continue_on_error),
                })
            }
        };

        Self { animation, batch }
    }
}
