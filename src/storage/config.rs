//! Configuration handling for pipecheck
//!
//! Configuration is stored in `pipecheck.toml` (project, found by walking up
//! from the current directory) and `config.toml` in the platform config
//! directory (global). Command-line flags override both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    PrioritySettings, DEFAULT_EXCEPTION_HANDLER, DEFAULT_METADATA_PREFIX,
    DEFAULT_UNCONDITIONAL_TYPE,
};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "pipecheck.toml";

/// Overrides the global configuration directory
pub const CONFIG_DIR_ENV: &str = "PIPECHECK_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Output format for reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Priority rule settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PriorityConfig {
    /// Name of the catch-all error node that must come first
    pub exception_handler: String,

    /// Recognition type that always matches
    pub unconditional_type: String,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            exception_handler: DEFAULT_EXCEPTION_HANDLER.to_string(),
            unconditional_type: DEFAULT_UNCONDITIONAL_TYPE.to_string(),
        }
    }
}

impl PriorityConfig {
    pub fn settings(&self) -> PrioritySettings {
        PrioritySettings {
            exception_handler: self.exception_handler.clone(),
            unconditional_type: self.unconditional_type.clone(),
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory holding pipeline `*.json` files
    pub pipeline_dir: PathBuf,

    /// Root for template image lookups
    pub image_dir: PathBuf,

    /// Interface document (JSON with comments)
    pub interface: PathBuf,

    /// Treat warnings as failures
    pub strict: bool,

    /// Report nodes unreachable from task entries
    pub unreachable: bool,

    /// Scan the pipeline directory recursively in `check`
    pub recursive: bool,

    /// Top-level keys with this prefix are not nodes
    pub metadata_prefix: String,

    /// Priority rule settings
    pub priority: PriorityConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            pipeline_dir: PathBuf::from("assets/resource/pipeline"),
            image_dir: PathBuf::from("assets/resource/image"),
            interface: PathBuf::from("assets/interface.json"),
            strict: false,
            unreachable: true,
            recursive: false,
            metadata_prefix: DEFAULT_METADATA_PREFIX.to_string(),
            priority: PriorityConfig::default(),
        }
    }
}

impl ProjectConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.priority.unconditional_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "priority.unconditional_type must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    /// Directory relative project paths are resolved against
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project_root = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::find_project_root(&cwd));

        let project = match &project_root {
            Some(root) => Self::load_project_file(&root.join(PROJECT_CONFIG_FILE))?,
            None => ProjectConfig::default(),
        };

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration with an explicit project file
    pub fn from_file(path: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_file(path)?;
        let project_root = path
            .parent()
            .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
            .map(Path::to_path_buf);

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        ProjectDirs::from("dev", "pipecheck", "pipecheck").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads a project configuration file
    fn load_project_file(config_path: &Path) -> Result<ProjectConfig> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;
        config.validate()?;
        Ok(config)
    }

    /// Finds the nearest directory at or above `start` holding `pipecheck.toml`
    pub fn find_project_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Resolves a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
