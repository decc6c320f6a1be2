//! Merge settings
//!
//! The options record that drives a merge. It arrives as the `options`
//! object of a plugin request (JSON, camelCase keys) or from a
//! `compose-merge.toml` file, where snake_case keys are accepted too.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ComposeFile;
use crate::domain::{relative, SecretStaging, DEFAULT_CONFIG_FOLDER};

/// File name looked up in the working directory when no `--config` is given
pub const SETTINGS_FILE: &str = "compose-merge.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Options for one merge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeSettings {
    /// Root directory of the project; every other path is relative to it
    #[serde(alias = "project_path")]
    pub project_path: String,

    /// Output directory; the merged file lands in `<output>/docker/`
    pub output: String,

    /// Path of the base compose file
    #[serde(alias = "base_path")]
    pub base_path: String,

    /// Directory holding one folder per project
    #[serde(alias = "project_folder")]
    pub project_folder: String,

    /// Project identifiers, merged in this order; the last path segment
    /// names the project's own service
    pub projects: Vec<String>,

    /// Staging folder for relocated secret files (default `config`)
    #[serde(alias = "config_folder")]
    pub config_folder: String,
}

impl MergeSettings {
    /// Loads settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to load settings: {}", path.display()))
    }

    /// Loads `compose-merge.toml` from `dir` if present, defaults otherwise
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Parses settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Root directory as a path
    pub fn root(&self) -> PathBuf {
        PathBuf::from(&self.project_path)
    }

    /// Location of the base compose file
    pub fn base_file(&self) -> PathBuf {
        self.root().join(relative(&self.base_path))
    }

    /// Location of a project's compose file
    pub fn project_file(&self, project: &str) -> PathBuf {
        self.root()
            .join(relative(&self.project_folder))
            .join(relative(project))
            .join(ComposeFile::FILE_NAME)
    }

    /// Location of the generated compose file
    pub fn output_file(&self) -> PathBuf {
        self.root()
            .join(relative(&self.output))
            .join("docker")
            .join(ComposeFile::FILE_NAME)
    }

    /// Build context for a project's service
    ///
    /// Every component is kept under the project root, even when written
    /// as an absolute path.
    pub fn build_context(&self, service_name: &str) -> PathBuf {
        self.root()
            .join(relative(&self.project_folder))
            .join(relative(service_name))
    }

    /// Secret staging directory derived from these settings
    pub fn staging(&self) -> SecretStaging {
        let folder = if self.config_folder.is_empty() {
            DEFAULT_CONFIG_FOLDER
        } else {
            self.config_folder.as_str()
        };
        SecretStaging::new(self.root(), self.output.clone(), folder)
    }
}

/// The service a project identifier refers to: its last path segment
pub fn service_name(project: &str) -> Option<&str> {
    project
        .rsplit('/')
        .find(|segment| !segment.is_empty())
}
