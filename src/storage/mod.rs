//! # Storage Layer
//!
//! File-backed inputs and outputs of a merge run.
//!
//! ## Layout
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Base document | YAML | `<projectPath>/<basePath>` |
//! | Project documents | YAML | `<projectPath>/<projectFolder>/<project>/docker-compose.yml` |
//! | Merged document | YAML | `<projectPath>/<output>/docker/docker-compose.yml` |
//! | Relocated secrets | - | `<projectPath>/<output>/<configFolder>/` |
//! | Settings | TOML | `compose-merge.toml` |
//!
//! ## Write Safety
//!
//! The merged document is written to a temp file under an exclusive lock
//! (`fs2`) and renamed into place.
//!
//! ## Key Types
//!
//! - [`ComposeFile`] - Read/write compose documents as YAML
//! - [`MergeSettings`] - Options for one merge run

mod compose_file;
mod config;

pub use compose_file::{parse, render, ComposeFile, ComposeFileError};
pub use config::{service_name, ConfigError, MergeSettings, SETTINGS_FILE};
