//! compose-merge - merge a base docker-compose file with per-project overrides
//!
//! A project tree holds one base compose file and one compose file per
//! project. The merge folds every project file into the base, in order,
//! combining services field by field, relocating secret files into the
//! output tree, and pointing each project's build context at its folder.

pub mod domain;
pub mod storage;
pub mod compiler;
pub mod plugin;
pub mod cli;

pub use compiler::{BuildReport, Compiler};
pub use domain::{combine, Document, MergeOptions, Service};
pub use storage::MergeSettings;
