//! YAML storage for compose documents
//!
//! Reads take a shared lock; writes go to a temp file under an exclusive
//! lock and are renamed into place, so a failed write never leaves a
//! half-written compose file behind.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::domain::Document;

#[derive(Debug, Error)]
pub enum ComposeFileError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize compose document")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A compose file on disk
#[derive(Debug, Clone)]
pub struct ComposeFile {
    path: PathBuf,
}

impl ComposeFile {
    /// File name used for per-project and generated compose files
    pub const FILE_NAME: &'static str = "docker-compose.yml";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the document
    pub fn read(&self) -> Result<Document, ComposeFileError> {
        let read_err = |source: std::io::Error| ComposeFileError::Read {
            path: self.path.clone(),
            source,
        };

        let mut file = File::open(&self.path).map_err(read_err)?;
        file.lock_shared().map_err(read_err)?;

        let mut content = String::new();
        file.read_to_string(&mut content).map_err(read_err)?;

        parse(&content).map_err(|source| ComposeFileError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Serializes the document and atomically replaces the file
    ///
    /// Missing parent directories are created.
    pub fn write(&self, document: &Document) -> Result<(), ComposeFileError> {
        let content = render(document)?;

        let write_err = |source: std::io::Error| ComposeFileError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp_path = self.path.with_extension("yml.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(write_err)?;

            file.lock_exclusive().map_err(write_err)?;

            let mut writer = BufWriter::new(&file);
            writer.write_all(content.as_bytes()).map_err(write_err)?;
            writer.flush().map_err(write_err)?;
        }

        fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            write_err(source)
        })
    }
}

/// Parses a compose document from YAML text
///
/// An empty file is an empty document.
pub fn parse(content: &str) -> Result<Document, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Document::new());
    }
    serde_yaml::from_str(content)
}

/// Renders a compose document as YAML text
pub fn render(document: &Document) -> Result<String, ComposeFileError> {
    serde_yaml::to_string(document).map_err(ComposeFileError::Serialize)
}
