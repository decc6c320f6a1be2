//! The merge pipeline
//!
//! 1. Check the required settings.
//! 2. Load the base document (fatal on failure).
//! 3. Load every project document (skipped on failure).
//! 4. Inject the build context into each project's own service.
//! 5. Fold the project documents into the base, in order.
//! 6. Write the result to `<output>/docker/docker-compose.yml`.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use super::inject::inject_build_context;
use crate::domain::{combine, Document, MergeError, MergeOptions};
use crate::storage::{service_name, ComposeFile, ComposeFileError, MergeSettings};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("project path not set")]
    ProjectPathNotSet,

    #[error("output path not set")]
    OutputPathNotSet,

    #[error("error reading base compose file")]
    ReadBase(#[source] ComposeFileError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("error writing merged compose file")]
    Write(#[source] ComposeFileError),
}

/// A project left out of the merge, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedProject {
    pub project: String,
    pub reason: String,
}

/// The merged document before it is written
#[derive(Debug)]
pub struct Compilation {
    pub document: Document,

    /// Projects folded into the document, in merge order
    pub merged: Vec<String>,

    pub skipped: Vec<SkippedProject>,
}

/// Outcome of a successful build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub output_path: PathBuf,
    pub merged: Vec<String>,
    pub skipped: Vec<SkippedProject>,
    pub services: usize,
}

/// Runs the merge pipeline for one set of settings
#[derive(Debug)]
pub struct Compiler {
    settings: MergeSettings,
    options: MergeOptions,
}

impl Compiler {
    /// Creates a compiler with the default merge options
    pub fn new(settings: MergeSettings) -> Self {
        let options = MergeOptions::new(settings.staging());
        Self { settings, options }
    }

    /// Replaces the merge options
    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    /// Loads and merges everything, without writing
    pub fn compile(&self) -> Result<Compilation, CompileError> {
        let _span = info_span!("compile", root = %self.settings.project_path).entered();

        self.validate()?;

        let base_file = ComposeFile::new(self.settings.base_file());
        info!(path = %base_file.path().display(), "reading base compose file");
        let base = base_file.read().map_err(CompileError::ReadBase)?;

        let (projects, skipped) = self.load_projects();

        info!(count = projects.len(), "merging project compose files");
        let mut document = combine(Some(&base), None, &self.options)?.into_owned();
        let mut merged = Vec::with_capacity(projects.len());

        for (project, project_doc) in projects {
            let next = combine(Some(&document), Some(&project_doc), &self.options)?.into_owned();
            document = next;
            merged.push(project);
        }

        Ok(Compilation {
            document,
            merged,
            skipped,
        })
    }

    /// Compiles and writes the merged document
    pub fn build(&self) -> Result<BuildReport, CompileError> {
        let compilation = self.compile()?;

        let output = ComposeFile::new(self.settings.output_file());
        output
            .write(&compilation.document)
            .map_err(CompileError::Write)?;

        info!(path = %output.path().display(), "generated compose file");

        Ok(BuildReport {
            output_path: output.path().to_path_buf(),
            merged: compilation.merged,
            skipped: compilation.skipped,
            services: compilation.document.services.len(),
        })
    }

    fn validate(&self) -> Result<(), CompileError> {
        if self.settings.project_path.is_empty() {
            return Err(CompileError::ProjectPathNotSet);
        }
        if self.settings.output.is_empty() {
            return Err(CompileError::OutputPathNotSet);
        }
        Ok(())
    }

    /// Reads each project's compose file, skipping the ones that fail
    fn load_projects(&self) -> (Vec<(String, Document)>, Vec<SkippedProject>) {
        let mut loaded = Vec::new();
        let mut skipped = Vec::new();

        for project in &self.settings.projects {
            let file = ComposeFile::new(self.settings.project_file(project));
            debug!(
                project = %project,
                path = %file.path().display(),
                "reading project compose file"
            );

            let mut document = match file.read() {
                Ok(document) => document,
                Err(err) => {
                    let reason = format!("{:#}", anyhow::Error::new(err));
                    warn!(project = %project, %reason, "skipping project");
                    skipped.push(SkippedProject {
                        project: project.clone(),
                        reason,
                    });
                    continue;
                }
            };

            match service_name(project) {
                Some(name) => match document.services.get_mut(name) {
                    Some(service) => {
                        if let Err(err) = inject_build_context(service, name, &self.settings) {
                            warn!(
                                project = %project,
                                service = name,
                                error = %err,
                                "build context not set"
                            );
                        }
                    }
                    None => debug!(
                        project = %project,
                        service = name,
                        "project has no service of its own"
                    ),
                },
                None => warn!(project = %project, "project identifier has no name segment"),
            }

            loaded.push((project.clone(), document));
        }

        (loaded, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Precedence, Secret, Service};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn settings(root: &Path, projects: &[&str]) -> MergeSettings {
        MergeSettings {
            project_path: root.display().to_string(),
            output: "build".to_string(),
            base_path: "docker-compose.base.yml".to_string(),
            project_folder: "services".to_string(),
            projects: projects.iter().map(|p| p.to_string()).collect(),
            config_folder: "config".to_string(),
        }
    }

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "docker-compose.base.yml",
            "version: '3.8'\nservices:\n  web:\n    image: nginx\n",
        );
        write(
            dir.path(),
            "services/api/docker-compose.yml",
            "services:\n  api:\n    image: app\n    build:\n      dockerfile: Dockerfile\n",
        );
        dir
    }

    #[test]
    fn missing_project_path_is_fatal() {
        let mut s = settings(Path::new("/tmp"), &[]);
        s.project_path.clear();

        let err = Compiler::new(s).compile().unwrap_err();
        assert!(matches!(err, CompileError::ProjectPathNotSet));
    }

    #[test]
    fn missing_output_is_fatal() {
        let mut s = settings(Path::new("/tmp"), &[]);
        s.output.clear();

        let err = Compiler::new(s).build().unwrap_err();
        assert!(matches!(err, CompileError::OutputPathNotSet));
    }

    #[test]
    fn missing_base_is_fatal() {
        let dir = TempDir::new().unwrap();

        let err = Compiler::new(settings(dir.path(), &[]))
            .compile()
            .unwrap_err();
        assert!(matches!(err, CompileError::ReadBase(_)));
    }

    #[test]
    fn merges_base_and_project() {
        let dir = setup();

        let compilation = Compiler::new(settings(dir.path(), &["api"]))
            .compile()
            .unwrap();
        let doc = compilation.document;

        assert_eq!(compilation.merged, vec!["api"]);
        assert!(compilation.skipped.is_empty());
        assert_eq!(doc.version.as_deref(), Some("3.8"));
        assert_eq!(doc.services["web"], Service::from_image("nginx"));

        let build = doc.services["api"].build.as_ref().unwrap();
        let expected = dir.path().join("services").join("api").display().to_string();
        assert_eq!(build.context.as_deref(), Some(expected.as_str()));
        assert_eq!(build.dockerfile.as_deref(), Some("Dockerfile"));
    }

    #[test]
    fn broken_project_is_skipped() {
        let dir = setup();
        write(dir.path(), "services/bad/docker-compose.yml", "services: [oops]\n");

        let compilation = Compiler::new(settings(dir.path(), &["bad", "missing", "api"]))
            .compile()
            .unwrap();

        assert_eq!(compilation.merged, vec!["api"]);
        let skipped: Vec<_> = compilation
            .skipped
            .iter()
            .map(|s| s.project.as_str())
            .collect();
        assert_eq!(skipped, vec!["bad", "missing"]);
        assert!(compilation.document.services.contains_key("api"));

        let bad = &compilation.skipped[0].reason;
        assert!(bad.starts_with("failed to parse "), "{bad}");

        let missing = &compilation.skipped[1].reason;
        assert!(missing.starts_with("failed to read "), "{missing}");
        assert!(missing.contains("missing"), "{missing}");
        assert_eq!(missing.matches("os error").count(), 1, "{missing}");
    }

    #[test]
    fn project_without_build_still_merges() {
        let dir = setup();
        write(
            dir.path(),
            "services/team/worker/docker-compose.yml",
            "services:\n  worker:\n    image: worker\n",
        );

        let compilation = Compiler::new(settings(dir.path(), &["team/worker"]))
            .compile()
            .unwrap();

        let worker = &compilation.document.services["worker"];
        assert_eq!(worker.image.as_deref(), Some("worker"));
        assert!(worker.build.is_none());
    }

    #[test]
    fn later_projects_override_earlier_ones() {
        let dir = setup();
        write(
            dir.path(),
            "services/edge/docker-compose.yml",
            concat!(
                "version: '3.9'\n",
                "services:\n  web:\n    image: caddy\n",
                "    environment:\n      TIER: edge\n",
            ),
        );

        let compilation = Compiler::new(settings(dir.path(), &["api", "edge"]))
            .compile()
            .unwrap();
        let doc = compilation.document;

        assert_eq!(doc.version.as_deref(), Some("3.9"));
        assert_eq!(doc.services["web"].image.as_deref(), Some("caddy"));
        assert_eq!(doc.services["web"].environment.as_ref().unwrap()["TIER"], "edge");
    }

    #[test]
    fn custom_options_are_used() {
        let dir = setup();
        write(
            dir.path(),
            "services/edge/docker-compose.yml",
            "version: '3.9'\nservices:\n  web:\n    image: caddy\n",
        );
        let s = settings(dir.path(), &["edge"]);
        let options = MergeOptions::new(s.staging())
            .without_resolver()
            .with_precedence(Precedence::First);

        let doc = Compiler::new(s)
            .with_options(options)
            .compile()
            .unwrap()
            .document;

        assert_eq!(doc.version.as_deref(), Some("3.8"));
        assert_eq!(doc.services["web"].image.as_deref(), Some("nginx"));
    }

    #[test]
    fn secrets_relocated_into_output() {
        let dir = setup();
        write(
            dir.path(),
            "services/api/docker-compose.yml",
            concat!(
                "services:\n  api:\n    image: app\n",
                "secrets:\n  creds:\n    file: ./secrets/creds.pem\n",
            ),
        );

        let doc = Compiler::new(settings(dir.path(), &["api"]))
            .compile()
            .unwrap()
            .document;

        let expected = dir
            .path()
            .join("build")
            .join("config")
            .join("creds.pem")
            .display()
            .to_string();
        assert_eq!(doc.secrets["creds"], Secret::from_file(expected));
    }

    #[test]
    fn build_writes_output_file() {
        let dir = setup();

        let report = Compiler::new(settings(dir.path(), &["api"]))
            .build()
            .unwrap();

        let expected = dir.path().join("build/docker/docker-compose.yml");
        assert_eq!(report.output_path, expected);
        assert_eq!(report.services, 2);

        let written = ComposeFile::new(&expected).read().unwrap();
        assert!(written.services.contains_key("web"));
        assert!(written.services.contains_key("api"));
    }

    #[test]
    fn write_failure_is_fatal() {
        let dir = setup();
        write(dir.path(), "build/docker", "not a directory");

        let err = Compiler::new(settings(dir.path(), &["api"]))
            .build()
            .unwrap_err();

        assert!(matches!(err, CompileError::Write(_)));
        let message = format!("{:#}", anyhow::Error::new(err));
        assert!(message.starts_with("error writing merged compose file: failed to write"));
    }

    #[test]
    fn base_only_build() {
        let dir = setup();

        let report = Compiler::new(settings(dir.path(), &[])).build().unwrap();

        assert!(report.merged.is_empty());
        let written = ComposeFile::new(&report.output_path).read().unwrap();
        assert_eq!(written.services.len(), 1);
    }
}
