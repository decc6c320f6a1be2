//! The `merge` command

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use super::output::Output;
use crate::compiler::Compiler;
use crate::storage::{render, MergeSettings};

#[derive(Args, Debug, Default)]
pub struct MergeArgs {
    /// Settings file (defaults to ./compose-merge.toml when present)
    #[arg(long, short = 'c', env = "COMPOSE_MERGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory of the project
    #[arg(long, env = "COMPOSE_MERGE_PROJECT_PATH")]
    pub project_path: Option<String>,

    /// Output directory, relative to the project root
    #[arg(long, short = 'o', env = "COMPOSE_MERGE_OUTPUT")]
    pub output: Option<String>,

    /// Base compose file, relative to the project root
    #[arg(long, env = "COMPOSE_MERGE_BASE_PATH")]
    pub base_path: Option<String>,

    /// Directory holding one folder per project
    #[arg(long, env = "COMPOSE_MERGE_PROJECT_FOLDER")]
    pub project_folder: Option<String>,

    /// Project to merge, in order (repeatable; replaces the settings file list)
    #[arg(
        long = "project",
        short = 'p',
        env = "COMPOSE_MERGE_PROJECTS",
        value_delimiter = ','
    )]
    pub projects: Vec<String>,

    /// Staging folder for relocated secret files
    #[arg(long, env = "COMPOSE_MERGE_CONFIG_FOLDER")]
    pub config_folder: Option<String>,

    /// Print the merged document instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

impl MergeArgs {
    /// Layers flags and environment over the settings file
    pub fn settings(&self) -> Result<MergeSettings> {
        let mut settings = match &self.config {
            Some(path) => MergeSettings::load(path)?,
            None => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                MergeSettings::discover(&cwd)?
            }
        };

        let overrides = [
            (&self.project_path, &mut settings.project_path),
            (&self.output, &mut settings.output),
            (&self.base_path, &mut settings.base_path),
            (&self.project_folder, &mut settings.project_folder),
            (&self.config_folder, &mut settings.config_folder),
        ];
        for (flag, field) in overrides {
            if let Some(value) = flag {
                *field = value.clone();
            }
        }

        if !self.projects.is_empty() {
            settings.projects = self.projects.clone();
        }

        Ok(settings)
    }
}

pub fn run(args: MergeArgs, output: &Output) -> Result<()> {
    let settings = args.settings()?;
    debug!(?settings, "resolved merge settings");

    let compiler = Compiler::new(settings);

    if args.stdout {
        let compilation = compiler.compile()?;
        for skipped in &compilation.skipped {
            output.warn(&format!("skipped {}: {}", skipped.project, skipped.reason));
        }

        let yaml = render(&compilation.document)?;
        if output.is_json() {
            output.data(&serde_json::json!({
                "merged": compilation.merged,
                "skipped": compilation.skipped,
                "document": yaml,
            }));
        } else {
            print!("{}", yaml);
        }
        return Ok(());
    }

    let report = compiler.build()?;

    if output.is_json() {
        output.data(&report);
        return Ok(());
    }

    for skipped in &report.skipped {
        output.warn(&format!("skipped {}: {}", skipped.project, skipped.reason));
    }
    output.success(&format!(
        "Merged {} project(s) into {} ({} services)",
        report.merged.len(),
        report.output_path.display(),
        report.services
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn flags_override_settings_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("merge.toml");
        fs::write(
            &config,
            "projectPath = \"/srv\"\noutput = \"dist\"\nprojects = [\"api\"]\n",
        )
        .unwrap();

        let args = MergeArgs {
            config: Some(config),
            output: Some("build".to_string()),
            projects: vec!["web".to_string(), "worker".to_string()],
            ..Default::default()
        };

        let settings = args.settings().unwrap();
        assert_eq!(settings.project_path, "/srv");
        assert_eq!(settings.output, "build");
        assert_eq!(settings.projects, vec!["web", "worker"]);
    }

    #[test]
    fn missing_config_file_is_error() {
        let dir = TempDir::new().unwrap();
        let args = MergeArgs {
            config: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };

        let err = args.settings().unwrap_err();
        assert!(format!("{:#}", err).contains("absent.toml"));
    }
}
