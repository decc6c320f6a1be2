//! Action dispatch
//!
//! Decodes a request, runs the action it names and wraps the outcome in a
//! [`PluginResponse`].

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, error};

use super::protocol::{ExecutionRequest, PluginResponse};
use crate::compiler::{BuildReport, Compiler};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("{0} action not found")]
    NotFound(String),
}

/// Actions the plugin understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Merge the base and project compose files
    Merge,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[Action::Merge]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Merge => write!(f, "merge"),
        }
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(Action::Merge),
            other => Err(ActionError::NotFound(other.to_string())),
        }
    }
}

/// Runs a decoded request
pub fn execute(request: ExecutionRequest) -> Result<BuildReport> {
    let action: Action = request.options.action.parse()?;
    debug!(%action, args = ?request.args, "executing plugin request");

    match action {
        Action::Merge => Compiler::new(request.options.settings)
            .build()
            .context("merge failed"),
    }
}

/// Decodes and runs a JSON request body, never failing
///
/// Errors (bad JSON, unknown action, failed merge) become an error
/// response carrying the full error chain.
pub fn handle(body: &str) -> PluginResponse {
    let outcome = serde_json::from_str::<ExecutionRequest>(body)
        .context("invalid request body")
        .and_then(execute)
        .and_then(|report| serde_json::to_value(report).context("failed to encode report"));

    match outcome {
        Ok(data) => PluginResponse::success(data),
        Err(err) => {
            error!(error = %format!("{:#}", err), "plugin request failed");
            PluginResponse::error(format!("{:#}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_known_action() {
        assert_eq!("merge".parse::<Action>(), Ok(Action::Merge));
    }

    #[test]
    fn unknown_action_is_named() {
        let err = "deploy".parse::<Action>().unwrap_err();
        assert_eq!(err.to_string(), "deploy action not found");
    }

    #[test]
    fn handle_unknown_action() {
        let response = handle(r#"{"options": {"action": "split"}}"#);

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("split action not found"));
    }

    #[test]
    fn handle_invalid_json() {
        let response = handle("not json");

        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("invalid request body"));
    }

    #[test]
    fn handle_merge_failure_reports_cause() {
        let response = handle(r#"{"options": {"action": "merge", "output": "build"}}"#);

        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("merge failed: project path not set")
        );
    }

    #[test]
    fn handle_merge_success() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("base.yml"),
            "services:\n  web:\n    image: nginx\n",
        )
        .unwrap();

        let body = serde_json::json!({
            "options": {
                "action": "merge",
                "projectPath": dir.path().display().to_string(),
                "output": "build",
                "basePath": "base.yml",
                "projectFolder": "services",
                "projects": []
            }
        })
        .to_string();

        let response = handle(&body);

        assert!(response.success, "{:?}", response.error);
        assert_eq!(response.data.unwrap()["services"], 1);
        assert!(dir.path().join("build/docker/docker-compose.yml").is_file());
    }
}
