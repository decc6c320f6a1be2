//! The `execute` and `manifest` commands
//!
//! These speak the plugin protocol: one JSON request in, one JSON response
//! out. The response is always printed as JSON, whatever `--format` says.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use crate::plugin::{self, PluginManifest};

/// Reads a request from `request` (or stdin) and prints the response
///
/// Exits with a failure status when the response reports an error.
pub fn run(request: Option<&Path>) -> Result<()> {
    let body = match request {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read request: {}", path.display()))?,
        None => {
            let mut body = String::new();
            io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read request from stdin")?;
            body
        }
    };

    let response = plugin::handle(&body);
    println!("{}", serde_json::to_string(&response)?);

    if !response.success {
        std::process::exit(1);
    }

    Ok(())
}

/// Prints the plugin manifest
pub fn manifest(output: &Output) -> Result<()> {
    output.data(&PluginManifest::current());
    Ok(())
}
