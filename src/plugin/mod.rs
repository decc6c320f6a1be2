//! # Plugin Surface
//!
//! Lets a host process drive a merge with one JSON request on stdin and
//! read one JSON response from stdout.
//!
//! ## Protocol
//!
//! ```text
//! Host                                  compose-merge execute
//!  │                                         │
//!  ├── Stdin: {"options": {"action": "merge", "projectPath": "...", ...}}
//!  │                                         │
//!  └── Stdout: {"success": true, "data": {"output_path": "...", ...}}
//! ```
//!
//! `compose-merge manifest` prints the plugin's capabilities.
//!
//! ## Key Types
//!
//! - [`ExecutionRequest`] - Request envelope (`args`, `options`, `input`)
//! - [`PluginResponse`] - Success data or error message
//! - [`Action`] - Recognised values of `options.action`

mod executor;
mod protocol;

pub use executor::{execute, handle, Action, ActionError};
pub use protocol::{ExecutionRequest, PluginManifest, PluginResponse, RequestOptions};
