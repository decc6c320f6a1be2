//! Plugin protocol types
//!
//! The host sends one JSON request; the plugin answers with one JSON
//! response. The action to run is named in `options.action`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::storage::MergeSettings;

/// Plugin manifest declaring capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name
    pub name: String,

    /// Plugin version
    pub version: String,

    /// Human-readable description
    pub description: String,

    /// Supported actions
    pub actions: Vec<String>,
}

impl PluginManifest {
    /// Manifest of this binary
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: env!("CARGO_PKG_DESCRIPTION").to_string(),
            actions: super::Action::all()
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }
}

/// The `options` object of a request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Which action to run
    pub action: String,

    #[serde(flatten)]
    pub settings: MergeSettings,
}

/// A request sent to the plugin
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionRequest {
    /// Free-form arguments from the host; not used by any action
    pub args: BTreeMap<String, String>,

    pub options: RequestOptions,

    /// Raw input from the host; not used by any action
    pub input: String,
}

/// A response from the plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginResponse {
    /// Whether the operation succeeded
    pub success: bool,

    /// Result data (if success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Error message (if failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PluginResponse {
    pub fn success(data: impl Into<serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
