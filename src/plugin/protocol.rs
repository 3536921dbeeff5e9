//! Tag plugin protocol types
//!
//! A tag plugin reads one JSON request line on stdin and answers with one
//! JSON response line on stdout.

use serde::{Deserialize, Serialize};

/// Operation name sent to tag plugins
pub const CONSTRUCT_OPERATION: &str = "construct";

/// A message sent to a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRequest {
    /// The operation to perform
    pub operation: String,

    /// Operation-specific parameters
    pub params: serde_json::Value,
}

impl PluginRequest {
    pub fn new(operation: impl Into<String>, params: impl Into<serde_json::Value>) -> Self {
        Self {
            operation: operation.into(),
            params: params.into(),
        }
    }
}

/// Parameters of a `construct` request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstructParams {
    /// Tag being constructed, e.g. `!env`
    pub tag: String,

    /// Raw node content as JSON
    pub value: serde_json::Value,

    /// File containing the tagged node
    pub file: String,
}

/// A response from a plugin
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

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
