//! # Tag Plugins
//!
//! Custom tags configured in `yamlc.toml` are served by external commands
//! speaking JSON over stdin/stdout, so a tag can be implemented in any
//! language.
//!
//! ## Protocol
//!
//! ```text
//! yamlc                           Plugin command
//!  │                               │
//!  ├── Spawn: yamlc-tag-env        │
//!  │                               │
//!  ├── Stdin: {"operation": "construct", "params": {"tag": "!env", "value": "HOME", "file": "..."}}
//!  │                               │
//!  └── Stdout: {"success": true, "data": "/home/me"}
//! ```
//!
//! `data` replaces the tagged node. `{"success": false, "error": "..."}`
//! fails the file being compiled.
//!
//! ## Key Types
//!
//! - [`ExecConstructor`] - [`TagConstructor`](crate::resolve::TagConstructor) running a command
//! - [`PluginRequest`] / [`PluginResponse`] - Wire messages

mod exec;
mod protocol;

pub use exec::ExecConstructor;
pub use protocol::{ConstructParams, PluginRequest, PluginResponse, CONSTRUCT_OPERATION};
