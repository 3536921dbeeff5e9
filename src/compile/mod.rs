//! # Compilation
//!
//! Batch layer on top of [`crate::resolve`]: pairs sources with
//! destinations, resolves each source, serializes it to JSON and writes the
//! result.
//!
//! ## Per-source Flow
//!
//! ```text
//! FilePair ──► skip? (directory / ignored name)
//!    │
//!    ├── Resolver::load_file     every document, includes expanded
//!    ├── to_json_string          one document as-is, several as an array
//!    ├── Middleware::process     may rewrite json or dest
//!    └── write (temp + rename)   unless disable_dest
//! ```
//!
//! The first failing source stops the batch. Outputs already written stay.
//!
//! ## Key Types
//!
//! - [`Compiler`] - Runs a batch
//! - [`CompileOptions`] - `space`, `ignored`, `middleware`, `disable_dest`, tags
//! - [`Config`] - TOML configuration that produces [`CompileOptions`]

mod batch;
mod config;
mod pairs;

pub use batch::{
    dest_path_for, BatchReport, CompileOptions, CompiledEntry, CompiledFile, Compiler, FilePair,
    Middleware,
};
pub use config::{Config, ConfigError, ConstructorCommand, FileConfig, CONFIG_DIR_ENV, PROJECT_CONFIG_FILE};
pub use pairs::{collect_pairs, is_yaml_file};
