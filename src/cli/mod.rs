//! # Command-Line Interface
//!
//! ## Commands
//!
//! | Command | Purpose | Example |
//! |---------|---------|---------|
//! | `compile` | Write `.json` next to (or mirrored from) each source | `yamlc compile config/ -o dist` |
//! | `check` | Resolve only, write nothing | `yamlc check config/` |
//! | `resolve` | Print one file's resolved JSON | `yamlc resolve app.yml` |
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - `Compiled a.yml -> a.json` per file
//! - `json` - The batch report as one JSON object
//!
//! `resolve` always prints the document JSON itself.
//!
//! ## Logging
//!
//! Logs go to stderr. `-v` shows each written file, `-vv` each include as it
//! is resolved. `RUST_LOG` takes precedence over the flags.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod compile_cmd;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
