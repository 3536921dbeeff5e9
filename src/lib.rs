//! yamlc - Compile YAML documents into JSON
//!
//! YAML sources may pull in other files with `!include path` or a single
//! anchored node with `!include path *anchor`. Includes are resolved
//! recursively, relative to the including file, and the result is written
//! as pretty-printed JSON.
//!
//! ```no_run
//! use yamlc::compile::{CompileOptions, Compiler, FilePair};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! compiler.compile_all(&[FilePair::for_source("config/app.yml", None)])?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod resolve;
pub mod output;
pub mod compile;
pub mod plugin;
pub mod cli;

pub use compile::{CompileOptions, Compiler, FilePair};
pub use resolve::{ResolveError, Resolver, ResolverOptions, TagRegistry};
