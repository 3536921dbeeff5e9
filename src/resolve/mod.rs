//! # Include Resolution
//!
//! Turns a graph of YAML files linked by `!include` tags into fully resolved
//! [`serde_yaml::Value`]s.
//!
//! ## Reference Syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `!include b` | Whole document of `b.yml` (or `b.yaml`) next to the including file |
//! | `!include sub/c.yaml` | Explicit extension, relative path |
//! | `!include /etc/shared` | Rooted path, not relative to the including file |
//! | `!include sub/c *node1` | Only the node anchored as `&node1` in `sub/c` |
//!
//! ## Pipeline
//!
//! ```text
//! text ──► Resolver::load_* ──► serde_yaml::Value (per document)
//!              │
//!              ├── Reference::parse          path + anchor
//!              ├── resolve_include_path      rooted / relative, .yml then .yaml
//!              ├── Source::read_to_string    file text
//!              └── load included text        same grammar, nested ParseState
//! ```
//!
//! ## Key Types
//!
//! - [`Resolver`] - Include-aware loader
//! - [`TagRegistry`] - Custom tag constructors
//! - [`Source`] - Read access to files ([`FsSource`], [`MemorySource`])
//! - [`ResolveError`] - Everything that can go wrong

mod error;
mod loader;
mod path;
mod reference;
mod source;
mod tags;

pub use error::ResolveError;
pub use loader::{ParseState, Resolver, ResolverOptions};
pub use path::{absolutize, has_yaml_extension, normalize, resolve_include_path};
pub use reference::{anchor_is_defined, splice_sentinel, Reference, SENTINEL_KEY};
pub use source::{FsSource, MemorySource, Source};
pub use tags::{normalize_tag, TagConstructor, TagContext, TagRegistry, INCLUDE_TAG};
