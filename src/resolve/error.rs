//! Errors raised while resolving a graph of YAML files

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Anchor '{anchor}' not found in {}", path.display())]
    AnchorNotFound { anchor: String, path: PathBuf },

    #[error("Anchor '{anchor}' in {} cannot be extracted: top level is not a mapping", path.display())]
    AnchorNotExtractable { anchor: String, path: PathBuf },

    #[error("Cyclic include: {}", format_chain(chain))]
    CyclicInclude { chain: Vec<PathBuf> },

    #[error("{}: !include expects a scalar file reference", path.display())]
    InvalidReference { path: PathBuf },

    #[error("{}: unknown tag {tag}", path.display())]
    UnknownTag { tag: String, path: PathBuf },

    #[error("{}: included file holds {count} documents, expected at most one", path.display())]
    MultipleDocuments { count: usize, path: PathBuf },

    #[error("Tag {tag} is reserved and cannot be overridden")]
    ReservedTag { tag: String },

    #[error("{}: tag {tag} failed: {message}", path.display())]
    Constructor {
        tag: String,
        path: PathBuf,
        message: String,
    },
}

impl ResolveError {
    /// Returns the file the error is attributed to, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ResolveError::Read { path, .. }
            | ResolveError::Parse { path, .. }
            | ResolveError::AnchorNotFound { path, .. }
            | ResolveError::AnchorNotExtractable { path, .. }
            | ResolveError::InvalidReference { path }
            | ResolveError::UnknownTag { path, .. }
            | ResolveError::MultipleDocuments { path, .. }
            | ResolveError::Constructor { path, .. } => Some(path),
            ResolveError::CyclicInclude { chain } => chain.last().map(|p| p.as_path()),
            ResolveError::ReservedTag { .. } => None,
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
