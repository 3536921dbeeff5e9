//! Source → destination pairing for command-line inputs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use super::batch::FilePair;

/// Expands inputs into file pairs
///
/// Files are taken as given. Directories are walked recursively for
/// `.yml`/`.yaml` files, in sorted order. Symlinked directories are not
/// followed. With `out_dir`, outputs mirror each input's layout below `out_dir`.
pub fn collect_pairs(inputs: &[PathBuf], out_dir: Option<&Path>) -> Result<Vec<FilePair>> {
    let mut pairs = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let files = scan_directory(input)?;
            pairs.extend(
                files
                    .into_iter()
                    .map(|file| FilePair::for_source(file, out_dir.map(|out| (input.as_path(), out)))),
            );
        } else if input.is_file() {
            let base = input.parent().unwrap_or_else(|| Path::new(""));
            pairs.push(FilePair::for_source(input, out_dir.map(|out| (base, out))));
        } else {
            anyhow::bail!("Source not found: {}", input.display());
        }
    }

    Ok(pairs)
}

/// Returns true for `.yml`/`.yaml` file names (case-insensitive)
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
        .unwrap_or(false)
}

fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        let path = entry.path();

        if !entry.file_type().is_dir() && path.is_file() && is_yaml_file(path) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
