//! Include path resolution
//!
//! Turns the path component of an `!include` reference into the file that
//! will actually be read:
//!
//! 1. A leading `/` or `\` makes the path relative to the root directory
//!    (the project root, normally the working directory).
//! 2. Anything else is joined to the directory of the including file.
//! 3. `.` and `..` segments are folded lexically.
//! 4. Without a `.yml`/`.yaml` extension, `<path>.yml` is used if it exists,
//!    otherwise `<path>.yaml`.
//!
//! Missing files are not reported here; the read that follows fails instead.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::source::Source;

/// Resolves an include path relative to the file containing the reference
pub fn resolve_include_path(
    path_component: &str,
    including_file: &Path,
    root_dir: &Path,
    source: &dyn Source,
) -> PathBuf {
    let joined = match path_component.strip_prefix(&['/', '\\'][..]) {
        Some(rest) => root_dir.join(rest.trim_start_matches(&['/', '\\'][..])),
        None => including_file
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(path_component),
    };

    let resolved = normalize(&joined);

    if has_yaml_extension(&resolved) {
        return resolved;
    }

    let yml = with_suffix(&resolved, ".yml");
    if source.is_file(&yml) {
        yml
    } else {
        with_suffix(&resolved, ".yaml")
    }
}

/// Returns true if `.yml` or `.yaml` appears anywhere in the path (case-insensitive)
pub fn has_yaml_extension(path: &Path) -> bool {
    static YAML_EXT: OnceLock<Regex> = OnceLock::new();
    let re = YAML_EXT.get_or_init(|| Regex::new(r"(?i)\.ya?ml").expect("valid regex"));
    re.is_match(&path.to_string_lossy())
}

/// Lexically folds `.` and `..` segments without touching the filesystem
///
/// `..` never climbs above the root of an absolute path. Leading `..` in a
/// relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                out.push(component.as_os_str());
                depth = 0;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(segment) => {
                out.push(segment);
                depth += 1;
            }
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Makes a path absolute against the current directory, then normalizes it
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
