//! Batch compilation of YAML sources into JSON files

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::output::{to_json_string, DEFAULT_INDENT};
use crate::resolve::{Resolver, ResolverOptions, TagRegistry};

/// A source file and where its output goes
///
/// `dest` may still carry the source's `.yml`/`.yaml` extension; the
/// compiler swaps it for `.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl FilePair {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }

    /// Pairs a source with its default destination
    ///
    /// Without `out`, the output sits next to the source. With
    /// `Some((base, out_dir))`, the source's path below `base` is mirrored
    /// under `out_dir`.
    pub fn for_source(source: impl Into<PathBuf>, out: Option<(&Path, &Path)>) -> Self {
        let source = source.into();
        let dest = match out {
            Some((base, out_dir)) => {
                let relative = source
                    .strip_prefix(base)
                    .ok()
                    .filter(|rel| !rel.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .or_else(|| source.file_name().map(PathBuf::from))
                    .unwrap_or_else(|| source.clone());
                out_dir.join(relative)
            }
            None => source.clone(),
        };

        Self { source, dest }
    }
}

/// Replaces a trailing `.yml`/`.yaml` with `.json`, or appends `.json`
pub fn dest_path_for(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yml" | "yaml") => path.with_extension("json"),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".json");
            PathBuf::from(name)
        }
    }
}

/// The result of compiling one source, handed to [`Middleware`] before writing
#[derive(Debug, Clone)]
pub struct CompiledFile {
    pub source: PathBuf,

    /// Output path; middleware may redirect it
    pub dest: PathBuf,

    /// Resolved documents in source order
    pub documents: Vec<Value>,

    /// Serialized output; middleware may rewrite it
    pub json: String,
}

impl CompiledFile {
    /// The value that was serialized: the single document, an array of all
    /// documents, or null for an empty source
    pub fn value(&self) -> Value {
        combined_value(&self.documents)
    }
}

/// Post-resolution hook run once per compiled source, before the write
pub trait Middleware: Send + Sync {
    fn process(&self, file: &mut CompiledFile) -> Result<()>;
}

impl<F> Middleware for F
where
    F: Fn(&mut CompiledFile) -> Result<()> + Send + Sync,
{
    fn process(&self, file: &mut CompiledFile) -> Result<()> {
        self(file)
    }
}

/// Options controlling a compile run
#[derive(Clone)]
pub struct CompileOptions {
    /// Custom tag constructors
    pub tags: TagRegistry,

    /// Sources whose file name matches are skipped
    pub ignored: Option<Regex>,

    /// JSON indent width
    pub space: usize,

    /// Hook run before each write
    pub middleware: Option<Arc<dyn Middleware>>,

    /// Resolve and serialize but write nothing
    pub disable_dest: bool,

    /// Treat a missing anchor as an error instead of substituting null
    pub strict_anchors: bool,

    /// Base for `!include /...` references (working directory when unset)
    pub root_dir: Option<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            tags: TagRegistry::new(),
            ignored: None,
            space: DEFAULT_INDENT,
            middleware: None,
            disable_dest: false,
            strict_anchors: true,
            root_dir: None,
        }
    }
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("tags", &self.tags)
            .field("ignored", &self.ignored.as_ref().map(Regex::as_str))
            .field("space", &self.space)
            .field("middleware", &self.middleware.is_some())
            .field("disable_dest", &self.disable_dest)
            .field("strict_anchors", &self.strict_anchors)
            .field("root_dir", &self.root_dir)
            .finish()
    }
}

/// One compiled source in a [`BatchReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledEntry {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub documents: usize,
    pub written: bool,
}

/// Outcome of a successful batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub compiled: Vec<CompiledEntry>,
    pub skipped: Vec<PathBuf>,
}

/// Compiles sources with a shared resolver
#[derive(Debug, Clone)]
pub struct Compiler {
    resolver: Resolver,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        let resolver = Resolver::new(
            options.tags.clone(),
            ResolverOptions {
                strict_anchors: options.strict_anchors,
                root_dir: options.root_dir.clone(),
            },
        );
        Self { resolver, options }
    }

    /// Uses a pre-built resolver (e.g. over an in-memory source)
    pub fn with_resolver(resolver: Resolver, options: CompileOptions) -> Self {
        Self { resolver, options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Returns true for directories and ignored file names
    pub fn should_skip(&self, source: &Path) -> bool {
        if source.is_dir() {
            return true;
        }

        match (&self.options.ignored, source.file_name()) {
            (Some(pattern), Some(name)) => pattern.is_match(&name.to_string_lossy()),
            _ => false,
        }
    }

    /// Compiles one source; `None` when it was skipped
    pub fn compile_file(&self, pair: &FilePair) -> Result<Option<CompiledFile>> {
        if self.should_skip(&pair.source) {
            debug!(source = %pair.source.display(), "Skipping");
            return Ok(None);
        }

        let documents = self
            .resolver
            .load_file(&pair.source)
            .with_context(|| format!("Failed to compile {}", pair.source.display()))?;

        let json = render(&documents, self.options.space)
            .with_context(|| format!("Failed to serialize {}", pair.source.display()))?;

        let mut compiled = CompiledFile {
            source: pair.source.clone(),
            dest: dest_path_for(&pair.dest),
            documents,
            json,
        };

        if let Some(middleware) = &self.options.middleware {
            middleware
                .process(&mut compiled)
                .with_context(|| format!("Middleware failed for {}", pair.source.display()))?;
        }

        if !self.options.disable_dest {
            write_atomic(&compiled.dest, &compiled.json)?;
            info!(
                source = %compiled.source.display(),
                dest = %compiled.dest.display(),
                "Compiled"
            );
        }

        Ok(Some(compiled))
    }

    /// Compiles every pair in order, stopping at the first failure
    ///
    /// Files written before a failure are left in place.
    pub fn compile_all<'a>(&self, pairs: impl IntoIterator<Item = &'a FilePair>) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for pair in pairs {
            match self.compile_file(pair)? {
                Some(compiled) => report.compiled.push(CompiledEntry {
                    source: compiled.source,
                    dest: compiled.dest,
                    documents: compiled.documents.len(),
                    written: !self.options.disable_dest,
                }),
                None => report.skipped.push(pair.source.clone()),
            }
        }

        Ok(report)
    }
}

fn combined_value(documents: &[Value]) -> Value {
    match documents {
        [] => Value::Null,
        [single] => single.clone(),
        many => Value::Sequence(many.to_vec()),
    }
}

fn render(documents: &[Value], space: usize) -> Result<String, serde_json::Error> {
    match documents {
        [single] => to_json_string(single, space),
        _ => to_json_string(&combined_value(documents), space),
    }
}

/// Writes `content` to `path` atomically (temp file + rename)
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("json.tmp");

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}
