//! Include-aware document loading
//!
//! [`Resolver`] parses YAML text into [`Value`]s and replaces every
//! `!include` node with the resolved content of the file it references.
//! Included files are loaded with the same grammar, so includes resolve
//! transitively, each one relative to the file that contains it.
//!
//! Every load carries a [`ParseState`] holding the current file and the
//! chain of files currently being resolved above it. A file that shows up
//! twice on that chain is an include cycle and fails the load.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use super::error::ResolveError;
use super::path::{absolutize, resolve_include_path};
use super::reference::{anchor_is_defined, splice_sentinel, Reference, SENTINEL_KEY};
use super::source::{FsSource, Source};
use super::tags::{tag_name, TagContext, TagRegistry, INCLUDE_TAG};

/// Resolver behaviour switches
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Fail when an anchored include names an anchor the file does not define.
    /// When false, a warning is logged and `null` is substituted.
    pub strict_anchors: bool,

    /// Base for references with a leading `/` or `\`.
    /// Defaults to the current working directory.
    pub root_dir: Option<PathBuf>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            strict_anchors: true,
            root_dir: None,
        }
    }
}

/// Per-load context
#[derive(Debug, Clone)]
pub struct ParseState {
    /// File whose text is being parsed
    pub file: PathBuf,

    /// Files being resolved, outermost first; ends with `file`
    pub chain: Vec<PathBuf>,
}

impl ParseState {
    /// State for a top-level load
    pub fn root(file: PathBuf) -> Self {
        Self {
            chain: vec![file.clone()],
            file,
        }
    }

    /// State for loading `file` from within this one
    pub fn enter(&self, file: &Path) -> Result<Self, ResolveError> {
        let mut chain = self.chain.clone();
        let cyclic = chain.iter().any(|p| p == file);
        chain.push(file.to_path_buf());

        if cyclic {
            return Err(ResolveError::CyclicInclude { chain });
        }

        Ok(Self {
            file: file.to_path_buf(),
            chain,
        })
    }

    /// Include depth (0 for a top-level file)
    pub fn depth(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }
}

/// Include-aware YAML loader
#[derive(Clone)]
pub struct Resolver {
    source: Arc<dyn Source>,
    tags: TagRegistry,
    options: ResolverOptions,
}

impl Resolver {
    /// Creates a resolver reading from the filesystem
    pub fn new(tags: TagRegistry, options: ResolverOptions) -> Self {
        Self::with_source(Arc::new(FsSource), tags, options)
    }

    /// Creates a resolver over an arbitrary source
    pub fn with_source(source: Arc<dyn Source>, tags: TagRegistry, options: ResolverOptions) -> Self {
        Self {
            source,
            tags,
            options,
        }
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Loads every document of a file, fully resolved, in document order
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<Value>, ResolveError> {
        let state = ParseState::root(absolutize(path.as_ref()));
        let text = self.read(&state.file)?;
        self.load_documents(&text, &state)
    }

    /// Loads every document of `text` as though it were the content of `path`
    pub fn load_str(&self, text: &str, path: impl AsRef<Path>) -> Result<Vec<Value>, ResolveError> {
        let state = ParseState::root(absolutize(path.as_ref()));
        self.load_documents(text, &state)
    }

    fn load_documents(&self, text: &str, state: &ParseState) -> Result<Vec<Value>, ResolveError> {
        let mut documents = Vec::new();

        for document in serde_yaml::Deserializer::from_str(text) {
            let raw = Value::deserialize(document).map_err(|source| ResolveError::Parse {
                path: state.file.clone(),
                source,
            })?;
            let mut resolved = self.resolve_value(raw, state)?;
            resolved.apply_merge().map_err(|source| ResolveError::Parse {
                path: state.file.clone(),
                source,
            })?;
            documents.push(resolved);
        }

        Ok(documents)
    }

    /// Loads an included file, which may hold at most one document
    fn load_single(&self, text: &str, state: &ParseState) -> Result<Value, ResolveError> {
        let mut documents = self.load_documents(text, state)?;
        match documents.len() {
            0 => Ok(Value::Null),
            1 => Ok(documents.remove(0)),
            count => Err(ResolveError::MultipleDocuments {
                count,
                path: state.file.clone(),
            }),
        }
    }

    /// Replaces tagged nodes anywhere inside `value`
    pub(crate) fn resolve_value(&self, value: Value, state: &ParseState) -> Result<Value, ResolveError> {
        match value {
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.resolve_value(item, state))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Mapping(mapping) => {
                let mut resolved = Mapping::with_capacity(mapping.len());
                for (key, value) in mapping {
                    resolved.insert(self.resolve_value(key, state)?, self.resolve_value(value, state)?);
                }
                Ok(Value::Mapping(resolved))
            }
            Value::Tagged(tagged) => self.resolve_tagged(*tagged, state),
            scalar => Ok(scalar),
        }
    }

    fn resolve_tagged(&self, tagged: TaggedValue, state: &ParseState) -> Result<Value, ResolveError> {
        let name = tag_name(&tagged.tag);

        if name == INCLUDE_TAG {
            return match tagged.value {
                Value::String(reference) => self.include(&reference, state),
                Value::Number(number) => self.include(&number.to_string(), state),
                Value::Bool(flag) => self.include(&flag.to_string(), state),
                _ => Err(ResolveError::InvalidReference {
                    path: state.file.clone(),
                }),
            };
        }

        let constructor = self.tags.get(&name).ok_or_else(|| ResolveError::UnknownTag {
            tag: name.clone(),
            path: state.file.clone(),
        })?;

        let ctx = TagContext {
            resolver: self,
            state,
            tag: &name,
        };
        constructor.construct(&tagged, &ctx)
    }

    /// Resolves one `!include` reference found in `state.file`
    pub(crate) fn include(&self, raw: &str, state: &ParseState) -> Result<Value, ResolveError> {
        let reference = Reference::parse(raw);
        let target = resolve_include_path(
            &reference.path,
            &state.file,
            &self.root_dir(),
            self.source.as_ref(),
        );
        let child = state.enter(&target)?;

        debug!(
            from = %state.file.display(),
            target = %target.display(),
            anchor = reference.anchor.as_deref().unwrap_or(""),
            depth = child.depth(),
            "Resolving include"
        );

        let text = self.read(&target)?;

        match reference.anchor {
            None => self.load_single(&text, &child),
            Some(anchor) => self.load_anchor(&text, &anchor, &child),
        }
    }

    fn load_anchor(&self, text: &str, anchor: &str, state: &ParseState) -> Result<Value, ResolveError> {
        if !anchor_is_defined(text, anchor) {
            if self.options.strict_anchors {
                return Err(ResolveError::AnchorNotFound {
                    anchor: anchor.to_string(),
                    path: state.file.clone(),
                });
            }

            warn!(
                anchor,
                file = %state.file.display(),
                "Anchor not found, substituting null"
            );
            return Ok(Value::Null);
        }

        let spliced = splice_sentinel(text, anchor);
        let not_extractable = || ResolveError::AnchorNotExtractable {
            anchor: anchor.to_string(),
            path: state.file.clone(),
        };

        match self.load_single(&spliced, state)? {
            Value::Mapping(mut mapping) => mapping.remove(SENTINEL_KEY).ok_or_else(not_extractable),
            _ => Err(not_extractable()),
        }
    }

    fn root_dir(&self) -> PathBuf {
        absolutize(self.options.root_dir.as_deref().unwrap_or_else(|| Path::new(".")))
    }

    fn read(&self, path: &Path) -> Result<String, ResolveError> {
        self.source
            .read_to_string(path)
            .map_err(|source| ResolveError::Read {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(TagRegistry::new(), ResolverOptions::default())
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("tags", &self.tags)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
