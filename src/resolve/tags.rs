//! Custom tag constructors
//!
//! Callers extend the grammar beyond `!include` by registering a constructor
//! per tag. A [`TagRegistry`] is built once, handed to a
//! [`Resolver`](super::Resolver) and never mutated afterwards, so the same
//! registry can back several resolvers running side by side.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::Value;

use super::error::ResolveError;
use super::loader::{ParseState, Resolver};

/// The built-in include tag
pub const INCLUDE_TAG: &str = "!include";

/// Builds a value for a custom-tagged node
pub trait TagConstructor: Send + Sync {
    /// Constructs the value substituted for `node`
    ///
    /// `node.value` is the raw, unresolved content of the tagged node.
    fn construct(&self, node: &TaggedValue, ctx: &TagContext<'_>) -> Result<Value, ResolveError>;
}

impl<F> TagConstructor for F
where
    F: Fn(&TaggedValue, &TagContext<'_>) -> Result<Value, ResolveError> + Send + Sync,
{
    fn construct(&self, node: &TaggedValue, ctx: &TagContext<'_>) -> Result<Value, ResolveError> {
        self(node, ctx)
    }
}

/// Handle to the resolver given to constructors
pub struct TagContext<'a> {
    pub(super) resolver: &'a Resolver,
    pub(super) state: &'a ParseState,
    pub(super) tag: &'a str,
}

impl TagContext<'_> {
    /// The file containing the tagged node
    pub fn file(&self) -> &Path {
        &self.state.file
    }

    /// The tag being constructed, with its leading `!`
    pub fn tag(&self) -> &str {
        self.tag
    }

    /// Resolves nested tags in `value` with the same grammar
    pub fn resolve(&self, value: Value) -> Result<Value, ResolveError> {
        self.resolver.resolve_value(value, self.state)
    }

    /// Loads a reference as if it appeared in an `!include` in this file
    pub fn include(&self, reference: &str) -> Result<Value, ResolveError> {
        self.resolver.include(reference, self.state)
    }

    /// Builds a constructor error attributed to this tag and file
    pub fn error(&self, message: impl Into<String>) -> ResolveError {
        ResolveError::Constructor {
            tag: self.tag.to_string(),
            path: self.state.file.clone(),
            message: message.into(),
        }
    }
}

/// Tag name → constructor mapping
#[derive(Clone, Default)]
pub struct TagRegistry {
    constructors: HashMap<String, Arc<dyn TagConstructor>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for `tag` (with or without the leading `!`)
    pub fn register(
        &mut self,
        tag: &str,
        constructor: impl TagConstructor + 'static,
    ) -> Result<&mut Self, ResolveError> {
        let name = normalize_tag(tag);
        if name == INCLUDE_TAG {
            return Err(ResolveError::ReservedTag { tag: name });
        }
        self.constructors.insert(name, Arc::new(constructor));
        Ok(self)
    }

    /// Registers a closure as a constructor
    pub fn register_fn<F>(&mut self, tag: &str, f: F) -> Result<&mut Self, ResolveError>
    where
        F: Fn(&TaggedValue, &TagContext<'_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.register(tag, f)
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn TagConstructor>> {
        self.constructors.get(&normalize_tag(tag))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(&normalize_tag(tag))
    }

    /// Registered tag names, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<_> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl std::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Canonical `!name` form of a tag
pub fn normalize_tag(tag: &str) -> String {
    format!("!{}", tag.trim_start_matches('!'))
}

/// Canonical `!name` form of a parsed tag
pub(super) fn tag_name(tag: &Tag) -> String {
    normalize_tag(&tag.to_string())
}
