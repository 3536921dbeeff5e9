//! Configuration handling for yamlc
//!
//! Configuration is read from `yamlc.toml` (project, found by walking up from
//! the current directory) layered over `~/.config/yamlc/config.toml`
//! (global). Project values win field by field; constructor tables are merged.
//!
//! ```toml
//! space = 2
//! ignored = "^_"
//! disable_dest = false
//! strict_anchors = true
//! out_dir = "dist"
//! root_dir = "."
//!
//! [constructors]
//! "!env" = "yamlc-tag-env"
//! "!secret" = ["vault-tag", "--mount", "kv"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::batch::CompileOptions;
use crate::output::DEFAULT_INDENT;
use crate::plugin::ExecConstructor;
use crate::resolve::TagRegistry;

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "yamlc.toml";

/// Overrides the global configuration directory
pub const CONFIG_DIR_ENV: &str = "YAMLC_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Command run for a custom tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstructorCommand {
    /// A program with no arguments
    Program(String),

    /// Program followed by its arguments
    Argv(Vec<String>),
}

impl ConstructorCommand {
    /// Splits into program and arguments
    pub fn split(&self) -> Option<(&str, &[String])> {
        let no_args: &[String] = &[];
        match self {
            ConstructorCommand::Program(program) => Some((program.as_str(), no_args)),
            ConstructorCommand::Argv(argv) => argv.split_first().map(|(p, args)| (p.as_str(), args)),
        }
    }
}

/// Contents of a single configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// JSON indent width
    pub space: Option<usize>,

    /// Regex; matching source file names are skipped
    pub ignored: Option<String>,

    /// Resolve only, never write outputs
    pub disable_dest: Option<bool>,

    /// Fail on missing anchors (default true)
    pub strict_anchors: Option<bool>,

    /// Where outputs go (relative to the config file)
    pub out_dir: Option<PathBuf>,

    /// Base for `!include /...` references (relative to the config file)
    pub root_dir: Option<PathBuf>,

    /// Custom tag → command
    pub constructors: BTreeMap<String, ConstructorCommand>,
}

impl FileConfig {
    /// Layers `other` over `self`
    pub fn merge(mut self, other: FileConfig) -> FileConfig {
        self.space = other.space.or(self.space);
        self.ignored = other.ignored.or(self.ignored);
        self.disable_dest = other.disable_dest.or(self.disable_dest);
        self.strict_anchors = other.strict_anchors.or(self.strict_anchors);
        self.out_dir = other.out_dir.or(self.out_dir);
        self.root_dir = other.root_dir.or(self.root_dir);
        self.constructors.extend(other.constructors);
        self
    }

    /// Makes relative paths absolute against `base`
    fn anchor_paths(mut self, base: &Path) -> FileConfig {
        if let Some(out_dir) = self.out_dir.take() {
            self.out_dir = Some(if out_dir.is_relative() { base.join(out_dir) } else { out_dir });
        }
        if let Some(root_dir) = self.root_dir.take() {
            self.root_dir = Some(if root_dir.is_relative() { base.join(root_dir) } else { root_dir });
        }

        for command in self.constructors.values_mut() {
            match command {
                ConstructorCommand::Program(program) => anchor_program(program, base),
                ConstructorCommand::Argv(argv) => {
                    if let Some(program) = argv.first_mut() {
                        anchor_program(program, base);
                    }
                }
            }
        }
        self
    }
}

/// Programs given as relative paths (`./tags/env`) resolve against the config
/// file; bare names are looked up on PATH when run.
fn anchor_program(program: &mut String, base: &Path) {
    let path = Path::new(program.as_str());
    if path.is_relative() && path.components().count() > 1 {
        *program = base.join(path).display().to_string();
    }
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: FileConfig,

    /// The project file that was loaded, if any
    pub project_file: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        match Self::find_project_file() {
            Some(path) => Self::with_project_file(&path),
            None => Ok(Self {
                settings: Self::load_global()?,
                project_file: None,
            }),
        }
    }

    /// Loads the global configuration and an explicit project file
    pub fn with_project_file(path: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::read_file(path)?;

        Ok(Self {
            settings: global.merge(project),
            project_file: Some(path.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        ProjectDirs::from("dev", "yamlc", "yamlc").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<FileConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(FileConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(FileConfig::default());
        }

        Self::read_file(&config_path).context("Failed to load global config")
    }

    /// Reads one configuration file
    pub fn read_file(path: &Path) -> Result<FileConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: FileConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.anchor_paths(base))
    }

    /// Finds `yamlc.toml` in the current directory or a parent
    pub fn find_project_file() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let candidate = current.join(PROJECT_CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    pub fn space(&self) -> usize {
        self.settings.space.unwrap_or(DEFAULT_INDENT)
    }

    pub fn strict_anchors(&self) -> bool {
        self.settings.strict_anchors.unwrap_or(true)
    }

    pub fn disable_dest(&self) -> bool {
        self.settings.disable_dest.unwrap_or(false)
    }

    pub fn out_dir(&self) -> Option<&Path> {
        self.settings.out_dir.as_deref()
    }

    pub fn root_dir(&self) -> Option<&Path> {
        self.settings.root_dir.as_deref()
    }

    /// Compiles the `ignored` pattern
    pub fn ignored(&self) -> Result<Option<Regex>, ConfigError> {
        self.settings
            .ignored
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|e| ConfigError::Invalid(format!("ignored pattern '{}': {}", pattern, e)))
            })
            .transpose()
    }

    /// Builds the tag registry from `[constructors]`
    pub fn tag_registry(&self) -> Result<TagRegistry, ConfigError> {
        let mut registry = TagRegistry::new();

        for (tag, command) in &self.settings.constructors {
            let (program, args) = command
                .split()
                .ok_or_else(|| ConfigError::Invalid(format!("constructor for {} has an empty command", tag)))?;

            registry
                .register(tag, ExecConstructor::new(program, args.to_vec()))
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(registry)
    }

    /// Builds compile options from this configuration
    pub fn compile_options(&self) -> Result<CompileOptions, ConfigError> {
        Ok(CompileOptions {
            tags: self.tag_registry()?,
            ignored: self.ignored()?,
            space: self.space(),
            middleware: None,
            disable_dest: self.disable_dest(),
            strict_anchors: self.strict_anchors(),
            root_dir: self.root_dir().map(Path::to_path_buf),
        })
    }
}
