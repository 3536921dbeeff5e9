//! Tag constructors backed by external commands

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use serde_yaml::value::TaggedValue;
use serde_yaml::Value;
use tracing::debug;

use super::protocol::{ConstructParams, PluginRequest, PluginResponse, CONSTRUCT_OPERATION};
use crate::output::to_json_value;
use crate::resolve::{ResolveError, TagConstructor, TagContext};

/// Runs a command per tagged node and substitutes its answer
#[derive(Debug, Clone)]
pub struct ExecConstructor {
    program: PathBuf,
    args: Vec<String>,
}

impl ExecConstructor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Sends one request and reads the response
    pub fn execute(&self, request: &PluginRequest) -> Result<PluginResponse> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn plugin: {}", self.program.display()))?;

        // Send request, then close stdin so the plugin sees EOF
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow::anyhow!("Failed to open plugin stdin"))?;
            let request_json = serde_json::to_string(request).context("Failed to serialize request")?;
            // A plugin that exits without reading is judged by its output below
            if let Err(e) = writeln!(stdin, "{}", request_json) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e).context("Failed to write to plugin");
                }
            }
        }

        let output = child
            .wait_with_output()
            .context("Failed to read plugin response")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let response_line = stdout.lines().find(|line| !line.trim().is_empty());

        match response_line {
            Some(line) => serde_json::from_str(line).context("Failed to parse plugin response"),
            None if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                anyhow::bail!("Plugin exited with {}: {}", output.status, stderr.trim())
            }
            None => anyhow::bail!("No response from plugin"),
        }
    }
}

impl TagConstructor for ExecConstructor {
    fn construct(&self, node: &TaggedValue, ctx: &TagContext<'_>) -> Result<Value, ResolveError> {
        let params = ConstructParams {
            tag: ctx.tag().to_string(),
            value: to_json_value(&node.value),
            file: ctx.file().display().to_string(),
        };
        let params = serde_json::to_value(&params).map_err(|e| ctx.error(e.to_string()))?;

        debug!(tag = ctx.tag(), program = %self.program.display(), "Running tag plugin");

        let response = self
            .execute(&PluginRequest::new(CONSTRUCT_OPERATION, params))
            .map_err(|e| ctx.error(format!("{:#}", e)))?;

        if !response.success {
            return Err(ctx.error(
                response
                    .error
                    .unwrap_or_else(|| "plugin reported failure".to_string()),
            ));
        }

        serde_yaml::to_value(response.data.unwrap_or_default()).map_err(|e| ctx.error(e.to_string()))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::resolve::{Resolver, ResolverOptions, TagRegistry};
    use serde_json::json;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn resolve_with(dir: &Path, tag: &str, plugin: ExecConstructor, yaml: &str) -> Result<Vec<Value>, ResolveError> {
        let mut tags = TagRegistry::new();
        tags.register(tag, plugin).unwrap();
        let resolver = Resolver::new(tags, ResolverOptions::default());

        let source = dir.join("a.yml");
        fs::write(&source, yaml).unwrap();
        resolver.load_file(&source)
    }

    #[test]
    fn substitutes_plugin_data() {
        let dir = TempDir::new().unwrap();
        let plugin = script(
            dir.path(),
            "tag-ok",
            r#"read line
echo '{"success":true,"data":{"from":"plugin","n":[1,2]}}'"#,
        );

        let docs = resolve_with(dir.path(), "!ext", ExecConstructor::new(plugin, vec![]), "x: !ext anything\n").unwrap();
        assert_eq!(to_json_value(&docs[0]), json!({"x": {"from": "plugin", "n": [1, 2]}}));
    }

    #[test]
    fn plugin_receives_request() {
        let dir = TempDir::new().unwrap();
        let plugin = script(
            dir.path(),
            "tag-echo",
            r#"read line
printf '{"success":true,"data":%s}\n' "$line""#,
        );

        let docs = resolve_with(dir.path(), "!echo", ExecConstructor::new(plugin, vec![]), "x: !echo [1, two]\n").unwrap();
        let request = to_json_value(&docs[0])["x"].clone();

        assert_eq!(request["operation"], json!("construct"));
        assert_eq!(request["params"]["tag"], json!("!echo"));
        assert_eq!(request["params"]["value"], json!([1, "two"]));
        assert!(request["params"]["file"].as_str().unwrap().ends_with("a.yml"));
    }

    #[test]
    fn plugin_arguments_are_passed() {
        let dir = TempDir::new().unwrap();
        let plugin = script(
            dir.path(),
            "tag-args",
            r#"read line
echo "{\"success\":true,\"data\":\"$1-$2\"}""#,
        );

        let constructor = ExecConstructor::new(plugin, vec!["left".to_string(), "right".to_string()]);
        let docs = resolve_with(dir.path(), "!args", constructor, "x: !args ~\n").unwrap();
        assert_eq!(to_json_value(&docs[0]), json!({"x": "left-right"}));
    }

    #[test]
    fn plugin_failure_is_constructor_error() {
        let dir = TempDir::new().unwrap();
        let plugin = script(
            dir.path(),
            "tag-fail",
            r#"read line
echo '{"success":false,"error":"no such secret"}'"#,
        );

        let err = resolve_with(dir.path(), "!secret", ExecConstructor::new(plugin, vec![]), "x: !secret k\n").unwrap_err();
        match err {
            ResolveError::Constructor { tag, message, .. } => {
                assert_eq!(tag, "!secret");
                assert_eq!(message, "no such secret");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn crashing_plugin_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let plugin = script(dir.path(), "tag-crash", "echo boom >&2\nexit 3");

        let err = resolve_with(dir.path(), "!crash", ExecConstructor::new(plugin, vec![]), "x: !crash 1\n").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn missing_program_is_constructor_error() {
        let dir = TempDir::new().unwrap();
        let constructor = ExecConstructor::new(dir.path().join("does-not-exist"), vec![]);

        let err = resolve_with(dir.path(), "!gone", constructor, "x: !gone 1\n").unwrap_err();
        assert!(matches!(err, ResolveError::Constructor { .. }));
        assert!(err.to_string().contains("Failed to spawn plugin"));
    }
}
