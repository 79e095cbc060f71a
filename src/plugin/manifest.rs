//! `plugin.yaml` manifests for directory plugins.
//!
//! ```yaml
//! name: scenes
//! category: discovery
//! command: ./scenes.sh --json
//! timeout_ms: 5000
//! description: Hue scenes stored on the bridge
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::PluginLoadError;

pub const MANIFEST_FILE: &str = "plugin.yaml";
pub const DEFAULT_PLUGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Manifest as written on disk.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    pub name: String,
    pub category: String,
    pub command: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A manifest checked against the requested category, with its command split
/// and the program resolved against the plugin directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlugin {
    pub name: String,
    pub description: Option<String>,
    pub dir: PathBuf,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
}

pub fn load_manifest(plugin_dir: &Path) -> Result<PluginManifest, PluginLoadError> {
    let path = plugin_dir.join(MANIFEST_FILE);
    let raw = std::fs::read_to_string(&path).map_err(|source| PluginLoadError::Io {
        path: path.clone(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| PluginLoadError::InvalidManifest { path, source })
}

/// Validate `manifest` for `category` and resolve its command.
pub fn resolve(
    manifest: PluginManifest,
    plugin_dir: &Path,
    category: &str,
) -> Result<ResolvedPlugin, PluginLoadError> {
    validate_name(&manifest.name).map_err(|reason| PluginLoadError::InvalidName {
        path: plugin_dir.join(MANIFEST_FILE),
        name: manifest.name.clone(),
        reason,
    })?;

    if manifest.category != category {
        return Err(PluginLoadError::CategoryMismatch {
            name: manifest.name,
            expected: category.to_string(),
            found: manifest.category,
        });
    }

    let invalid_command = |reason: String| PluginLoadError::InvalidCommand {
        name: manifest.name.clone(),
        reason,
    };
    let mut parts = shell_words::split(manifest.command.trim())
        .map_err(|e| invalid_command(format!("shell splitting failed: {e}")))?
        .into_iter();
    let program = match parts.next() {
        Some(p) if !p.is_empty() => p,
        _ => return Err(invalid_command("command is empty".to_string())),
    };

    Ok(ResolvedPlugin {
        program: resolve_program(&program, plugin_dir),
        args: parts.collect(),
        timeout: manifest
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PLUGIN_TIMEOUT),
        dir: plugin_dir.to_path_buf(),
        description: manifest.description,
        name: manifest.name,
    })
}

/// Names become registry keys and the left side of `target:subtarget`.
fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        Err("name is empty")
    } else if name.contains(':') {
        Err("name must not contain ':'")
    } else if name.chars().any(char::is_whitespace) {
        Err("name must not contain whitespace")
    } else {
        Ok(())
    }
}

/// Relative paths with a separator (`./run.sh`, `bin/tool`) are anchored at the
/// plugin directory; bare names (`python3`) are left for PATH lookup.
fn resolve_program(program: &str, plugin_dir: &Path) -> PathBuf {
    let candidate = Path::new(program);
    if candidate.is_relative() && candidate.components().count() > 1 {
        plugin_dir.join(candidate)
    } else {
        candidate.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn manifest(name: &str, category: &str, command: &str) -> PluginManifest {
        PluginManifest {
            name: name.into(),
            category: category.into(),
            command: command.into(),
            timeout_ms: None,
            description: None,
        }
    }

    #[test]
    fn parses_full_manifest() {
        let yaml = r#"
name: scenes
category: discovery
command: ./scenes.sh --json
timeout_ms: 2500
description: bridge scenes
"#;
        let m: PluginManifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(m.name, "scenes");
        assert_eq!(m.timeout_ms, Some(2500));
        assert_eq!(m.description.as_deref(), Some("bridge scenes"));
    }

    #[test]
    fn unknown_field_rejected() {
        let yaml = "name: x\ncategory: discovery\ncommand: run\nexe: nope\n";
        assert!(serde_yaml::from_str::<PluginManifest>(yaml).is_err());
    }

    #[test]
    fn resolves_relative_program_against_dir() {
        let dir = Path::new("/opt/plugins/scenes");
        let r = resolve(manifest("scenes", "discovery", "./scenes.sh --json 'a b'"), dir, "discovery")
            .unwrap();
        assert_eq!(r.program, dir.join("./scenes.sh"));
        assert_eq!(r.args, vec!["--json", "a b"]);
        assert_eq!(r.timeout, DEFAULT_PLUGIN_TIMEOUT);
        assert_eq!(r.dir, dir);
    }

    #[test]
    fn bare_program_left_for_path_lookup() {
        let r = resolve(manifest("py", "discovery", "python3 main.py"), Path::new("/p"), "discovery")
            .unwrap();
        assert_eq!(r.program, PathBuf::from("python3"));
        assert_eq!(r.args, vec!["main.py"]);
    }

    #[test]
    fn category_mismatch_rejected() {
        let err = resolve(manifest("x", "command", "run"), Path::new("/p"), "discovery").unwrap_err();
        assert!(matches!(err, PluginLoadError::CategoryMismatch { .. }));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("bad'quote")]
    fn unusable_command_rejected(#[case] command: &str) {
        let err = resolve(manifest("x", "discovery", command), Path::new("/p"), "discovery").unwrap_err();
        assert!(matches!(err, PluginLoadError::InvalidCommand { .. }), "{err}");
    }

    #[rstest]
    #[case("", "name is empty")]
    #[case("a:b", "':'")]
    #[case("two words", "whitespace")]
    fn invalid_names_rejected(#[case] name: &str, #[case] needle: &str) {
        let err = resolve(manifest(name, "discovery", "run"), Path::new("/p"), "discovery").unwrap_err();
        assert!(err.to_string().contains(needle), "{err}");
    }
}
