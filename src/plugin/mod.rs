//! Plugin loading for discoveries.
//!
//! Two sources feed the registry, in this order:
//!
//! - **Builtin**: discoveries compiled into the binary (always present).
//! - **Directory**: an optional, configured directory where each
//!   sub-directory is one plugin described by a `plugin.yaml` manifest and
//!   run as a child process (no dynamic loading).
//!
//! ```text
//! /etc/huemon/plugins/discoveries/
//! ├── scenes/
//! │   ├── plugin.yaml
//! │   └── scenes.sh
//! └── rules/
//!     ├── plugin.yaml
//!     └── rules.py
//! ```
//!
//! Every entry yields its own outcome; a broken plugin never stops the scan.

pub mod manifest;

pub use manifest::{ResolvedPlugin, load_manifest};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::ApiInterface;
use crate::discovery::external::ExternalDiscovery;
use crate::discovery::{Discovery, DiscoveryCandidate, PluginOrigin, builtin};
use crate::error::PluginLoadError;
use crate::sink::Sink;
use crate::utils::outcome::split_outcomes;

pub const DISCOVERY_CATEGORY: &str = "discovery";

pub type LoadOutcome = Result<DiscoveryCandidate, PluginLoadError>;

/// Where to look for plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    Builtin,
    Directory(PathBuf),
}

/// Load every plugin of `category` from `source`, one outcome per entry.
pub fn load_plugins(category: &str, source: &PluginSource) -> Vec<LoadOutcome> {
    match source {
        PluginSource::Builtin if category == DISCOVERY_CATEGORY => {
            builtin::candidates().into_iter().map(Ok).collect()
        }
        PluginSource::Builtin => Vec::new(),
        PluginSource::Directory(path) => load_directory(category, path),
    }
}

fn load_directory(category: &str, path: &Path) -> Vec<LoadOutcome> {
    if !path.exists() {
        debug!(category, path = %path.display(), "plugin directory does not exist");
        return Vec::new();
    }

    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(source) => {
            return vec![Err(PluginLoadError::UnreadableDirectory {
                path: path.to_path_buf(),
                source,
            })];
        }
    };

    let mut dirs = Vec::new();
    let mut outcomes = Vec::new();
    for entry in entries {
        match entry {
            Ok(e) if e.path().is_dir() => dirs.push(e.path()),
            Ok(e) => debug!(path = %e.path().display(), "skipping non-directory entry"),
            Err(source) => outcomes.push(Err(PluginLoadError::UnreadableDirectory {
                path: path.to_path_buf(),
                source,
            })),
        }
    }
    // read_dir order is platform dependent; keep registration deterministic.
    dirs.sort();

    outcomes.extend(dirs.iter().map(|dir| load_one(category, dir)));
    outcomes
}

fn load_one(category: &str, plugin_dir: &Path) -> LoadOutcome {
    let raw = load_manifest(plugin_dir)?;
    let plugin = manifest::resolve(raw, plugin_dir, category)?;
    debug!(
        name = %plugin.name,
        program = %plugin.program.display(),
        description = plugin.description.as_deref().unwrap_or(""),
        "loaded plugin"
    );

    let name = plugin.name.clone();
    let origin = PluginOrigin::External(plugin_dir.to_path_buf());
    Ok(DiscoveryCandidate::new(
        name,
        origin,
        Box::new(
            move |api: Arc<dyn ApiInterface>, sink: Arc<dyn Sink>| -> Box<dyn Discovery> {
                Box::new(ExternalDiscovery::new(plugin.clone(), api, sink))
            },
        ),
    ))
}

/// Candidates for the discovery registry: built-ins first, then the external
/// directory (if configured), so external plugins can shadow built-ins.
/// Load failures are logged and dropped.
pub fn load_discovery_candidates(external: Option<&Path>) -> Vec<DiscoveryCandidate> {
    let mut outcomes = load_plugins(DISCOVERY_CATEGORY, &PluginSource::Builtin);
    outcomes.extend(external.map_or_else(Vec::new, |path| {
        info!(path = %path.display(), "loading discovery plugins");
        load_plugins(DISCOVERY_CATEGORY, &PluginSource::Directory(path.to_path_buf()))
    }));

    let (candidates, failures) = split_outcomes(outcomes);
    for failure in &failures {
        warn!(error = %failure, "skipping discovery plugin");
    }
    debug!(
        loaded = candidates.len(),
        failed = failures.len(),
        "finished loading discovery plugins"
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest::MANIFEST_FILE;
    use std::fs;

    fn write_plugin(root: &Path, dir: &str, manifest: &str) {
        let d = root.join(dir);
        fs::create_dir_all(&d).unwrap();
        fs::write(d.join(MANIFEST_FILE), manifest).unwrap();
    }

    fn names(candidates: &[DiscoveryCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn builtin_source_is_all_successes() {
        let outcomes = load_plugins(DISCOVERY_CATEGORY, &PluginSource::Builtin);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(Result::is_ok));
    }

    #[test]
    fn builtin_source_has_nothing_for_other_categories() {
        assert!(load_plugins("command", &PluginSource::Builtin).is_empty());
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(load_plugins(DISCOVERY_CATEGORY, &PluginSource::Directory(missing)).is_empty());
    }

    #[test]
    fn malformed_plugin_does_not_hide_valid_one() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(dir.path(), "a-broken", "name: [unterminated\n");
        write_plugin(
            dir.path(),
            "b-scenes",
            "name: scenes\ncategory: discovery\ncommand: ./scenes.sh\n",
        );
        fs::create_dir_all(dir.path().join("c-no-manifest")).unwrap();
        fs::write(dir.path().join("README.txt"), "not a plugin").unwrap();

        let outcomes = load_plugins(
            DISCOVERY_CATEGORY,
            &PluginSource::Directory(dir.path().to_path_buf()),
        );
        assert_eq!(outcomes.len(), 3, "plain files are skipped");
        assert!(matches!(outcomes[0], Err(PluginLoadError::InvalidManifest { .. })));
        assert_eq!(outcomes[1].as_ref().map(|c| c.name()).ok(), Some("scenes"));
        assert!(matches!(outcomes[2], Err(PluginLoadError::Io { .. })));
    }

    #[test]
    fn wrong_category_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(dir.path(), "x", "name: x\ncategory: command\ncommand: run\n");
        let outcomes = load_plugins(
            DISCOVERY_CATEGORY,
            &PluginSource::Directory(dir.path().to_path_buf()),
        );
        assert!(matches!(outcomes[0], Err(PluginLoadError::CategoryMismatch { .. })));
    }

    #[test]
    fn candidates_are_builtins_then_external() {
        let dir = tempfile::tempdir().unwrap();
        write_plugin(
            dir.path(),
            "lights",
            "name: lights\ncategory: discovery\ncommand: ./lights.sh\n",
        );
        write_plugin(dir.path(), "broken", "category: discovery\n");

        let candidates = load_discovery_candidates(Some(dir.path()));
        assert_eq!(names(&candidates), vec!["lights", "groups", "sensors", "lights"]);
        assert_eq!(candidates[0].origin(), &PluginOrigin::Builtin);
        assert_eq!(
            candidates[3].origin(),
            &PluginOrigin::External(dir.path().join("lights"))
        );
    }

    #[test]
    fn no_external_path_means_builtins_only() {
        let candidates = load_discovery_candidates(None);
        assert_eq!(names(&candidates), vec!["lights", "groups", "sensors"]);
    }
}
