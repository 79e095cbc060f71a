//! Directory plugins run as child processes.
//!
//! Protocol:
//!   argv   manifest command tokens, then the sub-target (if any)
//!   stdin  {"discovery": "<name>", "arguments": [...]}
//!   env    HUEMON_BRIDGE_URL when the API knows its endpoint
//!   stdout a JSON array of records, or one JSON value per line
//!
//! Spawn failures, non-zero exits, timeouts and unparsable output become one
//! error record on the sink.

use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::Discovery;
use crate::api::ApiInterface;
use crate::plugin::ResolvedPlugin;
use crate::sink::{Record, Sink};
use crate::utils::block_on;

pub const BRIDGE_URL_ENV: &str = "HUEMON_BRIDGE_URL";

#[derive(Debug, Error)]
pub enum PluginRunError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0} ms")]
    Timeout(u128),

    #[error("exited with {status}: {stderr_hint}")]
    ExitStatus { status: String, stderr_hint: String },

    #[error("returned invalid JSON on line {line}: {source}")]
    InvalidOutput {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("runtime error: {0:#}")]
    Runtime(anyhow::Error),
}

pub struct ExternalDiscovery {
    plugin: ResolvedPlugin,
    api: Arc<dyn ApiInterface>,
    sink: Arc<dyn Sink>,
}

impl ExternalDiscovery {
    pub fn new(plugin: ResolvedPlugin, api: Arc<dyn ApiInterface>, sink: Arc<dyn Sink>) -> Self {
        Self { plugin, api, sink }
    }

    fn run(&self, arguments: &[String]) -> Result<Vec<Value>, PluginRunError> {
        let bridge_url = self.api.base_url().map(|u| u.to_string());
        let stdout = block_on(run_plugin(&self.plugin, arguments, bridge_url))
            .map_err(PluginRunError::Runtime)??;
        parse_plugin_output(&stdout)
    }
}

impl Discovery for ExternalDiscovery {
    fn exec(&self, arguments: &[String]) {
        let name = &self.plugin.name;
        match self.run(arguments) {
            Ok(records) => {
                debug!(discovery = %name, count = records.len(), "plugin finished");
                for record in records {
                    self.sink.process(Record::Entity(record));
                }
            }
            Err(e) => {
                warn!(discovery = %name, dir = %self.plugin.dir.display(), error = %e, "plugin failed");
                self.sink
                    .process(Record::error("discovery", format!("discovery `{name}` failed: {e}")));
            }
        }
    }
}

async fn run_plugin(
    plugin: &ResolvedPlugin,
    arguments: &[String],
    bridge_url: Option<String>,
) -> Result<Vec<u8>, PluginRunError> {
    let mut cmd = Command::new(&plugin.program);
    cmd.args(&plugin.args)
        .args(arguments)
        .current_dir(&plugin.dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(url) = bridge_url {
        cmd.env(BRIDGE_URL_ENV, url);
    }

    let mut child = cmd.spawn().map_err(|source| PluginRunError::Spawn {
        program: plugin.program.display().to_string(),
        source,
    })?;

    let payload = serde_json::json!({
        "discovery": plugin.name,
        "arguments": arguments,
    })
    .to_string();
    if let Some(mut stdin) = child.stdin.take() {
        // Plugins that ignore stdin may exit before reading it.
        if let Err(e) = stdin.write_all(payload.as_bytes()).await {
            debug!(error = %e, "plugin did not accept stdin payload");
        }
    }

    // Dropping the child on timeout kills it (kill_on_drop).
    let output = tokio::time::timeout(plugin.timeout, child.wait_with_output())
        .await
        .map_err(|_| PluginRunError::Timeout(plugin.timeout.as_millis()))?
        .map_err(|e| PluginRunError::Runtime(e.into()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PluginRunError::ExitStatus {
            status: output.status.to_string(),
            stderr_hint: stderr.lines().last().unwrap_or("").trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Parse plugin stdout: an array of records, a single JSON value, or JSON
/// lines. Blank output means no records.
pub fn parse_plugin_output(stdout: &[u8]) -> Result<Vec<Value>, PluginRunError> {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(match value {
            Value::Array(items) => items,
            other => vec![other],
        });
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(idx, l)| {
            serde_json::from_str::<Value>(l).map_err(|source| PluginRunError::InvalidOutput {
                line: idx + 1,
                source,
            })
        })
        .collect()
}
