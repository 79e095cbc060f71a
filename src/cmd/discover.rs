/*!
`discover.rs`

Implements the `discover` subcommand for the `huemon` CLI.

Usage:
  huemon discover lights
  huemon discover groups:1
  huemon discover sensors:ZLLTemperature

Behavior:
  - Arguments are collected verbatim, `-x` included, so they reach the
    arity and lookup checks instead of clap. Global flags therefore go
    before the target. Exactly one argument is required; anything else
    produces an argument-count error record and stops before any lookup.
  - The argument is split on ':' into `target` and an optional sub-target;
    segments after the second are ignored and an empty sub-target counts as
    absent (`lights:` == `lights`).
  - `target` is looked up in the discovery registry (built-ins, then the
    configured plugin directory). Unknown targets produce one
    unknown-discovery error record.
  - The resolved discovery runs with `[sub_target]` or `[]` and writes its
    own records to the sink.

Every failure on this path is a value: it is sent to the sink exactly once
and the process still exits cleanly.

Error record shape (stdout sink):
{
  "status": "error",
  "kind": "unknown_discovery",
  "error": "unknown discovery type `nonexistent` (available: groups, lights, sensors)"
}
*/

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{ApiInterface, HueApi, UnconfiguredApi};
use crate::config::Config;
use crate::discovery::DiscoveryRegistry;
use crate::error::CommandError;
use crate::plugin::load_discovery_candidates;
use crate::sink::{Record, Sink, StdoutSink};
use crate::utils::outcome::assert_num_args;

pub const DISCOVER_COMMAND: &str = "discover";

/// CLI arguments for `huemon discover <target>[:<subtarget>]`
///
/// Everything from the first argument on is taken verbatim, hyphens
/// included; global flags go before the target.
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Discovery to run, e.g. `lights` or `groups:1` (exactly one expected)
    #[arg(
        value_name = "TARGET[:SUBTARGET]",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub arguments: Vec<String>,
}

/// Entry point for the discover subcommand.
pub fn execute_discover(args: DiscoverArgs, config: &Config) -> Result<()> {
    let api: Arc<dyn ApiInterface> = match config.hue_hub_url.as_deref() {
        Some(url) => Arc::new(HueApi::from_config(url, config.request_timeout())?),
        None => {
            warn!("hue_hub_url is not configured; bridge queries will fail");
            Arc::new(UnconfiguredApi)
        }
    };
    let sink: Arc<dyn Sink> = Arc::new(StdoutSink);

    let command = DiscoverCommand::new(config, api, sink);
    // Failures were already reported to the sink.
    let _ = command.exec(&args.arguments);
    Ok(())
}

/* -------------------------------------------------------------------------- */
/* Command parsing                                                            */
/* -------------------------------------------------------------------------- */

/// `target[:sub_target]` split out of a raw command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub target: &'a str,
    pub sub_target: Option<&'a str>,
}

impl ParsedCommand<'_> {
    /// Arguments handed to the discovery: `[sub_target]` or `[]`.
    pub fn arguments(&self) -> Vec<String> {
        self.sub_target
            .map_or_else(Vec::new, |s| vec![s.to_string()])
    }
}

pub fn parse_command(raw: &str) -> ParsedCommand<'_> {
    let mut segments = raw.split(':');
    let target = segments.next().unwrap_or_default();
    let sub_target = segments.next().filter(|s| !s.is_empty());
    ParsedCommand { target, sub_target }
}

/* -------------------------------------------------------------------------- */
/* Dispatch                                                                   */
/* -------------------------------------------------------------------------- */

/// A handler that was resolved and ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub target: String,
    pub arguments: Vec<String>,
}

pub type DispatchOutcome = Result<Dispatched, CommandError>;

/// Routes a command string to its registered discovery.
pub struct DiscoveryDispatcher {
    registry: DiscoveryRegistry,
}

impl DiscoveryDispatcher {
    pub fn new(registry: DiscoveryRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DiscoveryRegistry {
        &self.registry
    }

    pub fn dispatch(&self, command: &str) -> DispatchOutcome {
        debug!(command, "dispatching discovery");
        let parsed = parse_command(command);
        self.registry.resolve(parsed.target).map(|handler| {
            let arguments = parsed.arguments();
            handler.exec(&arguments);
            Dispatched {
                target: parsed.target.to_string(),
                arguments,
            }
        })
    }
}

/// The `discover` command: argument-count check, then dispatch. Owns the only
/// path from a `CommandError` to the sink.
pub struct DiscoverCommand {
    dispatcher: DiscoveryDispatcher,
    sink: Arc<dyn Sink>,
}

impl DiscoverCommand {
    /// Load plugins (built-ins, then the configured directory) and build the
    /// registry against the shared collaborators.
    pub fn new(config: &Config, api: Arc<dyn ApiInterface>, sink: Arc<dyn Sink>) -> Self {
        let candidates = load_discovery_candidates(config.discovery_plugins_path());
        let command = Self::with_registry(
            DiscoveryRegistry::build(candidates, api, Arc::clone(&sink)),
            sink,
        );
        let registry = command.dispatcher().registry();
        if registry.is_empty() {
            warn!("no discoveries registered");
        }
        debug!(count = registry.len(), discoveries = ?registry.names(), "discovery registry ready");
        command
    }

    pub fn with_registry(registry: DiscoveryRegistry, sink: Arc<dyn Sink>) -> Self {
        Self {
            dispatcher: DiscoveryDispatcher::new(registry),
            sink,
        }
    }

    pub fn dispatcher(&self) -> &DiscoveryDispatcher {
        &self.dispatcher
    }

    pub fn exec(&self, arguments: &[String]) -> DispatchOutcome {
        debug!(?arguments, "running `{DISCOVER_COMMAND}` command");

        let outcome = assert_num_args(1, arguments, DISCOVER_COMMAND)
            .and_then(|args| self.dispatcher.dispatch(&args[0]));

        match &outcome {
            Ok(done) => debug!(discovery = %done.target, "finished `{DISCOVER_COMMAND}` command"),
            Err(e) => {
                warn!(error = %e, "`{DISCOVER_COMMAND}` command rejected");
                self.sink.process(Record::from(e.clone()));
            }
        }
        outcome
    }
}

/* --------------------------------- Tests ---------------------------------- */
