use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod api;
mod cmd;
mod config;
mod discovery;
mod error;
mod plugin;
mod sink;
mod utils;

use cmd::DiscoverArgs;

/// huemon - Hue bridge monitoring agent
///
/// Command layout:
///   huemon discover <target>[:<subtarget>]
///
/// Built-in discoveries:
///   lights     - all lights (`lights:<id>` for one)
///   groups     - rooms / zones (`groups:<id>` or `groups:Room`)
///   sensors    - sensors (`sensors:<id>` or `sensors:ZLLTemperature`)
///
/// Additional discoveries are loaded from `plugins.discoveries.path` in the
/// configuration; a plugin with a built-in's name replaces it.
///
/// Global flags / env (before the target; later tokens belong to discover):
///   -v / -vv / -vvv      Increase log verbosity (stderr)
///   -q / --quiet         Errors only
///   -c / --config        Configuration file (or HUEMON_CONFIG_PATH, default ./config.yml)
///   RUST_LOG             Overrides the log filter
///
/// Examples:
///   huemon discover lights
///   huemon -c /etc/huemon/config.yml discover groups:1
#[derive(Parser, Debug)]
#[command(
    name = "huemon",
    version,
    author,
    about = "huemon - Hue bridge discovery for monitoring agents",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (falls back to HUEMON_CONFIG_PATH, then ./config.yml)
    #[arg(short = 'c', long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a discovery and print its records as JSON lines
    Discover(DiscoverArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let config = config::resolve_config(cli.config)?;

    match cli.command {
        Commands::Discover(args) => cmd::execute_discover(args, &config),
    }
}
