/*!
Subcommand modules.

Layout:
  src/cmd/
    mod.rs       (this file)
    discover.rs  (DiscoverArgs + execute_discover, command parsing/dispatch)

Conventions:
  - Each subcommand module exposes exactly one public `execute_*` function
    returning `anyhow::Result<()>`; startup problems (bad config, bad bridge
    URL) surface there.
  - Recoverable command failures do not bubble up as `Err`: they are sent to
    the sink as error records.
  - Argument structs derive `clap::Args` and are kept minimal.
*/

pub mod discover;

pub use discover::{DiscoverArgs, execute_discover};
