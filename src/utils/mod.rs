//! Utilities: logging setup (tracing, dynamic level), outcome helpers over
//! `Result`/`Option`, and a blocking bridge onto a short-lived tokio runtime.
//!
//! Key items:
//!   init_logging / derive_level
//!   outcome::{split_outcomes, assert_num_args, assert_exists}
//!   block_on

pub mod outcome;

use anyhow::{Context, Result};
use std::future::Future;

/// Logging helpers.
pub mod logging {
    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::EnvFilter;

    /// Map CLI verbosity flags onto a tracing level. Stdout belongs to the sink,
    /// so the default only lets warnings through.
    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::ERROR;
        }
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Install the global subscriber. `RUST_LOG` wins over the CLI-derived level.
    pub fn init_logging(level: LevelFilter) {
        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();

        // A second init (tests) is harmless; keep the first subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

/// Run a future to completion on a fresh current-thread runtime.
///
/// The core is synchronous; collaborators that need async I/O (HTTP, child
/// processes) bridge through here once per call.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;
    Ok(rt.block_on(future))
}
