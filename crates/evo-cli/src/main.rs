//! `evo` — command-line front-end for the neuroevolution platform.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use evo_cli::commands::Cli;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = cli.execute() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

/// Wire up both logging stacks this crate's dependency tree carries:
/// `env_logger` so `log::*` calls inside `evo-core`/`evo-runtime` print
/// somewhere, and `tracing-subscriber` for this crate's own spans/events.
/// Both default to `info`, or `debug` when `--verbose` is passed, unless
/// `RUST_LOG` overrides them.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", default_level);
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .is_test(false)
        .try_init()
        .ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init()
        .ok();
}
