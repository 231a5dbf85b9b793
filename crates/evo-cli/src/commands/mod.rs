//! Top-level argument parsing and subcommand dispatch.

pub mod init;
pub mod inspect;
pub mod run;

use clap::{Parser, Subcommand};

use crate::error::CliResult;

/// Command-line front-end for the neuroevolution platform.
#[derive(Debug, Parser)]
#[command(name = "evo", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// The three external-facing subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run an experiment configuration document to completion.
    Run(run::RunCommand),
    /// Write a default experiment configuration document.
    Init(init::InitCommand),
    /// Validate a configuration document without running it.
    Inspect(inspect::InspectCommand),
}

impl Cli {
    /// Dispatch to the selected subcommand.
    pub fn execute(self) -> CliResult<()> {
        match self.command {
            Command::Run(cmd) => cmd.execute(),
            Command::Init(cmd) => cmd.execute(),
            Command::Inspect(cmd) => cmd.execute(),
        }
    }
}
