//! `evo inspect` — validate a configuration document without running it.

use std::path::PathBuf;

use clap::Args;
use evo_runtime::Config;

use crate::error::{CliError, CliResult};

/// Parse and validate a configuration document, reporting every failed
/// check (spec.md §7) without ever starting a run.
#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Configuration document to validate.
    #[arg(short = 'c', long = "config")]
    config: PathBuf,
}

impl InspectCommand {
    /// Exit non-zero (via a returned [`CliError`]) on the first failure
    /// to parse, or a [`CliError::Configuration`] carrying every failed
    /// validation check.
    pub fn execute(self) -> CliResult<()> {
        let text = std::fs::read_to_string(&self.config)?;
        let conf = Config::from_json(&text)?;

        match conf.validate() {
            Ok(()) => {
                println!("{}: configuration is valid", self.config.display());
                Ok(())
            }
            Err(reasons) => {
                for reason in &reasons {
                    eprintln!("{reason}");
                }
                Err(CliError::configuration(reasons))
            }
        }
    }
}
