//! `evo init` — write a default experiment configuration document.

use std::path::PathBuf;

use clap::Args;
use evo_runtime::Config;

use crate::error::CliResult;

/// Write a default configuration document to disk.
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Where to write the generated configuration document.
    #[arg(short = 'g', long = "generate", default_value = "config.json")]
    path: PathBuf,
}

impl InitCommand {
    /// Write [`Config::defaults`] to `self.path`, exiting `0` on success.
    pub fn execute(self) -> CliResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, Config::defaults().to_json())?;
        tracing::info!("wrote default configuration to {}", self.path.display());
        Ok(())
    }
}
