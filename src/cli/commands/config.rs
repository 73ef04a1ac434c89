use anyhow::{bail, Result};
use std::path::PathBuf;

use super::Command;
use crate::config::StageboardConfig;

pub struct ShowConfigCommand {
    pub config: StageboardConfig,
}

impl Command for ShowConfigCommand {
    async fn execute(&self) -> Result<()> {
        print!("{}", toml::to_string_pretty(&self.config)?);
        Ok(())
    }
}

pub struct InitConfigCommand {
    pub path: PathBuf,
    pub force: bool,
}

impl Command for InitConfigCommand {
    async fn execute(&self) -> Result<()> {
        if self.path.exists() && !self.force {
            bail!(
                "{} already exists, use --force to overwrite it",
                self.path.display()
            );
        }
        StageboardConfig::default().save_to_file(&self.path)?;
        println!("Wrote default configuration to {}", self.path.display());
        Ok(())
    }
}
