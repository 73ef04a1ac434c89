use anyhow::{bail, Result};
use std::path::PathBuf;

use super::{open_board, Command};
use crate::source::{ItemWriter, SoundChoice};

pub struct SoundCommand {
    pub board_path: PathBuf,
    pub choice: SoundChoice,
    pub custom_ref: Option<String>,
}

impl Command for SoundCommand {
    async fn execute(&self) -> Result<()> {
        if self.choice == SoundChoice::Custom
            && self.custom_ref.as_deref().map_or(true, |r| r.trim().is_empty())
        {
            bail!("a custom sound needs a sound file reference");
        }
        let store = open_board(&self.board_path)?;
        store.set_sound(self.choice, self.custom_ref.clone()).await?;
        match &self.custom_ref {
            Some(reference) if self.choice == SoundChoice::Custom => {
                println!("Displays will play {reference}")
            }
            _ => println!("Displays will play the built-in tones"),
        }
        Ok(())
    }
}
