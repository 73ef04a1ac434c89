use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use super::{open_board, Command};
use crate::source::ItemWriter;

pub struct AnnounceCommand {
    pub board_path: PathBuf,
    pub message: String,
    pub duration: Duration,
}

impl Command for AnnounceCommand {
    async fn execute(&self) -> Result<()> {
        let message = self.message.trim();
        if message.is_empty() {
            bail!("announcement text must not be empty");
        }
        let store = open_board(&self.board_path)?;
        let issued_at = store.publish_announcement(message, self.duration).await?;
        println!(
            "Announcement published at {} for {}s",
            issued_at.to_rfc3339(),
            self.duration.as_secs()
        );
        Ok(())
    }
}
