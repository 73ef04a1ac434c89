use anyhow::{bail, Result};
use std::path::PathBuf;

use super::{open_board, Command};
use crate::pipeline::{Category, ItemId, StageMachine, TransitionKind};
use crate::source::ItemWriter;

pub struct AddCommand {
    pub board_path: PathBuf,
    pub tag: String,
    pub category: Category,
}

impl Command for AddCommand {
    async fn execute(&self) -> Result<()> {
        let tag = self.tag.trim();
        if tag.is_empty() {
            bail!("item tag must not be empty");
        }
        let store = open_board(&self.board_path)?;
        let item = store.create_item(tag, self.category).await?;
        println!("Added #{} {} ({}) to {}", item.id, item.tag, item.category, item.stage);
        Ok(())
    }
}

/// Any of the four operator transitions on one item.
pub struct TransitionCommand {
    pub board_path: PathBuf,
    pub id: ItemId,
    pub kind: TransitionKind,
}

impl Command for TransitionCommand {
    async fn execute(&self) -> Result<()> {
        let store = open_board(&self.board_path)?;
        let result = StageMachine::new(store).execute(self.id, self.kind).await?;
        println!(
            "#{} {}: {} -> {}",
            result.item.id, result.item.tag, result.previous_stage, result.item.stage
        );
        Ok(())
    }
}
