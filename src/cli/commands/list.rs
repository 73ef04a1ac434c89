use anyhow::Result;
use std::path::PathBuf;

use super::{open_board, Command};
use crate::board::{render_text, BoardColumns, BoardFrame};
use crate::pipeline::{ItemFilter, Stage};
use crate::source::ItemSource;

pub struct ListCommand {
    pub board_path: PathBuf,
    pub filter: ItemFilter,
    pub json: bool,
}

impl Command for ListCommand {
    async fn execute(&self) -> Result<()> {
        let store = open_board(&self.board_path)?;
        let items = store.list_items(&self.filter).await?;
        let columns = BoardColumns::from_items(&items);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&columns)?);
            return Ok(());
        }

        print!(
            "{}",
            render_text(&BoardFrame {
                client_id: "board",
                columns: &columns,
                alert: None,
                announcement: None,
                audio_enabled: false,
            })
        );

        let barn = columns.column(Stage::Barn);
        if !barn.is_empty() {
            println!("{:<12} {:>3}", "BARN", barn.len());
            for item in &barn.items {
                println!("    #{:<5} {} ({})", item.id, item.tag, item.category);
            }
        }
        if columns.total() == 0 {
            println!("No items on the board");
        }
        Ok(())
    }
}
