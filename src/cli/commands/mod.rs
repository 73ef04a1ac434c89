use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::source::FileBoardStore;

pub mod announce;
pub mod config;
pub mod items;
pub mod list;
pub mod sound;
pub mod watch;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Open the shared board file, creating its directory on first use.
pub fn open_board(path: &Path) -> Result<Arc<FileBoardStore>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create board directory {}", parent.display()))?;
    }
    Ok(Arc::new(FileBoardStore::new(path)))
}

pub async fn show_getting_started() -> Result<()> {
    println!("Stageboard - stage tracking with display clients");
    println!();
    println!("Operator commands:");
    println!("  stageboard add <tag>        # Register an item in the barn");
    println!("  stageboard enqueue <id>     # Put it in the queue");
    println!("  stageboard advance <id>     # Move it one stage forward");
    println!("  stageboard announce <text>  # Broadcast an announcement");
    println!();
    println!("Display:");
    println!("  stageboard watch --audio    # Run a display client with sound");
    println!("  stageboard list             # Print the board once");
    Ok(())
}
