use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::pipeline::{Category, ItemId, Stage};
use crate::source::SoundChoice;

pub mod commands;

#[derive(Parser)]
#[command(name = "stageboard")]
#[command(about = "Stage tracking board with unattended display clients")]
#[command(long_about = "Stageboard moves items through a fixed sequence of handling stages and \
                       broadcasts every change to display clients, which poll the shared board, \
                       raise one alert at a time and show operator announcements. Start a display \
                       with 'stageboard watch'.")]
pub struct Cli {
    /// Board file to use instead of the configured one
    #[arg(long, global = true, help = "Path of the shared board file")]
    pub board: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a display client that polls the board and raises alerts
    Watch {
        /// Play tones and speech for alerts and announcements
        #[arg(long, help = "Enable audible cues (off unless this flag is given)")]
        audio: bool,
        /// Poll interval in milliseconds
        #[arg(long, help = "Override the configured poll interval")]
        interval_ms: Option<u64>,
        /// Display client id
        #[arg(long, help = "Client id shown on the display (defaults to the hostname)")]
        client_id: Option<String>,
        /// Append frames instead of redrawing the screen
        #[arg(long, help = "Do not clear the terminal between frames")]
        no_clear: bool,
    },
    /// Print the board once
    List {
        /// Only show items in this stage
        #[arg(long, value_enum)]
        stage: Option<StageArg>,
        /// Only show items of this category
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
        /// Only show items whose tag contains this text
        #[arg(long)]
        tag: Option<String>,
        /// Print JSON instead of the text board
        #[arg(long)]
        json: bool,
    },
    /// Register a new item in the barn
    Add {
        /// Display tag
        tag: String,
        #[arg(long, value_enum, default_value = "large")]
        category: CategoryArg,
    },
    /// Move an item from the barn into the queue
    Enqueue { id: ItemId },
    /// Move a queued item back to the barn
    Dequeue { id: ItemId },
    /// Move an item one stage forward
    Advance { id: ItemId },
    /// Move an item one stage back
    Revert { id: ItemId },
    /// Publish an announcement to every display
    Announce {
        message: String,
        /// How long displays keep it visible
        #[arg(long, default_value = "60")]
        duration_secs: u64,
    },
    /// Choose the sound family displays play
    Sound {
        #[arg(value_enum)]
        choice: SoundArg,
        /// Sound file played when the choice is custom
        custom_ref: Option<String>,
    },
    /// Inspect or write configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration to stageboard.toml
    Init {
        #[arg(long, help = "Overwrite an existing stageboard.toml")]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StageArg {
    Barn,
    Queued,
    Processing,
    Subdividing,
    Allocating,
    Completed,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Barn => Stage::Barn,
            StageArg::Queued => Stage::Queued,
            StageArg::Processing => Stage::Processing,
            StageArg::Subdividing => Stage::Subdividing,
            StageArg::Allocating => Stage::Allocating,
            StageArg::Completed => Stage::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    Large,
    Small,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Large => Category::Large,
            CategoryArg::Small => Category::Small,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SoundArg {
    Tones,
    Custom,
}

impl From<SoundArg> for SoundChoice {
    fn from(arg: SoundArg) -> Self {
        match arg {
            SoundArg::Tones => SoundChoice::Tones,
            SoundArg::Custom => SoundChoice::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_watch_audio_defaults_off() {
        let cli = Cli::try_parse_from(["stageboard", "watch"]).unwrap();
        match cli.command {
            Some(Commands::Watch { audio, .. }) => assert!(!audio),
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_item_ids_accept_hash_prefix() {
        let cli = Cli::try_parse_from(["stageboard", "advance", "#12"]).unwrap();
        match cli.command {
            Some(Commands::Advance { id }) => assert_eq!(id, ItemId(12)),
            _ => panic!("expected advance"),
        }
    }
}
