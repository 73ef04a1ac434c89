use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use stageboard::cli::commands::announce::AnnounceCommand;
use stageboard::cli::commands::config::{InitConfigCommand, ShowConfigCommand};
use stageboard::cli::commands::items::{AddCommand, TransitionCommand};
use stageboard::cli::commands::list::ListCommand;
use stageboard::cli::commands::sound::SoundCommand;
use stageboard::cli::commands::watch::WatchCommand;
use stageboard::cli::commands::{show_getting_started, Command};
use stageboard::cli::{Cli, Commands, ConfigAction};
use stageboard::{config, init_telemetry, shutdown_telemetry, ItemFilter, TransitionKind};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config()?;
    init_telemetry(
        &config.observability.log_level,
        config.observability.json_logs,
    )?;

    let board_path = cli.board.clone().unwrap_or_else(|| config.board.path.clone());
    let transition = |id, kind| TransitionCommand {
        board_path: board_path.clone(),
        id,
        kind,
    };

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            // No subcommand: explain the available commands
            None => show_getting_started().await,
            Some(Commands::Watch {
                audio,
                interval_ms,
                client_id,
                no_clear,
            }) => {
                WatchCommand::from_config(config, board_path.clone())
                    .with_audio(audio)
                    .with_interval_ms(interval_ms)
                    .with_client_id(client_id)
                    .with_clear_screen(!no_clear)
                    .execute()
                    .await
            }
            Some(Commands::List {
                stage,
                category,
                tag,
                json,
            }) => {
                let filter = ItemFilter {
                    stage: stage.map(Into::into),
                    category: category.map(Into::into),
                    tag_contains: tag,
                };
                ListCommand {
                    board_path: board_path.clone(),
                    filter,
                    json,
                }
                .execute()
                .await
            }
            Some(Commands::Add { tag, category }) => {
                AddCommand {
                    board_path: board_path.clone(),
                    tag,
                    category: category.into(),
                }
                .execute()
                .await
            }
            Some(Commands::Enqueue { id }) => transition(id, TransitionKind::Enqueue).execute().await,
            Some(Commands::Dequeue { id }) => transition(id, TransitionKind::Dequeue).execute().await,
            Some(Commands::Advance { id }) => transition(id, TransitionKind::Advance).execute().await,
            Some(Commands::Revert { id }) => transition(id, TransitionKind::Revert).execute().await,
            Some(Commands::Announce {
                message,
                duration_secs,
            }) => {
                AnnounceCommand {
                    board_path: board_path.clone(),
                    message,
                    duration: Duration::from_secs(duration_secs),
                }
                .execute()
                .await
            }
            Some(Commands::Sound { choice, custom_ref }) => {
                SoundCommand {
                    board_path: board_path.clone(),
                    choice: choice.into(),
                    custom_ref,
                }
                .execute()
                .await
            }
            Some(Commands::Config { action }) => match action {
                ConfigAction::Show => {
                    ShowConfigCommand {
                        config: config.clone(),
                    }
                    .execute()
                    .await
                }
                ConfigAction::Init { force } => {
                    InitConfigCommand {
                        path: PathBuf::from("stageboard.toml"),
                        force,
                    }
                    .execute()
                    .await
                }
            },
        }
    });

    shutdown_telemetry();
    result
}
