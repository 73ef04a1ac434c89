use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{open_board, Command};
use crate::board::TerminalRenderer;
use crate::config::StageboardConfig;
use crate::cues::{AudioGate, TerminalCuePlayer};
use crate::poller::PollLoop;
use crate::session::{ClientSession, SessionOptions};
use crate::shutdown::ShutdownCoordinator;

pub struct WatchCommand {
    pub board_path: PathBuf,
    pub client_id: String,
    pub interval: Duration,
    pub alert_lifetime: Duration,
    pub speech_delay: Duration,
    pub failure_logs_per_minute: u32,
    pub player_command: Vec<String>,
    pub speech_command: Vec<String>,
    pub audio: bool,
    pub clear_screen: bool,
    pub log_metrics: bool,
}

impl WatchCommand {
    pub fn from_config(config: &StageboardConfig, board_path: PathBuf) -> Self {
        Self {
            board_path,
            client_id: config.client.resolved_id(),
            interval: config.poller.interval(),
            alert_lifetime: config.poller.alert_lifetime(),
            speech_delay: config.audio.speech_delay(),
            failure_logs_per_minute: config.poller.failure_logs_per_minute,
            player_command: config.audio.player_command.clone(),
            speech_command: config.audio.speech_command.clone(),
            audio: false,
            clear_screen: true,
            log_metrics: config.observability.metrics_enabled,
        }
    }

    pub fn with_audio(mut self, audio: bool) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: Option<u64>) -> Self {
        if let Some(ms) = interval_ms {
            self.interval = Duration::from_millis(ms.max(1));
        }
        self
    }

    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        if let Some(id) = client_id.filter(|id| !id.trim().is_empty()) {
            self.client_id = id;
        }
        self
    }

    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }
}

impl Command for WatchCommand {
    async fn execute(&self) -> Result<()> {
        let store = open_board(&self.board_path)?;

        let gate = AudioGate::new();
        if self.audio {
            gate.enable();
        }
        let player = Arc::new(TerminalCuePlayer::new(
            self.player_command.clone(),
            self.speech_command.clone(),
        ));
        let session = ClientSession::new(
            SessionOptions {
                client_id: self.client_id.clone(),
                alert_lifetime: self.alert_lifetime,
                speech_delay: self.speech_delay,
            },
            store,
            player,
            gate,
        );

        let shutdown = ShutdownCoordinator::new();
        let signals = shutdown.install_signal_handlers();

        info!(board = %self.board_path.display(), "Watching board");
        let session = PollLoop::new(session, shutdown.subscribe())
            .with_interval(self.interval)
            .with_failure_logs_per_minute(self.failure_logs_per_minute)
            .with_renderer(Box::new(TerminalRenderer::new(self.clear_screen)))
            .run()
            .await;
        signals.abort();

        if self.log_metrics {
            session.metrics().log_stats();
        }
        Ok(())
    }
}
