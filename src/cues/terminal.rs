//! Terminal audio backend
//!
//! Tones are approximated with the terminal bell, one bell per pulse. Custom
//! sounds and speech are delegated to external programs configured by the
//! operator (for example `aplay` and `espeak`); the sound reference or text
//! is appended as the last argument.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{AudioError, CuePlayer, ToneSpec};

#[derive(Debug, Clone, Default)]
pub struct TerminalCuePlayer {
    player_command: Vec<String>,
    speech_command: Vec<String>,
}

impl TerminalCuePlayer {
    pub fn new(player_command: Vec<String>, speech_command: Vec<String>) -> Self {
        Self {
            player_command,
            speech_command,
        }
    }

    async fn run(command: &[String], last_arg: &str) -> Result<(), AudioError> {
        let Some((program, args)) = command.split_first() else {
            return Err(AudioError::PlaybackFailed("no command configured".to_string()));
        };
        let status = Command::new(program)
            .args(args)
            .arg(last_arg)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| AudioError::PlaybackFailed(format!("{program}: {e}")))?;
        if status.success() {
            Ok(())
        } else {
            Err(AudioError::PlaybackFailed(format!("{program} exited with {status}")))
        }
    }
}

#[async_trait]
impl CuePlayer for TerminalCuePlayer {
    async fn play_tone(&self, tone: ToneSpec) -> Result<(), AudioError> {
        let mut stderr = tokio::io::stderr();
        for pulse in 0..tone.pulses.max(1) {
            if pulse > 0 {
                tokio::time::sleep(Duration::from_millis(u64::from(tone.duration_ms))).await;
            }
            stderr
                .write_all(b"\x07")
                .await
                .map_err(|e| AudioError::PlaybackFailed(e.to_string()))?;
        }
        stderr
            .flush()
            .await
            .map_err(|e| AudioError::PlaybackFailed(e.to_string()))?;
        debug!(frequency_hz = tone.frequency_hz, pulses = tone.pulses, "Bell tone played");
        Ok(())
    }

    async fn play_custom(&self, sound_ref: &str) -> Result<(), AudioError> {
        Self::run(&self.player_command, sound_ref).await
    }

    async fn speak(&self, text: &str) -> Result<(), AudioError> {
        Self::run(&self.speech_command, text).await
    }
}
