// Cue players that never touch an audio device.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{AudioError, CuePlayer, ToneSpec};

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCuePlayer;

#[async_trait]
impl CuePlayer for NullCuePlayer {
    async fn play_tone(&self, _tone: ToneSpec) -> Result<(), AudioError> {
        Ok(())
    }

    async fn play_custom(&self, _sound_ref: &str) -> Result<(), AudioError> {
        Ok(())
    }

    async fn speak(&self, _text: &str) -> Result<(), AudioError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayedCue {
    Tone(ToneSpec),
    Custom(String),
    Speech(String),
}

/// Records every call, optionally failing each one.
#[derive(Debug, Default)]
pub struct RecordingCuePlayer {
    played: Mutex<Vec<PlayedCue>>,
    fail: bool,
}

impl RecordingCuePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls but reports every one as a playback failure.
    pub fn failing() -> Self {
        Self {
            played: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn played(&self) -> Vec<PlayedCue> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    fn record(&self, cue: PlayedCue) -> Result<(), AudioError> {
        self.lock().push(cue);
        if self.fail {
            Err(AudioError::PlaybackFailed("recording player set to fail".to_string()))
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PlayedCue>> {
        self.played.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CuePlayer for RecordingCuePlayer {
    async fn play_tone(&self, tone: ToneSpec) -> Result<(), AudioError> {
        self.record(PlayedCue::Tone(tone))
    }

    async fn play_custom(&self, sound_ref: &str) -> Result<(), AudioError> {
        self.record(PlayedCue::Custom(sound_ref.to_string()))
    }

    async fn speak(&self, text: &str) -> Result<(), AudioError> {
        self.record(PlayedCue::Speech(text.to_string()))
    }
}
