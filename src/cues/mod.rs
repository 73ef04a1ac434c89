//! Audible cues for alerts and announcements
//!
//! Every sound goes through a [`CuePlayer`]. The [`CueDispatcher`] decides
//! whether anything is played at all: unless the session's [`AudioGate`] was
//! opened by an explicit user action it does nothing, so an unattended
//! display never starts making noise on its own. Playback failures are
//! logged at debug level and otherwise ignored.

pub mod doubles;
pub mod terminal;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use crate::pipeline::Stage;

pub use doubles::{NullCuePlayer, PlayedCue, RecordingCuePlayer};
pub use terminal::TerminalCuePlayer;

/// Pause between the tone and the spoken phrase.
pub const DEFAULT_SPEECH_DELAY: Duration = Duration::from_millis(700);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio playback failed: {0}")]
    PlaybackFailed(String),
}

/// Identifies which sound belongs to an alert or announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundId {
    Queued,
    Processing,
    Subdividing,
    Allocating,
    Completed,
    Announcement,
}

impl SoundId {
    /// Barn moves never alert, so they have no sound.
    pub fn for_stage(stage: Stage) -> Option<SoundId> {
        match stage {
            Stage::Barn => None,
            Stage::Queued => Some(SoundId::Queued),
            Stage::Processing => Some(SoundId::Processing),
            Stage::Subdividing => Some(SoundId::Subdividing),
            Stage::Allocating => Some(SoundId::Allocating),
            Stage::Completed => Some(SoundId::Completed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    /// Sharp attack, quick decay.
    Pluck,
    /// Slow attack.
    Swell,
    Flat,
}

/// A synthesised tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneSpec {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub envelope: Envelope,
    /// Number of pulses; terminal playback maps each to one bell.
    pub pulses: u8,
}

impl ToneSpec {
    pub fn for_sound(sound: SoundId) -> Self {
        let (frequency_hz, duration_ms, envelope, pulses) = match sound {
            SoundId::Queued => (523, 180, Envelope::Pluck, 1),
            SoundId::Processing => (659, 220, Envelope::Pluck, 2),
            SoundId::Subdividing => (784, 220, Envelope::Flat, 2),
            SoundId::Allocating => (880, 260, Envelope::Swell, 2),
            SoundId::Completed => (1047, 400, Envelope::Swell, 3),
            SoundId::Announcement => (440, 600, Envelope::Swell, 1),
        };
        Self {
            frequency_hz,
            duration_ms,
            envelope,
            pulses,
        }
    }
}

/// What to play for one alert or announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub sound: SoundId,
    pub utterance: Option<String>,
}

/// Audio output backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CuePlayer: Send + Sync {
    async fn play_tone(&self, tone: ToneSpec) -> Result<(), AudioError>;

    /// Play a pre-recorded sound by reference (path or URL).
    async fn play_custom(&self, sound_ref: &str) -> Result<(), AudioError>;

    async fn speak(&self, text: &str) -> Result<(), AudioError>;
}

/// Session-wide audio permission. Closed until a user opens it.
#[derive(Debug, Clone, Default)]
pub struct AudioGate {
    enabled: Arc<AtomicBool>,
}

impl AudioGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the user's explicit opt-in.
    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            info!("Audio enabled by user");
        }
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

pub struct CueDispatcher {
    player: Arc<dyn CuePlayer>,
    gate: AudioGate,
    speech_delay: Duration,
}

impl CueDispatcher {
    pub fn new(player: Arc<dyn CuePlayer>, gate: AudioGate) -> Self {
        Self {
            player,
            gate,
            speech_delay: DEFAULT_SPEECH_DELAY,
        }
    }

    pub fn with_speech_delay(mut self, delay: Duration) -> Self {
        self.speech_delay = delay;
        self
    }

    pub fn gate(&self) -> &AudioGate {
        &self.gate
    }

    /// Start playing `cue` in the background. Returns `None` without touching
    /// the player when audio has not been enabled.
    ///
    /// `custom_sound` replaces the synthesised tone when set.
    pub fn dispatch(&self, cue: Cue, custom_sound: Option<String>) -> Option<JoinHandle<()>> {
        if !self.gate.is_enabled() {
            debug!(sound = ?cue.sound, "Audio not enabled, cue skipped");
            return None;
        }
        let player = Arc::clone(&self.player);
        let delay = self.speech_delay;
        Some(tokio::spawn(async move {
            play_cue(player.as_ref(), cue, custom_sound, delay).await;
        }))
    }
}

async fn play_cue(player: &dyn CuePlayer, cue: Cue, custom_sound: Option<String>, delay: Duration) {
    let played = match custom_sound.as_deref() {
        Some(sound_ref) => player.play_custom(sound_ref).await,
        None => player.play_tone(ToneSpec::for_sound(cue.sound)).await,
    };
    if let Err(e) = played {
        debug!(sound = ?cue.sound, error = %e, "Cue sound failed");
    }

    if let Some(text) = cue.utterance {
        tokio::time::sleep(delay).await;
        if let Err(e) = player.speak(&text).await {
            debug!(error = %e, "Cue speech failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn cue() -> Cue {
        Cue {
            sound: SoundId::Completed,
            utterance: Some("A-12, delivered".to_string()),
        }
    }

    #[test]
    fn test_tones_are_distinct_per_stage() {
        let tones: Vec<ToneSpec> = Stage::ALL
            .into_iter()
            .filter_map(SoundId::for_stage)
            .map(ToneSpec::for_sound)
            .collect();
        assert_eq!(tones.len(), 5);
        for (i, a) in tones.iter().enumerate() {
            for b in &tones[i + 1..] {
                assert_ne!(a.frequency_hz, b.frequency_hz);
            }
        }
    }

    #[tokio::test]
    async fn test_closed_gate_never_calls_player() {
        let mut player = MockCuePlayer::new();
        player.expect_play_tone().never();
        player.expect_play_custom().never();
        player.expect_speak().never();

        let dispatcher = CueDispatcher::new(Arc::new(player), AudioGate::new());
        assert!(dispatcher.dispatch(cue(), None).is_none());
        assert!(dispatcher
            .dispatch(cue(), Some("/srv/bell.wav".to_string()))
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tone_then_speech() {
        let mut player = MockCuePlayer::new();
        player
            .expect_play_tone()
            .with(eq(ToneSpec::for_sound(SoundId::Completed)))
            .times(1)
            .returning(|_| Ok(()));
        player
            .expect_speak()
            .with(eq("A-12, delivered"))
            .times(1)
            .returning(|_| Ok(()));

        let gate = AudioGate::new();
        gate.enable();
        let dispatcher = CueDispatcher::new(Arc::new(player), gate);
        dispatcher.dispatch(cue(), None).unwrap().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_errors_are_swallowed() {
        let mut player = MockCuePlayer::new();
        player
            .expect_play_custom()
            .times(1)
            .returning(|_| Err(AudioError::PlaybackFailed("no device".to_string())));
        player
            .expect_speak()
            .times(1)
            .returning(|_| Err(AudioError::PlaybackFailed("no voice".to_string())));

        let gate = AudioGate::new();
        gate.enable();
        let dispatcher = CueDispatcher::new(Arc::new(player), gate);
        let handle = dispatcher
            .dispatch(cue(), Some("/srv/bell.wav".to_string()))
            .unwrap();
        assert!(handle.await.is_ok());
    }
}
