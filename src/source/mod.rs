//! Data source abstractions
//!
//! The pipeline core never owns item records. It reads them through
//! [`ItemSource`] and the operator surface mutates them through
//! [`ItemWriter`]. Both are injected as trait objects so display clients and
//! tests can swap the backing store freely.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::announce::Announcement;
use crate::pipeline::{Category, Item, ItemFilter, ItemId, Stage};

pub use file::FileBoardStore;
pub use memory::MemorySource;

/// Default on-screen lifetime of a published announcement.
pub const DEFAULT_ANNOUNCEMENT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("item {id} moved to '{actual}' (expected '{expected}')")]
    StageChanged {
        id: ItemId,
        expected: Stage,
        actual: Stage,
    },
    #[error("board file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("board document is malformed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// How stage cues should sound on display clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SoundChoice {
    /// Synthesised per-stage tones.
    #[default]
    Tones,
    /// A pre-recorded sound referenced by `custom_sound_ref`.
    Custom,
}

/// Operator-controlled settings every client refreshes on each tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub announcement_message: Option<String>,
    /// Deduplication key of the current announcement.
    pub announcement_issued_at: Option<DateTime<Utc>>,
    pub announcement_duration_ms: u64,
    pub sound_choice: SoundChoice,
    pub custom_sound_ref: Option<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            announcement_message: None,
            announcement_issued_at: None,
            announcement_duration_ms: DEFAULT_ANNOUNCEMENT_SECS * 1000,
            sound_choice: SoundChoice::Tones,
            custom_sound_ref: None,
        }
    }
}

impl BoardSettings {
    /// The currently published announcement, if there is one worth showing.
    pub fn announcement(&self) -> Option<Announcement> {
        let message = self.announcement_message.as_deref()?.trim();
        let issued_at = self.announcement_issued_at?;
        if message.is_empty() {
            return None;
        }
        Some(Announcement {
            message: message.to_string(),
            issued_at,
            duration: self.announcement_duration(),
        })
    }

    pub fn announcement_duration(&self) -> Duration {
        Duration::from_millis(self.announcement_duration_ms)
    }

    /// Custom sound reference, only when custom sounds are selected.
    pub fn custom_sound(&self) -> Option<&str> {
        match self.sound_choice {
            SoundChoice::Custom => self
                .custom_sound_ref
                .as_deref()
                .filter(|r| !r.trim().is_empty()),
            SoundChoice::Tones => None,
        }
    }
}

/// Read API consumed by display clients.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch items matching the filter, in the source's stable order.
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, SourceError>;

    /// Fetch a single item by id.
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, SourceError>;

    /// Fetch announcement and sound settings.
    async fn settings(&self) -> Result<BoardSettings, SourceError>;
}

/// Write API driven by the operator surface.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ItemWriter: Send + Sync {
    /// Write a new stage. `updated_at` moves only if the stage changed.
    async fn set_stage(&self, id: ItemId, stage: Stage) -> Result<Item, SourceError>;

    /// Write a new stage only if the item is still at `expected`, checked
    /// under the same lock as the write.
    async fn set_stage_if(
        &self,
        id: ItemId,
        expected: Stage,
        stage: Stage,
    ) -> Result<Item, SourceError>;

    /// Register a new item in the barn.
    async fn create_item(&self, tag: &str, category: Category) -> Result<Item, SourceError>;

    /// Publish an announcement and return its issue timestamp, which is
    /// strictly later than any previous one.
    async fn publish_announcement(
        &self,
        message: &str,
        duration: Duration,
    ) -> Result<DateTime<Utc>, SourceError>;

    /// Select the sound family used by display clients.
    async fn set_sound(
        &self,
        choice: SoundChoice,
        custom_ref: Option<String>,
    ) -> Result<(), SourceError>;
}

/// A store that serves both sides, such as the shared board file.
pub trait BoardStore: ItemSource + ItemWriter {}

impl<T: ItemSource + ItemWriter> BoardStore for T {}

/// Stored form of an announcement lifetime, millisecond precision.
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Next issue timestamp for a publish: `now`, unless that would not be
/// strictly after the previous one.
pub fn next_issue_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + ChronoDuration::milliseconds(1),
        _ => now,
    }
}
