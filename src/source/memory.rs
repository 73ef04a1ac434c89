// In-memory board store for tests, demos and embedding.
// Writes go through a monotonic clock so updated_at orders mutations.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::{duration_to_millis, next_issue_timestamp, BoardSettings, ItemSource, ItemWriter, SoundChoice, SourceError};
use crate::pipeline::{Category, Item, ItemFilter, ItemId, Stage};

#[derive(Debug, Default)]
struct MemoryState {
    items: Vec<Item>,
    settings: BoardSettings,
    next_id: u64,
    last_write: Option<DateTime<Utc>>,
    failing_item_reads: usize,
}

impl MemoryState {
    fn tick_clock(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamped = match self.last_write {
            Some(last) if now <= last => last + ChronoDuration::milliseconds(1),
            _ => now,
        };
        self.last_write = Some(stamped);
        stamped
    }
}

/// Board store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
    item_reads: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records, keeping their order and timestamps.
    pub fn with_items(items: Vec<Item>) -> Self {
        let source = Self::new();
        for item in items {
            source.put(item);
        }
        source
    }

    /// Insert or replace a record verbatim, bypassing the write API. Used to
    /// simulate an external writer.
    pub fn put(&self, item: Item) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(item.id.0 + 1);
        match state.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => state.items.push(item),
        }
    }

    /// Make the next `count` item listings fail as if the source were down.
    pub fn fail_item_reads(&self, count: usize) {
        self.lock().failing_item_reads = count;
    }

    /// Number of item listings served, failed ones included.
    pub fn item_reads(&self) -> usize {
        self.item_reads.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    fn write_stage(
        &self,
        id: ItemId,
        expected: Option<Stage>,
        stage: Stage,
    ) -> Result<Item, SourceError> {
        let mut state = self.lock();
        let index = state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(SourceError::NotFound(id))?;
        let actual = state.items[index].stage;
        if let Some(expected) = expected.filter(|expected| *expected != actual) {
            return Err(SourceError::StageChanged {
                id,
                expected,
                actual,
            });
        }
        if actual != stage {
            let now = state.tick_clock();
            state.items[index].apply_stage(stage, now);
            debug!(item = %id, stage = %stage, "Stage written");
        }
        Ok(state.items[index].clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-write; the data is
        // still a valid list of items.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, SourceError> {
        self.item_reads.fetch_add(1, Ordering::Relaxed);
        let mut state = self.lock();
        if state.failing_item_reads > 0 {
            state.failing_item_reads -= 1;
            return Err(SourceError::Unavailable("injected item read failure".to_string()));
        }
        Ok(state
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, SourceError> {
        Ok(self.lock().items.iter().find(|item| item.id == id).cloned())
    }

    async fn settings(&self) -> Result<BoardSettings, SourceError> {
        Ok(self.lock().settings.clone())
    }
}

#[async_trait]
impl ItemWriter for MemorySource {
    async fn set_stage(&self, id: ItemId, stage: Stage) -> Result<Item, SourceError> {
        self.write_stage(id, None, stage)
    }

    async fn set_stage_if(
        &self,
        id: ItemId,
        expected: Stage,
        stage: Stage,
    ) -> Result<Item, SourceError> {
        self.write_stage(id, Some(expected), stage)
    }

    async fn create_item(&self, tag: &str, category: Category) -> Result<Item, SourceError> {
        let mut state = self.lock();
        let id = ItemId(state.next_id.max(1));
        state.next_id = id.0 + 1;
        let now = state.tick_clock();
        let item = Item::new(id, tag, category, now);
        state.items.push(item.clone());
        Ok(item)
    }

    async fn publish_announcement(
        &self,
        message: &str,
        duration: Duration,
    ) -> Result<DateTime<Utc>, SourceError> {
        let mut state = self.lock();
        let issued_at = next_issue_timestamp(state.settings.announcement_issued_at, Utc::now());
        state.settings.announcement_message = Some(message.to_string());
        state.settings.announcement_issued_at = Some(issued_at);
        state.settings.announcement_duration_ms = duration_to_millis(duration);
        Ok(issued_at)
    }

    async fn set_sound(
        &self,
        choice: SoundChoice,
        custom_ref: Option<String>,
    ) -> Result<(), SourceError> {
        let mut state = self.lock();
        state.settings.sound_choice = choice;
        state.settings.custom_sound_ref = custom_ref;
        Ok(())
    }
}
