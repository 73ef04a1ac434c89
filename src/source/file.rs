//! Shared JSON board file
//!
//! Operator commands and display clients on one machine (or a shared mount)
//! meet at a single JSON document. Readers load the file as-is; writers take
//! an advisory lock on a sibling `.lock` file, mutate, and atomically replace
//! the document, so a reader never observes a half-written board.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::{duration_to_millis, next_issue_timestamp, BoardSettings, ItemSource, ItemWriter, SoundChoice, SourceError};
use crate::pipeline::{Category, Item, ItemFilter, ItemId, Stage};

/// On-disk layout of the board file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardDocument {
    pub next_id: u64,
    pub items: Vec<Item>,
    pub settings: BoardSettings,
    /// Latest write timestamp, keeps updated_at monotonic across writers.
    pub last_write: Option<DateTime<Utc>>,
}

impl BoardDocument {
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamped = match self.last_write {
            Some(last) if now <= last => last + ChronoDuration::milliseconds(1),
            _ => now,
        };
        self.last_write = Some(stamped);
        stamped
    }

    fn write_stage(
        &mut self,
        id: ItemId,
        expected: Option<Stage>,
        stage: Stage,
    ) -> Result<Item, SourceError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(SourceError::NotFound(id))?;
        let actual = self.items[index].stage;
        if let Some(expected) = expected.filter(|expected| *expected != actual) {
            return Err(SourceError::StageChanged {
                id,
                expected,
                actual,
            });
        }
        if actual != stage {
            let now = self.stamp();
            self.items[index].apply_stage(stage, now);
        }
        Ok(self.items[index].clone())
    }
}

#[derive(Debug, Clone)]
pub struct FileBoardStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileBoardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "board.json".into());
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A board that has never been written is empty.
    pub async fn load(&self) -> Result<BoardDocument, SourceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => decode(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BoardDocument::default()),
            Err(e) => Err(SourceError::Unavailable(format!(
                "cannot read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Run `mutate` under the writer lock and persist the result.
    async fn write_with<F, T>(&self, mutate: F) -> Result<T, SourceError>
    where
        F: FnOnce(&mut BoardDocument) -> Result<T, SourceError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        tokio::task::spawn_blocking(move || locked_write(&path, &lock_path, mutate))
            .await
            .map_err(|e| SourceError::Unavailable(format!("board writer task failed: {e}")))?
    }
}

fn decode(bytes: &[u8]) -> Result<BoardDocument, SourceError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BoardDocument::default());
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn locked_write<F, T>(path: &Path, lock_path: &Path, mutate: F) -> Result<T, SourceError>
where
    F: FnOnce(&mut BoardDocument) -> Result<T, SourceError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;
    let mut lock = RwLock::new(lock_file);
    let _guard = lock.write()?;

    let mut document = match std::fs::read(path) {
        Ok(bytes) => decode(&bytes)?,
        Err(e) if e.kind() == ErrorKind::NotFound => BoardDocument::default(),
        Err(e) => return Err(e.into()),
    };
    let output = mutate(&mut document)?;

    let encoded = serde_json::to_vec_pretty(&document)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, encoded)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(output)
}

#[async_trait]
impl ItemSource for FileBoardStore {
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, SourceError> {
        let document = self.load().await?;
        Ok(document
            .items
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, SourceError> {
        let document = self.load().await?;
        Ok(document.items.into_iter().find(|item| item.id == id))
    }

    async fn settings(&self) -> Result<BoardSettings, SourceError> {
        Ok(self.load().await?.settings)
    }
}

#[async_trait]
impl ItemWriter for FileBoardStore {
    async fn set_stage(&self, id: ItemId, stage: Stage) -> Result<Item, SourceError> {
        self.write_with(move |document| document.write_stage(id, None, stage))
            .await
    }

    async fn set_stage_if(
        &self,
        id: ItemId,
        expected: Stage,
        stage: Stage,
    ) -> Result<Item, SourceError> {
        self.write_with(move |document| document.write_stage(id, Some(expected), stage))
            .await
    }

    async fn create_item(&self, tag: &str, category: Category) -> Result<Item, SourceError> {
        let tag = tag.to_string();
        let item = self
            .write_with(move |document| {
                let id = ItemId(document.next_id.max(1));
                document.next_id = id.0 + 1;
                let now = document.stamp();
                let item = Item::new(id, tag, category, now);
                document.items.push(item.clone());
                Ok(item)
            })
            .await?;
        info!(item = %item.id, tag = %item.tag, "Item created");
        Ok(item)
    }

    async fn publish_announcement(
        &self,
        message: &str,
        duration: Duration,
    ) -> Result<DateTime<Utc>, SourceError> {
        let message = message.to_string();
        let issued_at = self
            .write_with(move |document| {
                let settings = &mut document.settings;
                let issued_at = next_issue_timestamp(settings.announcement_issued_at, Utc::now());
                settings.announcement_message = Some(message);
                settings.announcement_issued_at = Some(issued_at);
                settings.announcement_duration_ms = duration_to_millis(duration);
                Ok(issued_at)
            })
            .await?;
        debug!(issued_at = %issued_at, "Announcement published");
        Ok(issued_at)
    }

    async fn set_sound(
        &self,
        choice: SoundChoice,
        custom_ref: Option<String>,
    ) -> Result<(), SourceError> {
        self.write_with(move |document| {
            document.settings.sound_choice = choice;
            document.settings.custom_sound_ref = custom_ref;
            Ok(())
        })
        .await
    }
}
