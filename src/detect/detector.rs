use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::snapshot::SnapshotStore;
use crate::pipeline::{Item, ItemId, Stage};

/// A stage difference observed between two consecutive polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChangeEvent {
    pub item_id: ItemId,
    pub previous: Stage,
    pub current: Stage,
    /// Client-local poll time, not the source's updated_at.
    pub detected_at: DateTime<Utc>,
}

/// Everything one diff produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionOutcome {
    /// Qualifying changes in source-list order.
    pub events: Vec<StageChangeEvent>,
    /// True when this diff only seeded an empty store.
    pub seeded: bool,
}

impl DetectionOutcome {
    /// The single event handed to the alert scheduler this cycle.
    pub fn forwarded(&self) -> Option<&StageChangeEvent> {
        self.events.first()
    }

    /// Events that qualified but are not forwarded.
    pub fn dropped(&self) -> usize {
        self.events.len().saturating_sub(1)
    }
}

/// Diffs each fetch against the previous one.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    snapshot: SnapshotStore,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    /// Diff a complete, successfully fetched item list against the stored
    /// snapshot, then replace the snapshot with it.
    pub fn observe(&mut self, items: &[Item], detected_at: DateTime<Utc>) -> DetectionOutcome {
        let next = SnapshotStore::mapping_of(items);
        let Some(previous) = self.snapshot.swap(next) else {
            debug!(items = items.len(), "Snapshot seeded");
            return DetectionOutcome {
                events: Vec::new(),
                seeded: true,
            };
        };

        let mut seen = HashSet::with_capacity(items.len());
        let events: Vec<StageChangeEvent> = items
            .iter()
            .filter(|item| seen.insert(item.id))
            .filter_map(|item| {
                let before = *previous.get(&item.id)?;
                // Landing in the barn is not news for the floor.
                if before == item.stage || item.stage == Stage::Barn {
                    return None;
                }
                Some(StageChangeEvent {
                    item_id: item.id,
                    previous: before,
                    current: item.stage,
                    detected_at,
                })
            })
            .collect();

        if !events.is_empty() {
            debug!(changes = events.len(), "Stage changes detected");
        }
        DetectionOutcome {
            events,
            seeded: false,
        }
    }
}
