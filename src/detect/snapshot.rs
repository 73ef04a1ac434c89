use std::collections::HashMap;

use crate::pipeline::{Item, ItemId, Stage};

/// Last observed stage per item for one poller.
///
/// The store is either unseeded (no successful fetch yet) or holds exactly
/// the mapping from the most recent successful fetch. It is only ever
/// replaced wholesale.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    stages: Option<HashMap<ItemId, Stage>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the mapping a fetch result would produce.
    pub fn mapping_of(items: &[Item]) -> HashMap<ItemId, Stage> {
        items.iter().map(|item| (item.id, item.stage)).collect()
    }

    pub fn is_seeded(&self) -> bool {
        self.stages.is_some()
    }

    pub fn stage_of(&self, id: ItemId) -> Option<Stage> {
        self.stages.as_ref()?.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.stages.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Install a new mapping and hand back the one it replaces.
    pub fn swap(&mut self, next: HashMap<ItemId, Stage>) -> Option<HashMap<ItemId, Stage>> {
        self.stages.replace(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_returns_previous_mapping() {
        let mut store = SnapshotStore::new();
        assert!(!store.is_seeded());
        assert!(store.swap(HashMap::from([(ItemId(1), Stage::Queued)])).is_none());
        assert_eq!(store.stage_of(ItemId(1)), Some(Stage::Queued));

        let previous = store
            .swap(HashMap::from([(ItemId(1), Stage::Processing)]))
            .unwrap();
        assert_eq!(previous.get(&ItemId(1)), Some(&Stage::Queued));
        assert_eq!(store.stage_of(ItemId(1)), Some(Stage::Processing));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_fetch_still_seeds() {
        let mut store = SnapshotStore::new();
        store.swap(HashMap::new());
        assert!(store.is_seeded());
        assert!(store.is_empty());
    }
}
