use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::stage::Stage;

/// Stable identifier assigned by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(ItemId)
    }
}

/// Size class of an item. Only used for the per-column tallies; it never
/// influences which transitions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Large,
    Small,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Large => f.write_str("large"),
            Category::Small => f.write_str("small"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "large" => Ok(Category::Large),
            "small" => Ok(Category::Small),
            other => Err(format!("unknown category '{other}' (expected large or small)")),
        }
    }
}

/// A unit moving through the pipeline, as reported by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Human lookup tag, not guaranteed unique.
    pub tag: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
    /// Moves forward on every stage mutation and only then.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// A freshly created item parked in the barn.
    pub fn new(id: ItemId, tag: impl Into<String>, category: Category, now: DateTime<Utc>) -> Self {
        Self {
            id,
            tag: tag.into(),
            category,
            stage: Stage::Barn,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a stage write. Returns `false` and leaves the item untouched
    /// when the stage does not actually change.
    pub fn apply_stage(&mut self, stage: Stage, now: DateTime<Utc>) -> bool {
        if self.stage == stage {
            return false;
        }
        self.stage = stage;
        // Writers may disagree on wall-clock time; never move backwards.
        self.updated_at = now.max(self.updated_at);
        true
    }
}

/// Read-side filter for `ItemSource::list_items`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub stage: Option<Stage>,
    pub category: Option<Category>,
    pub tag_contains: Option<String>,
}

impl ItemFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        if let Some(stage) = self.stage {
            if item.stage != stage {
                return false;
            }
        }
        if let Some(category) = self.category {
            if item.category != category {
                return false;
            }
        }
        if let Some(needle) = &self.tag_contains {
            if !item.tag.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(now: DateTime<Utc>) -> Item {
        Item::new(ItemId(7), "A-12", Category::Small, now)
    }

    #[test]
    fn test_new_item_starts_in_barn() {
        let now = Utc::now();
        let item = sample(now);
        assert_eq!(item.stage, Stage::Barn);
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn test_apply_same_stage_keeps_updated_at() {
        let now = Utc::now();
        let mut item = sample(now);
        assert!(!item.apply_stage(Stage::Barn, now + Duration::seconds(5)));
        assert_eq!(item.updated_at, now);
    }

    #[test]
    fn test_apply_stage_never_moves_updated_at_backwards() {
        let now = Utc::now();
        let mut item = sample(now);
        assert!(item.apply_stage(Stage::Queued, now - Duration::seconds(30)));
        assert_eq!(item.stage, Stage::Queued);
        assert_eq!(item.updated_at, now);
    }

    #[test]
    fn test_filter_matches_tag_case_insensitively() {
        let item = sample(Utc::now());
        let filter = ItemFilter {
            tag_contains: Some("a-1".to_string()),
            category: Some(Category::Small),
            ..ItemFilter::default()
        };
        assert!(filter.matches(&item));
        assert!(!ItemFilter::stage(Stage::Queued).matches(&item));
    }

    #[test]
    fn test_item_id_parses_with_hash_prefix() {
        assert_eq!("#42".parse::<ItemId>(), Ok(ItemId(42)));
    }
}
