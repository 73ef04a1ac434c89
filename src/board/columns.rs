use serde::Serialize;

use crate::pipeline::{Category, Item, Stage};

/// Count of items per size class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub large: usize,
    pub small: usize,
}

impl CategoryTally {
    pub fn total(&self) -> usize {
        self.large + self.small
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub stage: Stage,
    /// Oldest stage change first.
    pub items: Vec<Item>,
}

impl Column {
    pub fn tally(&self) -> CategoryTally {
        self.items
            .iter()
            .fold(CategoryTally::default(), |mut tally, item| {
                match item.category {
                    Category::Large => tally.large += 1,
                    Category::Small => tally.small += 1,
                }
                tally
            })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Items grouped strictly by current stage, one column per stage in
/// pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardColumns {
    columns: Vec<Column>,
}

impl Default for BoardColumns {
    fn default() -> Self {
        Self::from_items(&[])
    }
}

impl BoardColumns {
    pub fn from_items(items: &[Item]) -> Self {
        let mut columns: Vec<Column> = Stage::ALL
            .into_iter()
            .map(|stage| Column {
                stage,
                items: Vec::new(),
            })
            .collect();
        for item in items {
            // Stage::ALL is in declaration order, so the discriminant indexes it.
            columns[item.stage as usize].items.push(item.clone());
        }
        for column in &mut columns {
            column
                .items
                .sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
        }
        Self { columns }
    }

    pub fn column(&self, stage: Stage) -> &Column {
        &self.columns[stage as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Columns shown on a display client (everything but the barn).
    pub fn on_board(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.stage.is_on_board())
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }
}
