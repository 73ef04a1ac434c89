// Operator-side stage transitions.
// Validity depends only on the current stage and the requested kind; the
// write is conditional on the stage it was validated against.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::item::{Item, ItemId};
use super::stage::{Stage, TransitionKind};
use crate::source::{BoardStore, SourceError};

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("cannot {kind} item {id} from stage '{stage}'")]
    InvalidTransition {
        id: ItemId,
        stage: Stage,
        kind: TransitionKind,
    },
    #[error("item {id} is already in the pipeline (stage '{stage}')")]
    AlreadyQueued { id: ItemId, stage: Stage },
    #[error("item {0} not found")]
    ItemNotFound(ItemId),
    #[error("item {0} kept changing while the transition was applied")]
    Contended(ItemId),
    #[error("write failed: {0}")]
    Source(#[from] SourceError),
}

const MAX_WRITE_ATTEMPTS: usize = 3;

/// Outcome of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub previous_stage: Stage,
    pub item: Item,
}

/// Target stage for a request, or the reason it is rejected.
pub fn plan_transition(id: ItemId, current: Stage, kind: TransitionKind) -> Result<Stage, TransitionError> {
    let invalid = || TransitionError::InvalidTransition {
        id,
        stage: current,
        kind,
    };
    match kind {
        TransitionKind::Advance => current.next().ok_or_else(invalid),
        TransitionKind::Revert => current.previous().ok_or_else(invalid),
        TransitionKind::Enqueue => match current {
            Stage::Barn => Ok(Stage::Queued),
            stage => Err(TransitionError::AlreadyQueued { id, stage }),
        },
        TransitionKind::Dequeue => match current {
            Stage::Queued => Ok(Stage::Barn),
            _ => Err(invalid()),
        },
    }
}

/// Executes transition requests against a board store.
pub struct StageMachine {
    store: Arc<dyn BoardStore>,
}

impl StageMachine {
    pub fn new(store: Arc<dyn BoardStore>) -> Self {
        Self { store }
    }

    pub async fn advance(&self, id: ItemId) -> Result<TransitionResult, TransitionError> {
        self.execute(id, TransitionKind::Advance).await
    }

    pub async fn revert(&self, id: ItemId) -> Result<TransitionResult, TransitionError> {
        self.execute(id, TransitionKind::Revert).await
    }

    pub async fn enqueue(&self, id: ItemId) -> Result<TransitionResult, TransitionError> {
        self.execute(id, TransitionKind::Enqueue).await
    }

    /// Take a queued item back to the barn.
    pub async fn dequeue(&self, id: ItemId) -> Result<TransitionResult, TransitionError> {
        self.execute(id, TransitionKind::Dequeue).await
    }

    /// Validate and apply `kind`. The write only lands if the item is still
    /// at the stage it was validated against; if another writer moved it in
    /// between, the request is validated again against the new stage.
    pub async fn execute(
        &self,
        id: ItemId,
        kind: TransitionKind,
    ) -> Result<TransitionResult, TransitionError> {
        let mut current = self
            .store
            .get_item(id)
            .await?
            .ok_or(TransitionError::ItemNotFound(id))?
            .stage;

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let target = match plan_transition(id, current, kind) {
                Ok(target) => target,
                Err(e) => {
                    warn!(item = %id, stage = %current, kind = %kind, "Transition rejected");
                    return Err(e);
                }
            };

            match self.store.set_stage_if(id, current, target).await {
                Ok(item) => {
                    info!(
                        item = %id,
                        tag = %item.tag,
                        from = %current,
                        to = %item.stage,
                        kind = %kind,
                        "Stage transition applied"
                    );
                    return Ok(TransitionResult {
                        previous_stage: current,
                        item,
                    });
                }
                Err(SourceError::StageChanged { actual, .. }) => {
                    debug!(item = %id, expected = %current, actual = %actual, "Item moved concurrently");
                    current = actual;
                }
                Err(SourceError::NotFound(id)) => return Err(TransitionError::ItemNotFound(id)),
                Err(other) => return Err(TransitionError::Source(other)),
            }
        }

        Err(TransitionError::Contended(id))
    }
}
