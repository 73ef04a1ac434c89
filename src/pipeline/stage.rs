use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed handling stages, declared in pipeline order.
///
/// `Barn` is the holding area every new item starts in. Items leave it only
/// by being enqueued (or advanced), and return to it only through a dequeue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Barn,
    Queued,
    Processing,
    Subdividing,
    Allocating,
    Completed,
}

impl Stage {
    /// Every stage in pipeline order.
    pub const ALL: [Stage; 6] = [
        Stage::Barn,
        Stage::Queued,
        Stage::Processing,
        Stage::Subdividing,
        Stage::Allocating,
        Stage::Completed,
    ];

    /// The stage one step forward, `None` at the terminal stage.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Barn => Some(Stage::Queued),
            Stage::Queued => Some(Stage::Processing),
            Stage::Processing => Some(Stage::Subdividing),
            Stage::Subdividing => Some(Stage::Allocating),
            Stage::Allocating => Some(Stage::Completed),
            Stage::Completed => None,
        }
    }

    /// The stage one step backward.
    ///
    /// `Queued` has no exposed predecessor: going back to `Barn` is a dequeue,
    /// not a revert.
    pub fn previous(self) -> Option<Stage> {
        match self {
            Stage::Barn | Stage::Queued => None,
            Stage::Processing => Some(Stage::Queued),
            Stage::Subdividing => Some(Stage::Processing),
            Stage::Allocating => Some(Stage::Subdividing),
            Stage::Completed => Some(Stage::Allocating),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed)
    }

    /// Stages that appear as columns on a display client.
    pub fn is_on_board(self) -> bool {
        !matches!(self, Stage::Barn)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Barn => "barn",
            Stage::Queued => "queued",
            Stage::Processing => "processing",
            Stage::Subdividing => "subdividing",
            Stage::Allocating => "allocating",
            Stage::Completed => "completed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown stage '{0}' (expected one of: barn, queued, processing, subdividing, allocating, completed)")]
pub struct ParseStageError(pub String);

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == wanted)
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}

/// The operator-facing transition requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Advance,
    Revert,
    Enqueue,
    Dequeue,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionKind::Advance => "advance",
            TransitionKind::Revert => "revert",
            TransitionKind::Enqueue => "enqueue",
            TransitionKind::Dequeue => "dequeue",
        };
        f.write_str(name)
    }
}
