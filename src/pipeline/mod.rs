// Pipeline model: stages, items and the operator-side stage machine.

pub mod item;
pub mod stage;
pub mod transition;

pub use item::{Category, Item, ItemFilter, ItemId};
pub use stage::{ParseStageError, Stage, TransitionKind};
pub use transition::{plan_transition, StageMachine, TransitionError, TransitionResult};
