// Change detection between consecutive polls.

pub mod detector;
pub mod snapshot;

pub use detector::{ChangeDetector, DetectionOutcome, StageChangeEvent};
pub use snapshot::SnapshotStore;
