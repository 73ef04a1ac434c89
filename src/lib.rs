// Stageboard Library - stage tracking with polling display clients
// This exposes the core components for testing and integration

pub mod alerts;
pub mod announce;
pub mod board;
pub mod cli;
pub mod config;
pub mod cues;
pub mod detect;
pub mod observability;
pub mod pipeline;
pub mod poller;
pub mod session;
pub mod shutdown;
pub mod source;
pub mod telemetry;
pub mod timers;

// Re-export key types for easy access
pub use alerts::{Alert, AlertScheduler};
pub use announce::{Announcement, AnnouncementChannel, ShownAnnouncement};
pub use board::{BoardColumns, BoardFrame, BoardRenderer};
pub use config::{config, StageboardConfig};
pub use cues::{AudioGate, Cue, CueDispatcher, CuePlayer, SoundId};
pub use detect::{ChangeDetector, SnapshotStore, StageChangeEvent};
pub use observability::{PollMetrics, PollStats};
pub use pipeline::{Category, Item, ItemFilter, ItemId, Stage, StageMachine, TransitionError, TransitionKind};
pub use poller::PollLoop;
pub use session::{ClientSession, SessionOptions, TickReport};
pub use shutdown::ShutdownCoordinator;
pub use source::{
    BoardSettings, BoardStore, FileBoardStore, ItemSource, ItemWriter, MemorySource, SoundChoice,
    SourceError,
};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use timers::{TimerKey, TimerKind, TimerQueue};
