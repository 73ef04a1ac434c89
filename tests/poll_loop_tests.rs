//! Poll loop timing tests
//!
//! These tests use tokio's paused clock so a minute of polling runs
//! instantly and every tick lands on an exact interval boundary.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use stageboard::board::render_text;
use stageboard::cues::NullCuePlayer;
use stageboard::{
    AudioGate, BoardFrame, BoardRenderer, Category, ClientSession, ItemWriter, MemorySource, PollLoop,
    SessionOptions, ShutdownCoordinator, Stage,
};
use tokio::time;

/// Renderer that shares its frames with the test.
#[derive(Clone, Default)]
struct SharedFrames(Arc<Mutex<Vec<String>>>);

impl SharedFrames {
    fn last(&self) -> String {
        self.0.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl BoardRenderer for SharedFrames {
    fn render(&mut self, frame: &BoardFrame<'_>) {
        self.0.lock().unwrap().push(render_text(frame));
    }
}

fn spawn_loop(
    source: Arc<MemorySource>,
    frames: SharedFrames,
    shutdown: &ShutdownCoordinator,
) -> tokio::task::JoinHandle<ClientSession> {
    let session = ClientSession::new(
        SessionOptions {
            client_id: "dock".to_string(),
            ..SessionOptions::default()
        },
        source,
        Arc::new(NullCuePlayer),
        AudioGate::new(),
    );
    tokio::spawn(
        PollLoop::new(session, shutdown.subscribe())
            .with_interval(Duration::from_secs(2))
            .with_renderer(Box::new(frames))
            .run(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_alert_appears_and_clears_on_screen() {
    let source = Arc::new(MemorySource::new());
    let id = source.create_item("A-5", Category::Large).await.unwrap().id;
    source.set_stage(id, Stage::Queued).await.unwrap();

    let frames = SharedFrames::default();
    let shutdown = ShutdownCoordinator::new();
    let handle = spawn_loop(source.clone(), frames.clone(), &shutdown);

    time::sleep(Duration::from_millis(500)).await;
    assert!(!frames.last().contains("!!"));

    source.set_stage(id, Stage::Processing).await.unwrap();
    // Picked up by the tick at t=2s.
    time::sleep(Duration::from_secs(2)).await;
    assert!(frames.last().contains("!! CUT - A-5 processing complete"));

    // Still up 7s later, gone once the 8s lifetime has passed.
    time::sleep(Duration::from_secs(7)).await;
    assert!(frames.last().contains("!! CUT"));
    time::sleep(Duration::from_secs(2)).await;
    assert!(!frames.last().contains("!!"));

    shutdown.trigger();
    let session = handle.await.unwrap();
    assert!(session.active_alert().is_none());
    assert!(session.timers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_source_outage_does_not_stop_polling() {
    let source = Arc::new(MemorySource::new());
    source.create_item("B-1", Category::Small).await.unwrap();
    source.fail_item_reads(20);

    let frames = SharedFrames::default();
    let shutdown = ShutdownCoordinator::new();
    let handle = spawn_loop(source.clone(), frames.clone(), &shutdown);

    time::sleep(Duration::from_secs(60)).await;
    shutdown.trigger();
    let session = handle.await.unwrap();

    let stats = session.metrics().get_stats();
    assert_eq!(stats.failed_ticks, 20);
    assert!(stats.ticks >= 10);
    assert!(frames.count() >= 30);
    assert!(session.detector().snapshot().is_seeded());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_first_tick_returns_promptly() {
    let source = Arc::new(MemorySource::new());
    let shutdown = ShutdownCoordinator::new();
    shutdown.trigger();

    let session = spawn_loop(source.clone(), SharedFrames::default(), &shutdown)
        .await
        .unwrap();
    assert_eq!(session.metrics().get_stats().ticks, 0);
    assert_eq!(source.item_reads(), 0);
}
