//! Display client loop
//!
//! One `PollLoop` drives one [`ClientSession`]: a fixed-interval tick that
//! fetches and diffs, and in between, a sleep until the earliest pending
//! auto-dismiss deadline. Both run in the same `select!`, so the session has
//! a single writer. Source failures never end the loop.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Instrument};

use crate::board::BoardRenderer;
use crate::observability::TickTimer;
use crate::session::ClientSession;
use crate::telemetry::{create_tick_span, generate_correlation_id};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_FAILURE_LOGS_PER_MINUTE: u32 = 6;

pub struct PollLoop {
    session: ClientSession,
    interval: Duration,
    renderer: Option<Box<dyn BoardRenderer>>,
    shutdown: watch::Receiver<bool>,
    failure_log: DefaultDirectRateLimiter,
    suppressed_failures: u64,
    consecutive_failures: u64,
    ticks: u64,
}

impl PollLoop {
    pub fn new(session: ClientSession, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            session,
            interval: DEFAULT_POLL_INTERVAL,
            renderer: None,
            shutdown,
            failure_log: failure_limiter(DEFAULT_FAILURE_LOGS_PER_MINUTE),
            suppressed_failures: 0,
            consecutive_failures: 0,
            ticks: 0,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn BoardRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_failure_logs_per_minute(mut self, per_minute: u32) -> Self {
        self.failure_log = failure_limiter(per_minute);
        self
    }

    /// Run until shutdown is signalled, then hand the session back.
    pub async fn run(mut self) -> ClientSession {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            client = self.session.client_id(),
            interval_ms = self.interval.as_millis() as u64,
            audio = self.session.audio_gate().is_enabled(),
            "Display client started"
        );

        while !*self.shutdown.borrow() {
            let deadline = self.session.next_deadline();
            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped, stopping");
                        break;
                    }
                }
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let fired = self.session.fire_due_timers(Instant::now());
                    if !fired.is_empty() {
                        debug!(timers = ?fired, "Auto-dismiss timers fired");
                        self.render();
                    }
                }
                _ = ticker.tick() => {
                    self.poll_once().await;
                    self.render();
                }
            }
        }

        info!(client = self.session.client_id(), "Display client stopped");
        self.session
    }

    async fn poll_once(&mut self) {
        self.ticks += 1;
        let correlation_id = generate_correlation_id();
        let span = create_tick_span(self.session.client_id(), self.ticks, &correlation_id);
        let timer = TickTimer::start(self.interval);
        let result = self.session.tick().instrument(span.clone()).await;
        timer.finish();

        let _entered = span.enter();
        match result {
            Ok(report) => {
                if self.consecutive_failures > 0 {
                    info!(
                        failed_ticks = self.consecutive_failures,
                        "Board source recovered"
                    );
                    self.consecutive_failures = 0;
                }
                if report.seeded {
                    info!(items = report.items, "Snapshot seeded");
                } else if report.changes > 0 {
                    debug!(
                        changes = report.changes,
                        alert = ?report.alert_shown,
                        "Stage changes detected"
                    );
                }
            }
            Err(error) => {
                self.consecutive_failures += 1;
                if self.failure_log.check().is_ok() {
                    warn!(
                        error = %error,
                        consecutive = self.consecutive_failures,
                        suppressed = self.suppressed_failures,
                        "Board source unavailable, tick skipped"
                    );
                    self.suppressed_failures = 0;
                } else {
                    self.suppressed_failures += 1;
                }
            }
        }
    }

    fn render(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&self.session.frame());
        }
    }
}

fn failure_limiter(per_minute: u32) -> DefaultDirectRateLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_minute(per_minute))
}
