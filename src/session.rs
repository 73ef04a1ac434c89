//! Per-client display session
//!
//! A `ClientSession` owns everything one display client mutates: the
//! snapshot used for diffing, the alert scheduler, the announcement channel
//! and their auto-dismiss timers. Nothing here is shared with other clients,
//! and only the owning poll loop calls into it.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::alerts::{Alert, AlertScheduler, DEFAULT_ALERT_LIFETIME};
use crate::announce::{AnnouncementChannel, AnnouncementUpdate, ShownAnnouncement};
use crate::board::{BoardColumns, BoardFrame};
use crate::cues::{AudioGate, CueDispatcher, CuePlayer, DEFAULT_SPEECH_DELAY};
use crate::detect::{ChangeDetector, StageChangeEvent};
use crate::observability::PollMetrics;
use crate::pipeline::ItemFilter;
use crate::source::{BoardSettings, ItemSource, SourceError};
use crate::timers::{TimerKey, TimerKind, TimerQueue};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub client_id: String,
    pub alert_lifetime: Duration,
    pub speech_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            client_id: "display".to_string(),
            alert_lifetime: DEFAULT_ALERT_LIFETIME,
            speech_delay: DEFAULT_SPEECH_DELAY,
        }
    }
}

/// What one successful tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub items: usize,
    /// The tick only seeded the snapshot.
    pub seeded: bool,
    pub changes: usize,
    pub forwarded: Option<StageChangeEvent>,
    /// Id of the alert this tick raised.
    pub alert_shown: Option<u64>,
    /// Display id of the announcement this tick showed.
    pub announcement_shown: Option<u64>,
}

pub struct ClientSession {
    options: SessionOptions,
    source: Arc<dyn ItemSource>,
    detector: ChangeDetector,
    alerts: AlertScheduler,
    announcements: AnnouncementChannel,
    timers: TimerQueue,
    cues: CueDispatcher,
    columns: BoardColumns,
    settings: BoardSettings,
    metrics: Arc<PollMetrics>,
}

impl ClientSession {
    pub fn new(
        options: SessionOptions,
        source: Arc<dyn ItemSource>,
        player: Arc<dyn CuePlayer>,
        gate: AudioGate,
    ) -> Self {
        let cues = CueDispatcher::new(player, gate).with_speech_delay(options.speech_delay);
        Self {
            alerts: AlertScheduler::new(options.alert_lifetime),
            options,
            source,
            detector: ChangeDetector::new(),
            announcements: AnnouncementChannel::new(),
            timers: TimerQueue::new(),
            cues,
            columns: BoardColumns::default(),
            settings: BoardSettings::default(),
            metrics: Arc::new(PollMetrics::new()),
        }
    }

    /// Run one fetch-diff-schedule cycle.
    ///
    /// On error nothing changes: the snapshot, columns and announcement
    /// keep the last good state and the next tick starts fresh.
    pub async fn tick(&mut self) -> Result<TickReport, SourceError> {
        let result = self.try_tick().await;
        match &result {
            Ok(_) => self.metrics.record_tick(),
            Err(_) => self.metrics.record_failed_tick(),
        }
        result
    }

    async fn try_tick(&mut self) -> Result<TickReport, SourceError> {
        let mut report = TickReport::default();

        // Both reads succeed before any state changes, so a failed tick is
        // skipped entirely.
        let settings = self.source.settings().await?;
        let items = self.source.list_items(&ItemFilter::all()).await?;

        self.settings = settings;
        report.announcement_shown = self.check_announcement(Instant::now());

        let outcome = self.detector.observe(&items, Utc::now());
        self.columns = BoardColumns::from_items(&items);

        report.items = items.len();
        report.seeded = outcome.seeded;
        report.changes = outcome.events.len();
        self.metrics
            .record_changes(outcome.events.len(), outcome.dropped());
        if outcome.dropped() > 0 {
            debug!(
                dropped = outcome.dropped(),
                "Only the first stage change of a tick is alerted"
            );
        }

        let Some(event) = outcome.forwarded().cloned() else {
            return Ok(report);
        };
        report.forwarded = Some(event.clone());

        let Some(item) = items.iter().find(|item| item.id == event.item_id).cloned() else {
            warn!(item = %event.item_id, "Changed item missing from its own fetch");
            return Ok(report);
        };

        let was_showing = self.alerts.is_showing();
        let raised = self.alerts.offer(event, item, Instant::now()).cloned();
        match raised {
            Some(alert) => {
                self.timers
                    .schedule(TimerKey::alert(alert.id), alert.expires_at);
                self.cues
                    .dispatch(alert.cue(), self.settings.custom_sound().map(str::to_string));
                self.metrics.record_alert_shown();
                report.alert_shown = Some(alert.id);
            }
            None if was_showing => self.metrics.record_alert_ignored(),
            None => {}
        }
        Ok(report)
    }

    fn check_announcement(&mut self, now: Instant) -> Option<u64> {
        match self.announcements.check(self.settings.announcement(), now) {
            AnnouncementUpdate::Unchanged => None,
            AnnouncementUpdate::Shown { shown, superseded } => {
                if let Some(old) = superseded {
                    self.timers.cancel(TimerKey::announcement(old));
                }
                self.timers
                    .schedule(TimerKey::announcement(shown.display_id), shown.hides_at);
                self.cues.dispatch(
                    shown.announcement.cue(),
                    self.settings.custom_sound().map(str::to_string),
                );
                self.metrics.record_announcement_shown();
                Some(shown.display_id)
            }
        }
    }

    /// Fire every auto-dismiss timer due at `now`.
    pub fn fire_due_timers(&mut self, now: Instant) -> Vec<TimerKey> {
        let expired = self.timers.take_expired(now);
        for key in &expired {
            match key.kind {
                TimerKind::Alert => {
                    self.alerts.expire(key.id);
                }
                TimerKind::Announcement => {
                    self.announcements.hide(key.id);
                }
            }
        }
        expired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn client_id(&self) -> &str {
        &self.options.client_id
    }

    pub fn columns(&self) -> &BoardColumns {
        &self.columns
    }

    pub fn active_alert(&self) -> Option<&Alert> {
        self.alerts.active()
    }

    pub fn active_announcement(&self) -> Option<&ShownAnnouncement> {
        self.announcements.visible()
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn audio_gate(&self) -> &AudioGate {
        self.cues.gate()
    }

    pub fn metrics(&self) -> Arc<PollMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn frame(&self) -> BoardFrame<'_> {
        BoardFrame {
            client_id: &self.options.client_id,
            columns: &self.columns,
            alert: self.alerts.active(),
            announcement: self.announcements.visible(),
            audio_enabled: self.cues.gate().is_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cues::NullCuePlayer;
    use crate::pipeline::{Category, Item, ItemId, Stage};
    use crate::source::MockItemSource;

    fn item(id: u64, stage: Stage) -> Item {
        let mut item = Item::new(ItemId(id), format!("T{id}"), Category::Large, Utc::now());
        item.stage = stage;
        item
    }

    #[tokio::test]
    async fn test_settings_failure_skips_item_fetch() {
        let mut source = MockItemSource::new();
        source
            .expect_settings()
            .times(1)
            .returning(|| Err(SourceError::Unavailable("offline".to_string())));
        source.expect_list_items().never();

        let mut session = ClientSession::new(
            SessionOptions::default(),
            Arc::new(source),
            Arc::new(NullCuePlayer),
            AudioGate::new(),
        );
        assert!(session.tick().await.is_err());
        assert!(!session.detector().snapshot().is_seeded());
        assert_eq!(session.metrics().get_stats().failed_ticks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_timer_is_armed_with_alert() {
        let mut source = MockItemSource::new();
        source
            .expect_settings()
            .returning(|| Ok(BoardSettings::default()));
        let mut fetches = vec![
            vec![item(1, Stage::Processing)],
            vec![item(1, Stage::Queued)],
        ];
        source
            .expect_list_items()
            .times(2)
            .returning(move |_| Ok(fetches.pop().unwrap_or_default()));

        let mut session = ClientSession::new(
            SessionOptions::default(),
            Arc::new(source),
            Arc::new(NullCuePlayer),
            AudioGate::new(),
        );
        assert!(session.tick().await.unwrap().seeded);
        let report = session.tick().await.unwrap();
        let alert_id = report.alert_shown.unwrap();
        let alert = session.active_alert().unwrap();
        assert_eq!(alert.title, "CUT");
        assert_eq!(
            session.timers().deadline(TimerKey::alert(alert_id)),
            Some(alert.expires_at)
        );
    }
}
