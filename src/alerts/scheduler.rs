use statig::prelude::*;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::catalog::AlertCopy;
use crate::cues::{Cue, SoundId};
use crate::detect::StageChangeEvent;
use crate::pipeline::{Item, Stage};

/// Visible lifetime of an alert.
pub const DEFAULT_ALERT_LIFETIME: Duration = Duration::from_secs(8);

/// The single stage-change notification currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: u64,
    /// Item as fetched in the tick that raised the alert.
    pub item: Item,
    pub previous: Stage,
    pub stage: Stage,
    pub title: String,
    pub message: String,
    pub spoken: String,
    pub sound: SoundId,
    pub shown_at: Instant,
    pub expires_at: Instant,
}

impl Alert {
    pub fn cue(&self) -> Cue {
        Cue {
            sound: self.sound,
            utterance: Some(self.spoken.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertInput {
    StageChanged {
        event: StageChangeEvent,
        item: Item,
        now: Instant,
    },
    Expired {
        alert_id: u64,
    },
}

/// Shared storage for the idle/showing machine.
#[derive(Debug)]
pub struct AlertMachine {
    lifetime: Duration,
    next_id: u64,
    active: Option<Alert>,
    ignored: u64,
}

impl AlertMachine {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            next_id: 1,
            active: None,
            ignored: 0,
        }
    }

    fn build_alert(&mut self, event: &StageChangeEvent, item: &Item, now: Instant) -> Option<Alert> {
        let copy = AlertCopy::for_stage(event.current)?;
        let id = self.next_id;
        self.next_id += 1;
        Some(Alert {
            id,
            item: item.clone(),
            previous: event.previous,
            stage: event.current,
            title: copy.title.to_string(),
            message: format!("{} {}", item.tag, copy.message),
            spoken: copy.spoken(&item.tag),
            sound: copy.sound,
            shown_at: now,
            expires_at: now + self.lifetime,
        })
    }
}

#[state_machine(initial = "State::idle()")]
impl AlertMachine {
    #[state]
    fn idle(&mut self, event: &AlertInput) -> Outcome<State> {
        match event {
            AlertInput::StageChanged { event, item, now } => {
                match self.build_alert(event, item, *now) {
                    Some(alert) => {
                        info!(
                            alert_id = alert.id,
                            item = %alert.item.id,
                            tag = %alert.item.tag,
                            stage = %alert.stage,
                            title = %alert.title,
                            "Alert shown"
                        );
                        self.active = Some(alert);
                        Transition(State::showing())
                    }
                    None => Handled,
                }
            }
            AlertInput::Expired { .. } => Handled,
        }
    }

    #[state]
    fn showing(&mut self, event: &AlertInput) -> Outcome<State> {
        match event {
            AlertInput::StageChanged { event, .. } => {
                self.ignored += 1;
                debug!(
                    item = %event.item_id,
                    stage = %event.current,
                    active = ?self.active.as_ref().map(|a| a.id),
                    "Alert already showing, change ignored"
                );
                Handled
            }
            AlertInput::Expired { alert_id } => {
                if self.active.as_ref().map(|a| a.id) != Some(*alert_id) {
                    return Handled;
                }
                self.active = None;
                debug!(alert_id = %alert_id, "Alert dismissed");
                Transition(State::idle())
            }
        }
    }
}

/// At most one alert at a time; later changes never overlay or queue.
pub struct AlertScheduler {
    machine: StateMachine<AlertMachine>,
}

impl Default for AlertScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_LIFETIME)
    }
}

impl std::fmt::Debug for AlertScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertScheduler")
            .field("active", &self.active().map(|a| a.id))
            .field("ignored", &self.ignored_count())
            .finish()
    }
}

impl AlertScheduler {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            machine: AlertMachine::new(lifetime).state_machine(),
        }
    }

    /// Offer a forwarded change. Returns the alert if this call raised one.
    pub fn offer(&mut self, event: StageChangeEvent, item: Item, now: Instant) -> Option<&Alert> {
        let before = self.active().map(|a| a.id);
        self.machine
            .handle(&AlertInput::StageChanged { event, item, now });
        let after = self.active().map(|a| a.id);
        if after.is_some() && after != before {
            self.active()
        } else {
            None
        }
    }

    /// Dismiss the alert with `alert_id`. Returns whether it was showing.
    pub fn expire(&mut self, alert_id: u64) -> bool {
        let was_active = self.active().map(|a| a.id) == Some(alert_id);
        self.machine.handle(&AlertInput::Expired { alert_id });
        was_active && self.active().is_none()
    }

    pub fn active(&self) -> Option<&Alert> {
        self.machine.inner().active.as_ref()
    }

    pub fn is_showing(&self) -> bool {
        self.active().is_some()
    }

    /// Changes dropped because an alert was already on screen.
    pub fn ignored_count(&self) -> u64 {
        self.machine.inner().ignored
    }
}
