//! Announcement channel
//!
//! Operators publish free-text announcements that every display shows once.
//! The issue timestamp is the identity: republishing the same text produces a
//! new timestamp and therefore a new display cycle, while polling an
//! unchanged publish never re-shows it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cues::{Cue, SoundId};
use crate::source::duration_to_millis;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub message: String,
    pub issued_at: DateTime<Utc>,
    pub duration: Duration,
}

impl Announcement {
    pub fn cue(&self) -> Cue {
        Cue {
            sound: SoundId::Announcement,
            utterance: Some(self.message.clone()),
        }
    }
}

/// An announcement as it is currently displayed on this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownAnnouncement {
    /// Client-local display sequence number, used as the auto-hide timer id.
    pub display_id: u64,
    pub announcement: Announcement,
    pub shown_at: Instant,
    pub hides_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnouncementUpdate {
    Unchanged,
    Shown {
        shown: ShownAnnouncement,
        /// Display id of a still-visible announcement this one replaced.
        superseded: Option<u64>,
    },
}

#[derive(Debug, Default)]
pub struct AnnouncementChannel {
    last_shown: Option<DateTime<Utc>>,
    visible: Option<ShownAnnouncement>,
    next_display_id: u64,
}

impl AnnouncementChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the published announcement with what this client last showed.
    pub fn check(&mut self, published: Option<Announcement>, now: Instant) -> AnnouncementUpdate {
        let Some(announcement) = published else {
            return AnnouncementUpdate::Unchanged;
        };
        if self.last_shown == Some(announcement.issued_at) {
            return AnnouncementUpdate::Unchanged;
        }

        self.next_display_id += 1;
        let shown = ShownAnnouncement {
            display_id: self.next_display_id,
            hides_at: now + announcement.duration,
            shown_at: now,
            announcement,
        };
        self.last_shown = Some(shown.announcement.issued_at);
        let superseded = self
            .visible
            .replace(shown.clone())
            .map(|previous| previous.display_id);

        info!(
            issued_at = %shown.announcement.issued_at,
            duration_ms = duration_to_millis(shown.announcement.duration),
            superseded = ?superseded,
            "Announcement shown"
        );
        AnnouncementUpdate::Shown { shown, superseded }
    }

    /// Hide the announcement with `display_id` if it is still the visible one.
    pub fn hide(&mut self, display_id: u64) -> bool {
        if self.visible.as_ref().map(|v| v.display_id) != Some(display_id) {
            return false;
        }
        self.visible = None;
        debug!(display_id, "Announcement hidden");
        true
    }

    pub fn visible(&self) -> Option<&ShownAnnouncement> {
        self.visible.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn published(message: &str, issued_at: DateTime<Utc>) -> Option<Announcement> {
        Some(Announcement {
            message: message.to_string(),
            issued_at,
            duration: Duration::from_secs(60),
        })
    }

    #[test]
    fn test_same_publish_is_shown_once() {
        let now = Instant::now();
        let issued = Utc::now();
        let mut channel = AnnouncementChannel::new();
        assert!(matches!(
            channel.check(published("Break at 12", issued), now),
            AnnouncementUpdate::Shown { superseded: None, .. }
        ));
        for _ in 0..5 {
            assert_eq!(
                channel.check(published("Break at 12", issued), now),
                AnnouncementUpdate::Unchanged
            );
        }
    }

    #[test]
    fn test_republish_same_text_shows_again() {
        let now = Instant::now();
        let issued = Utc::now();
        let mut channel = AnnouncementChannel::new();
        channel.check(published("Break at 12", issued), now);
        let update = channel.check(
            published("Break at 12", issued + ChronoDuration::milliseconds(1)),
            now,
        );
        match update {
            AnnouncementUpdate::Shown { shown, superseded } => {
                assert_eq!(superseded, Some(1));
                assert_eq!(shown.display_id, 2);
            }
            AnnouncementUpdate::Unchanged => panic!("republish should display"),
        }
    }

    #[test]
    fn test_hide_ignores_superseded_display() {
        let now = Instant::now();
        let issued = Utc::now();
        let mut channel = AnnouncementChannel::new();
        channel.check(published("one", issued), now);
        channel.check(published("two", issued + ChronoDuration::seconds(1)), now);
        assert!(!channel.hide(1));
        assert_eq!(channel.visible().unwrap().announcement.message, "two");
        assert!(channel.hide(2));
        assert!(channel.visible().is_none());
    }

    #[test]
    fn test_hidden_announcement_is_not_reshown() {
        let now = Instant::now();
        let issued = Utc::now();
        let mut channel = AnnouncementChannel::new();
        channel.check(published("one", issued), now);
        assert!(channel.hide(1));
        assert_eq!(
            channel.check(published("one", issued), now),
            AnnouncementUpdate::Unchanged
        );
    }
}
