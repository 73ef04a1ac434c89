use crate::cues::SoundId;
use crate::pipeline::Stage;

/// Display copy for an alert about one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertCopy {
    pub title: &'static str,
    pub message: &'static str,
    pub sound: SoundId,
}

impl AlertCopy {
    /// Copy for an item that just reached `stage`. Barn has none.
    pub fn for_stage(stage: Stage) -> Option<Self> {
        let (title, message) = match stage {
            Stage::Barn => return None,
            Stage::Queued => ("QUEUED", "added to the queue"),
            Stage::Processing => ("CUT", "processing complete"),
            Stage::Subdividing => ("PORTIONING", "being subdivided"),
            Stage::Allocating => ("PACKING", "being allocated"),
            Stage::Completed => ("DELIVERED", "ready for pickup"),
        };
        Some(Self {
            title,
            message,
            sound: SoundId::for_stage(stage)?,
        })
    }

    /// Phrase read out after the tone.
    pub fn spoken(&self, tag: &str) -> String {
        format!("Number {tag}, {}", self.message)
    }
}
