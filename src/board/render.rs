use std::fmt::Write as _;
use std::io::Write as _;

use super::columns::BoardColumns;
use crate::alerts::Alert;
use crate::announce::ShownAnnouncement;

/// Everything a display needs for one redraw.
#[derive(Debug, Clone, Copy)]
pub struct BoardFrame<'a> {
    pub client_id: &'a str,
    pub columns: &'a BoardColumns,
    pub alert: Option<&'a Alert>,
    pub announcement: Option<&'a ShownAnnouncement>,
    pub audio_enabled: bool,
}

pub trait BoardRenderer: Send {
    fn render(&mut self, frame: &BoardFrame<'_>);
}

/// Plain-text layout shared by the terminal display and `list`.
pub fn render_text(frame: &BoardFrame<'_>) -> String {
    let mut out = String::new();
    let audio = if frame.audio_enabled { "on" } else { "off" };
    let _ = writeln!(out, "== {} ==  audio: {audio}", frame.client_id);

    if let Some(shown) = frame.announcement {
        let _ = writeln!(out, ">> {}", shown.announcement.message);
    }
    if let Some(alert) = frame.alert {
        let _ = writeln!(out, "!! {} - {}", alert.title, alert.message);
    }
    out.push('\n');

    for column in frame.columns.on_board() {
        let tally = column.tally();
        let _ = writeln!(
            out,
            "{:<12} {:>3}  (large {}, small {})",
            column.stage.as_str().to_uppercase(),
            column.len(),
            tally.large,
            tally.small
        );
        for item in &column.items {
            let _ = writeln!(out, "    #{:<5} {}", item.id, item.tag);
        }
    }
    out
}

/// Redraws the whole board on stdout.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    clear_screen: bool,
}

impl TerminalRenderer {
    pub fn new(clear_screen: bool) -> Self {
        Self { clear_screen }
    }
}

impl BoardRenderer for TerminalRenderer {
    fn render(&mut self, frame: &BoardFrame<'_>) {
        let text = render_text(frame);
        let mut stdout = std::io::stdout().lock();
        if self.clear_screen {
            let _ = stdout.write_all(b"\x1b[2J\x1b[H");
        }
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}
