// Read-models for display clients.

pub mod columns;
pub mod render;

pub use columns::{BoardColumns, CategoryTally, Column};
pub use render::{render_text, BoardFrame, BoardRenderer, TerminalRenderer};
