// Stage-change alerts: copy catalog and the single-occupancy scheduler.

pub mod catalog;
pub mod scheduler;

pub use catalog::AlertCopy;
pub use scheduler::{Alert, AlertInput, AlertMachine, AlertScheduler, DEFAULT_ALERT_LIFETIME};
