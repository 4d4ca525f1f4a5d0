//! iCalendar export of rotation definitions (RFC 5545).
//!
//! - Rule: `RRULE` values for recurring shifts, checked with the `rrule` crate
//! - Export: `VEVENT` / `VCALENDAR` rendering with escaped, folded lines

pub mod error;
pub mod export;
pub mod fold;
pub mod rule;

pub use error::{IcalError, IcalResult};
pub use export::{export_schedule, export_shift};
pub use rule::{rrule_line, rrule_value};
