//! Activation bounds and in-force checks.

use chrono::{DateTime, Utc};

use crate::expand::{Occurrence, Window, expand};
use crate::shift::Shift;

/// Whether an occurrence may surface users at all: its start lies within
/// `[rotation_start, until]`, both ends inclusive.
#[must_use]
pub fn is_eligible(shift: &Shift, occurrence: &Occurrence) -> bool {
    occurrence.start >= shift.rotation_start()
        && shift.until().is_none_or(|until| occurrence.start <= until)
}

/// Whether `instant` falls inside `[start, start + duration)`.
#[must_use]
pub fn is_in_force(occurrence: &Occurrence, instant: DateTime<Utc>) -> bool {
    occurrence.contains(instant)
}

/// ## Summary
/// Eligible occurrences of `shift` running at `instant`.
///
/// Plain and rolling shifts yield at most one item unless their duration is
/// longer than their step.
pub fn in_force(shift: &Shift, instant: DateTime<Utc>) -> impl Iterator<Item = Occurrence> {
    expand(shift, Window::at(instant))
        .filter(move |occurrence| is_eligible(shift, occurrence) && is_in_force(occurrence, instant))
}

/// First eligible occurrence of `shift` running at `instant`, if any.
#[must_use]
pub fn in_force_occurrence(shift: &Shift, instant: DateTime<Utc>) -> Option<Occurrence> {
    in_force(shift, instant).next()
}
