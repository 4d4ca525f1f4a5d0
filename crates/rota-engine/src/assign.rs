//! Maps occurrences to the group on duty.

use crate::expand::Occurrence;
use crate::shift::{RotationCadence, Shift, ShiftKind, UserGroup};

/// ## Summary
/// Returns the group on duty for `occurrence` of `shift`.
///
/// Rolling shifts pick `groups[i mod len]`, where `i` counts from the shift's
/// anchor rather than its rotation start: occurrences filtered out before the
/// rotation start still advance the rotation, so it begins mid-cycle.
#[must_use]
pub fn assign<'a>(shift: &'a Shift, occurrence: &Occurrence) -> &'a UserGroup {
    &shift.user_groups()[group_index(shift, occurrence)]
}

/// Position in `shift.user_groups()` of the group [`assign`] picks.
#[must_use]
pub fn group_index(shift: &Shift, occurrence: &Occurrence) -> usize {
    match shift.kind() {
        ShiftKind::Single | ShiftKind::Recurrent | ShiftKind::Override => 0,
        ShiftKind::Rolling => {
            let counter = match shift.rotation_cadence() {
                RotationCadence::PerOccurrence => occurrence.index,
                RotationCadence::PerPeriod => occurrence.period,
            };
            rotation_slot(counter, shift.user_groups().len())
        }
    }
}

fn rotation_slot(counter: u64, group_count: usize) -> usize {
    let count = u64::try_from(group_count).unwrap_or(u64::MAX).max(1);
    usize::try_from(counter % count).unwrap_or_default()
}
