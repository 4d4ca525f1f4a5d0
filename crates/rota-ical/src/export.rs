//! `VEVENT` and `VCALENDAR` rendering.

use chrono::{DateTime, Utc};
use rota_core::types::UserId;
use rota_engine::{Schedule, Shift, ShiftKind, UserGroup, Window, expand, group_index, is_eligible};
use uuid::Uuid;

use crate::error::IcalResult;
use crate::fold::{escape_text, fold_line};
use crate::rule::{UTC_FORMAT, rrule_value};

const PRODID: &str = "-//rota//rota-ical//EN";

/// Occurrences inspected per group when looking for each group's first turn.
const TURN_SEARCH_PER_GROUP: usize = 64;

/// Accumulates CRLF-terminated, folded content lines.
#[derive(Debug, Default)]
struct ContentLines(String);

impl ContentLines {
    fn push(&mut self, name: &str, value: &str) {
        self.0.push_str(&fold_line(&format!("{name}:{value}")));
        self.0.push_str("\r\n");
    }

    fn append(&mut self, rendered: &str) {
        self.0.push_str(rendered);
    }

    fn finish(self) -> String {
        self.0
    }
}

/// One exported event: a group and the instant its series begins.
struct Turn<'a> {
    uid: Uuid,
    start: DateTime<Utc>,
    group: &'a UserGroup,
}

/// First eligible turn of every group of a rolling shift, in group order.
/// Groups with no turn inside the searched span are left out.
fn first_turns(shift: &Shift) -> Vec<Turn<'_>> {
    let groups = shift.user_groups();
    let mut starts: Vec<Option<DateTime<Utc>>> = vec![None; groups.len()];
    let mut missing = groups.len();

    let search = expand(shift, Window::starting_at(shift.rotation_start()))
        .filter(|occurrence| is_eligible(shift, occurrence))
        .take(groups.len().saturating_mul(TURN_SEARCH_PER_GROUP));
    for occurrence in search {
        let Some(slot) = starts.get_mut(group_index(shift, &occurrence)) else {
            continue;
        };
        if slot.is_none() {
            *slot = Some(occurrence.start);
            missing -= 1;
            if missing == 0 {
                break;
            }
        }
    }
    if missing > 0 {
        tracing::debug!(shift_id = %shift.id(), missing, "Groups without a turn left out of export");
    }

    starts
        .into_iter()
        .zip(groups)
        .enumerate()
        .filter_map(|(position, (start, group))| {
            let uid = Uuid::new_v5(&shift.id().0, format!("group-{position}").as_bytes());
            start.map(|start| Turn { uid, start, group })
        })
        .collect()
}

fn turns(shift: &Shift) -> Vec<Turn<'_>> {
    match shift.kind() {
        ShiftKind::Rolling => first_turns(shift),
        ShiftKind::Single | ShiftKind::Recurrent | ShiftKind::Override => shift
            .user_groups()
            .first()
            .map(|group| Turn {
                uid: shift.id().0,
                start: shift.start(),
                group,
            })
            .into_iter()
            .collect(),
    }
}

fn summary(group: &UserGroup) -> String {
    let names: Vec<&str> = group.iter().map(UserId::as_str).collect();
    escape_text(&names.join(", "))
}

/// ## Summary
/// Renders `shift` as one or more `VEVENT` components.
///
/// Rolling shifts yield one event per group, starting at that group's first
/// eligible turn and repeating every full rotation. Every other kind yields a
/// single event at the shift's start. Levels outside `0..=9` are clamped into
/// `PRIORITY`'s range.
///
/// ## Errors
/// Returns an error if the recurrence cannot be written as a valid `RRULE`.
pub fn export_shift(shift: &Shift) -> IcalResult<String> {
    let rrule = rrule_value(shift)?;
    let mut lines = ContentLines::default();

    for turn in turns(shift) {
        let end = turn
            .start
            .checked_add_signed(shift.duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        lines.push("BEGIN", "VEVENT");
        lines.push("UID", &turn.uid.to_string());
        lines.push("DTSTART", &turn.start.format(UTC_FORMAT).to_string());
        lines.push("DTEND", &end.format(UTC_FORMAT).to_string());
        if let Some(rrule) = &rrule {
            lines.push("RRULE", rrule);
        }
        lines.push("SUMMARY", &summary(turn.group));
        if let Some(level) = shift.priority_level() {
            lines.push("PRIORITY", &level.clamp(0, 9).to_string());
        }
        lines.push("CATEGORIES", &shift.kind().as_str().to_ascii_uppercase());
        lines.push("END", "VEVENT");
    }

    Ok(lines.finish())
}

/// ## Summary
/// Renders every shift of `schedule` inside a `VCALENDAR`.
///
/// ## Errors
/// Propagates the first [`export_shift`] error.
pub fn export_schedule(schedule: &Schedule) -> IcalResult<String> {
    let mut lines = ContentLines::default();
    lines.push("BEGIN", "VCALENDAR");
    lines.push("VERSION", "2.0");
    lines.push("PRODID", PRODID);
    lines.push("CALSCALE", "GREGORIAN");
    if let Some(name) = schedule.name() {
        lines.push("X-WR-CALNAME", &escape_text(name));
    }
    for shift in schedule.shifts() {
        lines.append(&export_shift(shift)?);
    }
    lines.push("END", "VCALENDAR");

    tracing::debug!(
        schedule_id = %schedule.id(),
        shift_count = schedule.shifts().len(),
        "Exported schedule"
    );
    Ok(lines.finish())
}
