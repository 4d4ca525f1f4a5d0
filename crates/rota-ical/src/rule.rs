//! `RRULE` rendering.

use chrono::{DateTime, Utc, Weekday};
use rota_engine::{Recurrence, Shift, ShiftKind};
use rrule::{RRule, Tz, Unvalidated};

use crate::error::{IcalError, IcalResult};

/// Date-time form used for `UNTIL`, `DTSTART` and `DTEND`.
pub(crate) const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

const fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Interval as exported: rolling shifts stretch it over the whole rotation so
/// that each group's event only repeats on that group's turns.
fn exported_interval(shift: &Shift, recurrence: &Recurrence) -> IcalResult<u32> {
    let factor = match shift.kind() {
        ShiftKind::Rolling => u32::try_from(shift.user_groups().len())
            .map_err(|err| IcalError::Unrepresentable(format!("too many user groups: {err}")))?,
        ShiftKind::Single | ShiftKind::Recurrent | ShiftKind::Override => 1,
    };
    recurrence.interval().checked_mul(factor).ok_or_else(|| {
        IcalError::Unrepresentable(format!(
            "interval {} x {factor} groups overflows",
            recurrence.interval()
        ))
    })
}

fn join<T>(items: &[T], render: impl Fn(&T) -> String) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(",")
}

/// ## Summary
/// Renders the `RRULE` value of `shift` (without the property name).
///
/// Keys appear as `FREQ`, `UNTIL`, `INTERVAL`, `BYDAY`, `BYMONTHDAY`,
/// `WKST`; `UNTIL` only for bounded shifts and the `BY*` keys only when
/// constrained. Returns `None` for shifts that do not recur.
///
/// ## Errors
/// Returns `IcalError::Unrepresentable` if the exported interval overflows
/// and `IcalError::RRuleValidationError` if the rendered rule is rejected by
/// the `rrule` crate.
pub fn rrule_value(shift: &Shift) -> IcalResult<Option<String>> {
    let Some(recurrence) = shift.recurrence() else {
        return Ok(None);
    };

    let mut parts = vec![format!("FREQ={}", recurrence.frequency().as_str())];
    if let Some(until) = shift.until() {
        parts.push(format!("UNTIL={}", until.format(UTC_FORMAT)));
    }
    parts.push(format!("INTERVAL={}", exported_interval(shift, recurrence)?));
    if !recurrence.by_weekday().is_empty() {
        parts.push(format!(
            "BYDAY={}",
            join(recurrence.by_weekday(), |day| weekday_code(*day).to_owned())
        ));
    }
    if !recurrence.by_monthday().is_empty() {
        parts.push(format!(
            "BYMONTHDAY={}",
            join(recurrence.by_monthday(), ToString::to_string)
        ));
    }
    parts.push(format!("WKST={}", weekday_code(recurrence.week_start())));

    let value = parts.join(";");
    validate(&value, shift.start())?;
    tracing::trace!(shift_id = %shift.id(), rrule = %value, "Rendered RRULE");
    Ok(Some(value))
}

/// ## Summary
/// Full `RRULE:` content line for `shift`, or `None` if it does not recur.
///
/// ## Errors
/// See [`rrule_value`].
pub fn rrule_line(shift: &Shift) -> IcalResult<Option<String>> {
    Ok(rrule_value(shift)?.map(|value| format!("RRULE:{value}")))
}

fn validate(value: &str, dtstart: DateTime<Utc>) -> IcalResult<()> {
    let rule: RRule<Unvalidated> = value.parse()?;
    rule.build(dtstart.with_timezone(&Tz::UTC))?;
    Ok(())
}
