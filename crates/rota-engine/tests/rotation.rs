//! End-to-end rotation scenarios: one schedule, one shift, probed at a set
//! of instants.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, TimeZone, Utc, Weekday};
use rota_core::types::{ScheduleId, UserId};
use rota_engine::{Frequency, RotationCadence, Schedule, ShiftKind, ShiftSpec, resolve};

fn start() -> DateTime<Utc> {
    // Sunday
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
}

fn probe(spec: ShiftSpec, at: DateTime<Utc>) -> BTreeSet<UserId> {
    let shift = spec.build().expect("valid shift");
    let schedule = Schedule::new(ScheduleId::new(), vec![shift]);
    resolve(&[schedule], at)
}

fn assert_on_call(spec: &ShiftSpec, expected: &[(&str, Vec<DateTime<Utc>>)], nobody: &[DateTime<Utc>]) {
    for (user, instants) in expected {
        for at in instants {
            assert_eq!(
                probe(spec.clone(), *at),
                BTreeSet::from([UserId::from(*user)]),
                "expected {user} on call at {at}"
            );
        }
    }
    for at in nobody {
        assert!(
            probe(spec.clone(), *at).is_empty(),
            "expected nobody on call at {at}"
        );
    }
}

fn days(n: i64) -> TimeDelta {
    TimeDelta::days(n)
}

fn hours(n: i64) -> TimeDelta {
    TimeDelta::hours(n)
}

#[test_log::test]
fn test_single_event() {
    let spec = ShiftSpec::new(ShiftKind::Single, start(), TimeDelta::seconds(10_800))
        .with_priority_level(1)
        .with_users(["alice"]);
    let probe_at = start() + TimeDelta::minutes(5);

    assert_on_call(&spec, &[("alice", vec![probe_at])], &[start() + hours(3)]);
}

#[test]
fn test_override_event() {
    let spec = ShiftSpec::new(ShiftKind::Override, start(), TimeDelta::seconds(10_800))
        .with_users(["alice"]);

    assert_on_call(&spec, &[("alice", vec![start() + TimeDelta::minutes(5)])], &[]);
}

#[test]
fn test_recurrent_daily_every_other_day() {
    let spec = ShiftSpec::new(ShiftKind::Recurrent, start(), TimeDelta::seconds(10_800))
        .with_frequency(Frequency::Daily, 2)
        .with_users(["alice"]);
    let date = start() + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[("alice", vec![date, date + days(2)])],
        &[date + days(1)],
    );
}

#[test]
fn test_rolling_daily_every_other_day() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(10_800))
        .with_frequency(Frequency::Daily, 2)
        .with_rolling_users([["u1"], ["u2"]]);
    let date = start() + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u1", vec![date, date + days(4)]),
            ("u2", vec![date + days(2), date + days(6)]),
        ],
        &[date + days(1), date + days(3), date + days(5)],
    );
}

#[test]
fn test_rolling_hourly_interval() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(600))
        .with_frequency(Frequency::Hourly, 2)
        .with_rotation_start(start() + hours(1))
        .with_rolling_users([["u1"], ["u2"]]);
    let date = start() + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u1", vec![date + hours(4)]),
            ("u2", vec![date + hours(2), date + hours(6)]),
        ],
        &[date, date + hours(1), date + hours(3), date + hours(5)],
    );
}

#[test]
fn test_rolling_weekly_interval() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(10_800))
        .with_frequency(Frequency::Weekly, 2)
        .with_week_start(Weekday::Sun)
        .with_rotation_start(start() + hours(1))
        .with_rolling_users([["u1"], ["u2"]]);
    let date = start() + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u1", vec![date + days(28)]),
            ("u2", vec![date + days(14), date + days(42)]),
        ],
        &[date, date + days(7), date + days(21), date + days(35)],
    );
}

#[test]
fn test_rolling_monthly_interval() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(10_800))
        .with_frequency(Frequency::Monthly, 2)
        .with_rotation_start(start() + hours(1))
        .with_rolling_users([["u1"], ["u2"]]);
    let date = start() + TimeDelta::minutes(5);
    let may = date + days(31 + 30);
    let july = may + days(31 + 30);

    assert_on_call(
        &spec,
        &[("u1", vec![july]), ("u2", vec![may])],
        &[date, date + days(31), date + days(31 + 30 + 31)],
    );
}

#[test]
fn test_rotation_start_skips_hourly() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(1_800))
        .with_frequency(Frequency::Hourly, 1)
        .with_rotation_start(start() + hours(2))
        .with_until(start() + hours(6) + TimeDelta::minutes(59))
        .with_priority_level(1)
        .with_rolling_users([["u1"], ["u2"], ["u3"]]);
    let date = start() + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u1", vec![date + hours(3), date + hours(6)]),
            ("u2", vec![date + hours(4)]),
            ("u3", vec![date + hours(2), date + hours(5)]),
        ],
        &[date, date + hours(1), date + hours(7)],
    );
}

#[test]
fn test_rotation_start_skips_daily() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(1_800))
        .with_frequency(Frequency::Daily, 1)
        .with_rotation_start(start() + days(1) + hours(1))
        .with_until(start() + days(6) + TimeDelta::minutes(1))
        .with_rolling_users([["u1"], ["u2"], ["u3"]]);
    let date = start() + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u1", vec![date + days(3), date + days(6)]),
            ("u2", vec![date + days(4)]),
            ("u3", vec![date + days(2), date + days(5)]),
        ],
        &[date, date + days(1), date + days(7)],
    );
}

#[test]
fn test_rotation_start_skips_weekly() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(1_800))
        .with_frequency(Frequency::Weekly, 1)
        .with_week_start(Weekday::Sun)
        .with_rotation_start(start() + days(7) + hours(1))
        .with_until(start() + days(42) + TimeDelta::minutes(1))
        .with_rolling_users([["u1"], ["u2"], ["u3"]]);
    let date = start() + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u1", vec![date + days(21), date + days(42)]),
            ("u2", vec![date + days(28)]),
            ("u3", vec![date + days(14), date + days(35)]),
        ],
        &[date, date + days(7), date + days(43)],
    );
}

#[test]
fn test_weekend_rotation_hands_over_weekly() {
    // Wednesday; the first eligible week starts the following Monday.
    let now = Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap();
    let next_monday = now + days(5);
    let spec = ShiftSpec::new(ShiftKind::Rolling, now, TimeDelta::seconds(1_800))
        .with_frequency(Frequency::Weekly, 1)
        .with_week_start(Weekday::Mon)
        .with_by_weekday([Weekday::Sat, Weekday::Sun])
        .with_rotation_start(next_monday)
        .with_until(next_monday + days(30) + TimeDelta::minutes(1))
        .with_rotation_cadence(RotationCadence::PerPeriod)
        .with_rolling_users([["u1"], ["u2"], ["u3"]]);
    let first_sat = next_monday + days(5) + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u1", vec![first_sat + days(15)]),
            ("u2", vec![first_sat, first_sat + days(22)]),
            ("u3", vec![first_sat + days(7), first_sat + days(8)]),
        ],
        &[
            now,
            first_sat - days(7),
            first_sat + days(9),
            first_sat + days(30),
        ],
    );
}

#[test]
fn test_weekend_rotation_per_occurrence_alternates_days() {
    let now = Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap();
    let spec = ShiftSpec::new(ShiftKind::Rolling, now, TimeDelta::seconds(1_800))
        .with_frequency(Frequency::Weekly, 1)
        .with_week_start(Weekday::Mon)
        .with_by_weekday([Weekday::Sat, Weekday::Sun])
        .with_rolling_users([["u1"], ["u2"]]);
    let first_sat = now + days(3) + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u1", vec![first_sat, first_sat + days(7)]),
            ("u2", vec![first_sat + days(1), first_sat + days(8)]),
        ],
        &[now],
    );
}

#[test]
fn test_rotation_start_skips_monthly() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(1_800))
        .with_frequency(Frequency::Monthly, 1)
        .with_rotation_start(start() + days(30) + hours(1))
        .with_until(start() + days(31 + 30 + 10) + TimeDelta::minutes(1))
        .with_rotation_cadence(RotationCadence::PerPeriod)
        .with_rolling_users([["u1"], ["u2"], ["u3"]]);
    let date = start() + TimeDelta::minutes(5);

    assert_on_call(
        &spec,
        &[
            ("u2", vec![date + days(31)]),
            ("u3", vec![date + days(31 + 30)]),
        ],
        &[
            date,
            date + days(30),
            date + days(32),
            date + days(31 + 30 + 2),
            date + days(31 + 30 + 11),
        ],
    );
}

#[test]
fn test_monthly_days_share_one_hand_over() {
    let spec = ShiftSpec::new(ShiftKind::Rolling, start(), TimeDelta::seconds(1_800))
        .with_frequency(Frequency::Monthly, 1)
        .with_by_monthday(1..=4)
        .with_rotation_start(start() + days(30) + hours(1))
        .with_until(start() + days(31 + 30 + 10) + TimeDelta::minutes(1))
        .with_rotation_cadence(RotationCadence::PerPeriod)
        .with_rolling_users([["u1"], ["u2"], ["u3"]]);
    let date = start() + TimeDelta::minutes(5);
    let april = date + days(31);
    let may = date + days(31 + 30);

    assert_on_call(
        &spec,
        &[
            ("u2", (0..4).map(|n| april + days(n)).collect()),
            ("u3", (0..4).map(|n| may + days(n)).collect()),
        ],
        &[
            date,
            date + days(3),
            april + days(4),
            april + days(6),
            april + days(10),
            may + days(11),
        ],
    );
}
