//! Command execution against a loaded schedule document.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use rota_core::types::{ScheduleId, UserId};
use rota_engine::{Resolver, StaticSupplier, Window, duties, load_schedules};
use rota_ical::export_schedule;

use crate::cli::Command;

/// Range used by range commands when `--until` is not given.
const DEFAULT_RANGE_DAYS: i64 = 7;

/// ## Summary
/// Reads and validates the schedule document at `path`.
///
/// ## Errors
/// Returns an error if the file cannot be read or any schedule is invalid.
pub fn load_supplier(path: impl AsRef<Path>) -> Result<StaticSupplier> {
    let path = path.as_ref();
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("reading schedule document {}", path.display()))?;
    let supplier = StaticSupplier::from_json(&document)
        .with_context(|| format!("loading schedules from {}", path.display()))?;
    tracing::info!(path = %path.display(), schedules = supplier.len(), "Schedules loaded");
    Ok(supplier)
}

fn selected(supplier: &StaticSupplier, ids: &[ScheduleId]) -> Vec<ScheduleId> {
    if ids.is_empty() {
        supplier.ids()
    } else {
        ids.to_vec()
    }
}

fn range(from: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Window {
    let start = from.unwrap_or(now);
    let end = until.unwrap_or_else(|| {
        start
            .checked_add_signed(TimeDelta::days(DEFAULT_RANGE_DAYS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    });
    Window::new(start, end)
}

fn user_list<'a>(users: impl IntoIterator<Item = &'a UserId>) -> String {
    users
        .into_iter()
        .map(UserId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// ## Summary
/// Runs `command` and returns what should be printed.
///
/// `now` stands in for omitted instants so the output is reproducible.
///
/// ## Errors
/// Returns an error for unknown schedules or a failed export.
pub fn execute(
    command: &Command,
    supplier: &StaticSupplier,
    resolver: Resolver,
    now: DateTime<Utc>,
) -> Result<String> {
    let mut out = String::new();
    match command {
        Command::Who { at, schedule_ids } => {
            let at = at.unwrap_or(now);
            let ids = selected(supplier, schedule_ids);
            let users = resolver.resolve_from(supplier, &ids, at)?;
            tracing::info!(%at, user_count = users.len(), "Resolved on-call users");
            for user in &users {
                writeln!(out, "{user}")?;
            }
        }
        Command::Timeline {
            from,
            until,
            schedule_ids,
        } => {
            let window = range(*from, *until, now);
            let schedules = load_schedules(supplier, &selected(supplier, schedule_ids))?;
            for segment in resolver.timeline(&schedules, window) {
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    segment.start.to_rfc3339(),
                    segment.end.to_rfc3339(),
                    user_list(&segment.users)
                )?;
            }
        }
        Command::Duties {
            schedule_id,
            from,
            until,
        } => {
            let window = range(*from, *until, now);
            let schedules = load_schedules(supplier, &[*schedule_id])?;
            for schedule in &schedules {
                for duty in duties(schedule, window) {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{}\t{}",
                        duty.occurrence.start.to_rfc3339(),
                        duty.occurrence.end.to_rfc3339(),
                        duty.kind,
                        duty.shift_id,
                        user_list(&duty.users)
                    )?;
                }
            }
        }
        Command::Export { schedule_id } => {
            let schedule = supplier
                .get(schedule_id)
                .with_context(|| format!("unknown schedule {schedule_id}"))?;
            out.push_str(&export_schedule(schedule)?);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rota_core::types::PriorityPolicy;

    const DOCUMENT: &str = r#"[
        {
            "id": "0192e4a0-7c1f-7cc3-9d3a-5f0e3c8d2b11",
            "name": "primary",
            "shifts": [
                {
                    "kind": "rolling",
                    "priority_level": 1,
                    "start": "2026-01-05T09:00:00Z",
                    "duration_seconds": 28800,
                    "frequency": "daily",
                    "user_groups": [["alice"], ["bob"]]
                },
                {
                    "kind": "recurrent",
                    "priority_level": 2,
                    "start": "2026-01-05T09:00:00Z",
                    "duration_seconds": 3600,
                    "frequency": "daily",
                    "user_groups": [["lead"]]
                }
            ]
        },
        {
            "id": "0192e4a0-7c1f-7cc3-9d3a-5f0e3c8d2b12",
            "shifts": [
                {
                    "kind": "override",
                    "start": "2026-01-06T12:00:00Z",
                    "duration_seconds": 7200,
                    "user_groups": [["carol"]]
                }
            ]
        }
    ]"#;

    fn primary() -> ScheduleId {
        "0192e4a0-7c1f-7cc3-9d3a-5f0e3c8d2b11".parse().unwrap()
    }

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().unwrap()
    }

    fn supplier() -> StaticSupplier {
        StaticSupplier::from_json(DOCUMENT).expect("valid document")
    }

    #[test_log::test]
    fn test_who_across_all_schedules() {
        let command = Command::Who {
            at: Some(at("2026-01-06T12:30:00Z")),
            schedule_ids: Vec::new(),
        };
        let out = execute(&command, &supplier(), Resolver::default(), at("2026-01-01T00:00:00Z"))
            .expect("runs");
        assert_eq!(out, "bob\ncarol\n");
    }

    #[test]
    fn test_who_uses_configured_policy() {
        let command = Command::Who {
            at: None,
            schedule_ids: vec![primary()],
        };
        let resolver = Resolver::new(PriorityPolicy::HighestWins);
        let out = execute(&command, &supplier(), resolver, at("2026-01-05T09:30:00Z"))
            .expect("runs");
        assert_eq!(out, "lead\n");
    }

    #[test]
    fn test_timeline_output() {
        let command = Command::Timeline {
            from: Some(at("2026-01-05T00:00:00Z")),
            until: Some(at("2026-01-06T00:00:00Z")),
            schedule_ids: vec![primary()],
        };
        let out = execute(&command, &supplier(), Resolver::default(), at("2026-01-01T00:00:00Z"))
            .expect("runs");
        assert_eq!(
            out,
            "2026-01-05T09:00:00+00:00\t2026-01-05T10:00:00+00:00\talice,lead\n\
             2026-01-05T10:00:00+00:00\t2026-01-05T17:00:00+00:00\talice\n"
        );
    }

    #[test]
    fn test_duties_lists_each_occurrence() {
        let command = Command::Duties {
            schedule_id: primary(),
            from: Some(at("2026-01-05T00:00:00Z")),
            until: None,
        };
        let out = execute(&command, &supplier(), Resolver::default(), at("2026-01-01T00:00:00Z"))
            .expect("runs");
        assert_eq!(out.lines().count(), 14);
        assert!(out.lines().all(|line| line.split('\t').count() == 5));
    }

    #[test]
    fn test_export_and_unknown_schedule() {
        let export = Command::Export {
            schedule_id: primary(),
        };
        let out = execute(&export, &supplier(), Resolver::default(), Utc::now()).expect("runs");
        assert!(out.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(out.contains("X-WR-CALNAME:primary\r\n"));

        let missing = Command::Export {
            schedule_id: ScheduleId::new(),
        };
        assert!(execute(&missing, &supplier(), Resolver::default(), Utc::now()).is_err());
    }

    #[test]
    fn test_load_supplier_reports_missing_file() {
        let err = load_supplier("/nonexistent/rota/schedules.json").unwrap_err();
        assert!(err.to_string().contains("reading schedule document"));
    }
}
