//! Rotation definitions.
//!
//! A [`Shift`] is only obtainable through [`ShiftSpec::build`], which rejects
//! malformed recurrences and user groups up front so resolution never has to.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, TimeDelta, Utc, Weekday};
use rota_core::types::{ShiftId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::expand::{Expansion, Window, monthly_fires};

/// A set of people on duty together.
pub type UserGroup = BTreeSet<UserId>;

/// The four kinds of rotation definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    /// One occurrence at `start`.
    Single,
    /// Repeats with one fixed group.
    Recurrent,
    /// Repeats, cycling through two or more groups.
    Rolling,
    /// Supersedes every other kind on the same schedule while in force.
    Override,
}

impl ShiftKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Recurrent => "recurrent",
            Self::Rolling => "rolling",
            Self::Override => "override",
        }
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }
}

/// Which counter picks the group of a rolling shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationCadence {
    /// Every generated occurrence hands over to the next group.
    #[default]
    PerOccurrence,
    /// Every included week or month hands over to the next group; all
    /// occurrences inside it go to the same group.
    PerPeriod,
}

/// Validated recurrence of a repeating shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    frequency: Frequency,
    interval: u32,
    /// Sorted by distance from `week_start`; empty means the anchor's weekday.
    by_weekday: Vec<Weekday>,
    /// Sorted ascending; empty means the anchor's day of month.
    by_monthday: Vec<u32>,
    week_start: Weekday,
}

impl Recurrence {
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    #[must_use]
    pub fn by_weekday(&self) -> &[Weekday] {
        &self.by_weekday
    }

    #[must_use]
    pub fn by_monthday(&self) -> &[u32] {
        &self.by_monthday
    }

    #[must_use]
    pub const fn week_start(&self) -> Weekday {
        self.week_start
    }
}

/// Number of days from `week_start` forward to `day` (0..7).
pub(crate) fn days_from_week_start(day: Weekday, week_start: Weekday) -> u32 {
    (day.num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7
}

/// An immutable rotation definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    id: ShiftId,
    kind: ShiftKind,
    priority_level: Option<i32>,
    start: DateTime<Utc>,
    rotation_start: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
    duration: TimeDelta,
    recurrence: Option<Recurrence>,
    user_groups: Vec<UserGroup>,
    rotation_cadence: RotationCadence,
}

impl Shift {
    #[must_use]
    pub const fn id(&self) -> ShiftId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> ShiftKind {
        self.kind
    }

    #[must_use]
    pub const fn priority_level(&self) -> Option<i32> {
        self.priority_level
    }

    /// Anchor the recurrence is phased from.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// First instant at which an occurrence may surface users.
    #[must_use]
    pub const fn rotation_start(&self) -> DateTime<Utc> {
        self.rotation_start
    }

    /// Inclusive upper bound on occurrence starts.
    #[must_use]
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    #[must_use]
    pub const fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// `None` for shifts with exactly one occurrence.
    #[must_use]
    pub const fn recurrence(&self) -> Option<&Recurrence> {
        self.recurrence.as_ref()
    }

    #[must_use]
    pub fn user_groups(&self) -> &[UserGroup] {
        &self.user_groups
    }

    #[must_use]
    pub const fn rotation_cadence(&self) -> RotationCadence {
        self.rotation_cadence
    }

    /// Occurrences whose span intersects `window`, in order.
    #[must_use]
    pub fn occurrences(&self, window: Window) -> Expansion<'_> {
        crate::expand::expand(self, window)
    }
}

const fn default_interval() -> u32 {
    1
}

/// Unvalidated shift description, as supplied by the owning system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSpec {
    #[serde(default)]
    pub id: Option<ShiftId>,
    pub kind: ShiftKind,
    #[serde(default)]
    pub priority_level: Option<i32>,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub rotation_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub by_weekday: Option<Vec<Weekday>>,
    #[serde(default)]
    pub by_monthday: Option<Vec<u32>>,
    #[serde(default)]
    pub week_start: Option<Weekday>,
    pub user_groups: Vec<Vec<UserId>>,
    #[serde(default)]
    pub rotation_cadence: RotationCadence,
}

impl ShiftSpec {
    /// Starts a description with no recurrence and no users.
    #[must_use]
    pub fn new(kind: ShiftKind, start: DateTime<Utc>, duration: TimeDelta) -> Self {
        Self {
            id: None,
            kind,
            priority_level: None,
            start,
            rotation_start: None,
            until: None,
            duration_seconds: duration.num_seconds(),
            frequency: None,
            interval: default_interval(),
            by_weekday: None,
            by_monthday: None,
            week_start: None,
            user_groups: Vec::new(),
            rotation_cadence: RotationCadence::default(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: ShiftId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_priority_level(mut self, level: i32) -> Self {
        self.priority_level = Some(level);
        self
    }

    #[must_use]
    pub fn with_frequency(mut self, frequency: Frequency, interval: u32) -> Self {
        self.frequency = Some(frequency);
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_rotation_start(mut self, rotation_start: DateTime<Utc>) -> Self {
        self.rotation_start = Some(rotation_start);
        self
    }

    #[must_use]
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub fn with_by_weekday(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.by_weekday = Some(days.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_by_monthday(mut self, days: impl IntoIterator<Item = u32>) -> Self {
        self.by_monthday = Some(days.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = Some(week_start);
        self
    }

    #[must_use]
    pub fn with_rotation_cadence(mut self, cadence: RotationCadence) -> Self {
        self.rotation_cadence = cadence;
        self
    }

    /// Sets the single group of a non-rolling shift.
    #[must_use]
    pub fn with_users<U: Into<UserId>>(mut self, users: impl IntoIterator<Item = U>) -> Self {
        self.user_groups = vec![users.into_iter().map(Into::into).collect()];
        self
    }

    /// Sets the ordered groups of a rolling shift. Every other kind accepts
    /// exactly one group, so passing more fails in [`ShiftSpec::build`].
    #[must_use]
    pub fn with_rolling_users<U, G>(mut self, groups: impl IntoIterator<Item = G>) -> Self
    where
        U: Into<UserId>,
        G: IntoIterator<Item = U>,
    {
        self.user_groups = groups
            .into_iter()
            .map(|group| group.into_iter().map(Into::into).collect())
            .collect();
        self
    }

    /// ## Summary
    /// Validates the description and produces an immutable [`Shift`].
    ///
    /// ## Errors
    /// Returns `EngineError::InvalidShift` when the recurrence is malformed
    /// (missing or unexpected frequency, zero interval, empty or out-of-range
    /// constraints, constraints on the wrong frequency), the duration is not
    /// positive, `until` precedes `start`, or the user groups do not fit the
    /// kind.
    pub fn build(self) -> EngineResult<Shift> {
        let Self {
            id,
            kind,
            priority_level,
            start,
            rotation_start,
            until,
            duration_seconds,
            frequency,
            interval,
            by_weekday,
            by_monthday,
            week_start,
            user_groups,
            rotation_cadence,
        } = self;

        let invalid = |reason: String| {
            tracing::debug!(kind = %kind, %reason, "Rejected shift definition");
            EngineError::InvalidShift(reason)
        };

        let duration = TimeDelta::try_seconds(duration_seconds)
            .filter(|d| *d > TimeDelta::zero())
            .ok_or_else(|| invalid(format!("duration must be positive, got {duration_seconds}s")))?;

        if let Some(until) = until.filter(|until| *until < start) {
            return Err(invalid(format!("until {until} precedes start {start}")));
        }

        let recurrence = match (kind, frequency) {
            (ShiftKind::Single, Some(_)) => {
                return Err(invalid("single shifts cannot recur".to_owned()));
            }
            (ShiftKind::Single | ShiftKind::Override, None) => {
                if by_weekday.is_some() || by_monthday.is_some() {
                    return Err(invalid(
                        "day constraints require a recurring frequency".to_owned(),
                    ));
                }
                None
            }
            (ShiftKind::Recurrent | ShiftKind::Rolling, None) => {
                return Err(invalid(format!("{kind} shifts require a frequency")));
            }
            (_, Some(frequency)) => Some(build_recurrence(
                frequency,
                interval,
                by_weekday,
                by_monthday,
                week_start,
            )
            .map_err(invalid)?),
        };

        let never_fires = recurrence.as_ref().is_some_and(|recurrence| {
            recurrence.frequency == Frequency::Monthly
                && !monthly_fires(
                    start.date_naive(),
                    &monthly_days(recurrence, start),
                    u64::from(recurrence.interval),
                )
        });
        if never_fires {
            return Err(invalid(
                "monthly recurrence never lands on an existing day".to_owned(),
            ));
        }

        let groups: Vec<UserGroup> = user_groups
            .into_iter()
            .map(|group| group.into_iter().collect::<UserGroup>())
            .collect();
        if groups.iter().any(BTreeSet::is_empty) {
            return Err(invalid("user groups must not be empty".to_owned()));
        }
        match kind {
            ShiftKind::Rolling if groups.len() < 2 => {
                return Err(invalid(format!(
                    "rolling shifts need at least two groups, got {}",
                    groups.len()
                )));
            }
            ShiftKind::Single | ShiftKind::Recurrent | ShiftKind::Override
                if groups.len() != 1 =>
            {
                return Err(invalid(format!(
                    "{kind} shifts need exactly one group, got {}",
                    groups.len()
                )));
            }
            _ => {}
        }

        Ok(Shift {
            id: id.unwrap_or_default(),
            kind,
            priority_level,
            start,
            rotation_start: rotation_start.unwrap_or(start),
            until,
            duration,
            recurrence,
            user_groups: groups,
            rotation_cadence,
        })
    }
}

impl TryFrom<ShiftSpec> for Shift {
    type Error = EngineError;

    fn try_from(spec: ShiftSpec) -> Result<Self, Self::Error> {
        spec.build()
    }
}

fn build_recurrence(
    frequency: Frequency,
    interval: u32,
    by_weekday: Option<Vec<Weekday>>,
    by_monthday: Option<Vec<u32>>,
    week_start: Option<Weekday>,
) -> Result<Recurrence, String> {
    if interval < 1 {
        return Err("interval must be at least 1".to_owned());
    }
    let week_start = week_start.unwrap_or(Weekday::Sun);

    let by_weekday = match by_weekday {
        None => Vec::new(),
        Some(_) if frequency != Frequency::Weekly => {
            return Err("by_weekday is only valid for weekly shifts".to_owned());
        }
        Some(days) if days.is_empty() => {
            return Err("by_weekday must not be empty".to_owned());
        }
        Some(mut days) => {
            days.sort_by_key(|day| days_from_week_start(*day, week_start));
            days.dedup();
            days
        }
    };

    let by_monthday = match by_monthday {
        None => Vec::new(),
        Some(_) if frequency != Frequency::Monthly => {
            return Err("by_monthday is only valid for monthly shifts".to_owned());
        }
        Some(days) if days.is_empty() => {
            return Err("by_monthday must not be empty".to_owned());
        }
        Some(days) => {
            if let Some(bad) = days.iter().find(|day| !(1..=31).contains(*day)) {
                return Err(format!("by_monthday value {bad} is outside 1..=31"));
            }
            let mut days = days;
            days.sort_unstable();
            days.dedup();
            days
        }
    };

    Ok(Recurrence {
        frequency,
        interval,
        by_weekday,
        by_monthday,
        week_start,
    })
}

/// Weekdays a weekly recurrence fires on, as offsets from its week start.
pub(crate) fn weekly_offsets(recurrence: &Recurrence, anchor: DateTime<Utc>) -> Vec<u32> {
    if recurrence.by_weekday.is_empty() {
        vec![days_from_week_start(anchor.weekday(), recurrence.week_start)]
    } else {
        recurrence
            .by_weekday
            .iter()
            .map(|day| days_from_week_start(*day, recurrence.week_start))
            .collect()
    }
}

/// Days of month a monthly recurrence fires on.
pub(crate) fn monthly_days(recurrence: &Recurrence, anchor: DateTime<Utc>) -> Vec<u32> {
    if recurrence.by_monthday.is_empty() {
        vec![anchor.day()]
    } else {
        recurrence.by_monthday.clone()
    }
}
