//! Precedence resolution: who is on call.
//!
//! Within one schedule an in-force override silences every other shift;
//! the remaining shifts combine according to the [`PriorityPolicy`].
//! Schedules queried together are resolved independently and unioned.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rota_core::types::{PriorityPolicy, ShiftId, UserId};

use crate::assign::assign;
use crate::expand::{Occurrence, Window, expand};
use crate::filter::{in_force, is_eligible};
use crate::schedule::Schedule;
use crate::shift::{ShiftKind, UserGroup};

/// A stretch of time during which the on-call set does not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnCallSegment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub users: BTreeSet<UserId>,
}

/// One eligible occurrence of a shift together with its assigned group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duty {
    pub shift_id: ShiftId,
    pub kind: ShiftKind,
    pub priority_level: Option<i32>,
    pub occurrence: Occurrence,
    pub users: UserGroup,
}

/// Merges in-force shifts into on-call sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver {
    policy: PriorityPolicy,
}

impl Resolver {
    #[must_use]
    pub const fn new(policy: PriorityPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> PriorityPolicy {
        self.policy
    }

    /// ## Summary
    /// Users on call at `instant` across all `schedules`.
    ///
    /// Each schedule resolves on its own; the results are a plain union.
    #[must_use]
    pub fn resolve<S: Borrow<Schedule>>(
        &self,
        schedules: &[S],
        instant: DateTime<Utc>,
    ) -> BTreeSet<UserId> {
        schedules
            .iter()
            .flat_map(|schedule| self.resolve_schedule(schedule.borrow(), instant))
            .collect()
    }

    /// ## Summary
    /// Users on call at `instant` for a single schedule.
    #[must_use]
    pub fn resolve_schedule(&self, schedule: &Schedule, instant: DateTime<Utc>) -> BTreeSet<UserId> {
        let mut overrides: Option<BTreeSet<UserId>> = None;
        let mut levels: BTreeMap<i32, BTreeSet<UserId>> = BTreeMap::new();

        for shift in schedule.shifts() {
            let mut users = in_force(shift, instant)
                .flat_map(|occurrence| assign(shift, &occurrence).iter().cloned())
                .peekable();
            if users.peek().is_none() {
                continue;
            }

            tracing::trace!(
                schedule_id = %schedule.id(),
                shift_id = %shift.id(),
                kind = %shift.kind(),
                %instant,
                "Shift in force"
            );

            match shift.kind() {
                ShiftKind::Override => overrides.get_or_insert_default().extend(users),
                ShiftKind::Single | ShiftKind::Recurrent | ShiftKind::Rolling => levels
                    .entry(shift.priority_level().unwrap_or_default())
                    .or_default()
                    .extend(users),
            }
        }

        if let Some(users) = overrides {
            tracing::debug!(
                schedule_id = %schedule.id(),
                user_count = users.len(),
                "Override in force, other shifts suppressed"
            );
            return users;
        }

        let users = match self.policy {
            PriorityPolicy::Union => levels.into_values().flatten().collect(),
            PriorityPolicy::HighestWins => levels.pop_last().map(|(_, users)| users).unwrap_or_default(),
            PriorityPolicy::LowestWins => levels.pop_first().map(|(_, users)| users).unwrap_or_default(),
        };
        tracing::debug!(
            schedule_id = %schedule.id(),
            policy = %self.policy,
            user_count = users.len(),
            "Resolved schedule"
        );
        users
    }

    /// ## Summary
    /// Splits `window` into stretches with a constant, non-empty on-call set.
    ///
    /// Only occurrences intersecting the window are expanded; the set is
    /// re-evaluated at each occurrence boundary and adjacent stretches with
    /// the same users are merged.
    #[must_use]
    pub fn timeline<S: Borrow<Schedule>>(&self, schedules: &[S], window: Window) -> Vec<OnCallSegment> {
        if window.is_empty() {
            return Vec::new();
        }

        let mut boundaries = BTreeSet::from([window.start(), window.end()]);
        for schedule in schedules {
            for shift in schedule.borrow().shifts() {
                for occurrence in expand(shift, window).filter(|o| is_eligible(shift, o)) {
                    for edge in [occurrence.start, occurrence.end] {
                        if window.start() < edge && edge < window.end() {
                            boundaries.insert(edge);
                        }
                    }
                }
            }
        }

        let edges: Vec<_> = boundaries.into_iter().collect();
        let mut segments: Vec<OnCallSegment> = Vec::new();
        for pair in edges.windows(2) {
            let &[start, end] = pair else { continue };
            let users = self.resolve(schedules, start);
            if users.is_empty() {
                continue;
            }
            match segments.last_mut() {
                Some(last) if last.end == start && last.users == users => last.end = end,
                _ => segments.push(OnCallSegment { start, end, users }),
            }
        }
        segments
    }
}

/// ## Summary
/// Users on call at `instant` across `schedules` with the default policy.
#[must_use]
pub fn resolve<S: Borrow<Schedule>>(schedules: &[S], instant: DateTime<Utc>) -> BTreeSet<UserId> {
    Resolver::default().resolve(schedules, instant)
}

/// ## Summary
/// Lists every eligible occurrence of `schedule` intersecting `window`, in
/// start order, with the group assigned to it. Precedence is not applied.
#[must_use]
pub fn duties(schedule: &Schedule, window: Window) -> Vec<Duty> {
    let mut duties: Vec<Duty> = schedule
        .shifts()
        .iter()
        .flat_map(|shift| {
            expand(shift, window)
                .filter(|occurrence| is_eligible(shift, occurrence))
                .map(|occurrence| Duty {
                    shift_id: shift.id(),
                    kind: shift.kind(),
                    priority_level: shift.priority_level(),
                    occurrence,
                    users: assign(shift, &occurrence).clone(),
                })
        })
        .collect();
    duties.sort_by_key(|duty| duty.occurrence.start);
    duties
}
