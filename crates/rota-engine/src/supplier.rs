//! Where shift definitions come from.
//!
//! The engine never stores schedules itself; callers hand it a
//! [`ShiftSupplier`] that looks shifts up by schedule id.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rota_core::types::{ScheduleId, UserId};

use crate::error::{EngineError, EngineResult};
use crate::resolve::Resolver;
use crate::schedule::{Schedule, ScheduleSpec};
use crate::shift::Shift;

/// Source of shift definitions, keyed by schedule.
pub trait ShiftSupplier {
    /// ## Summary
    /// Returns the shifts belonging to `schedule_id`.
    ///
    /// ## Errors
    /// Returns `EngineError::UnknownSchedule` when the supplier has no such
    /// schedule, or any error raised while producing its shifts.
    fn shifts(&self, schedule_id: &ScheduleId) -> EngineResult<Vec<Shift>>;
}

/// In-memory supplier backed by already validated schedules.
#[derive(Debug, Clone, Default)]
pub struct StaticSupplier {
    schedules: HashMap<ScheduleId, Schedule>,
}

impl StaticSupplier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a schedule.
    pub fn insert(&mut self, schedule: Schedule) {
        self.schedules.insert(schedule.id(), schedule);
    }

    #[must_use]
    pub fn get(&self, schedule_id: &ScheduleId) -> Option<&Schedule> {
        self.schedules.get(schedule_id)
    }

    /// Schedule ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ScheduleId> {
        let mut ids: Vec<_> = self.schedules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    /// ## Summary
    /// Builds a supplier from unvalidated schedule descriptions.
    ///
    /// ## Errors
    /// Returns the first validation error of any contained shift.
    pub fn from_specs(specs: impl IntoIterator<Item = ScheduleSpec>) -> EngineResult<Self> {
        let mut supplier = Self::new();
        for spec in specs {
            supplier.insert(spec.build()?);
        }
        tracing::debug!(schedule_count = supplier.len(), "Loaded schedules");
        Ok(supplier)
    }

    /// ## Summary
    /// Parses a JSON array of schedule descriptions.
    ///
    /// ## Errors
    /// Returns `EngineError::ScheduleDocument` when the document is not valid
    /// JSON of the expected shape, or a shift validation error.
    pub fn from_json(document: &str) -> EngineResult<Self> {
        let specs: Vec<ScheduleSpec> = serde_json::from_str(document)?;
        Self::from_specs(specs)
    }
}

impl FromIterator<Schedule> for StaticSupplier {
    fn from_iter<T: IntoIterator<Item = Schedule>>(iter: T) -> Self {
        let mut supplier = Self::new();
        for schedule in iter {
            supplier.insert(schedule);
        }
        supplier
    }
}

impl ShiftSupplier for StaticSupplier {
    fn shifts(&self, schedule_id: &ScheduleId) -> EngineResult<Vec<Shift>> {
        self.schedules
            .get(schedule_id)
            .map(|schedule| schedule.shifts().to_vec())
            .ok_or(EngineError::UnknownSchedule(*schedule_id))
    }
}

/// ## Summary
/// Fetches the shifts of every id in `schedule_ids` from `supplier`.
///
/// ## Errors
/// Propagates the first supplier error.
pub fn load_schedules<P: ShiftSupplier + ?Sized>(
    supplier: &P,
    schedule_ids: &[ScheduleId],
) -> EngineResult<Vec<Schedule>> {
    schedule_ids
        .iter()
        .map(|id| Ok(Schedule::new(*id, supplier.shifts(id)?)))
        .collect()
}

impl Resolver {
    /// ## Summary
    /// Loads `schedule_ids` from `supplier` and resolves them at `instant`.
    ///
    /// ## Errors
    /// Propagates supplier errors, e.g. `EngineError::UnknownSchedule`.
    pub fn resolve_from<P: ShiftSupplier + ?Sized>(
        &self,
        supplier: &P,
        schedule_ids: &[ScheduleId],
        instant: DateTime<Utc>,
    ) -> EngineResult<BTreeSet<UserId>> {
        let schedules = load_schedules(supplier, schedule_ids)?;
        Ok(self.resolve(&schedules, instant))
    }
}
