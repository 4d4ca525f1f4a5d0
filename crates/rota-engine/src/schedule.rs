//! Schedules: ordered collections of shifts sharing an identity.

use rota_core::types::ScheduleId;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::shift::{Shift, ShiftSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    id: ScheduleId,
    name: Option<String>,
    shifts: Vec<Shift>,
}

impl Schedule {
    #[must_use]
    pub const fn new(id: ScheduleId, shifts: Vec<Shift>) -> Self {
        Self {
            id,
            name: None,
            shifts,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> ScheduleId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }
}

/// Serialized form of a schedule, as read from a schedule document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    #[serde(default)]
    pub id: Option<ScheduleId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub shifts: Vec<ShiftSpec>,
}

impl ScheduleSpec {
    /// ## Summary
    /// Validates every shift and assembles the schedule.
    ///
    /// ## Errors
    /// Returns the first shift validation error encountered.
    pub fn build(self) -> EngineResult<Schedule> {
        let shifts = self
            .shifts
            .into_iter()
            .map(ShiftSpec::build)
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Schedule {
            id: self.id.unwrap_or_default(),
            name: self.name,
            shifts,
        })
    }
}
