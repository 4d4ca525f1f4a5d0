//! On-call rotation resolution.
//!
//! Shifts are expanded lazily into occurrences for the window being asked
//! about, filtered by their activation bounds, assigned to a user group and
//! finally merged per schedule into the set of people on duty.

pub mod assign;
pub mod error;
pub mod expand;
pub mod filter;
pub mod resolve;
pub mod schedule;
pub mod shift;
pub mod supplier;

pub use assign::{assign, group_index};
pub use error::{EngineError, EngineResult};
pub use expand::{Expansion, Occurrence, Window, expand};
pub use filter::{in_force, in_force_occurrence, is_eligible, is_in_force};
pub use resolve::{Duty, OnCallSegment, Resolver, duties, resolve};
pub use schedule::{Schedule, ScheduleSpec};
pub use shift::{Frequency, Recurrence, RotationCadence, Shift, ShiftKind, ShiftSpec, UserGroup};
pub use supplier::{ShiftSupplier, StaticSupplier, load_schedules};
