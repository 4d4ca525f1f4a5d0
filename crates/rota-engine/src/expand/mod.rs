//! Lazy, windowed expansion of a shift into occurrences.
//!
//! Expansion never walks the timeline from the anchor: each cursor seeks
//! straight to the first base period that can reach the requested window and
//! derives the sequence index of that period arithmetically. Indices are
//! therefore identical whichever window is asked for.

mod calendar;

use std::iter::FusedIterator;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, Utc, Weekday};

use crate::shift::{Frequency, Shift, days_from_week_start, weekly_offsets};

use calendar::MonthlyCursor;
pub(crate) use calendar::monthly_fires;

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
const DAYS_PER_WEEK: u64 = 7;

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Window {
    /// Creates a window; an `end` before `start` yields an empty window.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// The smallest window containing `instant`.
    #[must_use]
    pub fn at(instant: DateTime<Utc>) -> Self {
        let end = instant
            .checked_add_signed(TimeDelta::nanoseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(instant, end)
    }

    /// Everything from `start` onwards.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self::new(start, DateTime::<Utc>::MAX_UTC)
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether the span `[start, end)` overlaps this window.
    #[must_use]
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// One concrete duty period of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurrence {
    /// 0-based ordinal counted from the shift's anchor.
    pub index: u64,
    /// 0-based ordinal of the included base period (hour, day, week or
    /// month) the occurrence belongs to.
    pub period: u64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Occurrence {
    /// Whether the occurrence is running at `instant`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Occurrence start produced by a cursor before window and bound checks.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: u64,
    period: u64,
    start: DateTime<Utc>,
}

#[derive(Debug)]
struct WeeklyCursor {
    /// First day of week 0 (the week containing the anchor).
    origin: NaiveDate,
    time: NaiveTime,
    offsets: Vec<u32>,
    stride_days: u64,
    week: u64,
    slot: usize,
    next_index: u64,
}

impl WeeklyCursor {
    fn seek(
        anchor: DateTime<Utc>,
        offsets: Vec<u32>,
        interval: u64,
        week_start: Weekday,
        lower: DateTime<Utc>,
    ) -> Option<Self> {
        let anchor_offset = days_from_week_start(anchor.weekday(), week_start);
        let origin = anchor
            .date_naive()
            .checked_sub_days(Days::new(u64::from(anchor_offset)))?;
        let stride_days = interval.checked_mul(DAYS_PER_WEEK)?;

        let week = if lower <= anchor {
            0
        } else {
            let elapsed = (lower.date_naive() - origin).num_days();
            u64::try_from(elapsed).ok()? / stride_days
        };

        let next_index = if week == 0 {
            0
        } else {
            let per_week = u64::try_from(offsets.len()).ok()?;
            let skipped = offsets.iter().filter(|offset| **offset < anchor_offset).count();
            week.checked_mul(per_week)?
                .checked_sub(u64::try_from(skipped).ok()?)?
        };

        Some(Self {
            origin,
            time: anchor.time(),
            offsets,
            stride_days,
            week,
            slot: 0,
            next_index,
        })
    }

    fn next_candidate(&mut self, anchor: DateTime<Utc>) -> Option<Candidate> {
        loop {
            if self.slot >= self.offsets.len() {
                self.week = self.week.checked_add(1)?;
                self.slot = 0;
            }
            let offset = *self.offsets.get(self.slot)?;
            self.slot += 1;

            let days = self
                .week
                .checked_mul(self.stride_days)?
                .checked_add(u64::from(offset))?;
            let start = self
                .origin
                .checked_add_days(Days::new(days))?
                .and_time(self.time)
                .and_utc();
            // Week 0 may hold weekdays that fall before the anchor.
            if start < anchor {
                continue;
            }

            let index = self.next_index;
            self.next_index += 1;
            return Some(Candidate {
                index,
                period: self.week,
                start,
            });
        }
    }
}

#[derive(Debug)]
enum Cursor {
    Once { pending: bool },
    Stepped { step_seconds: i64, n: u64 },
    Weekly(WeeklyCursor),
    Monthly(MonthlyCursor),
    Exhausted,
}

impl Cursor {
    /// Positions a cursor at the first base period whose occurrences may end
    /// after `lower`.
    fn seek(shift: &Shift, lower: DateTime<Utc>) -> Self {
        let anchor = shift.start();
        let Some(recurrence) = shift.recurrence() else {
            return Self::Once { pending: true };
        };
        let interval = u64::from(recurrence.interval());

        let cursor = match recurrence.frequency() {
            Frequency::Hourly | Frequency::Daily => {
                let unit = if recurrence.frequency() == Frequency::Hourly {
                    SECONDS_PER_HOUR
                } else {
                    SECONDS_PER_DAY
                };
                i64::from(recurrence.interval())
                    .checked_mul(unit)
                    .map(|step_seconds| {
                        let n = if lower <= anchor {
                            0
                        } else {
                            u64::try_from((lower - anchor).num_seconds() / step_seconds)
                                .unwrap_or_default()
                        };
                        Self::Stepped { step_seconds, n }
                    })
            }
            Frequency::Weekly => WeeklyCursor::seek(
                anchor,
                weekly_offsets(recurrence, anchor),
                interval,
                recurrence.week_start(),
                lower,
            )
            .map(Self::Weekly),
            Frequency::Monthly => {
                MonthlyCursor::seek(anchor, recurrence, interval, lower).map(Self::Monthly)
            }
        };

        cursor.unwrap_or(Self::Exhausted)
    }

    fn next_candidate(&mut self, anchor: DateTime<Utc>) -> Option<Candidate> {
        match self {
            Self::Once { pending } => {
                if !*pending {
                    return None;
                }
                *pending = false;
                Some(Candidate {
                    index: 0,
                    period: 0,
                    start: anchor,
                })
            }
            Self::Stepped { step_seconds, n } => {
                let offset = i64::try_from(*n).ok()?.checked_mul(*step_seconds)?;
                let start = anchor.checked_add_signed(TimeDelta::try_seconds(offset)?)?;
                let index = *n;
                *n += 1;
                Some(Candidate {
                    index,
                    period: index,
                    start,
                })
            }
            Self::Weekly(cursor) => cursor.next_candidate(anchor),
            Self::Monthly(cursor) => cursor.next_candidate(anchor),
            Self::Exhausted => None,
        }
    }
}

/// Lazy, chronologically ordered occurrences of one shift within a window.
///
/// Produced by [`expand`]; cheap to rebuild for any other window.
#[derive(Debug)]
pub struct Expansion<'a> {
    shift: &'a Shift,
    window: Window,
    cursor: Cursor,
}

impl Expansion<'_> {
    #[must_use]
    pub const fn window(&self) -> Window {
        self.window
    }
}

impl Iterator for Expansion<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        loop {
            let Some(candidate) = self.cursor.next_candidate(self.shift.start()) else {
                self.cursor = Cursor::Exhausted;
                return None;
            };

            let past_until = self
                .shift
                .until()
                .is_some_and(|until| candidate.start > until);
            if past_until || candidate.start >= self.window.end() {
                self.cursor = Cursor::Exhausted;
                return None;
            }

            let end = candidate
                .start
                .checked_add_signed(self.shift.duration())
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if end <= self.window.start() {
                continue;
            }

            return Some(Occurrence {
                index: candidate.index,
                period: candidate.period,
                start: candidate.start,
                end,
            });
        }
    }
}

impl FusedIterator for Expansion<'_> {}

/// ## Summary
/// Expands `shift` into the occurrences whose span intersects `window`.
///
/// Occurrences before the shift's rotation start are still produced (they
/// hold sequence indices); eligibility is decided by [`crate::filter`].
#[must_use]
pub fn expand(shift: &Shift, window: Window) -> Expansion<'_> {
    let cursor = if window.is_empty() {
        Cursor::Exhausted
    } else {
        let lower = window
            .start()
            .checked_sub_signed(shift.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Cursor::seek(shift, lower)
    };

    tracing::trace!(
        shift_id = %shift.id(),
        window_start = %window.start(),
        window_end = %window.end(),
        "Expanding shift"
    );

    Expansion {
        shift,
        window,
        cursor,
    }
}
