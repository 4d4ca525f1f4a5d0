//! Month arithmetic for monthly recurrences.
//!
//! Months are addressed by a linear index (`year * 12 + month0`). Month
//! lengths repeat every 400 Gregorian years, which bounds the work needed to
//! count occurrences before any month.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use super::Candidate;
use crate::shift::{Recurrence, monthly_days};

/// 400 years of months; the Gregorian calendar repeats after this many.
const GREGORIAN_CYCLE_MONTHS: u64 = 4_800;

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn year_month(index: i64) -> Option<(i32, u32)> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    Some((year, month))
}

const fn is_leap_year(year: i64) -> bool {
    year.rem_euclid(4) == 0 && (year.rem_euclid(100) != 0 || year.rem_euclid(400) == 0)
}

fn days_in_month(index: i64) -> u32 {
    let year = index.div_euclid(12);
    match index.rem_euclid(12) + 1 {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Counts the occurrences generated in included months `0..periods`,
/// ignoring the anchor (callers subtract the days skipped in month 0).
fn occurrences_before(anchor_month: i64, days: &[u32], interval: u64, periods: u64) -> Option<u64> {
    let in_month = |period: u64| -> Option<u64> {
        let offset = i64::try_from(period.checked_mul(interval)?).ok()?;
        let length = days_in_month(anchor_month.checked_add(offset)?);
        u64::try_from(days.iter().filter(|day| **day <= length).count()).ok()
    };
    let sum = |count: u64| -> Option<u64> {
        (0..count).try_fold(0_u64, |acc, period| acc.checked_add(in_month(period)?))
    };

    let cycle = GREGORIAN_CYCLE_MONTHS / gcd(interval, GREGORIAN_CYCLE_MONTHS);
    let full_cycles = periods / cycle;
    let per_cycle = if full_cycles > 0 { sum(cycle)? } else { 0 };

    full_cycles
        .checked_mul(per_cycle)?
        .checked_add(sum(periods % cycle)?)
}

/// Whether a monthly recurrence anchored at `anchor` ever lands on a day
/// that exists. Only rules made solely of days 29 to 31 can fail to.
pub(crate) fn monthly_fires(anchor: NaiveDate, days: &[u32], interval: u64) -> bool {
    let Some(&earliest) = days.first() else {
        return false;
    };
    if earliest <= 28 {
        return true;
    }
    let anchor_month = month_index(anchor);
    let cycle = GREGORIAN_CYCLE_MONTHS / gcd(interval.max(1), GREGORIAN_CYCLE_MONTHS);
    (0..cycle).any(|period| {
        period
            .checked_mul(interval)
            .and_then(|offset| i64::try_from(offset).ok())
            .and_then(|offset| anchor_month.checked_add(offset))
            .is_some_and(|month| days_in_month(month) >= earliest)
    })
}

#[derive(Debug)]
pub(super) struct MonthlyCursor {
    anchor_month: i64,
    time: NaiveTime,
    /// Sorted days of month.
    days: Vec<u32>,
    interval: u64,
    period: u64,
    slot: usize,
    next_index: u64,
}

impl MonthlyCursor {
    pub(super) fn seek(
        anchor: DateTime<Utc>,
        recurrence: &Recurrence,
        interval: u64,
        lower: DateTime<Utc>,
    ) -> Option<Self> {
        let days = monthly_days(recurrence, anchor);
        let anchor_month = month_index(anchor.date_naive());

        let period = if lower <= anchor {
            0
        } else {
            let elapsed = month_index(lower.date_naive()) - anchor_month;
            u64::try_from(elapsed).ok()? / interval
        };

        let next_index = if period == 0 {
            0
        } else {
            let skipped = days.iter().filter(|day| **day < anchor.day()).count();
            occurrences_before(anchor_month, &days, interval, period)?
                .checked_sub(u64::try_from(skipped).ok()?)?
        };

        Some(Self {
            anchor_month,
            time: anchor.time(),
            days,
            interval,
            period,
            slot: 0,
            next_index,
        })
    }

    pub(super) fn next_candidate(&mut self, anchor: DateTime<Utc>) -> Option<Candidate> {
        loop {
            if self.slot >= self.days.len() {
                self.period = self.period.checked_add(1)?;
                self.slot = 0;
            }
            let day = *self.days.get(self.slot)?;
            self.slot += 1;

            let offset = i64::try_from(self.period.checked_mul(self.interval)?).ok()?;
            let (year, month) = year_month(self.anchor_month.checked_add(offset)?)?;
            // Days the month does not have are not generated at all.
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            let start = date.and_time(self.time).and_utc();
            if start < anchor {
                continue;
            }

            let index = self.next_index;
            self.next_index += 1;
            return Some(Candidate {
                index,
                period: self.period,
                start,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month_follows_gregorian_rules() {
        let feb = |year: i32| days_in_month(i64::from(year) * 12 + 1);
        assert_eq!(feb(2024), 29);
        assert_eq!(feb(2026), 28);
        assert_eq!(feb(1900), 28);
        assert_eq!(feb(2000), 29);
        assert_eq!(days_in_month(2026 * 12 + 3), 30);
        assert_eq!(days_in_month(2026 * 12 + 11), 31);
    }

    #[test]
    fn test_year_month_round_trip() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(year_month(month_index(date)), Some((2026, 10)));
    }

    #[test]
    fn test_monthly_fires() {
        let feb = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        assert!(monthly_fires(feb, &[31], 1));
        assert!(!monthly_fires(feb, &[30, 31], 12));
        // Leap Februaries come round every 48 months.
        assert!(monthly_fires(feb, &[29], 12));
        assert!(monthly_fires(feb, &[3, 31], 12));
    }

    #[test]
    fn test_occurrences_before_uses_cycle() {
        let anchor_month = 2000 * 12;
        let days = [29, 30, 31];
        let periods = GREGORIAN_CYCLE_MONTHS * 2 + 17;

        let brute: u64 = (0..periods)
            .map(|period| {
                let length = days_in_month(anchor_month + i64::try_from(period).unwrap());
                u64::try_from(days.iter().filter(|day| **day <= length).count()).unwrap()
            })
            .sum();

        assert_eq!(
            occurrences_before(anchor_month, &days, 1, periods),
            Some(brute)
        );
    }
}
