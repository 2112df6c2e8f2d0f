//! Planning horizon and the day groupings every rule is expressed over.
//!
//! Days are ordinal indices into the horizon. Weeks are horizon-native
//! (`[7k, 7k + 7)`), quota blocks are consecutive spans from the first day, and
//! weekend units group the Friday, Saturday and Sunday of one weekend.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Length of a horizon-native week.
pub const WEEK_DAYS: usize = 7;

/// Length of the secondary hour-cap window.
pub const FORTNIGHT_DAYS: usize = 14;

/// Weekday classification used by coverage, hour and weekend rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayClass {
    /// Monday to Thursday.
    Weekday,
    Friday,
    Saturday,
    Sunday,
}

impl DayClass {
    pub fn of(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Fri => DayClass::Friday,
            Weekday::Sat => DayClass::Saturday,
            Weekday::Sun => DayClass::Sunday,
            _ => DayClass::Weekday,
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, DayClass::Saturday | DayClass::Sunday)
    }

    /// Monday to Friday.
    pub fn is_workweek(self) -> bool {
        !self.is_weekend()
    }
}

/// One day of the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Day {
    pub index: usize,
    pub date: NaiveDate,
    pub class: DayClass,
}

/// The Friday/Saturday/Sunday days of one weekend that fall inside the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekendUnit {
    pub friday: Option<usize>,
    pub saturday: Option<usize>,
    pub sunday: Option<usize>,
}

impl WeekendUnit {
    /// Days a weekend day-shift block spans (Saturday, Sunday).
    pub fn day_unit(&self) -> Vec<usize> {
        [self.saturday, self.sunday].into_iter().flatten().collect()
    }

    /// Days a weekend night-shift block spans (Friday, Saturday, Sunday).
    pub fn night_unit(&self) -> Vec<usize> {
        [self.friday, self.saturday, self.sunday]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Returns true if both days belong to this weekend's night unit.
    pub fn links_nights(&self, a: usize, b: usize) -> bool {
        let unit = self.night_unit();
        unit.contains(&a) && unit.contains(&b)
    }
}

/// A fixed planning horizon: a start date and a day count.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use shift_roster::calendar::{DayClass, Horizon};
///
/// let horizon = Horizon::new(NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(), 42);
/// assert_eq!(horizon.len(), 42);
/// assert_eq!(horizon.class(0), DayClass::Sunday);
/// assert_eq!(horizon.weeks().count(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    start: NaiveDate,
    len: usize,
}

impl Horizon {
    pub fn new(start: NaiveDate, len: usize) -> Self {
        Self { start, len }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Last date of the horizon, if it has any day.
    pub fn end(&self) -> Option<NaiveDate> {
        self.len
            .checked_sub(1)
            .map(|last| self.start + Duration::days(last as i64))
    }

    pub fn date(&self, day: usize) -> NaiveDate {
        self.start + Duration::days(day as i64)
    }

    pub fn class(&self, day: usize) -> DayClass {
        DayClass::of(self.date(day).weekday())
    }

    pub fn day(&self, index: usize) -> Day {
        Day {
            index,
            date: self.date(index),
            class: self.class(index),
        }
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        (0..self.len).map(|d| self.day(d))
    }

    /// Index of `date`, if it lies inside the horizon.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        if offset >= 0 && (offset as usize) < self.len {
            Some(offset as usize)
        } else {
            None
        }
    }

    /// Horizon-native weeks; the last one may be partial.
    pub fn weeks(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.spans(WEEK_DAYS)
    }

    /// Consecutive quota blocks of `block_days`; the last one may be partial.
    pub fn blocks(&self, block_days: usize) -> impl Iterator<Item = Range<usize>> + '_ {
        self.spans(block_days.max(1))
    }

    /// Fourteen-day windows starting on each week start that fit entirely.
    pub fn fortnights(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.len)
            .step_by(WEEK_DAYS)
            .filter(move |start| start + FORTNIGHT_DAYS <= self.len)
            .map(|start| start..start + FORTNIGHT_DAYS)
    }

    /// Sliding windows of `width` consecutive days.
    pub fn sliding(&self, width: usize) -> impl Iterator<Item = Range<usize>> + '_ {
        let width = width.max(1);
        (0..(self.len + 1).saturating_sub(width)).map(move |start| start..start + width)
    }

    /// Windows the hour band applies to: every run of `block_days`
    /// consecutive days, or the whole horizon when it is shorter than a block.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use shift_roster::calendar::Horizon;
    ///
    /// let start = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
    /// assert_eq!(Horizon::new(start, 44).quota_windows(42), vec![0..42, 1..43, 2..44]);
    /// assert_eq!(Horizon::new(start, 20).quota_windows(42), vec![0..20]);
    /// ```
    pub fn quota_windows(&self, block_days: usize) -> Vec<Range<usize>> {
        let width = block_days.max(1);
        if self.len == 0 {
            Vec::new()
        } else if self.len < width {
            vec![0..self.len]
        } else {
            self.sliding(width).collect()
        }
    }

    /// Weekends touching the horizon with at least a Saturday or a Sunday.
    pub fn weekends(&self) -> Vec<WeekendUnit> {
        let mut units: Vec<(NaiveDate, WeekendUnit)> = Vec::new();
        for day in self.days() {
            let saturday = match day.class {
                DayClass::Friday => day.date + Duration::days(1),
                DayClass::Saturday => day.date,
                DayClass::Sunday => day.date - Duration::days(1),
                DayClass::Weekday => continue,
            };
            let slot = match units.iter().position(|(key, _)| *key == saturday) {
                Some(pos) => pos,
                None => {
                    units.push((saturday, WeekendUnit::default()));
                    units.len() - 1
                }
            };
            let unit = &mut units[slot].1;
            match day.class {
                DayClass::Friday => unit.friday = Some(day.index),
                DayClass::Saturday => unit.saturday = Some(day.index),
                DayClass::Sunday => unit.sunday = Some(day.index),
                DayClass::Weekday => {}
            }
        }
        units
            .into_iter()
            .map(|(_, unit)| unit)
            .filter(|unit| unit.saturday.is_some() || unit.sunday.is_some())
            .collect()
    }

    /// Returns true if both days fall in one weekend night unit.
    pub fn same_night_unit(&self, a: usize, b: usize) -> bool {
        self.weekends().iter().any(|w| w.links_nights(a, b))
    }

    fn spans(&self, width: usize) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.len)
            .step_by(width)
            .map(move |start| start..(start + width).min(self.len))
    }
}
