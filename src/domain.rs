//! Domain model for shift rostering: employees, shift labels, approved leave,
//! and the validated input snapshot a planning run starts from.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::Range;

use crate::calendar::Horizon;
use crate::error::InputError;

/// Hour arithmetic is done in quarter-hours so 11.25 h and 7.5 h stay exact.
pub const HOUR_SCALE: i32 = 4;

/// Longest horizon a planning input accepts, in days.
pub const MAX_HORIZON_DAYS: usize = 366;

/// Converts quarter-hours back to hours for display.
pub fn quarters_to_hours(quarters: i64) -> f64 {
    quarters as f64 / HOUR_SCALE as f64
}

/// The categorical outcome for one employee on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftLabel {
    Rest,
    DayShift,
    NightShift,
    ShortDayShift,
    /// Approved absence; counts as a full day shift for hour quotas.
    Leave,
}

impl ShiftLabel {
    pub const COUNT: usize = 5;

    pub const ALL: [ShiftLabel; ShiftLabel::COUNT] = [
        ShiftLabel::Rest,
        ShiftLabel::DayShift,
        ShiftLabel::NightShift,
        ShiftLabel::ShortDayShift,
        ShiftLabel::Leave,
    ];

    /// Labels that count as worked days.
    pub const WORKING: [ShiftLabel; 3] = [
        ShiftLabel::DayShift,
        ShiftLabel::NightShift,
        ShiftLabel::ShortDayShift,
    ];

    /// Dense index used by the variable grid.
    pub fn index(self) -> usize {
        match self {
            ShiftLabel::Rest => 0,
            ShiftLabel::DayShift => 1,
            ShiftLabel::NightShift => 2,
            ShiftLabel::ShortDayShift => 3,
            ShiftLabel::Leave => 4,
        }
    }

    /// Nominal duration in quarter-hours.
    ///
    /// ```
    /// use shift_roster::domain::ShiftLabel;
    ///
    /// assert_eq!(ShiftLabel::DayShift.nominal_quarters(), 45);
    /// assert_eq!(ShiftLabel::ShortDayShift.nominal_quarters(), 30);
    /// assert_eq!(ShiftLabel::Leave.nominal_quarters(), 45);
    /// ```
    pub fn nominal_quarters(self) -> i32 {
        match self {
            ShiftLabel::Rest => 0,
            ShiftLabel::DayShift | ShiftLabel::NightShift | ShiftLabel::Leave => 45,
            ShiftLabel::ShortDayShift => 30,
        }
    }

    pub fn nominal_hours(self) -> f64 {
        quarters_to_hours(self.nominal_quarters() as i64)
    }

    pub fn is_working(self) -> bool {
        matches!(
            self,
            ShiftLabel::DayShift | ShiftLabel::NightShift | ShiftLabel::ShortDayShift
        )
    }

    /// Rest or leave: the days that satisfy rest obligations.
    pub fn is_off(self) -> bool {
        !self.is_working()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftLabel::Rest => "REST",
            ShiftLabel::DayShift => "DAY_SHIFT",
            ShiftLabel::NightShift => "NIGHT_SHIFT",
            ShiftLabel::ShortDayShift => "SHORT_DAY_SHIFT",
            ShiftLabel::Leave => "LEAVE",
        }
    }
}

impl fmt::Display for ShiftLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An employee on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Employee {
    /// Position in `PlanningInput::employees`, used as the grid row.
    pub index: usize,
    pub name: String,
}

impl Employee {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Approved leave days per employee, as day indices into the horizon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveRegistry {
    days: Vec<BTreeSet<usize>>,
}

impl LeaveRegistry {
    pub fn new(employee_count: usize) -> Self {
        Self {
            days: vec![BTreeSet::new(); employee_count],
        }
    }

    fn insert(&mut self, employee: usize, day: usize) {
        self.days[employee].insert(day);
    }

    pub fn is_on_leave(&self, employee: usize, day: usize) -> bool {
        self.days
            .get(employee)
            .is_some_and(|days| days.contains(&day))
    }

    pub fn days(&self, employee: usize) -> impl Iterator<Item = usize> + '_ {
        self.days.get(employee).into_iter().flatten().copied()
    }

    /// Leave days of `employee` inside `span`.
    pub fn count_in(&self, employee: usize, span: Range<usize>) -> usize {
        self.days
            .get(employee)
            .map_or(0, |days| days.range(span).count())
    }

    /// Employees on leave on `day`.
    pub fn absent_on(&self, day: usize) -> usize {
        self.days.iter().filter(|days| days.contains(&day)).count()
    }

    pub fn total(&self) -> usize {
        self.days.iter().map(BTreeSet::len).sum()
    }
}

/// Immutable snapshot of everything a planning run needs from its caller.
///
/// Built through [`PlanningInputBuilder`], which rejects bad input before
/// any model is constructed.
#[derive(Debug, Clone)]
pub struct PlanningInput {
    employees: Vec<Employee>,
    horizon: Horizon,
    leave: LeaveRegistry,
}

impl PlanningInput {
    pub fn builder(start: NaiveDate, days: usize) -> PlanningInputBuilder {
        PlanningInputBuilder {
            start,
            days,
            employees: Vec::new(),
            leave: Vec::new(),
        }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn day_count(&self) -> usize {
        self.horizon.len()
    }

    pub fn leave(&self) -> &LeaveRegistry {
        &self.leave
    }
}

/// Collects caller input for a [`PlanningInput`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use shift_roster::domain::PlanningInput;
///
/// let start = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
/// let input = PlanningInput::builder(start, 42)
///     .employees(["Amy", "Beth", "Carl"])
///     .leave("Beth", [start])
///     .build()
///     .unwrap();
///
/// assert_eq!(input.employee_count(), 3);
/// assert!(input.leave().is_on_leave(1, 0));
/// ```
#[derive(Debug, Clone)]
pub struct PlanningInputBuilder {
    start: NaiveDate,
    days: usize,
    employees: Vec<String>,
    leave: Vec<(String, NaiveDate)>,
}

impl PlanningInputBuilder {
    pub fn employee(mut self, name: impl Into<String>) -> Self {
        self.employees.push(name.into());
        self
    }

    pub fn employees(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.employees.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn leave(
        mut self,
        employee: impl Into<String>,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        let employee = employee.into();
        self.leave
            .extend(dates.into_iter().map(|date| (employee.clone(), date)));
        self
    }

    pub fn build(self) -> Result<PlanningInput, InputError> {
        if self.employees.is_empty() {
            return Err(InputError::NoEmployees);
        }
        if self.days == 0 {
            return Err(InputError::EmptyHorizon);
        }
        if self.days > MAX_HORIZON_DAYS {
            return Err(InputError::HorizonTooLong {
                days: self.days,
                max: MAX_HORIZON_DAYS,
            });
        }
        if self
            .start
            .checked_add_signed(Duration::days(self.days as i64 - 1))
            .is_none()
        {
            return Err(InputError::HorizonOutOfRange {
                start: self.start,
                days: self.days,
            });
        }

        let horizon = Horizon::new(self.start, self.days);
        let mut name_to_idx: HashMap<&str, usize> = HashMap::new();
        let mut employees = Vec::with_capacity(self.employees.len());
        for (index, name) in self.employees.iter().enumerate() {
            if name_to_idx.insert(name.as_str(), index).is_some() {
                return Err(InputError::DuplicateEmployee(name.clone()));
            }
            employees.push(Employee::new(index, name.as_str()));
        }

        let mut leave = LeaveRegistry::new(employees.len());
        for (name, date) in &self.leave {
            let employee = *name_to_idx
                .get(name.as_str())
                .ok_or_else(|| InputError::UnknownEmployee(name.clone()))?;
            let day = horizon
                .index_of(*date)
                .ok_or_else(|| InputError::LeaveOutsideHorizon {
                    employee: name.clone(),
                    date: *date,
                })?;
            leave.insert(employee, day);
        }

        Ok(PlanningInput {
            employees,
            horizon,
            leave,
        })
    }
}
