//! The realised roster and the counters derived from it.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::calendar::Horizon;
use crate::config::HourRules;
use crate::domain::{quarters_to_hours, Employee, PlanningInput, ShiftLabel};
use crate::model::ShiftGrid;
use crate::objective::FairnessCategory;
use crate::rules::quota_weight;

/// One roster cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type", content = "label")]
pub enum Slot {
    Assigned(ShiftLabel),
    /// No label could be read back; needs manual attention.
    Unassigned,
}

impl Slot {
    pub fn label(self) -> Option<ShiftLabel> {
        match self {
            Slot::Assigned(label) => Some(label),
            Slot::Unassigned => None,
        }
    }

    pub fn is(self, label: ShiftLabel) -> bool {
        self == Slot::Assigned(label)
    }

    pub fn is_working(self) -> bool {
        self.label().is_some_and(ShiftLabel::is_working)
    }

    pub fn is_off(self) -> bool {
        self.label().is_some_and(ShiftLabel::is_off)
    }
}

/// Per-employee shift counts by fairness category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub weekday_day: u32,
    pub weekday_night: u32,
    pub weekend_day: u32,
    pub weekend_night: u32,
    pub short: u32,
}

impl CategoryCounts {
    pub fn get(&self, category: FairnessCategory) -> u32 {
        match category {
            FairnessCategory::WeekdayDay => self.weekday_day,
            FairnessCategory::WeekdayNight => self.weekday_night,
            FairnessCategory::WeekendDay => self.weekend_day,
            FairnessCategory::WeekendNight => self.weekend_night,
            FairnessCategory::Short => self.short,
        }
    }

    fn bump(&mut self, category: FairnessCategory) {
        let slot = match category {
            FairnessCategory::WeekdayDay => &mut self.weekday_day,
            FairnessCategory::WeekdayNight => &mut self.weekday_night,
            FairnessCategory::WeekendDay => &mut self.weekend_day,
            FairnessCategory::WeekendNight => &mut self.weekend_night,
            FairnessCategory::Short => &mut self.short,
        };
        *slot += 1;
    }
}

/// Derived counters for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub employee: String,
    /// Quota hours over the whole horizon (weekend nights excluded).
    pub quota_hours: f64,
    /// Quota hours per quota block.
    pub block_hours: Vec<f64>,
    /// All nominal hours, weekend nights included.
    pub nominal_hours: f64,
    pub worked_days: u32,
    pub rest_days: u32,
    pub leave_days: u32,
    pub unassigned_days: u32,
    pub counts: CategoryCounts,
}

/// An immutable employee × day assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    employees: Vec<Employee>,
    horizon: Horizon,
    cells: Vec<Vec<Slot>>,
}

impl Roster {
    /// Builds a roster from rows of slots, one row per employee.
    ///
    /// Rows shorter than the horizon are padded with [`Slot::Unassigned`];
    /// extra cells are dropped.
    pub fn new(employees: Vec<Employee>, horizon: Horizon, mut cells: Vec<Vec<Slot>>) -> Self {
        cells.resize(employees.len(), Vec::new());
        for row in &mut cells {
            row.resize(horizon.len(), Slot::Unassigned);
        }
        Self {
            employees,
            horizon,
            cells,
        }
    }

    /// Builds a fully assigned roster from a label function.
    pub fn from_fn(input: &PlanningInput, label_of: impl Fn(usize, usize) -> ShiftLabel) -> Self {
        let cells = (0..input.employee_count())
            .map(|e| {
                (0..input.day_count())
                    .map(|d| Slot::Assigned(label_of(e, d)))
                    .collect()
            })
            .collect();
        Self::new(input.employees().to_vec(), input.horizon().clone(), cells)
    }

    /// Reads one label per cell from solver values.
    pub fn extract(input: &PlanningInput, grid: &ShiftGrid, values: &[i32]) -> Self {
        let cells = (0..grid.employees())
            .map(|e| {
                (0..grid.days())
                    .map(|d| match grid.read(values, e, d) {
                        Some(label) => Slot::Assigned(label),
                        None => Slot::Unassigned,
                    })
                    .collect()
            })
            .collect();
        Self::new(input.employees().to_vec(), input.horizon().clone(), cells)
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }

    pub fn day_count(&self) -> usize {
        self.horizon.len()
    }

    pub fn slot(&self, employee: usize, day: usize) -> Slot {
        self.cells
            .get(employee)
            .and_then(|row| row.get(day))
            .copied()
            .unwrap_or(Slot::Unassigned)
    }

    pub fn row(&self, employee: usize) -> &[Slot] {
        self.cells.get(employee).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells that need manual attention.
    pub fn unassigned(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for (e, row) in self.cells.iter().enumerate() {
            for (d, slot) in row.iter().enumerate() {
                if *slot == Slot::Unassigned {
                    cells.push((e, d));
                }
            }
        }
        cells
    }

    /// Employees holding `label` on `day`.
    pub fn count_on(&self, day: usize, label: ShiftLabel) -> usize {
        self.cells
            .iter()
            .filter(|row| row.get(day).is_some_and(|slot| slot.is(label)))
            .count()
    }

    /// Quota quarter-hours of one employee over `days`.
    pub fn quota_quarters(&self, employee: usize, days: Range<usize>, hours: &HourRules) -> i64 {
        days.filter_map(|d| {
            self.slot(employee, d)
                .label()
                .map(|label| quota_weight(label, self.horizon.class(d), hours) as i64)
        })
        .sum()
    }

    pub fn category_counts(&self, employee: usize) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for (d, slot) in self.row(employee).iter().enumerate() {
            if let Some(category) = slot
                .label()
                .and_then(|label| FairnessCategory::of(label, self.horizon.class(d)))
            {
                counts.bump(category);
            }
        }
        counts
    }

    pub fn summary(&self, employee: usize, hours: &HourRules) -> EmployeeSummary {
        let row = self.row(employee);
        let count = |pred: fn(Slot) -> bool| row.iter().filter(|&&slot| pred(slot)).count() as u32;
        let nominal: i64 = row
            .iter()
            .filter_map(|slot| slot.label())
            .map(|label| label.nominal_quarters() as i64)
            .sum();

        EmployeeSummary {
            employee: self
                .employees
                .get(employee)
                .map(|e| e.name.clone())
                .unwrap_or_default(),
            quota_hours: quarters_to_hours(self.quota_quarters(employee, 0..self.day_count(), hours)),
            block_hours: self
                .horizon
                .blocks(hours.block_days)
                .map(|block| quarters_to_hours(self.quota_quarters(employee, block, hours)))
                .collect(),
            nominal_hours: quarters_to_hours(nominal),
            worked_days: count(Slot::is_working),
            rest_days: count(|slot| slot.is(ShiftLabel::Rest)),
            leave_days: count(|slot| slot.is(ShiftLabel::Leave)),
            unassigned_days: count(|slot| slot == Slot::Unassigned),
            counts: self.category_counts(employee),
        }
    }

    pub fn summaries(&self, hours: &HourRules) -> Vec<EmployeeSummary> {
        (0..self.employee_count())
            .map(|e| self.summary(e, hours))
            .collect()
    }
}
