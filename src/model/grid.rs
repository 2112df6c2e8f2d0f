//! Dense employee × day × label indicator grid.

use super::{unit, Model, VarId};
use crate::domain::ShiftLabel;
use crate::rules::RuleClass;

/// One boolean per (employee, day, label), stored row-major.
///
/// Construction posts the exactly-one constraint for every cell, so the
/// assignment is total and single-valued by the time any rule sees the grid.
#[derive(Debug, Clone)]
pub struct ShiftGrid {
    employees: usize,
    days: usize,
    vars: Vec<VarId>,
}

impl ShiftGrid {
    pub fn new(model: &mut Model, employees: usize, days: usize) -> Self {
        let mut vars = Vec::with_capacity(employees * days * ShiftLabel::COUNT);
        for _ in 0..employees * days * ShiftLabel::COUNT {
            vars.push(model.new_bool());
        }
        let grid = Self {
            employees,
            days,
            vars,
        };
        for e in 0..employees {
            for d in 0..days {
                model.exactly(unit(grid.cell(e, d)), 1, RuleClass::Exclusivity);
            }
        }
        grid
    }

    pub fn employees(&self) -> usize {
        self.employees
    }

    pub fn days(&self) -> usize {
        self.days
    }

    fn offset(&self, employee: usize, day: usize) -> usize {
        debug_assert!(employee < self.employees && day < self.days);
        (employee * self.days + day) * ShiftLabel::COUNT
    }

    pub fn var(&self, employee: usize, day: usize, label: ShiftLabel) -> VarId {
        self.vars[self.offset(employee, day) + label.index()]
    }

    pub fn cell(&self, employee: usize, day: usize) -> [VarId; ShiftLabel::COUNT] {
        ShiftLabel::ALL.map(|label| self.var(employee, day, label))
    }

    pub fn working(&self, employee: usize, day: usize) -> [VarId; 3] {
        ShiftLabel::WORKING.map(|label| self.var(employee, day, label))
    }

    pub fn off(&self, employee: usize, day: usize) -> [VarId; 2] {
        [
            self.var(employee, day, ShiftLabel::Rest),
            self.var(employee, day, ShiftLabel::Leave),
        ]
    }

    /// The label chosen for a cell, or `None` unless exactly one indicator is set.
    pub fn read(&self, values: &[i32], employee: usize, day: usize) -> Option<ShiftLabel> {
        let mut chosen = ShiftLabel::ALL
            .into_iter()
            .filter(|&label| values.get(self.var(employee, day, label).index()) == Some(&1));
        match (chosen.next(), chosen.next()) {
            (Some(label), None) => Some(label),
            _ => None,
        }
    }

    /// Encodes a full label assignment as indicator values, padding any
    /// non-grid variables with zero.
    #[cfg(test)]
    pub(crate) fn encode(
        &self,
        var_count: usize,
        label_of: impl Fn(usize, usize) -> ShiftLabel,
    ) -> Vec<i32> {
        let mut values = vec![0; var_count];
        for e in 0..self.employees {
            for d in 0..self.days {
                values[self.var(e, d, label_of(e, d)).index()] = 1;
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_shape_and_exclusivity() {
        let mut model = Model::new();
        let grid = ShiftGrid::new(&mut model, 3, 4);
        assert_eq!((grid.employees(), grid.days()), (3, 4));
        assert_eq!(model.var_count(), 3 * 4 * ShiftLabel::COUNT);
        assert_eq!(model.constraints_for(RuleClass::Exclusivity).count(), 12);
    }

    #[test]
    fn test_encode_then_read() {
        let mut model = Model::new();
        let grid = ShiftGrid::new(&mut model, 2, 3);
        let values = grid.encode(model.var_count(), |e, d| {
            if e == 0 && d == 1 {
                ShiftLabel::NightShift
            } else {
                ShiftLabel::Rest
            }
        });
        assert!(model.violations(&values).is_empty());
        assert_eq!(grid.read(&values, 0, 1), Some(ShiftLabel::NightShift));
        assert_eq!(grid.read(&values, 1, 2), Some(ShiftLabel::Rest));
    }

    #[test]
    fn test_double_label_is_unreadable() {
        let mut model = Model::new();
        let grid = ShiftGrid::new(&mut model, 1, 1);
        let mut values = grid.encode(model.var_count(), |_, _| ShiftLabel::DayShift);
        values[grid.var(0, 0, ShiftLabel::NightShift).index()] = 1;
        assert_eq!(grid.read(&values, 0, 0), None);
        assert_eq!(model.violations(&values).len(), 1);

        let empty = vec![0; model.var_count()];
        assert_eq!(grid.read(&empty, 0, 0), None);
    }

    #[test]
    fn test_distinct_variables() {
        let mut model = Model::new();
        let grid = ShiftGrid::new(&mut model, 2, 2);
        let mut seen = std::collections::HashSet::new();
        for e in 0..2 {
            for d in 0..2 {
                for var in grid.cell(e, d) {
                    assert!(seen.insert(var), "variable reused: {var:?}");
                }
            }
        }
    }
}
