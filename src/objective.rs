//! Fairness objective: spread of sensitive shift counts across employees.
//!
//! For every category each employee gets a count variable tied to the grid,
//! and a per-category `max - min` spread variable bounds them from both sides.
//! The objective is the sum of spreads, added to whatever relaxation penalties
//! the rules already charged.

use serde::{Deserialize, Serialize};

use crate::calendar::{DayClass, Horizon};
use crate::domain::ShiftLabel;
use crate::model::{Model, ShiftGrid, Terms, VarId};
use crate::rules::RuleClass;

/// Shift categories whose distribution should be even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FairnessCategory {
    WeekdayDay,
    WeekdayNight,
    WeekendDay,
    WeekendNight,
    Short,
}

impl FairnessCategory {
    pub const COUNT: usize = 5;

    pub const ALL: [FairnessCategory; FairnessCategory::COUNT] = [
        FairnessCategory::WeekdayDay,
        FairnessCategory::WeekdayNight,
        FairnessCategory::WeekendDay,
        FairnessCategory::WeekendNight,
        FairnessCategory::Short,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Category of a label on a day of `class`; Friday belongs to the week.
    pub fn of(label: ShiftLabel, class: DayClass) -> Option<Self> {
        match (label, class.is_weekend()) {
            (ShiftLabel::DayShift, false) => Some(FairnessCategory::WeekdayDay),
            (ShiftLabel::NightShift, false) => Some(FairnessCategory::WeekdayNight),
            (ShiftLabel::DayShift, true) => Some(FairnessCategory::WeekendDay),
            (ShiftLabel::NightShift, true) => Some(FairnessCategory::WeekendNight),
            (ShiftLabel::ShortDayShift, _) => Some(FairnessCategory::Short),
            (ShiftLabel::Rest | ShiftLabel::Leave, _) => None,
        }
    }
}

/// Solver-side counters the validator cross-checks against the roster.
#[derive(Debug, Clone)]
pub struct FairnessVars {
    /// `counts[employee][category]`.
    pub counts: Vec<[VarId; FairnessCategory::COUNT]>,
    /// `(max, min)` over employees per category.
    pub extremes: [(VarId, VarId); FairnessCategory::COUNT],
    pub spreads: [VarId; FairnessCategory::COUNT],
}

/// Adds count and spread variables and the objective terms.
pub fn build(model: &mut Model, grid: &ShiftGrid, horizon: &Horizon) -> FairnessVars {
    let days = grid.days() as i32;

    let counts: Vec<[VarId; FairnessCategory::COUNT]> = (0..grid.employees())
        .map(|e| {
            FairnessCategory::ALL.map(|category| {
                let count = model.new_int(0, days);
                let mut link: Terms = vec![(1, count)];
                for day in horizon.days() {
                    for label in ShiftLabel::WORKING {
                        if FairnessCategory::of(label, day.class) == Some(category) {
                            link.push((-1, grid.var(e, day.index, label)));
                        }
                    }
                }
                model.exactly(link, 0, RuleClass::Fairness);
                count
            })
        })
        .collect();

    let extremes = FairnessCategory::ALL.map(|category| {
        let k = category.index();
        let high = model.new_int(0, days);
        let low = model.new_int(0, days);
        for per_employee in &counts {
            model.at_least(vec![(1, high), (-1, per_employee[k])], 0, RuleClass::Fairness);
            model.at_most(vec![(1, low), (-1, per_employee[k])], 0, RuleClass::Fairness);
        }
        (high, low)
    });

    let spreads = extremes.map(|(high, low)| {
        let spread = model.new_int(0, days);
        model.exactly(
            vec![(1, spread), (-1, high), (1, low)],
            0,
            RuleClass::Fairness,
        );
        model.add_objective(1, spread);
        spread
    });

    FairnessVars {
        counts,
        extremes,
        spreads,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::*;

    #[test]
    fn test_categories() {
        use super::FairnessCategory::*;
        assert_eq!(
            FairnessCategory::of(ShiftLabel::DayShift, DayClass::Friday),
            Some(WeekdayDay)
        );
        assert_eq!(
            FairnessCategory::of(ShiftLabel::NightShift, DayClass::Sunday),
            Some(WeekendNight)
        );
        assert_eq!(
            FairnessCategory::of(ShiftLabel::ShortDayShift, DayClass::Weekday),
            Some(Short)
        );
        assert_eq!(
            FairnessCategory::of(ShiftLabel::Leave, DayClass::Weekday),
            None
        );
        for (i, category) in FairnessCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_spread_follows_counts() {
        // Monday start; employee 0 works two weekday days, employee 1 none.
        let input = input(2, 7);
        let mut model = Model::new();
        let grid = ShiftGrid::new(&mut model, 2, 7);
        let fairness = build(&mut model, &grid, input.horizon());

        let mut values = grid.encode(model.var_count(), |e, d| {
            if e == 0 && d < 2 {
                ShiftLabel::DayShift
            } else {
                ShiftLabel::Rest
            }
        });
        let k = FairnessCategory::WeekdayDay.index();
        values[fairness.counts[0][k].index()] = 2;

        // The category maximum is still zero.
        assert!(!model.violations(&values).is_empty());

        // Fill in a consistent high/low/spread triple for the weekday-day category.
        let (high, low) = fairness.extremes[k];
        values[high.index()] = 2;
        values[low.index()] = 0;
        values[fairness.spreads[k].index()] = 2;
        assert!(model.violations(&values).is_empty());
        assert_eq!(model.objective_value(&values), 2);
    }
}
