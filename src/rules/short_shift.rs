//! Short shifts are a scarce weekday accommodation.

use super::{CompileContext, Rule, RuleClass};
use crate::domain::ShiftLabel;
use crate::model::unit;

/// Per-employee cap per rolling quota window, a global cap per weekday, and none at
/// all on Saturday or Sunday.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortShiftCap;

impl Rule for ShortShiftCap {
    fn class(&self) -> RuleClass {
        RuleClass::ShortShift
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let rules = &ctx.config.short_shift;
        let horizon = ctx.input.horizon();
        let grid = ctx.grid;

        for e in 0..grid.employees() {
            for window in horizon.quota_windows(ctx.config.hours.block_days) {
                let shorts = unit(window.map(|d| grid.var(e, d, ShiftLabel::ShortDayShift)));
                ctx.model
                    .at_most(shorts, rules.per_employee_per_block as i32, RuleClass::ShortShift);
            }
        }

        for day in horizon.days() {
            let shorts = unit(
                (0..grid.employees()).map(|e| grid.var(e, day.index, ShiftLabel::ShortDayShift)),
            );
            let cap = if day.class.is_workweek() {
                rules.per_weekday as i32
            } else {
                0
            };
            ctx.model.at_most(shorts, cap, RuleClass::ShortShift);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolveConfig;
    use crate::rules::test_support::*;

    fn compiled(employees: usize, days: usize) -> (crate::model::Model, crate::model::ShiftGrid) {
        let input = input(employees, days);
        compile_one(&ShortShiftCap, &input, &SolveConfig::default())
    }

    #[test]
    fn test_one_short_shift_is_allowed() {
        let (model, grid) = compiled(2, 7);
        let ok = broken(&model, &grid, |e, d| {
            if (e, d) == (0, 2) {
                ShiftLabel::ShortDayShift
            } else {
                ShiftLabel::Rest
            }
        });
        assert!(ok.is_empty());
    }

    #[test]
    fn test_two_short_shifts_on_one_weekday() {
        let (model, grid) = compiled(2, 7);
        let both = broken(&model, &grid, |_, d| {
            if d == 2 {
                ShiftLabel::ShortDayShift
            } else {
                ShiftLabel::Rest
            }
        });
        assert_eq!(both, vec![RuleClass::ShortShift]);
    }

    #[test]
    fn test_second_short_shift_in_block() {
        let (model, grid) = compiled(1, 7);
        let twice = broken(&model, &grid, |_, d| {
            if d == 0 || d == 3 {
                ShiftLabel::ShortDayShift
            } else {
                ShiftLabel::Rest
            }
        });
        assert_eq!(twice, vec![RuleClass::ShortShift]);
    }

    #[test]
    fn test_cap_rolls_across_block_boundaries() {
        // Days 38 and 44 sit in different 42-day blocks but share a window.
        let (model, grid) = compiled(1, 84);
        let straddling = broken(&model, &grid, |_, d| {
            if d == 38 || d == 44 {
                ShiftLabel::ShortDayShift
            } else {
                ShiftLabel::Rest
            }
        });
        assert!(!straddling.is_empty());
        assert!(straddling.iter().all(|rule| *rule == RuleClass::ShortShift));

        let apart = broken(&model, &grid, |_, d| {
            if d == 1 || d == 44 {
                ShiftLabel::ShortDayShift
            } else {
                ShiftLabel::Rest
            }
        });
        assert!(apart.is_empty());
    }

    #[test]
    fn test_short_shift_on_saturday() {
        // Day 5 is a Saturday for a Monday start.
        let (model, grid) = compiled(1, 7);
        let weekend = broken(&model, &grid, |_, d| {
            if d == 5 {
                ShiftLabel::ShortDayShift
            } else {
                ShiftLabel::Rest
            }
        });
        assert_eq!(weekend, vec![RuleClass::ShortShift]);
    }
}
