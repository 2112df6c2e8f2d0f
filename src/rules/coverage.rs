//! Daily staffing bounds.

use super::{CompileContext, Rule, RuleClass};
use crate::config::Bounds;
use crate::domain::ShiftLabel;
use crate::model::{unit, Model, Terms};

/// Day-side and night-side head counts per day.
///
/// On Monday to Friday a short shift counts toward day coverage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coverage;

impl Rule for Coverage {
    fn class(&self) -> RuleClass {
        RuleClass::Coverage
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let coverage = &ctx.config.coverage;
        let grid = ctx.grid;
        let staff = 0..grid.employees();

        for day in ctx.input.horizon().days() {
            let d = day.index;
            let day_side: Terms = if day.class.is_workweek() {
                staff
                    .clone()
                    .flat_map(|e| {
                        [
                            (1, grid.var(e, d, ShiftLabel::DayShift)),
                            (1, grid.var(e, d, ShiftLabel::ShortDayShift)),
                        ]
                    })
                    .collect()
            } else {
                unit(staff.clone().map(|e| grid.var(e, d, ShiftLabel::DayShift)))
            };
            bound(ctx.model, day_side, coverage.day(day.class));

            let night_side = unit(staff.clone().map(|e| grid.var(e, d, ShiftLabel::NightShift)));
            bound(ctx.model, night_side, coverage.night(day.class));
        }
    }
}

fn bound(model: &mut Model, terms: Terms, bounds: Bounds) {
    if bounds.min == bounds.max {
        model.exactly(terms, bounds.min as i32, RuleClass::Coverage);
    } else {
        model.at_least(terms.clone(), bounds.min as i32, RuleClass::Coverage);
        model.at_most(terms, bounds.max as i32, RuleClass::Coverage);
    }
}
