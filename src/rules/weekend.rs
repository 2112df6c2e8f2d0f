//! Weekend blocks and how often an employee takes one.

use super::{CompileContext, Rule, RuleClass};
use crate::domain::ShiftLabel;
use crate::model::{Model, VarId};

/// Weekend day shifts cover both Saturday and Sunday; weekend nights cover
/// Friday through Sunday. Partial blocks are invalid.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendContiguity;

impl Rule for WeekendContiguity {
    fn class(&self) -> RuleClass {
        RuleClass::WeekendContiguity
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let grid = ctx.grid;
        for weekend in ctx.input.horizon().weekends() {
            for e in 0..grid.employees() {
                let days: Vec<VarId> = weekend
                    .day_unit()
                    .into_iter()
                    .map(|d| grid.var(e, d, ShiftLabel::DayShift))
                    .collect();
                chain(ctx.model, &days);

                let nights: Vec<VarId> = weekend
                    .night_unit()
                    .into_iter()
                    .map(|d| grid.var(e, d, ShiftLabel::NightShift))
                    .collect();
                chain(ctx.model, &nights);
            }
        }
    }
}

fn chain(model: &mut Model, vars: &[VarId]) {
    for pair in vars.windows(2) {
        model.equivalent(pair[0], pair[1], RuleClass::WeekendContiguity);
    }
}

/// Each employee takes at most `ceil(weekends / period)` weekend blocks,
/// day and night blocks together.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendRotation;

impl WeekendRotation {
    /// Cap on weekend blocks per employee for `weekends` weekends.
    pub fn cap(weekends: usize, period: u32) -> usize {
        weekends.div_ceil(period.max(1) as usize)
    }
}

impl Rule for WeekendRotation {
    fn class(&self) -> RuleClass {
        RuleClass::WeekendRotation
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let grid = ctx.grid;
        let weekends = ctx.input.horizon().weekends();
        if weekends.is_empty() {
            return;
        }
        let cap = Self::cap(weekends.len(), ctx.config.weekend_rotation_period) as i32;

        for e in 0..grid.employees() {
            let mut taken = Vec::with_capacity(weekends.len() * 2);
            for weekend in &weekends {
                let units = [
                    (weekend.day_unit(), ShiftLabel::DayShift),
                    (weekend.night_unit(), ShiftLabel::NightShift),
                ];
                for (days, label) in units {
                    let vars: Vec<VarId> = days.into_iter().map(|d| grid.var(e, d, label)).collect();
                    taken.push(indicator(ctx.model, &vars));
                }
            }
            ctx.model.at_most(
                taken.into_iter().map(|var| (1, var)).collect(),
                cap,
                RuleClass::WeekendRotation,
            );
        }
    }
}

/// A fresh boolean equal to the disjunction of `vars`.
fn indicator(model: &mut Model, vars: &[VarId]) -> VarId {
    let any = model.new_bool();
    for &var in vars {
        model.at_most(vec![(1, var), (-1, any)], 0, RuleClass::WeekendRotation);
    }
    let mut terms = vec![(1, any)];
    terms.extend(vars.iter().map(|&var| (-1, var)));
    model.at_most(terms, 0, RuleClass::WeekendRotation);
    any
}
