//! Rest and fatigue rules.

use super::{CompileContext, Rule, RuleClass};
use crate::domain::ShiftLabel;
use crate::model::{unit, Terms};

/// Minimum `Rest`/`Leave` days in every horizon-native week, optionally with
/// two of them adjacent.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyRest;

impl Rule for WeeklyRest {
    fn class(&self) -> RuleClass {
        RuleClass::RestAdequacy
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let rest = &ctx.config.rest;
        let grid = ctx.grid;

        for week in ctx.input.horizon().weeks() {
            let required = rest.required_in(week.len()) as i32;
            if required == 0 {
                continue;
            }
            for e in 0..grid.employees() {
                let off = unit(week.clone().flat_map(|d| grid.off(e, d)));
                ctx.model.at_least(off, required, RuleClass::RestAdequacy);

                if rest.consecutive_rest_days && required >= 2 {
                    // pair[d] implies both d and d + 1 are off.
                    let mut pairs = Vec::new();
                    for d in week.start..week.end - 1 {
                        let pair = ctx.model.new_bool();
                        for day in [d, d + 1] {
                            let mut terms: Terms = vec![(1, pair)];
                            terms.extend(grid.off(e, day).map(|v| (-1, v)));
                            ctx.model.at_most(terms, 0, RuleClass::RestAdequacy);
                        }
                        pairs.push(pair);
                    }
                    ctx.model.at_least(unit(pairs), 1, RuleClass::RestAdequacy);
                }
            }
        }
    }
}

/// A night shift is followed by a day off, except inside one weekend night
/// unit where the nights run Friday to Sunday.
#[derive(Debug, Clone, Copy, Default)]
pub struct NightRest;

impl Rule for NightRest {
    fn class(&self) -> RuleClass {
        RuleClass::NightRest
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let horizon = ctx.input.horizon();
        let weekends = horizon.weekends();
        let grid = ctx.grid;

        for d in 0..grid.days().saturating_sub(1) {
            if weekends.iter().any(|w| w.links_nights(d, d + 1)) {
                continue;
            }
            for e in 0..grid.employees() {
                let mut terms = unit([grid.var(e, d, ShiftLabel::NightShift)]);
                terms.extend(unit(grid.working(e, d + 1)));
                ctx.model.at_most(terms, 1, RuleClass::NightRest);
            }
        }
    }
}

/// At most `max_consecutive_work_days` working days in any window one day
/// longer than that.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsecutiveWorkCap;

impl Rule for ConsecutiveWorkCap {
    fn class(&self) -> RuleClass {
        RuleClass::ConsecutiveWork
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let cap = ctx.config.rest.max_consecutive_work_days as usize;
        let grid = ctx.grid;

        for window in ctx.input.horizon().sliding(cap + 1) {
            for e in 0..grid.employees() {
                let working = unit(window.clone().flat_map(|d| grid.working(e, d)));
                ctx.model.at_most(working, cap as i32, RuleClass::ConsecutiveWork);
            }
        }
    }
}
