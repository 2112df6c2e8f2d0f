//! Approved leave is a fact, not a choice.

use super::{CompileContext, Rule, RuleClass};
use crate::domain::ShiftLabel;
use crate::model::unit;

/// `Leave` holds exactly on requested days, in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveForcing;

impl Rule for LeaveForcing {
    fn class(&self) -> RuleClass {
        RuleClass::Leave
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let leave = ctx.input.leave();
        for e in 0..ctx.grid.employees() {
            for d in 0..ctx.grid.days() {
                let var = ctx.grid.var(e, d, ShiftLabel::Leave);
                let forced = i32::from(leave.is_on_leave(e, d));
                ctx.model.exactly(unit([var]), forced, RuleClass::Leave);
            }
        }
    }
}
