//! Constraint compiler.
//!
//! Each rule module adds hard constraints over the shared [`ShiftGrid`]. Rules
//! are independent: any subset compiles, in any order, into a valid model.

mod coverage;
mod hours;
mod leave;
mod rest;
mod screen;
mod short_shift;
mod weekend;

pub use coverage::Coverage;
pub use hours::{quota_weight, HourQuota, SecondaryWindowCap};
pub use leave::LeaveForcing;
pub use rest::{ConsecutiveWorkCap, NightRest, WeeklyRest};
pub use screen::{screen, ScreenFinding};
pub use short_shift::ShortShiftCap;
pub use weekend::{WeekendContiguity, WeekendRotation};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::SolveConfig;
use crate::domain::PlanningInput;
use crate::model::{Model, ShiftGrid};
use crate::objective::{self, FairnessVars};

/// Families of constraints, used to tag constraints and to name suspects
/// when a model turns out infeasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleClass {
    Exclusivity,
    Leave,
    ShortShift,
    Coverage,
    RestAdequacy,
    NightRest,
    ConsecutiveWork,
    WeekendContiguity,
    WeekendRotation,
    HourQuota,
    SecondaryWindow,
    /// Linking constraints of the fairness objective.
    Fairness,
}

impl RuleClass {
    pub const ALL: [RuleClass; 12] = [
        RuleClass::Exclusivity,
        RuleClass::Leave,
        RuleClass::ShortShift,
        RuleClass::Coverage,
        RuleClass::RestAdequacy,
        RuleClass::NightRest,
        RuleClass::ConsecutiveWork,
        RuleClass::WeekendContiguity,
        RuleClass::WeekendRotation,
        RuleClass::HourQuota,
        RuleClass::SecondaryWindow,
        RuleClass::Fairness,
    ];

    /// Business rules a caller could relax; exclusivity and leave are facts.
    pub fn is_relaxable(self) -> bool {
        !matches!(
            self,
            RuleClass::Exclusivity | RuleClass::Leave | RuleClass::Fairness
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleClass::Exclusivity => "exclusivity",
            RuleClass::Leave => "leave",
            RuleClass::ShortShift => "short-shift cap",
            RuleClass::Coverage => "coverage",
            RuleClass::RestAdequacy => "weekly rest",
            RuleClass::NightRest => "rest after night",
            RuleClass::ConsecutiveWork => "consecutive work cap",
            RuleClass::WeekendContiguity => "weekend contiguity",
            RuleClass::WeekendRotation => "weekend rotation",
            RuleClass::HourQuota => "hour quota",
            RuleClass::SecondaryWindow => "fortnight hour cap",
            RuleClass::Fairness => "fairness",
        }
    }
}

impl fmt::Display for RuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a rule may read while adding constraints.
pub struct CompileContext<'a> {
    pub model: &'a mut Model,
    pub grid: &'a ShiftGrid,
    pub input: &'a PlanningInput,
    pub config: &'a SolveConfig,
}

/// A self-contained family of hard constraints.
pub trait Rule: Send + Sync {
    fn class(&self) -> RuleClass;

    fn compile(&self, ctx: &mut CompileContext<'_>);
}

/// The full rule set implied by a configuration.
pub fn standard_rules(config: &SolveConfig) -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = vec![
        // =====================================================================
        // Input facts
        // =====================================================================
        Box::new(LeaveForcing),
        // =====================================================================
        // Operational coverage
        // =====================================================================
        Box::new(Coverage),
        Box::new(ShortShiftCap),
        // =====================================================================
        // Labour rules
        // =====================================================================
        Box::new(WeeklyRest),
        Box::new(NightRest),
        Box::new(ConsecutiveWorkCap),
        // =====================================================================
        // Weekends
        // =====================================================================
        Box::new(WeekendContiguity),
        Box::new(WeekendRotation),
        // =====================================================================
        // Hours
        // =====================================================================
        Box::new(HourQuota),
    ];
    if config.hours.secondary_window.enabled {
        rules.push(Box::new(SecondaryWindowCap));
    }
    rules
}

/// A model ready for the solver, plus the handles needed to read it back.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    pub model: Model,
    pub grid: ShiftGrid,
    /// Present when the fairness objective was built.
    pub fairness: Option<FairnessVars>,
    pub rules: Vec<RuleClass>,
}

/// Compiles the standard rule set and the fairness objective.
pub fn compile(input: &PlanningInput, config: &SolveConfig) -> CompiledModel {
    compile_with(input, config, &standard_rules(config), true)
}

/// Compiles an explicit rule subset. Without `fairness` the model has no
/// objective at all, which makes the first feasible assignment optimal.
pub fn compile_with(
    input: &PlanningInput,
    config: &SolveConfig,
    rules: &[Box<dyn Rule>],
    fairness: bool,
) -> CompiledModel {
    let mut model = Model::new();
    let grid = ShiftGrid::new(&mut model, input.employee_count(), input.day_count());

    let mut ctx = CompileContext {
        model: &mut model,
        grid: &grid,
        input,
        config,
    };
    for rule in rules {
        let before = ctx.model.constraint_count();
        rule.compile(&mut ctx);
        debug!(
            rule = %rule.class(),
            constraints = ctx.model.constraint_count() - before,
            "Compiled rule"
        );
    }

    let fairness = if fairness {
        Some(objective::build(&mut model, &grid, input.horizon()))
    } else {
        model.clear_objective();
        None
    };

    CompiledModel {
        model,
        grid,
        fairness,
        rules: rules.iter().map(|rule| rule.class()).collect(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::domain::ShiftLabel;

    /// Monday 2025-11-03.
    pub fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    pub fn input(employees: usize, days: usize) -> PlanningInput {
        input_with_leave(employees, days, &[])
    }

    pub fn input_with_leave(
        employees: usize,
        days: usize,
        leave: &[(usize, usize)],
    ) -> PlanningInput {
        let names: Vec<String> = (0..employees).map(|i| format!("Employee {}", i + 1)).collect();
        let mut builder = PlanningInput::builder(monday(), days).employees(names.clone());
        for &(e, d) in leave {
            builder = builder.leave(names[e].clone(), [monday() + Duration::days(d as i64)]);
        }
        builder.build().unwrap()
    }

    /// Compiles a single rule over a fresh grid.
    pub fn compile_one(
        rule: &dyn Rule,
        input: &PlanningInput,
        config: &SolveConfig,
    ) -> (Model, ShiftGrid) {
        let mut model = Model::new();
        let grid = ShiftGrid::new(&mut model, input.employee_count(), input.day_count());
        let mut ctx = CompileContext {
            model: &mut model,
            grid: &grid,
            input,
            config,
        };
        rule.compile(&mut ctx);
        (model, grid)
    }

    /// Rule classes broken by a label assignment.
    pub fn broken(
        model: &Model,
        grid: &ShiftGrid,
        label_of: impl Fn(usize, usize) -> ShiftLabel,
    ) -> Vec<RuleClass> {
        let values = grid.encode(model.var_count(), label_of);
        model.violations(&values).iter().map(|c| c.rule).collect()
    }
}
