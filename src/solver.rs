//! Solve orchestrator.
//!
//! Translates a compiled [`Model`] into pumpkin-solver, searches under a time
//! budget and classifies the verdict. With more than one worker a portfolio of
//! independent solver instances runs on scoped threads; the first worker to
//! prove optimality or infeasibility stops the rest.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pumpkin_solver::constraints as cp;
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::results::{OptimisationResult, ProblemSolution, SolutionReference};
use pumpkin_solver::termination::{TerminationCondition, TimeBudget};
use pumpkin_solver::variables::TransformableVariable;
use pumpkin_solver::Solver;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{Comparison, LinearConstraint, Model, Terms, VarId};
use crate::rules::RuleClass;

/// Verdict of one solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Objective proven minimal.
    Optimal,
    /// A valid assignment, optimality not proven within the budget.
    Feasible,
    /// No assignment satisfies the hard constraints.
    Infeasible,
    /// Budget exhausted before any assignment was found.
    Unknown,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    /// ```
    /// use shift_roster::solver::SolveStatus;
    ///
    /// assert_eq!(SolveStatus::Optimal.as_str(), "OPTIMAL");
    /// assert_eq!(SolveStatus::Unknown.as_str(), "UNKNOWN");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Cooperative cancellation shared between a caller and a running solve.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Search limits for one solve call.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub time_budget: Duration,
    pub workers: usize,
    pub cancel: CancelFlag,
}

impl SolveOptions {
    pub fn new(time_budget: Duration) -> Self {
        Self {
            time_budget,
            workers: 1,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Result of a solve call: the verdict plus a reader over variable values.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    values: Option<Vec<i32>>,
    pub objective: Option<i64>,
    pub elapsed: Duration,
    /// The rule whose constraint the solver rejected while posting.
    pub rejected: Option<RuleClass>,
    pub cancelled: bool,
}

impl SolveOutcome {
    fn empty(status: SolveStatus, elapsed: Duration) -> Self {
        Self {
            status,
            values: None,
            objective: None,
            elapsed,
            rejected: None,
            cancelled: false,
        }
    }

    /// Value of `var` in the returned assignment.
    pub fn value(&self, var: VarId) -> Option<i32> {
        self.values.as_ref()?.get(var.index()).copied()
    }

    /// The full assignment, indexed by [`VarId::index`].
    pub fn values(&self) -> Option<&[i32]> {
        self.values.as_deref()
    }
}

/// Stops on the wall-clock budget, when another worker has finished, or when
/// the caller cancels.
struct PortfolioTermination<'a> {
    budget: TimeBudget,
    finished: &'a AtomicBool,
    cancel: &'a CancelFlag,
}

impl TerminationCondition for PortfolioTermination<'_> {
    fn should_stop(&mut self) -> bool {
        self.budget.should_stop()
            || self.finished.load(Ordering::Relaxed)
            || self.cancel.is_cancelled()
    }
}

/// Solves `model` within the limits of `options`.
pub fn solve(model: &Model, options: &SolveOptions) -> SolveOutcome {
    let started = Instant::now();
    let workers = options.workers.max(1);
    let finished = AtomicBool::new(false);

    let mut outcomes: Vec<SolveOutcome> = if workers == 1 {
        vec![run_worker(model, 0, 1, options, &finished)]
    } else {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let finished = &finished;
                    scope.spawn(move || run_worker(model, worker, workers, options, finished))
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().ok())
                .collect()
        })
    };

    let mut merged = merge(&mut outcomes);
    merged.elapsed = started.elapsed();
    merged.cancelled = !merged.status.has_solution() && options.cancel.is_cancelled();
    info!(
        status = merged.status.as_str(),
        objective = ?merged.objective,
        workers,
        elapsed_ms = merged.elapsed.as_millis() as u64,
        "Solve finished"
    );
    merged
}

/// Any proof of infeasibility wins, then any proof of optimality, then the
/// best feasible assignment.
fn merge(outcomes: &mut Vec<SolveOutcome>) -> SolveOutcome {
    if let Some(pos) = outcomes
        .iter()
        .position(|o| o.status == SolveStatus::Infeasible)
    {
        return outcomes.swap_remove(pos);
    }
    if let Some(pos) = outcomes.iter().position(|o| o.status == SolveStatus::Optimal) {
        return outcomes.swap_remove(pos);
    }
    let best = outcomes
        .iter()
        .enumerate()
        .filter(|(_, o)| o.status == SolveStatus::Feasible)
        .min_by_key(|(_, o)| o.objective.unwrap_or(i64::MAX))
        .map(|(pos, _)| pos);
    match best {
        Some(pos) => outcomes.swap_remove(pos),
        None => SolveOutcome::empty(SolveStatus::Unknown, Duration::ZERO),
    }
}

fn run_worker(
    model: &Model,
    worker: usize,
    workers: usize,
    options: &SolveOptions,
    finished: &AtomicBool,
) -> SolveOutcome {
    let started = Instant::now();
    let mut solver = Solver::default();

    // Rotating creation order gives each worker a different default branching order.
    let count = model.var_count();
    let offset = if count == 0 { 0 } else { worker * count / workers };
    let mut created: Vec<_> = (0..count)
        .map(|i| (i + offset) % count)
        .map(|i| {
            let domain = model.domains()[i];
            (i, solver.new_bounded_integer(domain.lb, domain.ub))
        })
        .collect();
    created.sort_by_key(|&(i, _)| i);
    let vars: Vec<_> = created.into_iter().map(|(_, var)| var).collect();

    let mut tags = HashMap::new();
    for constraint in model.constraints() {
        let tag = *tags
            .entry(constraint.rule)
            .or_insert_with(|| solver.new_constraint_tag());
        let rejected = as_greater_or_equal(constraint).into_iter().any(|(terms, rhs)| {
            let views: Vec<_> = terms
                .iter()
                .map(|&(coef, var)| vars[var.index()].scaled(coef))
                .collect();
            solver
                .add_constraint(cp::greater_than_or_equals(views, rhs, tag))
                .post()
                .is_err()
        });
        if rejected {
            debug!(worker, rule = %constraint.rule, "Constraint rejected while posting");
            finished.store(true, Ordering::Relaxed);
            let mut outcome = SolveOutcome::empty(SolveStatus::Infeasible, started.elapsed());
            outcome.rejected = Some(constraint.rule);
            return outcome;
        }
    }

    // objective == sum(weight * var); a constant zero when the model has none.
    let upper = model.objective_upper_bound().clamp(0, i32::MAX as i64) as i32;
    let objective = solver.new_bounded_integer(0, upper);
    let objective_tag = solver.new_constraint_tag();
    for sign in [1, -1] {
        let mut views = vec![objective.scaled(sign)];
        views.extend(
            model
                .objective()
                .iter()
                .map(|&(weight, var)| vars[var.index()].scaled(-sign * weight)),
        );
        if solver
            .add_constraint(cp::greater_than_or_equals(views, 0, objective_tag))
            .post()
            .is_err()
        {
            finished.store(true, Ordering::Relaxed);
            return SolveOutcome::empty(SolveStatus::Infeasible, started.elapsed());
        }
    }

    let mut brancher = solver.default_brancher();
    let mut termination = PortfolioTermination {
        budget: TimeBudget::starting_now(options.time_budget),
        finished,
        cancel: &options.cancel,
    };

    fn noop_callback<B>(_: &Solver, _: SolutionReference, _: &B) {}
    let result = solver.optimise(
        &mut brancher,
        &mut termination,
        LinearSatUnsat::new(OptimisationDirection::Minimise, objective, noop_callback),
    );

    let (status, values, value) = match result {
        OptimisationResult::Optimal(solution) => {
            let values: Vec<i32> = vars.iter().map(|&v| solution.get_integer_value(v)).collect();
            let value = solution.get_integer_value(objective) as i64;
            (SolveStatus::Optimal, Some(values), Some(value))
        }
        OptimisationResult::Satisfiable(solution) => {
            let values: Vec<i32> = vars.iter().map(|&v| solution.get_integer_value(v)).collect();
            let value = solution.get_integer_value(objective) as i64;
            (SolveStatus::Feasible, Some(values), Some(value))
        }
        OptimisationResult::Unsatisfiable => (SolveStatus::Infeasible, None, None),
        OptimisationResult::Unknown => (SolveStatus::Unknown, None, None),
    };
    if matches!(status, SolveStatus::Optimal | SolveStatus::Infeasible) {
        finished.store(true, Ordering::Relaxed);
    }
    debug!(
        worker,
        status = status.as_str(),
        objective = ?value,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Worker finished"
    );

    SolveOutcome {
        status,
        values,
        objective: value,
        elapsed: started.elapsed(),
        rejected: None,
        cancelled: false,
    }
}

/// Rewrites a constraint as one or two `sum >= rhs` rows.
fn as_greater_or_equal(constraint: &LinearConstraint) -> Vec<(Terms, i32)> {
    let negated: Terms = constraint
        .terms
        .iter()
        .map(|&(coef, var)| (-coef, var))
        .collect();
    match constraint.comparison {
        Comparison::AtLeast => vec![(constraint.terms.clone(), constraint.rhs)],
        Comparison::AtMost => vec![(negated, -constraint.rhs)],
        Comparison::Exactly => vec![
            (constraint.terms.clone(), constraint.rhs),
            (negated, -constraint.rhs),
        ],
    }
}
