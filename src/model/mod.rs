//! Solver-agnostic linear model.
//!
//! Rule modules add integer-coefficient linear constraints over bounded
//! integer variables; the solver backend translates the finished model.
//! Keeping this layer free of solver types lets each rule be checked against
//! hand-built assignments with [`Model::violations`].

mod grid;

pub use grid::ShiftGrid;

use crate::rules::RuleClass;

/// Handle to a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Inclusive integer domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub lb: i32,
    pub ub: i32,
}

impl Domain {
    pub fn contains(&self, value: i32) -> bool {
        (self.lb..=self.ub).contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AtLeast,
    AtMost,
    Exactly,
}

/// Weighted sum of variables.
pub type Terms = Vec<(i32, VarId)>;

/// Unit-weight terms.
pub fn unit(vars: impl IntoIterator<Item = VarId>) -> Terms {
    vars.into_iter().map(|var| (1, var)).collect()
}

/// `sum(terms) <cmp> rhs`, tagged with the rule that added it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub terms: Terms,
    pub comparison: Comparison,
    pub rhs: i32,
    pub rule: RuleClass,
}

impl LinearConstraint {
    pub fn lhs(&self, values: &[i32]) -> i64 {
        self.terms
            .iter()
            .map(|&(coef, var)| coef as i64 * values[var.index()] as i64)
            .sum()
    }

    pub fn is_satisfied(&self, values: &[i32]) -> bool {
        let lhs = self.lhs(values);
        let rhs = self.rhs as i64;
        match self.comparison {
            Comparison::AtLeast => lhs >= rhs,
            Comparison::AtMost => lhs <= rhs,
            Comparison::Exactly => lhs == rhs,
        }
    }
}

/// A complete model: variables, hard constraints and a minimisation objective.
#[derive(Debug, Clone, Default)]
pub struct Model {
    domains: Vec<Domain>,
    constraints: Vec<LinearConstraint>,
    objective: Terms,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool(&mut self) -> VarId {
        self.new_int(0, 1)
    }

    pub fn new_int(&mut self, lb: i32, ub: i32) -> VarId {
        self.domains.push(Domain { lb, ub });
        VarId(self.domains.len() - 1)
    }

    pub fn add(&mut self, terms: Terms, comparison: Comparison, rhs: i32, rule: RuleClass) {
        self.constraints.push(LinearConstraint {
            terms,
            comparison,
            rhs,
            rule,
        });
    }

    pub fn at_least(&mut self, terms: Terms, rhs: i32, rule: RuleClass) {
        self.add(terms, Comparison::AtLeast, rhs, rule);
    }

    pub fn at_most(&mut self, terms: Terms, rhs: i32, rule: RuleClass) {
        self.add(terms, Comparison::AtMost, rhs, rule);
    }

    pub fn exactly(&mut self, terms: Terms, rhs: i32, rule: RuleClass) {
        self.add(terms, Comparison::Exactly, rhs, rule);
    }

    /// `a == b`, the linear form of a bidirectional implication between booleans.
    pub fn equivalent(&mut self, a: VarId, b: VarId, rule: RuleClass) {
        self.exactly(vec![(1, a), (-1, b)], 0, rule);
    }

    pub fn add_objective(&mut self, weight: i32, var: VarId) {
        self.objective.push((weight, var));
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn domain(&self, var: VarId) -> Domain {
        self.domains[var.index()]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &[(i32, VarId)] {
        &self.objective
    }

    pub fn clear_objective(&mut self) {
        self.objective.clear();
    }

    pub fn var_count(&self) -> usize {
        self.domains.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints_for(&self, rule: RuleClass) -> impl Iterator<Item = &LinearConstraint> {
        self.constraints.iter().filter(move |c| c.rule == rule)
    }

    /// Largest value the objective can take under the variable domains.
    pub fn objective_upper_bound(&self) -> i64 {
        self.objective
            .iter()
            .map(|&(w, var)| {
                let d = self.domain(var);
                (w as i64 * d.lb as i64).max(w as i64 * d.ub as i64)
            })
            .sum()
    }

    pub fn objective_value(&self, values: &[i32]) -> i64 {
        self.objective
            .iter()
            .map(|&(w, var)| w as i64 * values[var.index()] as i64)
            .sum()
    }

    /// Constraints broken by a full assignment, including out-of-domain values.
    /// An assignment of the wrong size breaks every constraint.
    pub fn violations<'a>(&'a self, values: &[i32]) -> Vec<&'a LinearConstraint> {
        if values.len() != self.var_count() {
            return self.constraints.iter().collect();
        }
        self.constraints
            .iter()
            .filter(|c| {
                !c.is_satisfied(values)
                    || c.terms
                        .iter()
                        .any(|&(_, var)| !self.domain(var).contains(values[var.index()]))
            })
            .collect()
    }
}
