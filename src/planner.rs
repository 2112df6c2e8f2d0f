//! End-to-end planning pipeline.
//!
//! `plan` runs the capacity screen, compiles the rule set, solves, and reads
//! the roster back through the independent validator. Nothing is retried with
//! relaxed rules: every failure goes back to the caller with enough detail to
//! decide that.

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::SolveConfig;
use crate::domain::PlanningInput;
use crate::error::{InfeasibleStage, PlanError};
use crate::roster::{EmployeeSummary, Roster};
use crate::rules::{self, compile_with, standard_rules, Rule, RuleClass};
use crate::solver::{self, CancelFlag, SolveOptions, SolveStatus};
use crate::validation::{self, Issue};

/// A published roster with its derived counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub status: SolveStatus,
    #[serde(skip)]
    pub roster: Roster,
    pub summaries: Vec<EmployeeSummary>,
    /// Findings only allowed because a relax flag is set.
    pub advisories: Vec<Issue>,
    pub objective: Option<i64>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Plans a roster for `input` under `config`.
///
/// `cancel` stops the search cooperatively; a cancelled run that found no
/// assignment yet returns [`PlanError::Cancelled`].
pub fn plan(
    input: &PlanningInput,
    config: &SolveConfig,
    cancel: &CancelFlag,
) -> Result<PlanResult, PlanError> {
    config.validate()?;

    let findings = rules::screen(input, config);
    if !findings.is_empty() {
        let mut suspected: Vec<RuleClass> = findings.iter().map(|f| f.rule).collect();
        suspected.sort();
        suspected.dedup();
        warn!(findings = findings.len(), ?suspected, "Capacity screen failed");
        return Err(PlanError::Infeasible {
            suspected,
            stage: InfeasibleStage::Screen,
            details: findings.into_iter().map(|f| f.detail).collect(),
        });
    }

    if config.relax_hour_quota_upper_only {
        warn!("Hour quota ceiling relaxed; only the floor is enforced");
    }
    if config.hours.secondary_window.enabled && config.relax_secondary_window {
        warn!(
            slack_weight = config.hours.secondary_window.slack_weight,
            "Fortnight hour cap relaxed to a weighted penalty"
        );
    }

    let compiled = rules::compile(input, config);
    info!(
        employees = input.employee_count(),
        days = input.day_count(),
        variables = compiled.model.var_count(),
        constraints = compiled.model.constraint_count(),
        "Model compiled"
    );

    let options = SolveOptions::new(config.time_budget())
        .with_workers(config.worker_count)
        .with_cancel(cancel.clone());
    let outcome = solver::solve(&compiled.model, &options);

    match outcome.status {
        SolveStatus::Infeasible => {
            if let Some(rule) = outcome.rejected {
                warn!(%rule, "Model rejected while posting");
                return Err(PlanError::Infeasible {
                    suspected: vec![rule],
                    stage: InfeasibleStage::Posting,
                    details: Vec::new(),
                });
            }
            let suspected = if config.diagnose_infeasibility {
                diagnose(input, config, || standard_rules(config), cancel)
            } else {
                Vec::new()
            };
            warn!(?suspected, "Search proved the model infeasible");
            return Err(PlanError::Infeasible {
                suspected,
                stage: InfeasibleStage::Search,
                details: Vec::new(),
            });
        }
        SolveStatus::Unknown => {
            if outcome.cancelled || cancel.is_cancelled() {
                info!("Planning cancelled");
                return Err(PlanError::Cancelled);
            }
            warn!(elapsed_ms = outcome.elapsed.as_millis() as u64, "Time budget exhausted");
            return Err(PlanError::Unknown {
                elapsed: outcome.elapsed,
            });
        }
        SolveStatus::Optimal | SolveStatus::Feasible => {}
    }

    let Some(values) = outcome.values() else {
        return Err(PlanError::Unknown {
            elapsed: outcome.elapsed,
        });
    };
    let roster = Roster::extract(input, &compiled.grid, values);

    let mut issues = validation::validate(&roster, input, config);
    if let Some(fairness) = &compiled.fairness {
        issues.extend(validation::check_consistency(&roster, fairness, &outcome));
    }
    let (violations, advisories): (Vec<Issue>, Vec<Issue>) =
        issues.into_iter().partition(Issue::is_violation);
    if !violations.is_empty() {
        error!(
            issues = violations.len(),
            first = %violations[0],
            "Solved roster failed independent validation"
        );
        return Err(PlanError::Inconsistent {
            issues: violations,
            roster: Box::new(roster),
        });
    }

    info!(
        status = outcome.status.as_str(),
        objective = ?outcome.objective,
        advisories = advisories.len(),
        "Roster published"
    );
    Ok(PlanResult {
        status: outcome.status,
        summaries: roster.summaries(&config.hours),
        roster,
        advisories,
        objective: outcome.objective,
        elapsed: outcome.elapsed,
    })
}

/// Names the relaxable rule classes whose removal alone makes the model
/// feasible. Each probe drops the objective and runs under the diagnosis
/// budget; probes that time out do not implicate their class.
pub fn diagnose(
    input: &PlanningInput,
    config: &SolveConfig,
    rules: impl Fn() -> Vec<Box<dyn Rule>>,
    cancel: &CancelFlag,
) -> Vec<RuleClass> {
    let mut classes: Vec<RuleClass> = Vec::new();
    for class in rules().iter().map(|rule| rule.class()) {
        if class.is_relaxable() && !classes.contains(&class) {
            classes.push(class);
        }
    }

    let options = SolveOptions::new(config.diagnosis_budget()).with_cancel(cancel.clone());
    let mut suspected = Vec::new();
    for class in classes {
        if cancel.is_cancelled() {
            break;
        }
        let subset: Vec<Box<dyn Rule>> = rules()
            .into_iter()
            .filter(|rule| rule.class() != class)
            .collect();
        let compiled = compile_with(input, config, &subset, false);
        let outcome = solver::solve(&compiled.model, &options);
        info!(
            rule = %class,
            status = outcome.status.as_str(),
            "Diagnosis probe finished"
        );
        if outcome.status.has_solution() {
            suspected.push(class);
        }
    }
    suspected
}
