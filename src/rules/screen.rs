//! Capacity checks that prove infeasibility without a solver.
//!
//! Each check is a necessary condition: passing the screen says nothing about
//! feasibility, but a finding is conclusive.

use serde::Serialize;

use super::{quota_weight, RuleClass};
use crate::calendar::DayClass;
use crate::config::SolveConfig;
use crate::domain::{quarters_to_hours, PlanningInput, ShiftLabel};

/// One conclusive reason the hard rules cannot all hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenFinding {
    pub rule: RuleClass,
    pub employee: Option<usize>,
    pub day: Option<usize>,
    pub detail: String,
}

/// Runs every capacity check and returns all findings.
pub fn screen(input: &PlanningInput, config: &SolveConfig) -> Vec<ScreenFinding> {
    let mut findings = Vec::new();
    let horizon = input.horizon();
    let leave = input.leave();
    let staff = input.employee_count();

    for day in horizon.days() {
        let available = staff - leave.absent_on(day.index);
        let needed =
            (config.coverage.day(day.class).min + config.coverage.night(day.class).min) as usize;
        if available < needed {
            findings.push(ScreenFinding {
                rule: RuleClass::Coverage,
                employee: None,
                day: Some(day.index),
                detail: format!(
                    "{}: {available} employees available, coverage needs {needed}",
                    day.date
                ),
            });
        }
    }

    let leave_weight = ShiftLabel::Leave.nominal_quarters() as i64;
    let best_day = ShiftLabel::ALL
        .into_iter()
        .map(|label| quota_weight(label, DayClass::Weekday, &config.hours))
        .max()
        .unwrap_or(0) as i64;

    for window in horizon.quota_windows(config.hours.block_days) {
        let (low, high) = config.hours.band_for(window.len());
        for employee in input.employees() {
            let on_leave = leave.count_in(employee.index, window.clone()) as i64;
            let leave_quarters = on_leave * leave_weight;

            if !config.relax_hour_quota_upper_only && leave_quarters > high as i64 {
                findings.push(ScreenFinding {
                    rule: RuleClass::HourQuota,
                    employee: Some(employee.index),
                    day: Some(window.start),
                    detail: format!(
                        "{}: leave alone is {} h, above the {} h ceiling",
                        employee.name,
                        quarters_to_hours(leave_quarters),
                        quarters_to_hours(high as i64)
                    ),
                });
            }

            let reachable = leave_quarters + (window.len() as i64 - on_leave) * best_day;
            if reachable < low as i64 {
                findings.push(ScreenFinding {
                    rule: RuleClass::HourQuota,
                    employee: Some(employee.index),
                    day: Some(window.start),
                    detail: format!(
                        "{}: at most {} h reachable, below the {} h floor",
                        employee.name,
                        quarters_to_hours(reachable),
                        quarters_to_hours(low as i64)
                    ),
                });
            }
        }
    }

    findings
}
