//! Independent roster validation.
//!
//! Every check here recomputes its figures from the [`Roster`] alone. A solver
//! roster that fails a check points at a model bug rather than a scheduling
//! conflict, so the planner refuses to publish it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{Bounds, SolveConfig};
use crate::domain::{PlanningInput, ShiftLabel};
use crate::objective::{FairnessCategory, FairnessVars};
use crate::roster::{Roster, Slot};
use crate::rules::{RuleClass, WeekendRotation};
use crate::solver::SolveOutcome;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    Unassigned,
    LeaveNotHonoured,
    UnrequestedLeave,
    ShortShiftCap,
    ShortShiftOnWeekend,
    DayCoverage,
    NightCoverage,
    WeeklyRest,
    RestPair,
    NightRest,
    ConsecutiveWork,
    WeekendContiguity,
    WeekendRotation,
    HoursBelowBand,
    HoursAboveBand,
    SecondaryWindow,
    /// Solver counters disagree with the recomputed roster.
    CounterMismatch,
}

impl IssueKind {
    /// The rule family that should have prevented this issue.
    pub fn rule(self) -> RuleClass {
        match self {
            IssueKind::Unassigned => RuleClass::Exclusivity,
            IssueKind::LeaveNotHonoured | IssueKind::UnrequestedLeave => RuleClass::Leave,
            IssueKind::ShortShiftCap | IssueKind::ShortShiftOnWeekend => RuleClass::ShortShift,
            IssueKind::DayCoverage | IssueKind::NightCoverage => RuleClass::Coverage,
            IssueKind::WeeklyRest | IssueKind::RestPair => RuleClass::RestAdequacy,
            IssueKind::NightRest => RuleClass::NightRest,
            IssueKind::ConsecutiveWork => RuleClass::ConsecutiveWork,
            IssueKind::WeekendContiguity => RuleClass::WeekendContiguity,
            IssueKind::WeekendRotation => RuleClass::WeekendRotation,
            IssueKind::HoursBelowBand | IssueKind::HoursAboveBand => RuleClass::HourQuota,
            IssueKind::SecondaryWindow => RuleClass::SecondaryWindow,
            IssueKind::CounterMismatch => RuleClass::Fairness,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// A hard rule is broken.
    Violation,
    /// Outside the nominal rule, but allowed by a relax flag.
    Advisory,
}

/// One residual finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: IssueKind,
    pub employee: Option<usize>,
    /// First day of the offending day, week, window or block.
    pub day: Option<usize>,
    pub observed: i64,
    pub severity: Severity,
}

impl Issue {
    fn violation(kind: IssueKind, employee: Option<usize>, day: Option<usize>, observed: i64) -> Self {
        Self {
            kind,
            employee,
            day,
            observed,
            severity: Severity::Violation,
        }
    }

    fn advisory(kind: IssueKind, employee: Option<usize>, day: Option<usize>, observed: i64) -> Self {
        Self {
            severity: Severity::Advisory,
            ..Self::violation(kind, employee, day, observed)
        }
    }

    pub fn is_violation(&self) -> bool {
        self.severity == Severity::Violation
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(e) = self.employee {
            write!(f, " employee={e}")?;
        }
        if let Some(d) = self.day {
            write!(f, " day={d}")?;
        }
        write!(f, " observed={}", self.observed)
    }
}

/// Checks every hard rule against a roster.
pub fn validate(roster: &Roster, input: &PlanningInput, config: &SolveConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    check_cells(roster, input, &mut issues);
    check_short_shifts(roster, config, &mut issues);
    check_coverage(roster, config, &mut issues);
    check_rest(roster, config, &mut issues);
    check_weekends(roster, config, &mut issues);
    check_hours(roster, config, &mut issues);
    issues
}

fn check_cells(roster: &Roster, input: &PlanningInput, issues: &mut Vec<Issue>) {
    let leave = input.leave();
    for e in 0..roster.employee_count() {
        for d in 0..roster.day_count() {
            let slot = roster.slot(e, d);
            let requested = leave.is_on_leave(e, d);
            if slot == Slot::Unassigned {
                issues.push(Issue::violation(IssueKind::Unassigned, Some(e), Some(d), 0));
            } else if requested && !slot.is(ShiftLabel::Leave) {
                issues.push(Issue::violation(IssueKind::LeaveNotHonoured, Some(e), Some(d), 0));
            } else if !requested && slot.is(ShiftLabel::Leave) {
                issues.push(Issue::violation(IssueKind::UnrequestedLeave, Some(e), Some(d), 1));
            }
        }
    }
}

fn check_short_shifts(roster: &Roster, config: &SolveConfig, issues: &mut Vec<Issue>) {
    let horizon = roster.horizon();
    let limits = &config.short_shift;
    for e in 0..roster.employee_count() {
        let mut over = false;
        for window in horizon.quota_windows(config.hours.block_days) {
            let start = window.start;
            let count = window
                .filter(|&d| roster.slot(e, d).is(ShiftLabel::ShortDayShift))
                .count() as i64;
            let exceeded = count > limits.per_employee_per_block as i64;
            if exceeded && !over {
                issues.push(Issue::violation(IssueKind::ShortShiftCap, Some(e), Some(start), count));
            }
            over = exceeded;
        }
    }
    for day in horizon.days() {
        let count = roster.count_on(day.index, ShiftLabel::ShortDayShift) as i64;
        if count == 0 {
            continue;
        }
        if day.class.is_weekend() {
            issues.push(Issue::violation(IssueKind::ShortShiftOnWeekend, None, Some(day.index), count));
        } else if count > limits.per_weekday as i64 {
            issues.push(Issue::violation(IssueKind::ShortShiftCap, None, Some(day.index), count));
        }
    }
}

fn check_coverage(roster: &Roster, config: &SolveConfig, issues: &mut Vec<Issue>) {
    let outside = |count: usize, bounds: Bounds| !bounds.contains(count as u32);
    for day in roster.horizon().days() {
        let d = day.index;
        let mut day_side = roster.count_on(d, ShiftLabel::DayShift);
        if day.class.is_workweek() {
            day_side += roster.count_on(d, ShiftLabel::ShortDayShift);
        }
        if outside(day_side, config.coverage.day(day.class)) {
            issues.push(Issue::violation(IssueKind::DayCoverage, None, Some(d), day_side as i64));
        }
        let nights = roster.count_on(d, ShiftLabel::NightShift);
        if outside(nights, config.coverage.night(day.class)) {
            issues.push(Issue::violation(IssueKind::NightCoverage, None, Some(d), nights as i64));
        }
    }
}

fn check_rest(roster: &Roster, config: &SolveConfig, issues: &mut Vec<Issue>) {
    let horizon = roster.horizon();
    let rest = &config.rest;
    let weekends = horizon.weekends();
    let cap = rest.max_consecutive_work_days as usize;

    for e in 0..roster.employee_count() {
        let row = roster.row(e);

        for week in horizon.weeks() {
            let required = rest.required_in(week.len()) as i64;
            let off = row[week.clone()].iter().filter(|slot| slot.is_off()).count() as i64;
            if off < required {
                issues.push(Issue::violation(IssueKind::WeeklyRest, Some(e), Some(week.start), off));
            } else if rest.consecutive_rest_days && required >= 2 {
                let paired = row[week.clone()]
                    .windows(2)
                    .any(|pair| pair[0].is_off() && pair[1].is_off());
                if !paired {
                    issues.push(Issue::violation(IssueKind::RestPair, Some(e), Some(week.start), off));
                }
            }
        }

        for d in 0..row.len().saturating_sub(1) {
            if weekends.iter().any(|w| w.links_nights(d, d + 1)) {
                continue;
            }
            if row[d].is(ShiftLabel::NightShift) && row[d + 1].is_working() {
                issues.push(Issue::violation(IssueKind::NightRest, Some(e), Some(d), 1));
            }
        }

        for window in horizon.sliding(cap + 1) {
            let worked = row[window.clone()].iter().filter(|slot| slot.is_working()).count();
            if worked > cap {
                issues.push(Issue::violation(
                    IssueKind::ConsecutiveWork,
                    Some(e),
                    Some(window.start),
                    worked as i64,
                ));
            }
        }
    }
}

fn check_weekends(roster: &Roster, config: &SolveConfig, issues: &mut Vec<Issue>) {
    let weekends = roster.horizon().weekends();
    let cap = WeekendRotation::cap(weekends.len(), config.weekend_rotation_period) as i64;

    for e in 0..roster.employee_count() {
        let mut taken = 0;
        for weekend in &weekends {
            let units = [
                (weekend.day_unit(), ShiftLabel::DayShift),
                (weekend.night_unit(), ShiftLabel::NightShift),
            ];
            for (days, label) in units {
                let held = days.iter().filter(|&&d| roster.slot(e, d).is(label)).count();
                if held > 0 {
                    taken += 1;
                }
                if held > 0 && held < days.len() {
                    issues.push(Issue::violation(
                        IssueKind::WeekendContiguity,
                        Some(e),
                        days.first().copied(),
                        held as i64,
                    ));
                }
            }
        }
        if taken > cap {
            issues.push(Issue::violation(IssueKind::WeekendRotation, Some(e), None, taken));
        }
    }
}

fn check_hours(roster: &Roster, config: &SolveConfig, issues: &mut Vec<Issue>) {
    let hours = &config.hours;
    let horizon = roster.horizon();

    for e in 0..roster.employee_count() {
        // Overlapping windows out of band together report once, at the first.
        let mut previous = None;
        for window in horizon.quota_windows(hours.block_days) {
            let (low, high) = hours.band_for(window.len());
            let start = window.start;
            let total = roster.quota_quarters(e, window, hours);
            let kind = if total < low as i64 {
                Some(IssueKind::HoursBelowBand)
            } else if total > high as i64 {
                Some(IssueKind::HoursAboveBand)
            } else {
                None
            };
            if let Some(kind) = kind.filter(|kind| previous != Some(*kind)) {
                let issue = if kind == IssueKind::HoursAboveBand && config.relax_hour_quota_upper_only {
                    Issue::advisory(kind, Some(e), Some(start), total)
                } else {
                    Issue::violation(kind, Some(e), Some(start), total)
                };
                issues.push(issue);
            }
            previous = kind;
        }

        if hours.secondary_window.enabled {
            for span in horizon.fortnights() {
                let start = span.start;
                let total = roster.quota_quarters(e, span, hours);
                if total > hours.secondary_window.cap_quarters as i64 {
                    let issue = if config.relax_secondary_window {
                        Issue::advisory(IssueKind::SecondaryWindow, Some(e), Some(start), total)
                    } else {
                        Issue::violation(IssueKind::SecondaryWindow, Some(e), Some(start), total)
                    };
                    issues.push(issue);
                }
            }
        }
    }
}

/// Compares the solver's per-category counters with the roster's own counts.
pub fn check_consistency(
    roster: &Roster,
    fairness: &FairnessVars,
    outcome: &SolveOutcome,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (e, counters) in fairness.counts.iter().enumerate() {
        let recomputed = roster.category_counts(e);
        for category in FairnessCategory::ALL {
            let expected = recomputed.get(category) as i64;
            let reported = outcome.value(counters[category.index()]).map(i64::from);
            if reported != Some(expected) {
                issues.push(Issue::violation(
                    IssueKind::CounterMismatch,
                    Some(e),
                    None,
                    reported.unwrap_or(-1),
                ));
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoverageRules, Tolerance};
    use crate::domain::ShiftLabel::{DayShift as D, Leave as L, NightShift as N, Rest as R};
    use crate::rules::test_support::*;

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    /// Config under which a lone employee can only break the rule under test.
    fn lenient() -> SolveConfig {
        let mut config = SolveConfig::default();
        config.coverage = CoverageRules {
            weekday_day: Bounds::new(0, 10),
            weekday_night: Bounds::new(0, 10),
            friday_night: Bounds::new(0, 10),
            weekend_day: Bounds::new(0, 10),
            weekend_night: Bounds::new(0, 10),
        };
        config.hours.tolerance = Tolerance::Fixed { quarters: 10_000 };
        config.weekend_rotation_period = 1;
        config
    }

    #[test]
    fn test_clean_week() {
        let input = input(1, 7);
        let week = [D, D, R, D, R, R, R];
        let roster = Roster::from_fn(&input, |_, d| week[d]);
        assert!(validate(&roster, &input, &lenient()).is_empty());
    }

    #[test]
    fn test_night_followed_by_work_is_rejected() {
        let input = input(1, 7);
        let week = [N, D, R, R, R, R, R];
        let roster = Roster::from_fn(&input, |_, d| week[d]);
        let issues = validate(&roster, &input, &lenient());
        assert_eq!(kinds(&issues), vec![IssueKind::NightRest]);
        assert_eq!(issues[0].day, Some(0));
        assert!(issues[0].is_violation());
    }

    #[test]
    fn test_leave_mismatches() {
        let input = input_with_leave(1, 7, &[(0, 2)]);
        let week = [L, R, D, R, R, R, R];
        let roster = Roster::from_fn(&input, |_, d| week[d]);
        let issues = validate(&roster, &input, &lenient());
        assert_eq!(
            kinds(&issues),
            vec![IssueKind::UnrequestedLeave, IssueKind::LeaveNotHonoured]
        );
    }

    #[test]
    fn test_unassigned_cell() {
        let input = input(1, 7);
        let roster = Roster::new(
            input.employees().to_vec(),
            input.horizon().clone(),
            vec![vec![Slot::Assigned(R); 6]],
        );
        let issues = validate(&roster, &input, &lenient());
        assert!(kinds(&issues).contains(&IssueKind::Unassigned));
    }

    #[test]
    fn test_weekly_rest_and_consecutive_work() {
        let input = input(1, 7);
        let week = [D, D, D, D, R, D, D];
        let roster = Roster::from_fn(&input, |_, d| week[d]);
        let issues = validate(&roster, &input, &lenient());
        assert_eq!(
            kinds(&issues),
            vec![IssueKind::WeeklyRest, IssueKind::ConsecutiveWork]
        );
    }

    #[test]
    fn test_partial_weekend() {
        // Friday 4, Saturday 5, Sunday 6.
        let input = input(1, 7);
        let week = [R, R, R, R, R, D, R];
        let roster = Roster::from_fn(&input, |_, d| week[d]);
        let issues = validate(&roster, &input, &lenient());
        assert_eq!(kinds(&issues), vec![IssueKind::WeekendContiguity]);
    }

    #[test]
    fn test_weekend_rotation() {
        let input = input(1, 14);
        let mut config = lenient();
        config.weekend_rotation_period = 3;
        let labels = |d: usize| match d {
            5 | 6 | 12 | 13 => D,
            _ => R,
        };
        let roster = Roster::from_fn(&input, |_, d| labels(d));
        let issues = validate(&roster, &input, &config);
        assert_eq!(kinds(&issues), vec![IssueKind::WeekendRotation]);
        assert_eq!(issues[0].observed, 2);
    }

    #[test]
    fn test_coverage_counts() {
        let input = input(2, 1);
        let mut config = lenient();
        config.coverage.weekday_night = Bounds::exactly(1);
        let roster = Roster::from_fn(&input, |_, _| D);
        let issues = validate(&roster, &input, &config);
        assert_eq!(kinds(&issues), vec![IssueKind::NightCoverage]);
        assert_eq!(issues[0].observed, 0);
    }

    #[test]
    fn test_hours_above_band_is_advisory_when_relaxed() {
        let input = input(1, 14);
        let mut config = lenient();
        config.hours.block_days = 14;
        config.hours.target_quarters = 180;
        config.hours.tolerance = Tolerance::Fixed { quarters: 0 };
        let labels = |d: usize| if matches!(d, 0 | 2 | 7 | 9 | 11) { D } else { R };
        let roster = Roster::from_fn(&input, |_, d| labels(d));

        let strict = validate(&roster, &input, &config);
        assert_eq!(kinds(&strict), vec![IssueKind::HoursAboveBand]);
        assert!(strict[0].is_violation());
        assert_eq!(strict[0].observed, 5 * 45);

        config.relax_hour_quota_upper_only = true;
        let relaxed = validate(&roster, &input, &config);
        assert_eq!(relaxed[0].severity, Severity::Advisory);
    }

    #[test]
    fn test_hours_band_rolls_across_blocks() {
        let input = input(1, 84);
        let mut config = lenient();
        config.hours.tolerance = Tolerance::Fixed { quarters: 20 };

        // Nineteen day shifts in every 42-day run keeps each window in band.
        let steady = Roster::from_fn(&input, |_, d| if d % 42 < 19 { D } else { R });
        let hour_kinds = |issues: Vec<Issue>| -> Vec<Issue> {
            issues
                .into_iter()
                .filter(|i| matches!(i.kind, IssueKind::HoursAboveBand | IssueKind::HoursBelowBand))
                .collect()
        };
        assert!(hour_kinds(validate(&steady, &input, &config)).is_empty());

        // Both blocks hold 19 shifts, but the run of 38 overloads the middle.
        let packed = Roster::from_fn(&input, |_, d| if (23..61).contains(&d) { D } else { R });
        let above: Vec<_> = hour_kinds(validate(&packed, &input, &config))
            .into_iter()
            .filter(|i| i.kind == IssueKind::HoursAboveBand)
            .collect();
        assert_eq!(above.len(), 1, "{above:?}");
        assert!(above[0].is_violation());
        assert!(above[0].observed > 860);
    }

    #[test]
    fn test_short_shift_cap_rolls_across_blocks() {
        let input = input(1, 84);
        let shorts = |days: [usize; 2]| {
            Roster::from_fn(&input, |_, d| {
                if days.contains(&d) {
                    ShiftLabel::ShortDayShift
                } else {
                    R
                }
            })
        };
        let capped = |roster: &Roster| -> Vec<Issue> {
            validate(roster, &input, &lenient())
                .into_iter()
                .filter(|i| i.kind == IssueKind::ShortShiftCap)
                .collect()
        };

        let straddling = capped(&shorts([38, 44]));
        assert_eq!(straddling.len(), 1, "{straddling:?}");
        assert_eq!(straddling[0].day, Some(3));
        assert!(capped(&shorts([1, 44])).is_empty());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let input = input(3, 14);
        let roster = Roster::from_fn(&input, |e, d| if (e + d) % 3 == 0 { N } else { D });
        let config = SolveConfig::default();
        let first = validate(&roster, &input, &config);
        let second = validate(&roster, &input, &config);
        assert_eq!(first, second);
        assert_eq!(roster.summaries(&config.hours), roster.summaries(&config.hours));
    }

    #[test]
    fn test_issue_rule_mapping() {
        assert_eq!(IssueKind::NightRest.rule(), RuleClass::NightRest);
        assert_eq!(IssueKind::HoursAboveBand.rule(), RuleClass::HourQuota);
        assert_eq!(IssueKind::NightCoverage.rule(), RuleClass::Coverage);
    }
}
