//! Hour accounting: the block quota and the optional fortnight cap.

use std::ops::Range;

use super::{CompileContext, Rule, RuleClass};
use crate::calendar::{DayClass, FORTNIGHT_DAYS};
use crate::config::HourRules;
use crate::domain::ShiftLabel;
use crate::model::Terms;

/// Quarter-hours a label contributes to the quota on a day of `class`.
///
/// Weekend nights do not count; Friday nights count unless configured
/// otherwise. Leave counts as a full day shift.
///
/// ```
/// use shift_roster::calendar::DayClass;
/// use shift_roster::config::HourRules;
/// use shift_roster::domain::ShiftLabel;
/// use shift_roster::rules::quota_weight;
///
/// let hours = HourRules::default();
/// assert_eq!(quota_weight(ShiftLabel::NightShift, DayClass::Weekday, &hours), 45);
/// assert_eq!(quota_weight(ShiftLabel::NightShift, DayClass::Friday, &hours), 45);
/// assert_eq!(quota_weight(ShiftLabel::NightShift, DayClass::Sunday, &hours), 0);
/// assert_eq!(quota_weight(ShiftLabel::Leave, DayClass::Saturday, &hours), 45);
/// ```
pub fn quota_weight(label: ShiftLabel, class: DayClass, hours: &HourRules) -> i32 {
    match (label, class) {
        (ShiftLabel::NightShift, DayClass::Saturday | DayClass::Sunday) => 0,
        (ShiftLabel::NightShift, DayClass::Friday) if !hours.count_friday_night => 0,
        _ => label.nominal_quarters(),
    }
}

/// Weighted hour sum of one employee over `span`.
fn hour_terms(ctx: &CompileContext<'_>, employee: usize, span: Range<usize>) -> Terms {
    let horizon = ctx.input.horizon();
    let grid = ctx.grid;
    let mut terms = Terms::new();
    for d in span {
        let class = horizon.class(d);
        for label in ShiftLabel::ALL {
            let weight = quota_weight(label, class, &ctx.config.hours);
            if weight != 0 {
                terms.push((weight, grid.var(employee, d, label)));
            }
        }
    }
    terms
}

/// Hours in every rolling quota window stay inside the tolerance band. A
/// horizon shorter than one block is a single pro-rated window. With
/// `relax_hour_quota_upper_only` only the floor is posted.
#[derive(Debug, Clone, Copy, Default)]
pub struct HourQuota;

impl Rule for HourQuota {
    fn class(&self) -> RuleClass {
        RuleClass::HourQuota
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let grid = ctx.grid;
        let hours = &ctx.config.hours;
        let relaxed = ctx.config.relax_hour_quota_upper_only;

        for window in ctx.input.horizon().quota_windows(hours.block_days) {
            let (low, high) = hours.band_for(window.len());
            for e in 0..grid.employees() {
                let terms = hour_terms(ctx, e, window.clone());
                if relaxed {
                    ctx.model.at_least(terms, low, RuleClass::HourQuota);
                } else {
                    ctx.model.at_least(terms.clone(), low, RuleClass::HourQuota);
                    ctx.model.at_most(terms, high, RuleClass::HourQuota);
                }
            }
        }
    }
}

/// Caps hours in every fourteen-day window. When relaxed, overrun goes into a
/// slack variable that the objective charges at `slack_weight` per quarter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecondaryWindowCap;

impl Rule for SecondaryWindowCap {
    fn class(&self) -> RuleClass {
        RuleClass::SecondaryWindow
    }

    fn compile(&self, ctx: &mut CompileContext<'_>) {
        let grid = ctx.grid;
        let window = &ctx.config.hours.secondary_window;
        let relaxed = ctx.config.relax_secondary_window;
        let most = FORTNIGHT_DAYS as i32 * ShiftLabel::DayShift.nominal_quarters();

        for span in ctx.input.horizon().fortnights() {
            for e in 0..grid.employees() {
                let mut terms = hour_terms(ctx, e, span.clone());
                if relaxed {
                    let slack = ctx.model.new_int(0, (most - window.cap_quarters).max(0));
                    terms.push((-1, slack));
                    ctx.model.add_objective(window.slack_weight, slack);
                }
                ctx.model
                    .at_most(terms, window.cap_quarters, RuleClass::SecondaryWindow);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SolveConfig, Tolerance};
    use crate::domain::ShiftLabel::{DayShift as D, Leave as L, NightShift as N, Rest as R};
    use crate::rules::test_support::*;

    /// Fourteen days from Monday: target 280 quarters, band 260..=300.
    fn config() -> SolveConfig {
        let mut config = SolveConfig::default();
        config.hours.block_days = 14;
        config.hours.target_quarters = 280;
        config.hours.tolerance = Tolerance::Fixed { quarters: 20 };
        config
    }

    /// Six day shifts then rest: 270 quarters.
    fn six_days(d: usize) -> crate::domain::ShiftLabel {
        if d < 6 {
            D
        } else {
            R
        }
    }

    #[test]
    fn test_weights() {
        let mut hours = crate::config::HourRules::default();
        assert_eq!(quota_weight(R, DayClass::Weekday, &hours), 0);
        assert_eq!(quota_weight(D, DayClass::Sunday, &hours), 45);
        assert_eq!(quota_weight(ShiftLabel::ShortDayShift, DayClass::Weekday, &hours), 30);
        assert_eq!(quota_weight(N, DayClass::Saturday, &hours), 0);
        hours.count_friday_night = false;
        assert_eq!(quota_weight(N, DayClass::Friday, &hours), 0);
        assert_eq!(quota_weight(N, DayClass::Weekday, &hours), 45);
    }

    #[test]
    fn test_in_band() {
        let input = input(1, 14);
        let (model, grid) = compile_one(&HourQuota, &input, &config());
        assert!(broken(&model, &grid, |_, d| six_days(d)).is_empty());
    }

    #[test]
    fn test_below_and_above_band() {
        let input = input(1, 14);
        let (model, grid) = compile_one(&HourQuota, &input, &config());

        let five = broken(&model, &grid, |_, d| if d < 5 { D } else { R });
        assert_eq!(five, vec![RuleClass::HourQuota]);

        let seven = broken(&model, &grid, |_, d| if d < 7 { D } else { R });
        assert_eq!(seven, vec![RuleClass::HourQuota]);
    }

    #[test]
    fn test_weekend_nights_are_free() {
        // Friday 4, Saturday 5, Sunday 6: only Friday counts.
        let input = input(1, 14);
        let (model, grid) = compile_one(&HourQuota, &input, &config());
        let labels = [D, D, D, R, N, N, N, R, D, D, R, R, R, R];
        // Five day shifts and the Friday night: 270 quarters.
        assert!(broken(&model, &grid, |_, d| labels[d]).is_empty());
    }

    #[test]
    fn test_leave_counts_as_day_shift() {
        let input = input_with_leave(1, 14, &[(0, 0), (0, 1)]);
        let (model, grid) = compile_one(&HourQuota, &input, &config());
        let labels = [L, L, D, D, D, D, R, R, R, R, R, R, R, R];
        assert!(broken(&model, &grid, |_, d| labels[d]).is_empty());
    }

    #[test]
    fn test_relaxed_ceiling_keeps_floor() {
        let input = input(1, 14);
        let mut config = config();
        config.relax_hour_quota_upper_only = true;
        let (model, grid) = compile_one(&HourQuota, &input, &config);

        assert!(broken(&model, &grid, |_, d| if d < 10 { D } else { R }).is_empty());
        assert_eq!(
            broken(&model, &grid, |_, d| if d < 2 { D } else { R }),
            vec![RuleClass::HourQuota]
        );
    }

    #[test]
    fn test_short_horizon_is_pro_rated() {
        // Seven days against a 14-day block: band 120..=160.
        let input = input(1, 7);
        let (model, grid) = compile_one(&HourQuota, &input, &config());
        assert_eq!(model.constraints_for(RuleClass::HourQuota).count(), 2);
        assert!(broken(&model, &grid, |_, d| if d < 3 { D } else { R }).is_empty());
        assert_eq!(
            broken(&model, &grid, |_, d| if d < 4 { D } else { R }),
            vec![RuleClass::HourQuota]
        );
    }

    #[test]
    fn test_band_rolls_across_block_boundaries() {
        // 84 days, default 42-day band of 820..=860 quarters.
        let input = input(1, 84);
        let config = SolveConfig::default();
        let (model, grid) = compile_one(&HourQuota, &input, &config);
        assert_eq!(model.constraints_for(RuleClass::HourQuota).count(), 2 * 43);

        // Nineteen day shifts in every 42-day run.
        assert!(broken(&model, &grid, |_, d| if d % 42 < 19 { D } else { R }).is_empty());

        // Each back-to-back block holds 19 shifts, but days 23..61 hold 38.
        let packed = |d: usize| if (23..61).contains(&d) { D } else { R };
        let rules = broken(&model, &grid, |_, d| packed(d));
        assert!(!rules.is_empty());
        assert!(rules.iter().all(|rule| *rule == RuleClass::HourQuota));
    }

    #[test]
    fn test_secondary_window_hard_cap() {
        let input = input(1, 14);
        let mut config = config();
        config.hours.secondary_window.enabled = true;
        config.hours.secondary_window.cap_quarters = 270;
        let (model, grid) = compile_one(&SecondaryWindowCap, &input, &config);
        assert_eq!(model.constraints_for(RuleClass::SecondaryWindow).count(), 1);

        assert!(broken(&model, &grid, |_, d| six_days(d)).is_empty());
        assert_eq!(
            broken(&model, &grid, |_, d| if d < 7 { D } else { R }),
            vec![RuleClass::SecondaryWindow]
        );
    }

    #[test]
    fn test_secondary_window_relaxed_into_objective() {
        let input = input(1, 14);
        let mut config = config();
        config.hours.secondary_window.enabled = true;
        config.hours.secondary_window.cap_quarters = 270;
        config.relax_secondary_window = true;
        let (model, grid) = compile_one(&SecondaryWindowCap, &input, &config);

        assert_eq!(model.objective().len(), 1);
        let (weight, slack) = model.objective()[0];
        assert_eq!(weight, 1_000);

        let mut values = grid.encode(model.var_count(), |_, d| if d < 7 { D } else { R });
        assert!(!model.violations(&values).is_empty());
        values[slack.index()] = 45;
        assert!(model.violations(&values).is_empty());
        assert_eq!(model.objective_value(&values), 45_000);
    }
}
