//! Planning configuration.
//!
//! Every tunable that used to be ambient UI state is an explicit field of
//! [`SolveConfig`], passed into model construction and never read mid-solve.
//!
//! # Examples
//!
//! ```
//! use shift_roster::config::SolveConfig;
//!
//! let config = SolveConfig::from_toml_str(r#"
//!     relax_hour_quota_upper_only = true
//!     time_budget_seconds = 30
//!
//!     [coverage.weekend_day]
//!     min = 2
//!     max = 3
//! "#).unwrap();
//!
//! assert!(config.relax_hour_quota_upper_only);
//! assert_eq!(config.coverage.weekend_day.max, 3);
//! assert_eq!(config.hours.block_days, 42);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::DayClass;
use crate::domain::HOUR_SCALE;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Inclusive bounds on a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub const fn exactly(n: u32) -> Self {
        Self { min: n, max: n }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Daily staffing bounds, counted across all employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageRules {
    /// `DayShift + ShortDayShift` on Monday to Friday.
    pub weekday_day: Bounds,
    /// `NightShift` on Monday to Thursday.
    pub weekday_night: Bounds,
    pub friday_night: Bounds,
    /// `DayShift` on Saturday and Sunday.
    pub weekend_day: Bounds,
    pub weekend_night: Bounds,
}

impl CoverageRules {
    pub fn standard() -> Self {
        Self {
            weekday_day: Bounds::new(4, 7),
            weekday_night: Bounds::exactly(2),
            friday_night: Bounds::exactly(2),
            weekend_day: Bounds::exactly(2),
            weekend_night: Bounds::exactly(2),
        }
    }

    /// Mon–Thu nights exactly 2, Friday to Sunday between 2 and 3.
    pub fn flexible_weekend() -> Self {
        Self {
            friday_night: Bounds::new(2, 3),
            weekend_day: Bounds::new(2, 3),
            weekend_night: Bounds::new(2, 3),
            ..Self::standard()
        }
    }

    /// Day-side bounds for a day class.
    pub fn day(&self, class: DayClass) -> Bounds {
        if class.is_weekend() {
            self.weekend_day
        } else {
            self.weekday_day
        }
    }

    /// Night bounds for a day class.
    pub fn night(&self, class: DayClass) -> Bounds {
        match class {
            DayClass::Weekday => self.weekday_night,
            DayClass::Friday => self.friday_night,
            DayClass::Saturday | DayClass::Sunday => self.weekend_night,
        }
    }
}

impl Default for CoverageRules {
    fn default() -> Self {
        Self::standard()
    }
}

/// Width of the accepted band around an hour target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tolerance {
    /// A fixed number of quarter-hours either side.
    Fixed { quarters: i32 },
    /// A percentage of the target either side. At 10 % a 210 h target gives
    /// 189..=231 h, which is wider than the one-shift band of 198.75..=221.25 h;
    /// that band is `Fixed { quarters: 45 }`.
    Percent { percent: i32 },
}

impl Tolerance {
    pub fn quarters_for(&self, target: i32) -> i32 {
        match *self {
            Tolerance::Fixed { quarters } => quarters,
            Tolerance::Percent { percent } => target * percent / 100,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Fixed {
            quarters: 5 * HOUR_SCALE,
        }
    }
}

/// The optional fortnightly hour cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryWindow {
    pub enabled: bool,
    /// Cap per 14-day window, tolerance included.
    pub cap_quarters: i32,
    /// Objective weight per quarter-hour of overrun when relaxed.
    pub slack_weight: i32,
}

impl Default for SecondaryWindow {
    fn default() -> Self {
        Self {
            enabled: false,
            cap_quarters: 75 * HOUR_SCALE,
            slack_weight: 1_000,
        }
    }
}

/// Hour quota settings. All amounts are in quarter-hours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourRules {
    pub block_days: usize,
    pub target_quarters: i32,
    pub tolerance: Tolerance,
    /// Whether Friday-night hours count toward the quota.
    pub count_friday_night: bool,
    pub secondary_window: SecondaryWindow,
}

impl HourRules {
    /// Target for a block of `days`, pro-rated against `block_days`.
    ///
    /// ```
    /// use shift_roster::config::HourRules;
    ///
    /// let hours = HourRules::default();
    /// assert_eq!(hours.target_for(42), 840);
    /// assert_eq!(hours.target_for(14), 280);
    /// ```
    pub fn target_for(&self, days: usize) -> i32 {
        let block = self.block_days.max(1) as i64;
        ((self.target_quarters as i64 * days as i64 + block / 2) / block) as i32
    }

    /// Accepted `(low, high)` band for a block of `days`.
    pub fn band_for(&self, days: usize) -> (i32, i32) {
        let target = self.target_for(days);
        let slack = self.tolerance.quarters_for(target);
        ((target - slack).max(0), target + slack)
    }
}

impl Default for HourRules {
    fn default() -> Self {
        Self {
            block_days: 42,
            target_quarters: 210 * HOUR_SCALE,
            tolerance: Tolerance::default(),
            count_friday_night: true,
            secondary_window: SecondaryWindow::default(),
        }
    }
}

/// Rest and fatigue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestRules {
    pub min_rest_days_per_week: u32,
    /// Require two of the weekly rest days to be adjacent.
    pub consecutive_rest_days: bool,
    pub max_consecutive_work_days: u32,
}

impl RestRules {
    /// Rest days required in a week of `len` days.
    pub fn required_in(&self, len: usize) -> u32 {
        let missing = crate::calendar::WEEK_DAYS.saturating_sub(len) as u32;
        self.min_rest_days_per_week.saturating_sub(missing)
    }
}

impl Default for RestRules {
    fn default() -> Self {
        Self {
            min_rest_days_per_week: 2,
            consecutive_rest_days: false,
            max_consecutive_work_days: 3,
        }
    }
}

/// Short-shift caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortShiftRules {
    pub per_employee_per_block: u32,
    pub per_weekday: u32,
}

impl Default for ShortShiftRules {
    fn default() -> Self {
        Self {
            per_employee_per_block: 1,
            per_weekday: 1,
        }
    }
}

/// Immutable configuration for one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Drop the upper hour bound only; the floor is always kept.
    pub relax_hour_quota_upper_only: bool,
    /// Turn the fortnightly cap into a heavily weighted soft constraint.
    pub relax_secondary_window: bool,
    pub time_budget_seconds: u64,
    pub worker_count: usize,
    pub coverage: CoverageRules,
    pub hours: HourRules,
    pub rest: RestRules,
    pub short_shift: ShortShiftRules,
    /// An employee takes at most one weekend unit per this many weekends.
    pub weekend_rotation_period: u32,
    pub diagnose_infeasibility: bool,
    pub diagnosis_budget_seconds: u64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            relax_hour_quota_upper_only: false,
            relax_secondary_window: false,
            time_budget_seconds: 120,
            worker_count: 1,
            coverage: CoverageRules::default(),
            hours: HourRules::default(),
            rest: RestRules::default(),
            short_shift: ShortShiftRules::default(),
            weekend_rotation_period: 3,
            diagnose_infeasibility: true,
            diagnosis_budget_seconds: 5,
        }
    }
}

impl SolveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string and validates it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_time_budget(mut self, seconds: u64) -> Self {
        self.time_budget_seconds = seconds;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn with_relaxed_hour_ceiling(mut self) -> Self {
        self.relax_hour_quota_upper_only = true;
        self
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_seconds)
    }

    pub fn diagnosis_budget(&self) -> Duration {
        Duration::from_secs(self.diagnosis_budget_seconds)
    }

    /// Rejects settings no model could be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let coverage = [
            ("coverage.weekday_day", self.coverage.weekday_day),
            ("coverage.weekday_night", self.coverage.weekday_night),
            ("coverage.friday_night", self.coverage.friday_night),
            ("coverage.weekend_day", self.coverage.weekend_day),
            ("coverage.weekend_night", self.coverage.weekend_night),
        ];
        for (name, bounds) in coverage {
            if bounds.min > bounds.max {
                return Err(ConfigError::Invalid(format!(
                    "{name}: min {} exceeds max {}",
                    bounds.min, bounds.max
                )));
            }
        }
        if self.hours.block_days == 0 {
            return Err(ConfigError::Invalid("hours.block_days must be positive".into()));
        }
        if self.hours.target_quarters <= 0 {
            return Err(ConfigError::Invalid(
                "hours.target_quarters must be positive".into(),
            ));
        }
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid("worker_count must be at least 1".into()));
        }
        if self.time_budget_seconds == 0 {
            return Err(ConfigError::Invalid(
                "time_budget_seconds must be positive".into(),
            ));
        }
        if self.weekend_rotation_period == 0 {
            return Err(ConfigError::Invalid(
                "weekend_rotation_period must be positive".into(),
            ));
        }
        if self.rest.min_rest_days_per_week as usize > crate::calendar::WEEK_DAYS {
            return Err(ConfigError::Invalid(
                "rest.min_rest_days_per_week cannot exceed 7".into(),
            ));
        }
        Ok(())
    }
}
