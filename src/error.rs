//! Error taxonomy for planning runs.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::roster::Roster;
use crate::rules::RuleClass;
use crate::validation::Issue;

/// Caller input rejected before any model is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("employee list is empty")]
    NoEmployees,

    #[error("planning horizon has no days")]
    EmptyHorizon,

    #[error("employee {0:?} listed more than once")]
    DuplicateEmployee(String),

    #[error("leave requested for unknown employee {0:?}")]
    UnknownEmployee(String),

    #[error("leave for {employee:?} on {date} lies outside the horizon")]
    LeaveOutsideHorizon { employee: String, date: NaiveDate },

    #[error("planning horizon of {days} days exceeds the {max} day limit")]
    HorizonTooLong { days: usize, max: usize },

    #[error("a {days} day horizon from {start} runs past the last representable date")]
    HorizonOutOfRange { start: NaiveDate, days: usize },
}

/// Where infeasibility was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfeasibleStage {
    /// Capacity checks over the input, before any solver call.
    Screen,
    /// The solver rejected a constraint while it was being posted.
    Posting,
    /// Search exhausted the space.
    Search,
}

impl fmt::Display for InfeasibleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InfeasibleStage::Screen => "pre-solve screen",
            InfeasibleStage::Posting => "model posting",
            InfeasibleStage::Search => "search",
        })
    }
}

/// Failure of a planning run.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no roster satisfies the hard rules ({stage}); suspected: {}", list(.suspected))]
    Infeasible {
        suspected: Vec<RuleClass>,
        stage: InfeasibleStage,
        details: Vec<String>,
    },

    #[error("time budget exhausted after {elapsed:?} without a feasible roster")]
    Unknown { elapsed: Duration },

    #[error("planning cancelled before a roster was found")]
    Cancelled,

    #[error("solved roster failed its own recomputation ({} issues)", .issues.len())]
    Inconsistent {
        issues: Vec<Issue>,
        roster: Box<Roster>,
    },

    /// The planner panicked; the message is the panic payload when it is text.
    #[error("planner aborted: {0}")]
    Aborted(String),
}

impl PlanError {
    /// Whether retrying with a relaxed configuration could help.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlanError::Infeasible { .. } | PlanError::Unknown { .. })
    }
}

fn list(classes: &[RuleClass]) -> String {
    if classes.is_empty() {
        return "unknown".to_string();
    }
    classes
        .iter()
        .map(|class| class.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
