//! Planning job manager.
//!
//! Each job owns an immutable input snapshot and configuration. Solving runs on
//! tokio's blocking pool; the job is updated once, when the planner returns.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SolveConfig;
use crate::domain::PlanningInput;
use crate::error::PlanError;
use crate::planner::{self, PlanResult};
use crate::solver::CancelFlag;

/// Lifecycle of a planning job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    NotSolving,
    Solving,
    Solved,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// ```
    /// use shift_roster::service::JobStatus;
    ///
    /// assert_eq!(JobStatus::NotSolving.as_str(), "NOT_SOLVING");
    /// assert!(JobStatus::Solved.is_terminal());
    /// assert!(!JobStatus::Solving.is_terminal());
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::NotSolving => "NOT_SOLVING",
            JobStatus::Solving => "SOLVING",
            JobStatus::Solved => "SOLVED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Solved | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// A planning job and its outcome so far.
pub struct PlanJob {
    pub id: String,
    pub status: JobStatus,
    pub input: PlanningInput,
    pub config: SolveConfig,
    pub result: Option<PlanResult>,
    pub error: Option<PlanError>,
    cancel: CancelFlag,
}

impl PlanJob {
    pub fn new(id: String, input: PlanningInput, config: SolveConfig) -> Self {
        Self {
            id,
            status: JobStatus::NotSolving,
            input,
            config,
            result: None,
            error: None,
            cancel: CancelFlag::new(),
        }
    }
}

/// Manages planning jobs.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use shift_roster::config::SolveConfig;
/// use shift_roster::domain::PlanningInput;
/// use shift_roster::service::{JobStatus, PlanService};
///
/// let start = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
/// let input = PlanningInput::builder(start, 42)
///     .employees(["Amy", "Beth"])
///     .build()
///     .unwrap();
///
/// let service = PlanService::new();
/// // Creating a job does not start solving.
/// let job = service.create_job("job-1".to_string(), input, SolveConfig::default());
/// assert_eq!(job.read().status, JobStatus::NotSolving);
/// assert_eq!(service.list_jobs(), vec!["job-1".to_string()]);
/// ```
pub struct PlanService {
    jobs: RwLock<HashMap<String, Arc<RwLock<PlanJob>>>>,
}

impl PlanService {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn create_job(
        &self,
        id: String,
        input: PlanningInput,
        config: SolveConfig,
    ) -> Arc<RwLock<PlanJob>> {
        let job = Arc::new(RwLock::new(PlanJob::new(id.clone(), input, config)));
        self.jobs.write().insert(id, job.clone());
        job
    }

    pub fn get_job(&self, id: &str) -> Option<Arc<RwLock<PlanJob>>> {
        self.jobs.read().get(id).cloned()
    }

    pub fn list_jobs(&self) -> Vec<String> {
        self.jobs.read().keys().cloned().collect()
    }

    pub fn remove_job(&self, id: &str) -> Option<Arc<RwLock<PlanJob>>> {
        self.jobs.write().remove(id)
    }

    /// Starts solving a job on the blocking pool. Must be called from inside a
    /// tokio runtime.
    pub fn start_solving(&self, job: Arc<RwLock<PlanJob>>) {
        job.write().status = JobStatus::Solving;
        tokio::task::spawn_blocking(move || solve_blocking(job));
    }

    /// Asks a running job to stop. Returns false if the job is unknown or
    /// not solving.
    pub fn stop_solving(&self, id: &str) -> bool {
        match self.get_job(id) {
            Some(job) => {
                let guard = job.read();
                if guard.status == JobStatus::Solving {
                    guard.cancel.cancel();
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }
}

impl Default for PlanService {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the planner in a blocking context.
fn solve_blocking(job: Arc<RwLock<PlanJob>>) {
    run_job(job, planner::plan);
}

/// Runs `planner` for the job and records its outcome. A panic marks the job
/// failed instead of leaving it solving.
fn run_job<F>(job: Arc<RwLock<PlanJob>>, planner: F)
where
    F: FnOnce(&PlanningInput, &SolveConfig, &CancelFlag) -> Result<PlanResult, PlanError>,
{
    let (job_id, input, config, cancel) = {
        let guard = job.read();
        (
            guard.id.clone(),
            guard.input.clone(),
            guard.config.clone(),
            guard.cancel.clone(),
        )
    };

    info!(
        job_id = %job_id,
        employees = input.employee_count(),
        days = input.day_count(),
        "Starting roster solve"
    );

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| planner(&input, &config, &cancel)))
        .unwrap_or_else(|payload| Err(PlanError::Aborted(panic_message(payload.as_ref()))));

    let mut guard = job.write();
    match outcome {
        Ok(result) => {
            guard.status = JobStatus::Solved;
            guard.result = Some(result);
        }
        Err(PlanError::Cancelled) => {
            guard.status = JobStatus::Cancelled;
            guard.error = Some(PlanError::Cancelled);
        }
        Err(err) => {
            warn!(job_id = %job_id, error = %err, "Roster solve failed");
            guard.status = JobStatus::Failed;
            guard.error = Some(err);
        }
    }
    info!(job_id = %job_id, status = guard.status.as_str(), "Roster solve finished");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
