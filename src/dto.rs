//! DTOs for REST API requests/responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::SolveConfig;
use crate::domain::{PlanningInput, ShiftLabel};
use crate::error::{InfeasibleStage, InputError, PlanError};
use crate::roster::{EmployeeSummary, Roster, Slot};
use crate::rules::RuleClass;
use crate::service::{JobStatus, PlanJob};
use crate::solver::SolveStatus;
use crate::validation::Issue;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    pub name: String,
    #[serde(default)]
    pub leave_dates: Vec<NaiveDate>,
}

/// Everything needed to start a planning job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningRequestDto {
    pub start_date: NaiveDate,
    pub days: usize,
    pub employees: Vec<EmployeeDto>,
    /// Defaults apply when absent.
    #[serde(default)]
    pub config: Option<SolveConfig>,
}

impl PlanningRequestDto {
    pub fn from_input(input: &PlanningInput, config: Option<SolveConfig>) -> Self {
        let horizon = input.horizon();
        let employees = input
            .employees()
            .iter()
            .map(|e| EmployeeDto {
                name: e.name.clone(),
                leave_dates: input.leave().days(e.index).map(|d| horizon.date(d)).collect(),
            })
            .collect();
        Self {
            start_date: horizon.start(),
            days: horizon.len(),
            employees,
            config,
        }
    }

    pub fn to_input(&self) -> Result<PlanningInput, InputError> {
        let mut builder = PlanningInput::builder(self.start_date, self.days)
            .employees(self.employees.iter().map(|e| e.name.as_str()));
        for employee in &self.employees {
            builder = builder.leave(employee.name.as_str(), employee.leave_dates.iter().copied());
        }
        builder.build()
    }

    pub fn config(&self) -> SolveConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// One employee's row; `null` marks a cell needing manual attention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRowDto {
    pub employee: String,
    pub shifts: Vec<Option<ShiftLabel>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterDto {
    pub start_date: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<RosterRowDto>,
}

impl RosterDto {
    pub fn from_roster(roster: &Roster) -> Self {
        let horizon = roster.horizon();
        let rows = roster
            .employees()
            .iter()
            .map(|e| RosterRowDto {
                employee: e.name.clone(),
                shifts: roster.row(e.index).iter().map(|slot| slot.label()).collect(),
            })
            .collect();
        Self {
            start_date: horizon.start(),
            dates: (0..horizon.len()).map(|d| horizon.date(d)).collect(),
            rows,
        }
    }

    /// Aligns rows to the input's employees by name; missing rows and cells
    /// come back unassigned.
    pub fn to_roster(&self, input: &PlanningInput) -> Roster {
        let cells = input
            .employees()
            .iter()
            .map(|e| {
                self.rows
                    .iter()
                    .find(|row| row.employee == e.name)
                    .map(|row| {
                        row.shifts
                            .iter()
                            .map(|cell| cell.map_or(Slot::Unassigned, Slot::Assigned))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect();
        Roster::new(input.employees().to_vec(), input.horizon().clone(), cells)
    }
}

/// Why a job produced no roster.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suspected: Vec<RuleClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<InfeasibleStage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

impl From<&PlanError> for ErrorDto {
    fn from(err: &PlanError) -> Self {
        let mut dto = Self {
            kind: "",
            message: err.to_string(),
            suspected: Vec::new(),
            stage: None,
            details: Vec::new(),
            issues: Vec::new(),
        };
        dto.kind = match err {
            PlanError::Input(_) => "INPUT",
            PlanError::Config(_) => "CONFIG",
            PlanError::Infeasible {
                suspected,
                stage,
                details,
            } => {
                dto.suspected = suspected.clone();
                dto.stage = Some(*stage);
                dto.details = details.clone();
                "INFEASIBLE"
            }
            PlanError::Unknown { .. } => "UNKNOWN",
            PlanError::Cancelled => "CANCELLED",
            PlanError::Inconsistent { issues, .. } => {
                dto.issues = issues.clone();
                "INCONSISTENT"
            }
            PlanError::Aborted(_) => "ABORTED",
        };
        dto
    }
}

/// Full job state for `GET /rosters/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDto {
    pub id: String,
    pub status: JobStatus,
    pub solve_status: Option<SolveStatus>,
    pub objective: Option<i64>,
    pub roster: Option<RosterDto>,
    pub summaries: Vec<EmployeeSummary>,
    pub advisories: Vec<Issue>,
    pub error: Option<ErrorDto>,
}

impl JobDto {
    pub fn from_job(job: &PlanJob) -> Self {
        let result = job.result.as_ref();
        Self {
            id: job.id.clone(),
            status: job.status,
            solve_status: result.map(|r| r.status),
            objective: result.and_then(|r| r.objective),
            roster: result.map(|r| RosterDto::from_roster(&r.roster)),
            summaries: result.map(|r| r.summaries.clone()).unwrap_or_default(),
            advisories: result.map(|r| r.advisories.clone()).unwrap_or_default(),
            error: job.error.as_ref().map(ErrorDto::from),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: JobStatus,
    pub solve_status: Option<SolveStatus>,
    pub objective: Option<i64>,
}

/// Body of `PUT /rosters/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequestDto {
    pub request: PlanningRequestDto,
    pub roster: RosterDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub issues: Vec<Issue>,
    pub summaries: Vec<EmployeeSummary>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub solver_engine: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShiftLabel::{DayShift as D, Leave as L, Rest as R};
    use chrono::Duration;

    fn request() -> PlanningRequestDto {
        let start = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        PlanningRequestDto {
            start_date: start,
            days: 3,
            employees: vec![
                EmployeeDto {
                    name: "Amy Cole".into(),
                    leave_dates: vec![start + Duration::days(1)],
                },
                EmployeeDto {
                    name: "Beth Fox".into(),
                    leave_dates: Vec::new(),
                },
            ],
            config: None,
        }
    }

    #[test]
    fn test_request_to_input() {
        let input = request().to_input().unwrap();
        assert_eq!(input.employee_count(), 2);
        assert!(input.leave().is_on_leave(0, 1));
        assert_eq!(input.leave().total(), 1);

        let back = PlanningRequestDto::from_input(&input, None);
        assert_eq!(back.employees[0].leave_dates, request().employees[0].leave_dates);
    }

    #[test]
    fn test_request_rejects_leave_outside_horizon() {
        let mut dto = request();
        dto.employees[1].leave_dates = vec![dto.start_date + Duration::days(10)];
        assert!(matches!(
            dto.to_input(),
            Err(InputError::LeaveOutsideHorizon { .. })
        ));
    }

    #[test]
    fn test_request_json_uses_camel_case() {
        let json = r#"{
            "startDate": "2025-11-03",
            "days": 7,
            "employees": [{"name": "Amy"}, {"name": "Beth", "leaveDates": ["2025-11-04"]}]
        }"#;
        let dto: PlanningRequestDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.days, 7);
        assert!(dto.config.is_none());
        assert_eq!(dto.employees[1].leave_dates.len(), 1);
        assert_eq!(dto.config(), SolveConfig::default());
    }

    #[test]
    fn test_roster_dto_aligns_rows_by_name() {
        let input = request().to_input().unwrap();
        let dto = RosterDto {
            start_date: input.horizon().start(),
            dates: Vec::new(),
            rows: vec![RosterRowDto {
                employee: "Amy Cole".into(),
                shifts: vec![Some(D), Some(L), None],
            }],
        };
        let roster = dto.to_roster(&input);
        assert_eq!(roster.slot(0, 1), Slot::Assigned(L));
        assert_eq!(roster.slot(0, 2), Slot::Unassigned);
        assert_eq!(roster.row(1), &[Slot::Unassigned; 3]);

        let back = RosterDto::from_roster(&roster);
        assert_eq!(back.rows[0].shifts, vec![Some(D), Some(L), None]);
        assert_eq!(back.dates.len(), 3);
    }

    #[test]
    fn test_error_dto_carries_suspects() {
        let err = PlanError::Infeasible {
            suspected: vec![RuleClass::Coverage],
            stage: InfeasibleStage::Screen,
            details: vec!["2025-11-03: 1 employees available".into()],
        };
        let dto = ErrorDto::from(&err);
        assert_eq!(dto.kind, "INFEASIBLE");
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["suspected"][0], "COVERAGE");
        assert_eq!(json["stage"], "SCREEN");
        assert!(json.get("issues").is_none());

        let aborted = ErrorDto::from(&PlanError::Aborted("overflow".into()));
        assert_eq!(aborted.kind, "ABORTED");
        assert_eq!(aborted.message, "planner aborted: overflow");

        let cancelled = ErrorDto::from(&PlanError::Cancelled);
        assert_eq!(cancelled.kind, "CANCELLED");
        assert!(cancelled.stage.is_none());
    }

    #[test]
    fn test_shift_labels_serialize_screaming() {
        let row = RosterRowDto {
            employee: "Amy".into(),
            shifts: vec![Some(R), None],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"employee":"Amy","shifts":["REST",null]}"#);
    }
}
