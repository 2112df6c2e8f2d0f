//! Shift roster planner.
//!
//! Compiles staffing, rest, weekend and hour-quota rules into a constraint
//! model over a dense employee × day × shift grid, solves it with
//! pumpkin-solver, and checks every roster it publishes with an independent
//! validator.

pub mod api;
pub mod calendar;
pub mod config;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod model;
pub mod objective;
pub mod planner;
pub mod roster;
pub mod rules;
pub mod service;
pub mod solver;
pub mod validation;

pub use config::SolveConfig;
pub use domain::{PlanningInput, ShiftLabel};
pub use error::{InputError, PlanError};
pub use planner::{plan, PlanResult};
pub use roster::Roster;
pub use solver::{CancelFlag, SolveStatus};
