//! Demo planning requests.

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{Bounds, CoverageRules, SolveConfig};
use crate::dto::{EmployeeDto, PlanningRequestDto};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                employee_count: 15,
                days_in_schedule: 42,
                leave_length_distribution: vec![(0, 1.0)],
                config: None,
            },
            DemoData::Large => DemoDataParameters {
                employee_count: 25,
                days_in_schedule: 42,
                leave_length_distribution: vec![(0, 4.0), (2, 2.0), (3, 2.0), (5, 1.0)],
                // 25 quotas do not fit under the standard coverage caps.
                config: Some(SolveConfig {
                    coverage: CoverageRules {
                        weekday_day: Bounds::new(6, 12),
                        weekday_night: Bounds::exactly(3),
                        friday_night: Bounds::exactly(3),
                        weekend_day: Bounds::new(3, 4),
                        weekend_night: Bounds::exactly(3),
                    },
                    ..SolveConfig::default()
                }),
            },
        }
    }
}

struct DemoDataParameters {
    employee_count: usize,
    days_in_schedule: usize,
    /// Length of one contiguous leave block per employee.
    leave_length_distribution: Vec<(usize, f64)>,
    config: Option<SolveConfig>,
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// First day of every demo horizon, a Sunday.
pub fn demo_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 2).unwrap_or_default()
}

/// Generates a demo request for the given size.
pub fn generate(demo: DemoData) -> PlanningRequestDto {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);
    let start = demo_start();

    let names = generate_name_permutations(&mut rng);
    let employees = (0..params.employee_count)
        .map(|i| {
            let name = names[i % names.len()].clone();
            let length = pick_count(&mut rng, &params.leave_length_distribution)
                .min(params.days_in_schedule);
            let leave_dates = if length == 0 {
                Vec::new()
            } else {
                let first = rng.gen_range(0..=params.days_in_schedule - length);
                (first..first + length)
                    .map(|d| start + Duration::days(d as i64))
                    .collect()
            };
            EmployeeDto { name, leave_dates }
        })
        .collect();

    PlanningRequestDto {
        start_date: start,
        days: params.days_in_schedule,
        employees,
        config: params.config,
    }
}

/// Pick a count based on weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(usize, f64)]) -> usize {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (count, weight) in distribution {
        if choice < *weight {
            return *count;
        }
        choice -= weight;
    }
    distribution.last().map(|(c, _)| *c).unwrap_or(0)
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{} {}", first, last));
        }
    }
    names.shuffle(rng);
    names
}
