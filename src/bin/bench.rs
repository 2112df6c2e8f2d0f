//! Benchmark for model compilation and solving.
//!
//! Run with: cargo run --release --bin bench -- [SMALL|LARGE] [seconds]

use shift_roster::demo_data::{self, DemoData};
use shift_roster::rules;
use shift_roster::solver::{self, SolveOptions};
use std::time::Instant;

fn main() {
    let mut args = std::env::args().skip(1);
    let demo = args
        .next()
        .and_then(|s| s.parse::<DemoData>().ok())
        .unwrap_or(DemoData::Small);
    let seconds: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60);

    let request = demo_data::generate(demo);
    let config = request.config().with_time_budget(seconds);
    let input = match request.to_input() {
        Ok(input) => input,
        Err(err) => {
            eprintln!("Invalid demo input: {err}");
            std::process::exit(1);
        }
    };

    println!("Benchmark: Shift Roster ({})", demo.as_str());
    println!("  Employees: {}", input.employee_count());
    println!("  Days: {}", input.day_count());
    println!("  Leave days: {}", input.leave().total());
    println!();

    let screen_start = Instant::now();
    let findings = rules::screen(&input, &config);
    println!("Screen: {} findings ({:?})", findings.len(), screen_start.elapsed());
    for finding in &findings {
        println!("  {}: {}", finding.rule, finding.detail);
    }

    let compile_start = Instant::now();
    let compiled = rules::compile(&input, &config);
    println!(
        "Compile: {} variables, {} constraints ({:?})",
        compiled.model.var_count(),
        compiled.model.constraint_count(),
        compile_start.elapsed()
    );
    println!();

    for workers in [1, config.worker_count.max(2)] {
        let options = SolveOptions::new(config.time_budget()).with_workers(workers);
        let outcome = solver::solve(&compiled.model, &options);
        println!("Workers: {}", workers);
        println!("  Status: {}", outcome.status.as_str());
        println!("  Objective: {:?}", outcome.objective);
        println!("  Time: {:.2?}", outcome.elapsed);
    }
}
