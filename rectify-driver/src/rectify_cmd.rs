// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use clap::ArgMatches;
use rectify::blif::{emit_blif, parse_blif_file};
use rectify::cegis::CegisOptions;
use rectify::circuit::{Circuit, CircuitError};
use rectify::circuit_sim::exhaustive_mismatch;
use rectify::oracle::VarisatOracle;
use rectify::rectify::{rectify, FixSelection, RectifyReport};
use rectify::stats::CircuitStats;

use crate::driver_config::{get_bool, get_max_iterations, DriverConfig};
use crate::report_cli_error::report_cli_error_and_exit;

#[derive(Debug, serde::Serialize)]
struct RectifyOutput<'a> {
    report: &'a RectifyReport,
    elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<Vec<CircuitStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    check_passed: Option<bool>,
}

fn parse_gate_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn load_circuit(path: &str, role: &str) -> anyhow::Result<Circuit> {
    parse_blif_file(Path::new(path)).with_context(|| format!("parse {} {}", role, path))
}

/// Exits with a listing of the available gates if any selected gate is not in
/// the implementation.
fn check_selected_gates(implementation: &Circuit, names: &[String]) {
    let unknown: Vec<&str> = names
        .iter()
        .filter(|name| implementation.get_gate(name).is_none())
        .map(|s| s.as_str())
        .collect();
    if unknown.is_empty() {
        return;
    }
    let available: Vec<&str> = implementation
        .gates()
        .iter()
        .map(|g| g.name.as_str())
        .collect();
    report_cli_error_and_exit(
        "unknown gates to fix",
        vec![
            ("unknown", &unknown.join(", ")),
            ("available", &available.join(", ")),
        ],
    );
}

/// Exhaustively compares the rectified circuit with the specification;
/// `None` when there are too many inputs to enumerate.
fn check_rectified(rectified: &Circuit, specification: &Circuit) -> anyhow::Result<Option<bool>> {
    let mismatch = match exhaustive_mismatch(rectified, specification) {
        Ok(mismatch) => mismatch,
        Err(CircuitError::TooManyInputs { count, limit }) => {
            log::warn!(
                "skipping exhaustive check; {} primary inputs exceeds {}",
                count,
                limit
            );
            return Ok(None);
        }
        Err(e) => return Err(e).context("simulate rectified circuit"),
    };
    if let Some(assignment) = &mismatch {
        log::error!(
            "rectified circuit differs from specification at {:?}",
            assignment
        );
    }
    Ok(Some(mismatch.is_none()))
}

/// Runs one rectification request; returns whether it succeeded.
pub fn handle_rectify(matches: &ArgMatches, config: &Option<DriverConfig>) -> anyhow::Result<bool> {
    let impl_path = matches.get_one::<String>("impl").unwrap();
    let spec_path = matches.get_one::<String>("spec").unwrap();
    let json = get_bool(matches, config.as_ref().and_then(|c| c.json), "json");
    let check = get_bool(matches, config.as_ref().and_then(|c| c.check), "check");
    let options = CegisOptions {
        max_iterations: get_max_iterations(
            matches,
            config,
            CegisOptions::default().max_iterations,
        ),
    };

    let implementation = load_circuit(impl_path, "implementation")?;
    let specification = load_circuit(spec_path, "specification")?;

    let stats = if matches.get_flag("stats") {
        Some(vec![
            CircuitStats::from_circuit(&implementation),
            CircuitStats::from_circuit(&specification),
        ])
    } else {
        None
    };
    if let (Some(stats), false) = (&stats, json) {
        println!("Implementation circuit:");
        print!("{}", stats[0]);
        println!();
        println!("Specification circuit:");
        print!("{}", stats[1]);
        println!();
    }

    let selection = if matches.get_flag("fix_all") {
        FixSelection::All
    } else {
        let names = parse_gate_list(matches.get_one::<String>("fix").unwrap());
        check_selected_gates(&implementation, &names);
        FixSelection::Gates(names)
    };

    if !json {
        let gates_to_fix = selection.resolve(&implementation)?;
        let total_parameters: usize = gates_to_fix
            .iter()
            .filter_map(|name| implementation.get_gate(name))
            .map(|g| 1usize << g.num_inputs())
            .sum();
        println!("Rectifying circuit: {}", implementation.name);
        println!(
            "  Gates to fix: {}",
            gates_to_fix.into_iter().collect::<Vec<_>>().join(", ")
        );
        println!("  Total parameters: {}", total_parameters);
        println!();
        println!("Running CEGIS...");
    }

    let start = Instant::now();
    let report = rectify::<VarisatOracle>(&implementation, &specification, &selection, &options)?;
    let elapsed = start.elapsed();

    let rectified = report.rectified(&implementation)?;
    let mut check_passed: Option<bool> = None;
    if let Some(rectified) = &rectified {
        if check {
            check_passed = check_rectified(rectified, &specification)?;
        }
        if let Some(output_path) = matches.get_one::<String>("output") {
            std::fs::write(output_path, emit_blif(rectified))
                .with_context(|| format!("write rectified circuit to {}", output_path))?;
            log::info!("wrote rectified circuit to {}", output_path);
        }
    }

    if json {
        let output = RectifyOutput {
            report: &report,
            elapsed_secs: elapsed.as_secs_f64(),
            stats,
            check_passed,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        print!("{}", report);
        println!("Time: {:.3}s", elapsed.as_secs_f64());
        match check_passed {
            Some(true) => println!("Check: rectified circuit matches specification"),
            Some(false) => println!("Check: FAILED, rectified circuit differs from specification"),
            None => {}
        }
    }

    Ok(report.success && check_passed != Some(false))
}
