// SPDX-License-Identifier: Apache-2.0

//! Command line driver for circuit rectification.
//!
//! Reads a faulty implementation and a reference specification in BLIF and
//! searches for replacement functions for the selected implementation gates.
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- --impl buggy.blif --spec golden.blif --fix n1,n2
//! $ cargo run -- --impl buggy.blif --spec golden.blif --fix-all --json
//! $ cargo run -- --impl buggy.blif --spec golden.blif --fix n1 \
//!     --output fixed.blif --check -v
//! ```
//!
//! Settings may also come from a TOML file given with `--config`, or from
//! `rectify.toml` in the working directory.

mod driver_config;
mod rectify_cmd;
mod report_cli_error;

use clap::{Arg, ArgAction, ArgGroup};

use crate::report_cli_error::report_cli_error_and_exit;

fn main() {
    let matches = clap::Command::new("rectify")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rectify buggy circuits using CEGIS-based synthesis")
        .arg(
            Arg::new("impl")
                .long("impl")
                .value_name("BLIF")
                .help("Path to buggy implementation BLIF file")
                .required(true),
        )
        .arg(
            Arg::new("spec")
                .long("spec")
                .value_name("BLIF")
                .help("Path to correct specification BLIF file")
                .required(true),
        )
        .arg(
            Arg::new("fix")
                .long("fix")
                .value_name("GATES")
                .help("Comma-separated list of gate names to fix"),
        )
        .arg(
            Arg::new("fix_all")
                .long("fix-all")
                .help("Try to fix all gates (can be slow)")
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("fix_selection")
                .args(["fix", "fix_all"])
                .required(true),
        )
        .arg(
            Arg::new("max_iter")
                .long("max-iter")
                .value_name("N")
                .help("Maximum CEGIS iterations (default: 10000)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Print circuit statistics")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Emit the result as JSON on stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("BLIF")
                .help("Write the rectified implementation to this path on success"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Exhaustively re-verify the rectified circuit against the specification")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("TOML")
                .help("Path to a rectify.toml configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print detailed progress")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let mut logger = env_logger::Builder::from_default_env();
    if matches.get_flag("verbose") {
        logger.filter_level(log::LevelFilter::Debug);
    }
    let _ = logger.try_init();

    log::info!("rectify starting; version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let config = match driver_config::load_config(config_path) {
        Ok(config) => config,
        Err(e) => report_cli_error_and_exit(
            "could not load configuration",
            vec![("error", &format!("{:#}", e))],
        ),
    };

    match rectify_cmd::handle_rectify(&matches, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => report_cli_error_and_exit(&e.to_string(), vec![("error", &format!("{:#}", e))]),
    }
}
