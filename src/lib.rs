// SPDX-License-Identifier: Apache-2.0

//! Counterexample-guided rectification of combinational circuits.
//!
//! Given a faulty implementation circuit and a reference specification with
//! the same primary inputs and outputs, finds replacement truth tables for a
//! chosen set of implementation gates so that both circuits agree on every
//! input assignment.
//!
//! Basic example usage:
//! ```
//! use rectify::blif::parse_blif;
//! use rectify::cegis::CegisOptions;
//! use rectify::oracle::VarisatOracle;
//! use rectify::rectify::{rectify, FixSelection};
//!
//! let implementation =
//!     parse_blif(".model impl\n.inputs a b\n.outputs f\n.names a b f\n11 1\n.end\n").unwrap();
//! let specification = parse_blif(
//!     ".model spec\n.inputs a b\n.outputs f\n.names a b f\n1- 1\n-1 1\n.end\n",
//! )
//! .unwrap();
//! let report = rectify::<VarisatOracle>(
//!     &implementation,
//!     &specification,
//!     &FixSelection::Gates(vec!["f".to_string()]),
//!     &CegisOptions::default(),
//! )
//! .unwrap();
//! assert!(report.success);
//! assert_eq!(report.fixes[0].new_kind, "OR");
//! ```

pub mod blif;
pub mod cegis;
pub mod circuit;
pub mod circuit_sim;
pub mod encoder;
pub mod oracle;
pub mod rectify;
pub mod rectify_error;
pub mod stats;
pub mod term;
pub mod test_utils;
pub mod topo;
pub mod truth_table;
