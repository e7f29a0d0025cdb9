// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::blif::BlifError;
use crate::cegis::CegisError;
use crate::circuit::CircuitError;
use crate::encoder::EncodeError;
use crate::oracle::OracleError;
use crate::truth_table::TruthTableError;

/// Any error a rectification request can raise.
#[derive(Debug)]
pub enum RectifyError {
    TruthTable(TruthTableError),
    Circuit(CircuitError),
    Encode(EncodeError),
    Oracle(OracleError),
    Cegis(CegisError),
    Blif(BlifError),
}

impl fmt::Display for RectifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RectifyError::TruthTable(e) => write!(f, "truth table error: {}", e),
            RectifyError::Circuit(e) => write!(f, "circuit error: {}", e),
            RectifyError::Encode(e) => write!(f, "encoding error: {}", e),
            RectifyError::Oracle(e) => write!(f, "{}", e),
            RectifyError::Cegis(e) => write!(f, "{}", e),
            RectifyError::Blif(e) => write!(f, "parse error: {}", e),
        }
    }
}

impl std::error::Error for RectifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RectifyError::TruthTable(e) => Some(e),
            RectifyError::Circuit(e) => Some(e),
            RectifyError::Encode(e) => Some(e),
            RectifyError::Oracle(e) => Some(e),
            RectifyError::Cegis(e) => Some(e),
            RectifyError::Blif(e) => Some(e),
        }
    }
}

impl From<TruthTableError> for RectifyError {
    fn from(e: TruthTableError) -> Self {
        RectifyError::TruthTable(e)
    }
}

impl From<CircuitError> for RectifyError {
    fn from(e: CircuitError) -> Self {
        RectifyError::Circuit(e)
    }
}

impl From<EncodeError> for RectifyError {
    fn from(e: EncodeError) -> Self {
        RectifyError::Encode(e)
    }
}

impl From<OracleError> for RectifyError {
    fn from(e: OracleError) -> Self {
        RectifyError::Oracle(e)
    }
}

impl From<CegisError> for RectifyError {
    fn from(e: CegisError) -> Self {
        RectifyError::Cegis(e)
    }
}

impl From<BlifError> for RectifyError {
    fn from(e: BlifError) -> Self {
        RectifyError::Blif(e)
    }
}
