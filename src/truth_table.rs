// SPDX-License-Identifier: Apache-2.0

//! Gate functions described as a list of onset cubes.
//!
//! A cube is a string over `{0, 1, -}` with one character per gate input; the
//! gate output is true when any cube matches the input values. This is the
//! same representation BLIF uses for `.names` rows.

use std::fmt;

use bitvec::vec::BitVec;

/// Largest arity for which we are willing to materialize an explicit
/// `2^n`-row table. Only used for classification and reporting.
pub const MAX_CANONICAL_ARITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeValue {
    Zero,
    One,
    DontCare,
}

impl CubeValue {
    pub fn matches(&self, value: bool) -> bool {
        match self {
            CubeValue::Zero => !value,
            CubeValue::One => value,
            CubeValue::DontCare => true,
        }
    }

    fn to_char(self) -> char {
        match self {
            CubeValue::Zero => '0',
            CubeValue::One => '1',
            CubeValue::DontCare => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cube {
    values: Vec<CubeValue>,
}

impl Cube {
    pub fn parse(text: &str) -> Result<Self, TruthTableError> {
        let mut values = Vec::with_capacity(text.len());
        for c in text.chars() {
            let value = match c {
                '0' => CubeValue::Zero,
                '1' => CubeValue::One,
                '-' => CubeValue::DontCare,
                other => {
                    return Err(TruthTableError::InvalidCubeChar {
                        cube: text.to_string(),
                        c: other,
                    });
                }
            };
            values.push(value);
        }
        Ok(Cube { values })
    }

    pub fn values(&self) -> &[CubeValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if every position is a don't-care, i.e. the cube covers the whole
    /// input space.
    pub fn is_tautology(&self) -> bool {
        self.values.iter().all(|v| *v == CubeValue::DontCare)
    }

    pub fn matches(&self, inputs: &[bool]) -> bool {
        self.values
            .iter()
            .zip(inputs.iter())
            .all(|(v, input)| v.matches(*input))
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.values {
            write!(f, "{}", v.to_char())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruthTableError {
    InvalidCubeChar { cube: String, c: char },
    CubeWidthMismatch { cube: String, num_inputs: usize },
    /// A zero-input table may only hold a single (empty) cube.
    MalformedConstant { cube_count: usize },
    CanonicalWidthMismatch { num_inputs: usize, bit_count: usize },
}

impl fmt::Display for TruthTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TruthTableError::InvalidCubeChar { cube, c } => {
                write!(f, "invalid character '{}' in cube '{}'", c, cube)
            }
            TruthTableError::CubeWidthMismatch { cube, num_inputs } => write!(
                f,
                "cube '{}' has {} bits but gate has {} inputs",
                cube,
                cube.len(),
                num_inputs
            ),
            TruthTableError::MalformedConstant { cube_count } => write!(
                f,
                "constant truth table must have at most one cube; got {}",
                cube_count
            ),
            TruthTableError::CanonicalWidthMismatch {
                num_inputs,
                bit_count,
            } => write!(
                f,
                "canonical table for {} inputs needs {} rows; got {}",
                num_inputs,
                1usize << num_inputs,
                bit_count
            ),
        }
    }
}

impl std::error::Error for TruthTableError {}

/// Returns the row index of an input pattern: the first input is the most
/// significant bit.
///
/// This ordering is shared by the parameterized gate encoding and the
/// counterexample-to-constraint step, so the two always address the same
/// parameter for the same input values.
pub fn row_index(inputs: &[bool]) -> usize {
    let n = inputs.len();
    inputs
        .iter()
        .enumerate()
        .filter(|(_, v)| **v)
        .map(|(i, _)| 1usize << (n - 1 - i))
        .sum()
}

/// Inverse of `row_index` for a given arity.
pub fn row_inputs(row: usize, num_inputs: usize) -> Vec<bool> {
    (0..num_inputs)
        .map(|i| (row >> (num_inputs - 1 - i)) & 1 == 1)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TruthTable {
    num_inputs: usize,
    onset_cubes: Vec<Cube>,
}

impl TruthTable {
    pub fn new(num_inputs: usize, onset_cubes: &[&str]) -> Result<Self, TruthTableError> {
        let cubes = onset_cubes
            .iter()
            .map(|text| Cube::parse(text))
            .collect::<Result<Vec<Cube>, TruthTableError>>()?;
        Self::from_cubes(num_inputs, cubes)
    }

    pub fn from_cubes(num_inputs: usize, onset_cubes: Vec<Cube>) -> Result<Self, TruthTableError> {
        if num_inputs == 0 && onset_cubes.len() > 1 {
            return Err(TruthTableError::MalformedConstant {
                cube_count: onset_cubes.len(),
            });
        }
        for cube in &onset_cubes {
            if cube.len() != num_inputs {
                return Err(TruthTableError::CubeWidthMismatch {
                    cube: cube.to_string(),
                    num_inputs,
                });
            }
        }
        Ok(TruthTable {
            num_inputs,
            onset_cubes,
        })
    }

    pub fn constant(value: bool) -> Self {
        TruthTable {
            num_inputs: 0,
            onset_cubes: if value {
                vec![Cube { values: vec![] }]
            } else {
                vec![]
            },
        }
    }

    /// Builds a table from explicit rows (row `i` is the output for the input
    /// pattern with `row_index == i`). The onset holds one minterm per set row.
    pub fn from_canonical(num_inputs: usize, rows: &[bool]) -> Result<Self, TruthTableError> {
        if rows.len() != 1usize << num_inputs {
            return Err(TruthTableError::CanonicalWidthMismatch {
                num_inputs,
                bit_count: rows.len(),
            });
        }
        if num_inputs == 0 {
            return Ok(Self::constant(rows[0]));
        }
        let onset_cubes = rows
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(|(row, _)| Cube {
                values: row_inputs(row, num_inputs)
                    .into_iter()
                    .map(|b| if b { CubeValue::One } else { CubeValue::Zero })
                    .collect(),
            })
            .collect();
        Ok(TruthTable {
            num_inputs,
            onset_cubes,
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn onset_cubes(&self) -> &[Cube] {
        &self.onset_cubes
    }

    pub fn evaluate(&self, inputs: &[bool]) -> bool {
        assert_eq!(
            inputs.len(),
            self.num_inputs,
            "truth table evaluated with wrong number of inputs"
        );
        self.onset_cubes.iter().any(|cube| cube.matches(inputs))
    }

    /// Returns the explicit table, row 0 first, or `None` when the arity is
    /// above `MAX_CANONICAL_ARITY`.
    pub fn to_canonical_table(&self) -> Option<BitVec> {
        if self.num_inputs > MAX_CANONICAL_ARITY {
            return None;
        }
        let mut bits = BitVec::repeat(false, 1usize << self.num_inputs);
        for row in 0..bits.len() {
            let inputs = row_inputs(row, self.num_inputs);
            bits.set(row, self.evaluate(&inputs));
        }
        Some(bits)
    }

    pub fn classify(&self) -> GateKind {
        match self.to_canonical_table() {
            Some(bits) => {
                let rows: Vec<bool> = bits.iter().by_vals().collect();
                GateKind::from_rows(&rows)
            }
            None => GateKind::Complex("TOO_LARGE".to_string()),
        }
    }
}

impl fmt::Display for TruthTable {
    /// Renders the onset in BLIF row form, one row per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_inputs == 0 {
            if !self.onset_cubes.is_empty() {
                writeln!(f, "1")?;
            }
            return Ok(());
        }
        for cube in &self.onset_cubes {
            writeln!(f, "{} 1", cube)?;
        }
        Ok(())
    }
}

/// Named elementary functions, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateKind {
    Const0,
    Const1,
    Buf,
    Not,
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
    BufA,
    BufB,
    NotA,
    NotB,
    AAndNotB,
    NotAAndB,
    AOrNotB,
    NotAOrB,
    /// Payload is the canonical table as a `0`/`1` string.
    Complex(String),
}

impl GateKind {
    pub fn from_rows(rows: &[bool]) -> GateKind {
        let table: String = rows.iter().map(|b| if *b { '1' } else { '0' }).collect();
        match table.as_str() {
            "0" | "00" | "0000" => GateKind::Const0,
            "1" | "11" | "1111" => GateKind::Const1,
            "01" => GateKind::Buf,
            "10" => GateKind::Not,
            "0001" => GateKind::And,
            "0111" => GateKind::Or,
            "1110" => GateKind::Nand,
            "1000" => GateKind::Nor,
            "0110" => GateKind::Xor,
            "1001" => GateKind::Xnor,
            "0011" => GateKind::BufA,
            "0101" => GateKind::BufB,
            "1100" => GateKind::NotA,
            "1010" => GateKind::NotB,
            "0010" => GateKind::AAndNotB,
            "0100" => GateKind::NotAAndB,
            "1011" => GateKind::AOrNotB,
            "1101" => GateKind::NotAOrB,
            _ => GateKind::Complex(table),
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateKind::Const0 => "CONST0",
            GateKind::Const1 => "CONST1",
            GateKind::Buf => "BUF",
            GateKind::Not => "NOT",
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
            GateKind::BufA => "BUF_A",
            GateKind::BufB => "BUF_B",
            GateKind::NotA => "NOT_A",
            GateKind::NotB => "NOT_B",
            GateKind::AAndNotB => "A_AND_NOT_B",
            GateKind::NotAAndB => "NOT_A_AND_B",
            GateKind::AOrNotB => "A_OR_NOT_B",
            GateKind::NotAOrB => "NOT_A_OR_B",
            GateKind::Complex(table) => return write!(f, "COMPLEX({})", table),
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn all_assignments(n: usize) -> Vec<Vec<bool>> {
        (0..(1usize << n)).map(|row| row_inputs(row, n)).collect()
    }

    #[test]
    fn test_evaluate_and_or() {
        let and = TruthTable::new(2, &["11"]).unwrap();
        let or = TruthTable::new(2, &["1-", "-1"]).unwrap();
        assert!(and.evaluate(&[true, true]));
        assert!(!and.evaluate(&[true, false]));
        assert!(or.evaluate(&[false, true]));
        assert!(!or.evaluate(&[false, false]));
    }

    #[test]
    fn test_constants() {
        assert!(TruthTable::constant(true).evaluate(&[]));
        assert!(!TruthTable::constant(false).evaluate(&[]));
        assert!(TruthTable::new(0, &[""]).unwrap().evaluate(&[]));
        assert!(!TruthTable::new(0, &[]).unwrap().evaluate(&[]));
    }

    #[test]
    fn test_malformed_constant_rejected() {
        assert_eq!(
            TruthTable::new(0, &["", ""]),
            Err(TruthTableError::MalformedConstant { cube_count: 2 })
        );
    }

    #[test]
    fn test_bad_cubes_rejected() {
        assert!(matches!(
            TruthTable::new(2, &["1"]),
            Err(TruthTableError::CubeWidthMismatch { .. })
        ));
        assert!(matches!(
            TruthTable::new(2, &["1x"]),
            Err(TruthTableError::InvalidCubeChar { c: 'x', .. })
        ));
    }

    #[test_case(1, &["1"]; "buffer")]
    #[test_case(1, &["0"]; "inverter")]
    #[test_case(2, &["11"]; "and")]
    #[test_case(2, &["1-", "-1"]; "or")]
    #[test_case(2, &["10", "01"]; "xor")]
    #[test_case(3, &["1-0", "011", "--1"]; "three input mix")]
    #[test_case(4, &["1--0", "-11-", "0000"]; "four input mix")]
    fn test_evaluate_matches_canonical(num_inputs: usize, cubes: &[&str]) {
        let tt = TruthTable::new(num_inputs, cubes).unwrap();
        let canonical = tt.to_canonical_table().unwrap();
        for inputs in all_assignments(num_inputs) {
            assert_eq!(
                tt.evaluate(&inputs),
                canonical[row_index(&inputs)],
                "inputs: {:?}",
                inputs
            );
        }
    }

    #[test]
    fn test_canonical_first_input_msb() {
        // a AND NOT b is only true at (1, 0), which is row 2.
        let tt = TruthTable::new(2, &["10"]).unwrap();
        let bits: Vec<bool> = tt.to_canonical_table().unwrap().iter().by_vals().collect();
        assert_eq!(bits, vec![false, false, true, false]);
    }

    #[test]
    fn test_canonical_above_ceiling() {
        let tt = TruthTable::new(5, &["1----"]).unwrap();
        assert!(tt.to_canonical_table().is_none());
        assert_eq!(tt.classify(), GateKind::Complex("TOO_LARGE".to_string()));
    }

    #[test_case(1, &["1"], GateKind::Buf)]
    #[test_case(1, &["0"], GateKind::Not)]
    #[test_case(2, &["11"], GateKind::And)]
    #[test_case(2, &["1-", "-1"], GateKind::Or)]
    #[test_case(2, &["0-", "-0"], GateKind::Nand)]
    #[test_case(2, &["00"], GateKind::Nor)]
    #[test_case(2, &["10", "01"], GateKind::Xor)]
    #[test_case(2, &["00", "11"], GateKind::Xnor)]
    #[test_case(2, &[], GateKind::Const0)]
    #[test_case(2, &["--"], GateKind::Const1)]
    #[test_case(0, &[""], GateKind::Const1)]
    #[test_case(2, &["1-"], GateKind::BufA)]
    fn test_classify(num_inputs: usize, cubes: &[&str], want: GateKind) {
        assert_eq!(TruthTable::new(num_inputs, cubes).unwrap().classify(), want);
    }

    #[test]
    fn test_classify_complex_three_input() {
        let majority = TruthTable::new(3, &["11-", "1-1", "-11"]).unwrap();
        assert_eq!(majority.classify().to_string(), "COMPLEX(00010111)");
    }

    #[test]
    fn test_from_canonical_round_trip() {
        let rows = [false, true, true, false];
        let tt = TruthTable::from_canonical(2, &rows).unwrap();
        assert_eq!(tt.classify(), GateKind::Xor);
        let bits: Vec<bool> = tt.to_canonical_table().unwrap().iter().by_vals().collect();
        assert_eq!(bits, rows.to_vec());
        assert!(matches!(
            TruthTable::from_canonical(2, &[true]),
            Err(TruthTableError::CanonicalWidthMismatch { .. })
        ));
    }

    #[test]
    fn test_row_index() {
        assert_eq!(row_index(&[]), 0);
        assert_eq!(row_index(&[true]), 1);
        assert_eq!(row_index(&[true, false]), 2);
        assert_eq!(row_index(&[false, true]), 1);
        assert_eq!(row_index(&[true, true, false]), 6);
        assert_eq!(row_inputs(6, 3), vec![true, true, false]);
    }

    #[test]
    fn test_display_blif_rows() {
        let tt = TruthTable::new(2, &["1-", "-1"]).unwrap();
        assert_eq!(tt.to_string(), "1- 1\n-1 1\n");
        assert_eq!(TruthTable::constant(true).to_string(), "1\n");
        assert_eq!(TruthTable::constant(false).to_string(), "");
    }
}
