// SPDX-License-Identifier: Apache-2.0

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use rectify::blif::{emit_blif, parse_blif, BlifError};
use rectify::circuit::CircuitError;
use rectify::circuit_sim::exhaustive_mismatch;
use rectify::test_utils::{random_circuit, RandomCircuitOptions};

#[test]
fn random_circuits_round_trip_through_blif() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x5eed);
    for i in 0..16 {
        let original = random_circuit(
            &mut rng,
            &format!("rt{}", i),
            &RandomCircuitOptions::default(),
        );
        let text = emit_blif(&original);
        let reparsed = parse_blif(&text).unwrap();
        assert_eq!(reparsed.name, original.name);
        assert_eq!(reparsed.primary_inputs, original.primary_inputs);
        assert_eq!(reparsed.primary_outputs, original.primary_outputs);
        assert_eq!(
            exhaustive_mismatch(&original, &reparsed).unwrap(),
            None,
            "round trip changed behavior:\n{}",
            text
        );
        // A second trip is a fixed point.
        assert_eq!(emit_blif(&reparsed), text);
    }
}

#[test]
fn cycle_surfaces_when_ordering() {
    let text = "\
.model loop
.inputs a
.outputs q
.names a p q
11 1
.names q p
1 1
.end
";
    let circuit = parse_blif(text).unwrap();
    let err = circuit.dependency_order().unwrap_err();
    assert_eq!(
        err,
        CircuitError::Cycle {
            unresolved: vec!["q".to_string(), "p".to_string()],
        }
    );
}

#[test]
fn subckt_is_rejected() {
    let err = parse_blif(".model top\n.inputs a\n.outputs b\n.subckt child x=a y=b\n.end\n")
        .unwrap_err();
    assert!(matches!(
        err,
        BlifError::Unsupported { line: 4, ref directive } if directive == ".subckt"
    ));
}
