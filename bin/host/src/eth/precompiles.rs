//! Contains the in-process EIP-4844 point-evaluation precompile.
//!
//! The precompile is deterministic, so the host runs it locally and stores
//! the outcome; replays then need no network at all.

use alloy_eips::eip4844::kzg_to_versioned_hash;
use c_kzg::{ethereum_kzg_settings, Bytes32, Bytes48, KzgProof};

/// The exact input length the point-evaluation precompile accepts:
/// `versioned_hash(32) ++ z(32) ++ y(32) ++ commitment(48) ++ proof(48)`.
const POINT_EVALUATION_INPUT_LENGTH: usize = 192;

/// Runs the EIP-4844 point-evaluation precompile over `input` and reports
/// whether the proof verifies. Input validation is the precompile's
/// responsibility: malformed input is a failed evaluation, not an error.
pub(crate) fn kzg_point_evaluation(input: &[u8]) -> bool {
    if input.len() != POINT_EVALUATION_INPUT_LENGTH {
        return false;
    }

    let versioned_hash = &input[..32];
    let commitment = &input[96..144];
    if kzg_to_versioned_hash(commitment).as_slice() != versioned_hash {
        return false;
    }

    let Ok(z) = Bytes32::from_bytes(&input[32..64]) else {
        return false;
    };
    let Ok(y) = Bytes32::from_bytes(&input[64..96]) else {
        return false;
    };
    let Ok(commitment) = Bytes48::from_bytes(commitment) else {
        return false;
    };
    let Ok(proof) = Bytes48::from_bytes(&input[144..192]) else {
        return false;
    };

    KzgProof::verify_kzg_proof(&commitment, &z, &y, &proof, ethereum_kzg_settings())
        .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use super::*;

    /// The compressed-infinity G1 point: the commitment to the zero
    /// polynomial, for which every evaluation is zero and the identity is
    /// its own proof.
    fn infinity_point() -> [u8; 48] {
        let mut point = [0u8; 48];
        point[0] = 0xc0;
        point
    }

    fn valid_input() -> Vec<u8> {
        let commitment = infinity_point();
        let mut input = vec![0u8; POINT_EVALUATION_INPUT_LENGTH];
        input[..32].copy_from_slice(kzg_to_versioned_hash(&commitment).as_slice());
        input[96..144].copy_from_slice(&commitment);
        input[144..192].copy_from_slice(&infinity_point());
        input
    }

    #[test]
    fn test_valid_proof_verifies() {
        assert!(kzg_point_evaluation(&valid_input()));
    }

    #[test]
    fn test_garbage_input_fails() {
        assert!(!kzg_point_evaluation(&[0xde; 64]));
        assert!(!kzg_point_evaluation(&[]));
        assert!(!kzg_point_evaluation(&[0xde; POINT_EVALUATION_INPUT_LENGTH]));
    }

    #[test]
    fn test_wrong_versioned_hash_fails() {
        let mut input = valid_input();
        input[0] ^= 0xff;
        assert!(!kzg_point_evaluation(&input));
    }

    #[test]
    fn test_wrong_claimed_value_fails() {
        let mut input = valid_input();
        // Claim p(z) = 1 for the zero polynomial.
        input[95] = 0x01;
        assert!(!kzg_point_evaluation(&input));
    }
}
