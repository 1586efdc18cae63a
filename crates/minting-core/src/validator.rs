//! Proof digest checks against a compact target.

use log::warn;

use crate::arith::U256;
use crate::compact::CompactTarget;
use crate::error::ProofError;
use crate::params::{ConsensusParameters, Height};

/// Check a proof digest against `bits` for a block at `height`.
///
/// The target must expand cleanly, be non-zero and not exceed the limit
/// in force at `height`. The digest passes when it is at most the target.
pub fn check_proof(
    digest: &U256,
    height: Height,
    bits: CompactTarget,
    params: &ConsensusParameters,
) -> Result<(), ProofError> {
    let target = bits.expand().map_err(|err| {
        warn!("Rejecting proof at height {}: target {} {}", height, bits, err);
        ProofError::TargetOutOfBounds
    })?;

    if target.is_zero() || target > params.pow_limit_at(height) {
        warn!("Rejecting proof at height {}: target {} out of bounds", height, bits);
        return Err(ProofError::TargetOutOfBounds);
    }

    if *digest > target {
        return Err(ProofError::InsufficientWork);
    }

    Ok(())
}

/// [`check_proof`] for a 32-byte big-endian digest.
pub fn check_proof_bytes(
    digest: &[u8; 32],
    height: Height,
    bits: CompactTarget,
    params: &ConsensusParameters,
) -> Result<(), ProofError> {
    check_proof(&U256::from_big_endian(digest), height, bits, params)
}
