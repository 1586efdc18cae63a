//! Error types for the minting engine.

use thiserror::Error;

/// Top-level engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// The network selector did not name a known network.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
    /// Malformed caller input, such as negative pagination.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// A block proof was rejected.
    #[error(transparent)]
    Proof(#[from] ProofError),
}

/// Reasons a proof digest is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProofError {
    /// The compact target is zero, malformed, or above the network limit.
    #[error("Target out of bounds")]
    TargetOutOfBounds,
    /// The digest is above the target.
    #[error("Insufficient work: digest above target")]
    InsufficientWork,
}

/// Compact target values that cannot be expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompactError {
    /// The sign bit is set on a non-zero mantissa.
    #[error("Negative compact target")]
    Negative,
    /// The encoded value does not fit in 256 bits.
    #[error("Compact target overflows 256 bits")]
    Overflow,
}
