//! Consensus engine for a hybrid proof-of-work / proof-of-stake chain.
//!
//! This crate provides pure Rust implementations of:
//! - Per-network consensus parameters and version-bits deployment config
//! - Compact ("bits") target encoding with Bitcoin semantics
//! - Same-proof-type ancestor lookup on an interleaved chain
//! - Next-block target computation (legacy, averaging, PoS)
//! - Proof-of-work digest validation
//! - Stake weight and minting probability estimates
//! - A wallet-facing listing of mintable outputs

pub mod arith;
pub mod chain;
pub mod compact;
pub mod error;
pub mod filter;
pub mod listing;
pub mod network;
pub mod oracle;
pub mod params;
pub mod stake;
pub mod validator;

pub use arith::U256;
pub use chain::{BlockHeader, ChainView, ProofType};
pub use compact::{format_difficulty, CompactTarget};
pub use error::{CompactError, ConsensusError, ProofError};
pub use filter::{ancestors_of_type, most_recent_of_type};
pub use listing::{current_stake_target, list_minting, MintingQuery, MintingRecord, MintingStatus, WalletCoin};
pub use network::Network;
pub use oracle::{next_target, RetargetRule};
pub use params::{Amount, ConsensusParameters, Deployment, DeploymentPos, Height, Timestamp, COIN};
pub use stake::{instantaneous_probability, probability_within_window, StakeCandidate};
pub use validator::{check_proof, check_proof_bytes};
