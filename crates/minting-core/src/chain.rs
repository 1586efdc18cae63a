//! Borrowed views of the header chain.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::compact::CompactTarget;
use crate::params::{Height, Timestamp};

/// How a block was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofType {
    /// Proof of work.
    Work,
    /// Proof of stake.
    Stake,
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofType::Work => write!(f, "PoW"),
            ProofType::Stake => write!(f, "PoS"),
        }
    }
}

/// The header fields the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: Height,
    /// Block timestamp (Unix time).
    pub timestamp: Timestamp,
    /// Target in compact form.
    pub bits: CompactTarget,
    pub proof_type: ProofType,
}

impl BlockHeader {
    pub fn new(height: Height, timestamp: Timestamp, bits: CompactTarget, proof_type: ProofType) -> Self {
        BlockHeader {
            height,
            timestamp,
            bits,
            proof_type,
        }
    }

    #[inline]
    pub fn is_proof_of_stake(&self) -> bool {
        self.proof_type == ProofType::Stake
    }
}

/// Read-only, height-ordered access to headers owned by storage.
///
/// The view must not change for the duration of one engine call.
pub trait ChainView {
    /// Header at `height`, if the view contains it.
    fn header_at(&self, height: Height) -> Option<&BlockHeader>;

    /// The header preceding `header`, or `None` at the root of the view.
    fn prev(&self, header: &BlockHeader) -> Option<&BlockHeader> {
        let height = header.height.checked_sub(1)?;
        self.header_at(height)
    }
}

/// A contiguous run of headers, the first element being the lowest height.
impl ChainView for [BlockHeader] {
    fn header_at(&self, height: Height) -> Option<&BlockHeader> {
        let base = self.first()?.height;
        let offset = height.checked_sub(base)? as usize;
        self.get(offset)
    }
}

impl ChainView for Vec<BlockHeader> {
    fn header_at(&self, height: Height) -> Option<&BlockHeader> {
        self.as_slice().header_at(height)
    }
}
