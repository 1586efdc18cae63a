//! Consensus engine handle exposed to JavaScript.

use log::{debug, warn};
use minting_core::arith::u256_from_hex;
use minting_core::{
    check_proof, current_stake_target, list_minting, next_target, probability_within_window, Amount, BlockHeader,
    CompactTarget, ConsensusError, ConsensusParameters, MintingQuery, ProofError, ProofType, StakeCandidate, Timestamp, WalletCoin,
    U256,
};
use wasm_bindgen::prelude::*;

use crate::state::{NetworkInfo, TargetInfo};

/// Consensus rules for one network.
#[wasm_bindgen]
pub struct ConsensusEngine {
    params: ConsensusParameters,
}

#[wasm_bindgen]
impl ConsensusEngine {
    /// Create an engine for `network` ("main", "test" or "regtest").
    #[wasm_bindgen(constructor)]
    pub fn new(network: &str) -> Result<ConsensusEngine, JsValue> {
        let params = ConsensusParameters::select(network).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(ConsensusEngine { params })
    }

    /// Compact target required of the block after the last of `headers`.
    ///
    /// # Arguments
    /// * `headers` - Array of `{height, timestamp, bits, proof_type}`, oldest first
    /// * `candidate_time` - Timestamp of the block being built (or 0 for now)
    /// * `proof_of_stake` - Whether the next block is proof-of-stake
    #[wasm_bindgen]
    pub fn next_target(&self, headers: JsValue, candidate_time: f64, proof_of_stake: bool) -> Result<u32, JsValue> {
        let headers = headers_from_js(headers)?;
        let tip = headers.last().ok_or_else(|| JsValue::from_str("No headers supplied"))?;
        let proof_type = if proof_of_stake { ProofType::Stake } else { ProofType::Work };

        let bits = next_target(&headers, tip, resolve_time(candidate_time), &self.params, proof_type);
        Ok(bits.to_bits())
    }

    /// Check a PoW digest (64 hex digits, big-endian) against `bits`.
    ///
    /// Returns false when the digest is above the target and an error when
    /// the target itself is out of bounds.
    #[wasm_bindgen]
    pub fn check_proof(&self, digest_hex: &str, height: u32, bits: u32) -> Result<bool, JsValue> {
        let digest = parse_digest(digest_hex).map_err(|e| JsValue::from_str(&e))?;
        proof_outcome(&digest, height, bits, &self.params).map_err(|e| JsValue::from_str(&e))
    }

    /// Bits of the most recent PoS block in `headers`, or the initial
    /// PoS target when there is none.
    #[wasm_bindgen]
    pub fn stake_target(&self, headers: JsValue) -> Result<u32, JsValue> {
        let headers = headers_from_js(headers)?;
        let tip = headers.last().ok_or_else(|| JsValue::from_str("No headers supplied"))?;
        Ok(current_stake_target(&headers, tip, &self.params).to_bits())
    }

    /// Probability that a coin mints within `minutes`.
    ///
    /// # Arguments
    /// * `bits` - Current PoS target
    /// * `value` - Coin value in base units
    /// * `mint_time` - Time the coin was confirmed
    /// * `now` - Query time (or 0 for now)
    #[wasm_bindgen]
    pub fn minting_probability(&self, bits: u32, minutes: u32, value: f64, mint_time: f64, now: f64) -> Result<f64, JsValue> {
        let value = amount_from_js(value).map_err(|e| JsValue::from_str(&e))?;
        let candidate = StakeCandidate::new(value, mint_time as Timestamp);
        Ok(probability_within_window(
            CompactTarget(bits),
            minutes,
            &candidate,
            resolve_time(now),
            &self.params,
        ))
    }

    /// List mintable coins with weights and probabilities.
    ///
    /// # Arguments
    /// * `coins` - Array of `{address, txid, vout, value, block_time, depth}`
    /// * `bits` - Current PoS target
    /// * `now` - Query time (or 0 for now)
    /// * `count`, `skip` - Pagination; count 0 lists everything
    /// * `min_weight`, `max_weight` - Coin-day weight filter; max 0 is unbounded
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn list_minting(
        &self,
        coins: JsValue,
        bits: u32,
        now: f64,
        count: f64,
        skip: f64,
        min_weight: f64,
        max_weight: f64,
    ) -> Result<JsValue, JsValue> {
        let coins: Vec<WalletCoin> = serde_wasm_bindgen::from_value(coins)
            .map_err(|e| JsValue::from_str(&format!("Invalid coins: {}", e)))?;
        let query = query_from_js(count, skip, min_weight, max_weight).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let records = list_minting(&coins, CompactTarget(bits), resolve_time(now), &self.params, &query)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        serde_wasm_bindgen::to_value(&records)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
    }

    /// Decode `bits` into target and difficulty.
    #[wasm_bindgen]
    pub fn target_info(&self, bits: u32) -> Result<JsValue, JsValue> {
        TargetInfo::from_bits(bits).map_err(|e| JsValue::from_str(&e))?.to_js()
    }

    /// Get the current network.
    #[wasm_bindgen(getter)]
    pub fn network(&self) -> String {
        self.params.network.name().to_string()
    }

    /// Get a summary of the network's consensus parameters.
    #[wasm_bindgen]
    pub fn params(&self) -> Result<JsValue, JsValue> {
        NetworkInfo::new(&self.params).to_js()
    }
}

fn headers_from_js(headers: JsValue) -> Result<Vec<BlockHeader>, JsValue> {
    let headers: Vec<BlockHeader> = serde_wasm_bindgen::from_value(headers)
        .map_err(|e| JsValue::from_str(&format!("Invalid headers: {}", e)))?;
    check_contiguous(&headers).map_err(|e| JsValue::from_str(&e))?;
    debug!("Received {} headers from JS", headers.len());
    Ok(headers)
}

/// Headers must be consecutive by height so parents resolve by index.
fn check_contiguous(headers: &[BlockHeader]) -> Result<(), String> {
    for pair in headers.windows(2) {
        if pair[0].height.checked_add(1) != Some(pair[1].height) {
            return Err(format!(
                "Headers not contiguous: {} followed by {}",
                pair[0].height, pair[1].height
            ));
        }
    }
    Ok(())
}

/// Parse a 64-digit big-endian hex digest.
fn parse_digest(digest_hex: &str) -> Result<U256, String> {
    let digits = digest_hex.trim();
    if digits.trim_start_matches("0x").len() != 64 {
        return Err("Digest must be 32 bytes".to_string());
    }
    u256_from_hex(digits).map_err(|_| "Invalid digest hex".to_string())
}

fn proof_outcome(digest: &U256, height: u32, bits: u32, params: &ConsensusParameters) -> Result<bool, String> {
    match check_proof(digest, height, CompactTarget(bits), params) {
        Ok(()) => Ok(true),
        Err(ProofError::InsufficientWork) => Ok(false),
        Err(e) => Err(e.to_string()),
    }
}

/// Build a listing query from JS numbers, rejecting anything that is not
/// a whole number in `i64` range. Sign checks are left to the core.
fn query_from_js(count: f64, skip: f64, min_weight: f64, max_weight: f64) -> Result<MintingQuery, ConsensusError> {
    Ok(MintingQuery {
        count: integer_from_js(count, "count")?,
        skip: integer_from_js(skip, "skip")?,
        min_weight: integer_from_js(min_weight, "minweight")?,
        max_weight: integer_from_js(max_weight, "maxweight")?,
    })
}

fn integer_from_js(value: f64, name: &str) -> Result<i64, ConsensusError> {
    // 2^63; i64::MAX itself is not representable.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if !value.is_finite() || value.fract() != 0.0 || value < -LIMIT || value >= LIMIT {
        warn!("Rejecting minting query: {} is {}", name, value);
        return Err(ConsensusError::InvalidParameter(format!("Invalid {}: {}", name, value)));
    }
    Ok(value as i64)
}

fn amount_from_js(value: f64) -> Result<Amount, String> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > Amount::MAX as f64 {
        return Err(format!("Invalid amount: {}", value));
    }
    Ok(value as Amount)
}

/// Seconds since the epoch, using the current time when `time` is not positive.
fn resolve_time(time: f64) -> Timestamp {
    if time > 0.0 {
        time as Timestamp
    } else {
        (js_sys::Date::now() / 1000.0) as Timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minting_core::Network;

    fn header(height: u32) -> BlockHeader {
        BlockHeader::new(height, 1_600_000_000 + i64::from(height) * 60, CompactTarget(0x1e0fffff), ProofType::Work)
    }

    #[test]
    fn test_parse_digest() {
        let digest = parse_digest(&format!("{}01", "0".repeat(62))).unwrap();
        assert_eq!(digest, U256::one());

        let prefixed = parse_digest(&format!("0x{}", "f".repeat(64))).unwrap();
        assert_eq!(prefixed, U256::MAX);

        assert!(parse_digest("abcd").is_err());
        assert!(parse_digest(&"z".repeat(64)).is_err());
    }

    #[test]
    fn test_check_contiguous() {
        let headers: Vec<BlockHeader> = (5..10).map(header).collect();
        assert!(check_contiguous(&headers).is_ok());
        assert!(check_contiguous(&[]).is_ok());

        let gapped = vec![header(5), header(7)];
        assert!(check_contiguous(&gapped).is_err());
    }

    #[test]
    fn test_proof_outcome() {
        let params = ConsensusParameters::for_network(Network::Main);
        assert_eq!(proof_outcome(&U256::one(), 1, 0x1d00ffff, &params), Ok(true));
        assert_eq!(proof_outcome(&U256::MAX, 1, 0x1d00ffff, &params), Ok(false));
        assert!(proof_outcome(&U256::one(), 1, 0, &params).is_err());
    }

    #[test]
    fn test_query_from_js() {
        assert_eq!(
            query_from_js(5.0, 2.0, 0.0, 100.0),
            Ok(MintingQuery { count: 5, skip: 2, min_weight: 0, max_weight: 100 })
        );
        // Negative whole numbers pass through for the core to reject by name.
        assert_eq!(query_from_js(0.0, -1.0, 0.0, 0.0).map(|q| q.skip), Ok(-1));

        assert_eq!(
            query_from_js(0.0, -0.5, 0.0, 0.0),
            Err(ConsensusError::InvalidParameter("Invalid skip: -0.5".to_string()))
        );
        assert!(query_from_js(f64::NAN, 0.0, 0.0, 0.0).is_err());
        assert!(query_from_js(2.7, 0.0, 0.0, 0.0).is_err());
        assert!(query_from_js(0.0, 0.0, f64::INFINITY, 0.0).is_err());
        assert!(query_from_js(0.0, 0.0, 0.0, 1e19).is_err());
    }

    #[test]
    fn test_amount_from_js() {
        assert_eq!(amount_from_js(150_000_000.0), Ok(150_000_000));
        assert_eq!(amount_from_js(0.0), Ok(0));
        assert!(amount_from_js(-1.0).is_err());
        assert!(amount_from_js(1.5).is_err());
        assert!(amount_from_js(f64::NAN).is_err());
    }

    #[test]
    fn test_resolve_time_keeps_explicit_time() {
        assert_eq!(resolve_time(1_600_000_000.0), 1_600_000_000);
    }
}
