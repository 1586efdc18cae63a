//! Stake weight and minting probability.
//!
//! A coin's chance of producing a valid PoS proof grows with its value and
//! its age past `stake_min_age`, up to `stake_max_age`. Consensus only needs
//! the integer coin-day weight; the float probabilities are informational.

use serde::{Deserialize, Serialize};

use crate::arith::{u256_to_f64, u512_to_f64, widen, U256};
use crate::compact::CompactTarget;
use crate::params::{Amount, ConsensusParameters, Timestamp, COIN, SECONDS_PER_DAY};

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A coin evaluated for staking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeCandidate {
    /// Value in the smallest unit.
    pub value: Amount,
    /// Time the coin became eligible.
    pub mint_time: Timestamp,
}

impl StakeCandidate {
    pub fn new(value: Amount, mint_time: Timestamp) -> Self {
        StakeCandidate { value, mint_time }
    }

    /// Seconds of eligible age at `now + time_offset`.
    ///
    /// Capped at `stake_max_age`, then reduced by `stake_min_age`; young
    /// coins yield a non-positive weight.
    pub fn time_weight(&self, now: Timestamp, time_offset: i64, params: &ConsensusParameters) -> i64 {
        now.saturating_sub(self.mint_time)
            .saturating_add(time_offset)
            .min(params.stake_max_age)
            .saturating_sub(params.stake_min_age)
    }

    /// Coin-day weight for a time weight in seconds: value × days / COIN.
    pub fn coin_day_weight(&self, time_weight: i64) -> U256 {
        if time_weight <= 0 {
            return U256::zero();
        }
        U256::from(self.value) * U256::from(time_weight as u64) / U256::from(COIN) / U256::from(SECONDS_PER_DAY as u64)
    }
}

/// Per-second probability that `candidate` mints a block under `bits`.
///
/// The product of coin-day weight and target is taken in 512 bits and
/// compared with the whole 256-bit hash space. Coins younger than
/// `stake_min_age` and malformed targets give zero.
pub fn instantaneous_probability(
    bits: CompactTarget,
    time_offset: i64,
    candidate: &StakeCandidate,
    now: Timestamp,
    params: &ConsensusParameters,
) -> f64 {
    let time_weight = candidate.time_weight(now, time_offset, params);
    if time_weight <= 0 {
        return 0.0;
    }

    let target_per_coin_day = match bits.expand() {
        Ok(target) => target,
        Err(_) => return 0.0,
    };

    let weight = widen(&candidate.coin_day_weight(time_weight));
    let product = weight * widen(&target_per_coin_day);
    clamp_probability(u512_to_f64(&product) / u256_to_f64(&U256::MAX))
}

/// Probability that `candidate` mints at least once within `minutes`.
///
/// Each whole day uses the coin's weight at the end of that day; the
/// leftover minutes use the weight at the end of the following day.
pub fn probability_within_window(
    bits: CompactTarget,
    minutes: u32,
    candidate: &StakeCandidate,
    now: Timestamp,
    params: &ConsensusParameters,
) -> f64 {
    let days = minutes / MINUTES_PER_DAY;
    let remainder = minutes % MINUTES_PER_DAY;

    let mut miss = 1.0;
    let mut time_offset = SECONDS_PER_DAY;
    for _ in 0..days {
        let p = instantaneous_probability(bits, time_offset, candidate, now, params);
        miss *= (1.0 - p).powf(SECONDS_PER_DAY as f64);
        time_offset += SECONDS_PER_DAY;
    }

    let p = instantaneous_probability(bits, time_offset, candidate, now, params);
    miss *= (1.0 - p).powf(f64::from(60 * remainder));

    clamp_probability(1.0 - miss)
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, 1.0)
}
