//! Mintable-output listing for wallet tooling.
//!
//! Not consensus-critical. Coins come from the wallet in its own order; the
//! listing applies pagination and weight filters and attaches probability
//! estimates at fixed horizons.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::chain::{BlockHeader, ChainView, ProofType};
use crate::compact::CompactTarget;
use crate::error::ConsensusError;
use crate::filter::most_recent_of_type;
use crate::oracle::initial_target;
use crate::params::{Amount, ConsensusParameters, Timestamp, COIN, SECONDS_PER_DAY};
use crate::stake::{probability_within_window, StakeCandidate, MINUTES_PER_DAY};

/// Probability horizons reported per coin, in minutes.
pub const HORIZON_10_MINUTES: u32 = 10;
pub const HORIZON_24_HOURS: u32 = MINUTES_PER_DAY;
pub const HORIZON_30_DAYS: u32 = 30 * MINUTES_PER_DAY;
pub const HORIZON_90_DAYS: u32 = 90 * MINUTES_PER_DAY;

/// Pagination and weight filters as supplied by the caller.
///
/// Values are signed so that negative input can be rejected rather than
/// wrapped. Zero `count` and zero `max_weight` mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MintingQuery {
    pub count: i64,
    pub skip: i64,
    pub min_weight: i64,
    pub max_weight: i64,
}

/// A [`MintingQuery`] that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pagination {
    count: u64,
    skip: u64,
    min_weight: u64,
    max_weight: u64,
}

impl MintingQuery {
    fn validate(&self) -> Result<Pagination, ConsensusError> {
        let check = |value: i64, name: &str| {
            u64::try_from(value).map_err(|_| {
                warn!("Rejecting minting query: negative {}", name);
                ConsensusError::InvalidParameter(format!("Negative {}", name))
            })
        };

        Ok(Pagination {
            count: check(self.count, "count")?,
            skip: check(self.skip, "skip")?,
            min_weight: check(self.min_weight, "minweight")?,
            max_weight: check(self.max_weight, "maxweight")?,
        })
    }
}

/// A spendable output as reported by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCoin {
    pub address: String,
    pub txid: String,
    pub vout: u32,
    pub value: Amount,
    /// Timestamp of the block that confirmed the output, if any.
    pub block_time: Option<Timestamp>,
    /// Confirmations; zero means not yet in the main chain.
    pub depth: u32,
}

/// Whether a coin has reached `stake_min_age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MintingStatus {
    Mature,
    Immature,
}

/// One row of the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintingRecord {
    pub address: String,
    pub transaction_id: String,
    pub output_index: u32,
    pub mint_time: Timestamp,
    pub value: Amount,
    pub status: MintingStatus,
    pub age_in_days: i64,
    pub coin_day_weight: u64,
    pub probability_10m: f64,
    pub probability_24h: f64,
    pub probability_30d: f64,
    pub probability_90d: f64,
    /// Seconds past `stake_min_age` for mature coins, zero otherwise.
    pub attempts: i64,
}

/// Stake target to quote probabilities against: the latest PoS block's
/// bits, or the initial PoS target when none exists.
pub fn current_stake_target<C>(chain: &C, tip: &BlockHeader, params: &ConsensusParameters) -> CompactTarget
where
    C: ChainView + ?Sized,
{
    most_recent_of_type(chain, tip, ProofType::Stake)
        .map(|header| header.bits)
        .unwrap_or_else(|| initial_target(ProofType::Stake, tip.height.saturating_add(1), params))
}

/// Whole-coin weight used for filtering: value × whole eligible days.
pub fn listed_coin_day_weight(value: Amount, age: i64, params: &ConsensusParameters) -> u64 {
    let day_weight = age.min(params.stake_max_age).saturating_sub(params.stake_min_age) / SECONDS_PER_DAY;
    let weight = i128::from(value) * i128::from(day_weight) / i128::from(COIN);
    u64::try_from(weight.max(0)).unwrap_or(u64::MAX)
}

/// List mintable coins with their weights and minting probabilities.
///
/// `skip` consumes coins before anything is counted toward `count`,
/// including coins that would later be filtered out. Unconfirmed coins are
/// never listed.
pub fn list_minting<'a, I>(
    coins: I,
    bits: CompactTarget,
    now: Timestamp,
    params: &ConsensusParameters,
    query: &MintingQuery,
) -> Result<Vec<MintingRecord>, ConsensusError>
where
    I: IntoIterator<Item = &'a WalletCoin>,
{
    let page = query.validate()?;
    let min_age_days = params.stake_min_age / SECONDS_PER_DAY;

    let mut skip = page.skip;
    let mut records = Vec::new();

    for coin in coins {
        if skip != 0 {
            skip -= 1;
            continue;
        }

        if page.count != 0 && records.len() as u64 >= page.count {
            break;
        }

        let block_time = match coin.block_time {
            Some(time) if coin.depth > 0 => time,
            _ => continue,
        };

        let age = now.saturating_sub(block_time);
        let weight = listed_coin_day_weight(coin.value, age, params);
        if weight < page.min_weight {
            continue;
        }
        if page.max_weight != 0 && weight > page.max_weight {
            continue;
        }

        let age_in_days = age / SECONDS_PER_DAY;
        let (status, attempts) = if age_in_days >= min_age_days {
            (MintingStatus::Mature, age.saturating_sub(params.stake_min_age))
        } else {
            (MintingStatus::Immature, 0)
        };

        let candidate = StakeCandidate::new(coin.value, block_time);
        let probability = |minutes| probability_within_window(bits, minutes, &candidate, now, params);

        records.push(MintingRecord {
            address: coin.address.clone(),
            transaction_id: coin.txid.clone(),
            output_index: coin.vout,
            mint_time: block_time,
            value: coin.value,
            status,
            age_in_days,
            coin_day_weight: weight,
            probability_10m: probability(HORIZON_10_MINUTES),
            probability_24h: probability(HORIZON_24_HOURS),
            probability_30d: probability(HORIZON_30_DAYS),
            probability_90d: probability(HORIZON_90_DAYS),
            attempts,
        });
    }

    debug!("Listed {} mintable outputs against target {}", records.len(), bits);
    Ok(records)
}
