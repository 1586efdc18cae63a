//! Required-target computation for the next block.
//!
//! PoW blocks switch retarget algorithms at fixed heights; PoS blocks use a
//! single per-block formula for the lifetime of the chain. The choice is made
//! in one place, [`RetargetRule::select`], and every algorithm only ever sees
//! ancestors of its own proof type.

use log::{debug, trace, warn};

use crate::arith::{mul_div, U256};
use crate::chain::{BlockHeader, ChainView, ProofType};
use crate::compact::CompactTarget;
use crate::filter::{ancestors_of_type, most_recent_of_type, previous_of_type};
use crate::params::{ConsensusParameters, Height, Timestamp};

/// Legacy retarget dampening: the measured timespan is bounded to
/// `[timespan / 4, timespan * 4]`.
pub const LEGACY_ADJUST_FACTOR: i64 = 4;

/// Per-block swing bound of the averaging retarget, in percent.
pub const AVERAGING_MAX_ADJUST_PERCENT: i64 = 16;

/// A block arriving later than this many spacings after its predecessor may
/// use the limit target on min-difficulty networks.
pub const STALL_SPACING_MULTIPLE: i64 = 2;

/// The retarget algorithm in force for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetRule {
    /// Fixed-interval retarget used before the hash algorithm switch.
    Legacy,
    /// Per-block retarget over a window of recent PoW blocks.
    Averaging { generation: u8, window: u32 },
    /// Per-block exponential retarget toward the PoS spacing.
    ProofOfStake,
}

impl RetargetRule {
    /// Pick the rule for a block of `proof_type` at `next_height`.
    pub fn select(proof_type: ProofType, next_height: Height, params: &ConsensusParameters) -> Self {
        match proof_type {
            ProofType::Stake => RetargetRule::ProofOfStake,
            ProofType::Work if next_height < params.hash_algo_switch_height => RetargetRule::Legacy,
            ProofType::Work if next_height < params.new_diff_algorithm_height => RetargetRule::Averaging {
                generation: 1,
                window: params.pow_averaging_window_v1,
            },
            ProofType::Work => RetargetRule::Averaging {
                generation: 2,
                window: params.pow_averaging_window_v2,
            },
        }
    }
}

/// Target used when no block of `proof_type` exists yet.
pub fn initial_target(proof_type: ProofType, next_height: Height, params: &ConsensusParameters) -> CompactTarget {
    match proof_type {
        ProofType::Work => CompactTarget::from_target(&params.pow_limit_at(next_height)),
        ProofType::Stake => CompactTarget::from_target(&params.initial_hash_target_pos),
    }
}

/// Compact target required of the block following `last`.
///
/// `last` is the current tip of `chain`; `candidate_time` is the timestamp
/// of the block being built or validated. Short histories shrink the
/// retarget window instead of failing.
pub fn next_target<C>(
    chain: &C,
    last: &BlockHeader,
    candidate_time: Timestamp,
    params: &ConsensusParameters,
    proof_type: ProofType,
) -> CompactTarget
where
    C: ChainView + ?Sized,
{
    let next_height = last.height.saturating_add(1);
    let rule = RetargetRule::select(proof_type, next_height, params);

    let prev = match most_recent_of_type(chain, last, proof_type) {
        Some(prev) => prev,
        None => {
            let target = initial_target(proof_type, next_height, params);
            debug!("No {} ancestor below height {}, using initial target {}", proof_type, next_height, target);
            return target;
        }
    };

    if params.no_retargeting {
        return prev.bits;
    }

    let mut target = match rule {
        RetargetRule::Legacy => legacy_retarget(chain, prev, next_height, candidate_time, params),
        RetargetRule::Averaging { window, .. } => averaging_retarget(chain, prev, window, next_height, params),
        RetargetRule::ProofOfStake => stake_retarget(chain, prev, next_height, candidate_time, params),
    };

    if proof_type == ProofType::Work && params.legacy_ceiling_active(next_height) {
        target = apply_ceiling(target, &params.pow_limit_legacy);
    }

    debug!("Next {} target at height {} via {:?}: {}", proof_type, next_height, rule, target);
    target
}

/// Fixed-interval retarget with 4x dampening.
fn legacy_retarget<C>(
    chain: &C,
    last: &BlockHeader,
    next_height: Height,
    candidate_time: Timestamp,
    params: &ConsensusParameters,
) -> CompactTarget
where
    C: ChainView + ?Sized,
{
    let limit = params.pow_limit_at(next_height);
    let limit_bits = CompactTarget::from_target(&limit);

    if params.allow_min_difficulty_blocks
        && candidate_time > last.timestamp.saturating_add(STALL_SPACING_MULTIPLE * params.pow_target_spacing_begin)
    {
        return limit_bits;
    }

    let interval = params.legacy_interval();
    if i64::from(next_height) % interval != 0 {
        if params.allow_min_difficulty_blocks {
            return last_non_stall_bits(chain, last, interval, limit_bits);
        }
        return last.bits;
    }

    let first = ancestors_of_type(chain, last, ProofType::Work)
        .take(interval as usize)
        .last()
        .unwrap_or(last);

    let timespan = params.pow_target_timespan;
    let actual = last
        .timestamp
        .saturating_sub(first.timestamp)
        .clamp(timespan / LEGACY_ADJUST_FACTOR, timespan * LEGACY_ADJUST_FACTOR);
    trace!(
        "Legacy retarget over heights {}..={}: actual {}s, nominal {}s",
        first.height,
        last.height,
        actual,
        timespan
    );

    let old = expand_or_limit(last.bits, &limit);
    let new = mul_div(&old, actual as u64, timespan as u64).min(limit);
    CompactTarget::from_target(&new)
}

/// Inherited target on min-difficulty networks.
///
/// Skips back over stall blocks carrying the limit target, stopping at an
/// interval boundary, so one slow block does not lower the whole interval.
fn last_non_stall_bits<C>(chain: &C, last: &BlockHeader, interval: i64, limit_bits: CompactTarget) -> CompactTarget
where
    C: ChainView + ?Sized,
{
    let mut current = last;
    while i64::from(current.height) % interval != 0 && current.bits == limit_bits {
        match previous_of_type(chain, current, ProofType::Work) {
            Some(prev) => current = prev,
            None => break,
        }
    }
    current.bits
}

/// Averaging retarget shared by both generations.
///
/// The mean spacing over the window, divided by the nominal spacing, is the
/// adjustment ratio. It is bounded to ±[`AVERAGING_MAX_ADJUST_PERCENT`] and
/// applied to the latest PoW target.
fn averaging_retarget<C>(
    chain: &C,
    last: &BlockHeader,
    window: u32,
    next_height: Height,
    params: &ConsensusParameters,
) -> CompactTarget
where
    C: ChainView + ?Sized,
{
    let limit = params.pow_limit_at(next_height);

    let (steps, first) = ancestors_of_type(chain, last, ProofType::Work)
        .take(window.max(1) as usize)
        .enumerate()
        .last()
        .unwrap_or((0, last));

    if steps == 0 {
        return last.bits;
    }

    let nominal = steps as i64 * params.pow_target_spacing_begin;
    let min_span = nominal * (100 - AVERAGING_MAX_ADJUST_PERCENT) / 100;
    let max_span = nominal * (100 + AVERAGING_MAX_ADJUST_PERCENT) / 100;
    let actual = last.timestamp.saturating_sub(first.timestamp).clamp(min_span, max_span);
    trace!(
        "Averaging retarget over {} PoW blocks ({}..={}): actual {}s, nominal {}s",
        steps + 1,
        first.height,
        last.height,
        actual,
        nominal
    );

    let old = expand_or_limit(last.bits, &limit);
    let new = mul_div(&old, actual as u64, nominal as u64).max(U256::one()).min(limit);
    CompactTarget::from_target(&new)
}

/// Per-block PoS retarget moving toward `pos_target_spacing`.
///
/// From `pos_floor_relax_height` on, a stalled PoS chain may fall back to
/// the initial PoS target for one block.
fn stake_retarget<C>(
    chain: &C,
    last: &BlockHeader,
    next_height: Height,
    candidate_time: Timestamp,
    params: &ConsensusParameters,
) -> CompactTarget
where
    C: ChainView + ?Sized,
{
    let initial = CompactTarget::from_target(&params.initial_hash_target_pos);
    let target_spacing = params.pos_target_spacing;

    if next_height >= params.pos_floor_relax_height
        && candidate_time > last.timestamp.saturating_add(STALL_SPACING_MULTIPLE * target_spacing)
    {
        return initial;
    }

    let prev = match previous_of_type(chain, last, ProofType::Stake) {
        Some(prev) => prev,
        None => return initial,
    };

    let mut spacing = last.timestamp.saturating_sub(prev.timestamp);
    if spacing < 0 {
        spacing = target_spacing;
    }

    let interval = i128::from(params.pos_interval());
    let numerator = (interval - 1) * i128::from(target_spacing) + 2 * i128::from(spacing);
    let denominator = (interval + 1) * i128::from(target_spacing);
    trace!(
        "PoS retarget at height {}: spacing {}s, nominal {}s, interval {}",
        next_height,
        spacing,
        target_spacing,
        interval
    );

    let old = expand_or_limit(last.bits, &params.pow_limit);
    let new = mul_div(&old, saturate_u64(numerator), saturate_u64(denominator))
        .max(U256::one())
        .min(params.pow_limit);
    CompactTarget::from_target(&new)
}

/// Bound `target` so it is never easier than `ceiling`.
fn apply_ceiling(target: CompactTarget, ceiling: &U256) -> CompactTarget {
    match target.expand() {
        Ok(value) if value <= *ceiling => target,
        _ => CompactTarget::from_target(ceiling),
    }
}

fn saturate_u64(value: i128) -> u64 {
    u64::try_from(value.max(0)).unwrap_or(u64::MAX)
}

fn expand_or_limit(bits: CompactTarget, limit: &U256) -> U256 {
    match bits.expand() {
        Ok(target) => target,
        Err(err) => {
            warn!("Stored target {} is malformed ({}), using limit", bits, err);
            *limit
        }
    }
}
