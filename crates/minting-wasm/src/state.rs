//! Display-oriented views handed back to JavaScript.

use minting_core::arith::u256_to_hex;
use minting_core::{format_difficulty, CompactTarget, ConsensusParameters};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// A compact target decoded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// Compact bits.
    pub bits: u32,
    /// Compact bits as 8 hex digits.
    pub bits_hex: String,
    /// Expanded target, 64 hex digits.
    pub target: String,
    /// Difficulty relative to 0x1d00ffff.
    pub difficulty: f64,
    /// Formatted difficulty string.
    pub difficulty_display: String,
}

impl TargetInfo {
    /// Decode `bits`, failing on negative or overflowing encodings.
    pub fn from_bits(bits: u32) -> Result<Self, String> {
        let compact = CompactTarget(bits);
        let target = compact.expand().map_err(|e| format!("Invalid bits {}: {}", compact, e))?;
        let difficulty = compact.difficulty();

        Ok(TargetInfo {
            bits,
            bits_hex: compact.to_string(),
            target: u256_to_hex(&target),
            difficulty,
            difficulty_display: format_difficulty(difficulty),
        })
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
    }
}

/// Summary of the selected network's consensus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub name: String,
    pub display_name: String,
    pub pow_limit: String,
    pub pow_limit_legacy: String,
    pub pow_target_spacing: i64,
    pub pos_target_spacing: i64,
    pub stake_min_age: i64,
    pub stake_max_age: i64,
    pub hash_algo_switch_height: u32,
    pub new_diff_algorithm_height: u32,
    pub allow_min_difficulty_blocks: bool,
    pub no_retargeting: bool,
}

impl NetworkInfo {
    pub fn new(params: &ConsensusParameters) -> Self {
        NetworkInfo {
            name: params.network.name().to_string(),
            display_name: params.network.display_name().to_string(),
            pow_limit: u256_to_hex(&params.pow_limit),
            pow_limit_legacy: u256_to_hex(&params.pow_limit_legacy),
            pow_target_spacing: params.pow_target_spacing_begin,
            pos_target_spacing: params.pos_target_spacing,
            stake_min_age: params.stake_min_age,
            stake_max_age: params.stake_max_age,
            hash_algo_switch_height: params.hash_algo_switch_height,
            new_diff_algorithm_height: params.new_diff_algorithm_height,
            allow_min_difficulty_blocks: params.allow_min_difficulty_blocks,
            no_retargeting: params.no_retargeting,
        }
    }

    /// Convert to JS value.
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {:?}", e)))
    }
}
