//! Per-network consensus parameters.
//!
//! One [`ConsensusParameters`] value is built per selected network and
//! borrowed by every engine operation. The only supported mutation is the
//! version-bits override hook, which must run before the value is shared.

use crate::arith::U256;
use crate::error::ConsensusError;
use crate::network::Network;

/// Block height.
pub type Height = u32;

/// Unix time in seconds.
pub type Timestamp = i64;

/// Amount in the smallest unit.
pub type Amount = u64;

/// Smallest units per whole coin.
pub const COIN: Amount = 100_000_000;

/// Seconds in one day.
pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Soft-fork deployments voted on with version bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentPos {
    TestDummy,
    Segwit,
}

impl DeploymentPos {
    /// Number of known deployments.
    pub const COUNT: usize = 2;

    #[inline]
    fn index(self) -> usize {
        match self {
            DeploymentPos::TestDummy => 0,
            DeploymentPos::Segwit => 1,
        }
    }
}

/// Version-bits parameters of a single deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    /// Bit position in the block version.
    pub bit: u8,
    /// Median time at which voting starts.
    pub start_time: i64,
    /// Median time at which the deployment fails if not locked in.
    pub timeout: i64,
}

/// Consensus rules of one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParameters {
    pub network: Network,

    /// Maximum PoW target from `hash_algo_switch_height` onward.
    pub pow_limit: U256,
    /// Maximum PoW target before the hash algorithm switch.
    pub pow_limit_legacy: U256,
    /// Legacy retarget timespan in seconds.
    pub pow_target_timespan: i64,
    /// Nominal PoW block spacing in seconds.
    pub pow_target_spacing_begin: i64,
    /// Permit limit-difficulty blocks after a stall.
    pub allow_min_difficulty_blocks: bool,
    /// Never retarget; every block inherits its predecessor's target.
    pub no_retargeting: bool,

    /// Blocks in a confirmation window that must signal to lock in.
    pub rule_change_activation_threshold: u32,
    /// Version-bits confirmation window.
    pub miner_confirmation_window: u32,
    deployments: [Deployment; DeploymentPos::COUNT],

    /// PoS retarget timespan in seconds.
    pub pos_target_timespan: i64,
    /// Nominal PoS block spacing in seconds.
    pub pos_target_spacing: i64,
    /// Minimum coin age before it may stake.
    pub stake_min_age: i64,
    /// Age at which a coin reaches full weight.
    pub stake_max_age: i64,
    /// Interval between stake modifier recomputations.
    pub stake_modifier_interval: i64,
    /// PoS target before any PoS block exists.
    pub initial_hash_target_pos: U256,

    /// First height mined with the new hash and the averaging retarget.
    pub hash_algo_switch_height: Height,
    pub pow_averaging_window_v1: u32,
    /// First height using the wide averaging window.
    pub new_diff_algorithm_height: Height,
    pub pow_averaging_window_v2: u32,
    /// First height of the legacy target ceiling.
    pub legacy_target_floor_height: Height,
    /// Number of blocks the legacy target ceiling stays active.
    pub legacy_target_floor_limit: u32,
    /// First height at which the PoS minimum-difficulty relaxation applies.
    pub pos_floor_relax_height: Height,

    pub minimum_chain_work: U256,
    /// Block hash (display hex) whose ancestors skip script checks.
    pub default_assume_valid: &'static str,
}

impl ConsensusParameters {
    /// Build the parameters of `network`.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Test => Self::test(),
            Network::Regtest => Self::regtest(),
        }
    }

    /// Resolve a network selector (`main`, `test`, `regtest`).
    pub fn select(name: &str) -> Result<Self, ConsensusError> {
        let network: Network = name.parse()?;
        log::debug!("Selected consensus parameters for {}", network);
        Ok(Self::for_network(network))
    }

    fn main() -> Self {
        ConsensusParameters {
            network: Network::Main,
            pow_limit: U256::MAX >> 8,
            pow_limit_legacy: U256::MAX >> 20,
            pow_target_timespan: 10 * 60,
            pow_target_spacing_begin: 5 * 60,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            rule_change_activation_threshold: 6048, // 75% of 8064
            miner_confirmation_window: 8064,
            deployments: [
                Deployment { bit: 28, start_time: 1199145601, timeout: 1230767999 },
                Deployment { bit: 0, start_time: 1512086401, timeout: 1517356801 },
            ],
            pos_target_timespan: 14 * SECONDS_PER_DAY,
            pos_target_spacing: 60 * 7 / 3,
            stake_min_age: 2 * SECONDS_PER_DAY,
            stake_max_age: 90 * SECONDS_PER_DAY,
            stake_modifier_interval: 6 * 60 * 60,
            initial_hash_target_pos: U256::MAX >> 32,
            hash_algo_switch_height: 10_000,
            pow_averaging_window_v1: 24,
            new_diff_algorithm_height: 250_000,
            pow_averaging_window_v2: 120,
            legacy_target_floor_height: 130_000,
            legacy_target_floor_limit: 300,
            pos_floor_relax_height: 730_000,
            minimum_chain_work: U256::from(0x014e_7205_088e_d530u64),
            default_assume_valid: "d3e3c9bd441e70bbb74addfedc2324ed8c394d8afc48d73ccb4b0320ea28c631",
        }
    }

    fn test() -> Self {
        ConsensusParameters {
            network: Network::Test,
            allow_min_difficulty_blocks: true,
            rule_change_activation_threshold: 2 * 4 / 3,
            miner_confirmation_window: 2 * 4,
            deployments: [
                Deployment { bit: 28, start_time: 1199145601, timeout: 1230767999 },
                Deployment { bit: 0, start_time: 0, timeout: 99999999999 },
            ],
            pos_target_timespan: SECONDS_PER_DAY,
            stake_min_age: 2 * SECONDS_PER_DAY / 60 / 10,
            stake_max_age: 90 * SECONDS_PER_DAY / 60,
            stake_modifier_interval: 6 * 60 * 60 / 60 / 20,
            hash_algo_switch_height: 10,
            new_diff_algorithm_height: 21_000,
            legacy_target_floor_height: 120,
            legacy_target_floor_limit: 50,
            pos_floor_relax_height: 0,
            minimum_chain_work: U256::zero(),
            default_assume_valid: "0c14a678cb406be311c75938702e4ac567146d43bbd6d4f44e8d7a879a849424",
            ..Self::main()
        }
    }

    fn regtest() -> Self {
        ConsensusParameters {
            network: Network::Regtest,
            allow_min_difficulty_blocks: true,
            no_retargeting: true,
            deployments: [
                Deployment { bit: 28, start_time: 1199145601, timeout: 1230767999 },
                Deployment { bit: 0, start_time: 0, timeout: 99999999999 },
            ],
            pos_target_spacing: 10 * 60,
            hash_algo_switch_height: 10,
            new_diff_algorithm_height: Height::MAX,
            legacy_target_floor_height: 120,
            legacy_target_floor_limit: 50,
            pos_floor_relax_height: 0,
            minimum_chain_work: U256::zero(),
            default_assume_valid: "0000000000000000000000000000000000000000000000000000000000000000",
            ..Self::main()
        }
    }

    /// Maximum PoW target accepted at `height`.
    #[inline]
    pub fn pow_limit_at(&self, height: Height) -> U256 {
        if height < self.hash_algo_switch_height {
            self.pow_limit_legacy
        } else {
            self.pow_limit
        }
    }

    /// Blocks between legacy retargets.
    #[inline]
    pub fn legacy_interval(&self) -> i64 {
        (self.pow_target_timespan / self.pow_target_spacing_begin).max(1)
    }

    /// PoS retarget interval in blocks.
    #[inline]
    pub fn pos_interval(&self) -> i64 {
        (self.pos_target_timespan / self.pos_target_spacing).max(1)
    }

    /// Whether the legacy target ceiling bounds PoW blocks at `height`.
    pub fn legacy_ceiling_active(&self, height: Height) -> bool {
        let end = self
            .legacy_target_floor_height
            .saturating_add(self.legacy_target_floor_limit);
        height >= self.legacy_target_floor_height && height < end
    }

    /// Version-bits parameters of a deployment.
    pub fn deployment(&self, pos: DeploymentPos) -> &Deployment {
        &self.deployments[pos.index()]
    }

    /// Override the voting window of a deployment.
    ///
    /// Test and research hook; apply before the parameters are shared.
    pub fn update_version_bits_parameters(&mut self, pos: DeploymentPos, start_time: i64, timeout: i64) {
        log::debug!(
            "Overriding {:?} deployment on {}: start {} timeout {}",
            pos,
            self.network,
            start_time,
            timeout
        );
        let deployment = &mut self.deployments[pos.index()];
        deployment.start_time = start_time;
        deployment.timeout = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::u256_from_hex;

    #[test]
    fn test_select_known_networks() {
        for network in Network::ALL {
            let params = ConsensusParameters::select(network.name()).unwrap();
            assert_eq!(params.network, network);
        }
    }

    #[test]
    fn test_select_unknown_network() {
        assert_eq!(
            ConsensusParameters::select("litecoin"),
            Err(ConsensusError::UnknownNetwork("litecoin".to_string()))
        );
    }

    #[test]
    fn test_limits() {
        let params = ConsensusParameters::for_network(Network::Main);
        assert_eq!(
            params.pow_limit,
            u256_from_hex("00ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff").unwrap()
        );
        assert_eq!(
            params.pow_limit_legacy,
            u256_from_hex("00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff").unwrap()
        );
        assert_eq!(
            params.initial_hash_target_pos,
            u256_from_hex("00000000ffffffffffffffffffffffffffffffffffffffffffffffffffffffff").unwrap()
        );
        assert_eq!(params.pow_limit_at(9_999), params.pow_limit_legacy);
        assert_eq!(params.pow_limit_at(10_000), params.pow_limit);
    }

    #[test]
    fn test_testnet_values() {
        let params = ConsensusParameters::for_network(Network::Test);
        assert_eq!(params.stake_min_age, 288);
        assert_eq!(params.stake_max_age, 129_600);
        assert_eq!(params.stake_modifier_interval, 18);
        assert_eq!(params.pos_target_timespan, 86_400);
        assert_eq!(params.pos_target_spacing, 140);
        assert_eq!(params.rule_change_activation_threshold, 2);
        assert!(params.allow_min_difficulty_blocks);
        assert!(!params.no_retargeting);
    }

    #[test]
    fn test_regtest_values() {
        let params = ConsensusParameters::for_network(Network::Regtest);
        assert!(params.no_retargeting);
        assert_eq!(params.pos_target_spacing, 600);
        assert_eq!(params.new_diff_algorithm_height, Height::MAX);
        assert_eq!(params.legacy_interval(), 2);
    }

    #[test]
    fn test_legacy_ceiling_window() {
        let params = ConsensusParameters::for_network(Network::Main);
        assert!(!params.legacy_ceiling_active(129_999));
        assert!(params.legacy_ceiling_active(130_000));
        assert!(params.legacy_ceiling_active(130_299));
        assert!(!params.legacy_ceiling_active(130_300));
    }

    #[test]
    fn test_deployment_override() {
        let mut params = ConsensusParameters::for_network(Network::Regtest);
        assert_eq!(params.deployment(DeploymentPos::Segwit).timeout, 99999999999);

        params.update_version_bits_parameters(DeploymentPos::Segwit, 10, 20);
        let segwit = params.deployment(DeploymentPos::Segwit);
        assert_eq!((segwit.bit, segwit.start_time, segwit.timeout), (0, 10, 20));
        // Other deployments and networks are untouched.
        assert_eq!(params.deployment(DeploymentPos::TestDummy).bit, 28);
        assert_eq!(
            ConsensusParameters::for_network(Network::Regtest)
                .deployment(DeploymentPos::Segwit)
                .timeout,
            99999999999
        );
    }
}
