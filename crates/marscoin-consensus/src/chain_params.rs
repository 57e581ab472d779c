//! Chain parameters for the Marscoin networks.
//!
//! Five network variants exist: main, testnet (v3), testnet4, signet, and
//! regtest. Each is an immutable [`ChainParams`] record constructed once
//! and passed explicitly to the difficulty and proof-of-work functions;
//! there is no process-wide current-network singleton, which keeps the
//! consensus functions pure and lets tests exercise several networks in
//! parallel.
//!
//! The only dynamic pieces of construction are signet's message-start
//! derivation (first four bytes of SHA256d over the serialized challenge
//! script) and regtest's option-overridable deployment heights.

use crate::target::{Target, U256};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// The five network variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainType {
    /// Main network on which people trade goods and services.
    Main,
    /// Public test network (v3), reset from time to time.
    Testnet,
    /// Public test network (v4).
    Testnet4,
    /// Test network with an additional signature challenge (BIP 325).
    Signet,
    /// Regression test: private networks with instantly minable blocks.
    Regtest,
}

impl ChainType {
    /// Canonical lowercase name, as used in datadir paths and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ChainType::Main => "main",
            ChainType::Testnet => "test",
            ChainType::Testnet4 => "testnet4",
            ChainType::Signet => "signet",
            ChainType::Regtest => "regtest",
        }
    }
}

/// Buried softfork deployments, activated at fixed heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuriedDeployment {
    /// BIP 34: height in coinbase.
    HeightInCoinbase,
    /// BIP 65: CHECKLOCKTIMEVERIFY.
    Cltv,
    /// BIP 66: strict DER signatures.
    Dersig,
    /// BIP 68/112/113: relative lock-time.
    Csv,
    /// BIP 141/143/147: segregated witness.
    Segwit,
}

/// Version-bits deployment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentPos {
    /// Dummy deployment used in tests.
    TestDummy = 0,
    /// Taproot (BIPs 340-342).
    Taproot = 1,
}

/// Parameters of one version-bits deployment window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    /// Which bit in the block version field signals this deployment.
    pub bit: u8,
    /// Start of the signalling window (median-time-past), or one of the
    /// [`Deployment::ALWAYS_ACTIVE`] / [`Deployment::NEVER_ACTIVE`]
    /// sentinels.
    pub start_time: i64,
    /// End of the signalling window, or [`Deployment::NO_TIMEOUT`].
    pub timeout: i64,
    /// Earliest height at which the deployment may activate.
    pub min_activation_height: i32,
}

impl Deployment {
    /// The deployment never times out.
    pub const NO_TIMEOUT: i64 = i64::MAX;
    /// The deployment is active from genesis.
    pub const ALWAYS_ACTIVE: i64 = -1;
    /// The deployment can never activate.
    pub const NEVER_ACTIVE: i64 = -2;
}

/// Overrides accepted by the signet constructor.
#[derive(Debug, Clone, Default)]
pub struct SigNetOptions {
    /// Block-signing challenge script; the canonical global-signet
    /// challenge is used when omitted.
    pub challenge: Option<Vec<u8>>,
    /// DNS seeds; the canonical seed list is used when omitted.
    pub seeds: Option<Vec<String>>,
}

/// Overrides accepted by the regtest constructor.
#[derive(Debug, Clone, Default)]
pub struct RegTestOptions {
    /// Prune aggressively (lowers the prune-after height to 100).
    pub fastprune: bool,
    /// Buried-deployment activation height overrides.
    pub activation_heights: HashMap<BuriedDeployment, i32>,
    /// Version-bits window overrides per deployment slot.
    pub version_bits_parameters: HashMap<DeploymentPos, VersionBitsParameters>,
}

/// Version-bits window override values for [`RegTestOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionBitsParameters {
    pub start_time: i64,
    pub timeout: i64,
    pub min_activation_height: i32,
}

/// The canonical global-signet challenge script
/// (a 1-of-2 multisig held by the signet maintainers).
const DEFAULT_SIGNET_CHALLENGE: &str =
    "512103ad5e0edad18cb1f0fc0d28a3d4f1f3e445640337489abb10404f2d1e086be430210359ef5021964fe22d6f8e05b2463c9540ce96883fe3b278760f048f5189f2e6c452ae";

/// Immutable consensus parameters for one network.
///
/// Only fields the difficulty-adjustment and proof-of-work code consume
/// are carried, plus the identity constants (magic, port, seeds) that
/// accompany them.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub chain_type: ChainType,

    /// First four bytes of every p2p message on this network.
    pub message_start: [u8; 4],
    /// Default p2p listening port.
    pub default_port: u16,
    /// DNS seeds for peer discovery.
    pub dns_seeds: Vec<String>,
    /// Bech32 human-readable part for native witness addresses.
    pub bech32_hrp: &'static str,

    /// Maximum allowed target (easiest difficulty): 2^236 - 1.
    pub pow_limit: Target,
    /// Nominal seconds between blocks before the sol forks.
    pub pow_target_spacing: i64,
    /// Nominal retarget window in seconds before the sol forks.
    pub pow_target_timespan: i64,
    /// Testnet escape hatch: blocks may fall back to minimum difficulty
    /// when the chain stalls.
    pub allow_min_difficulty_blocks: bool,
    /// Regtest: the difficulty never changes.
    pub no_retargeting: bool,

    /// First sol fork: the retarget window becomes one sol.
    pub fork_one_height: i32,
    /// Second sol fork: block spacing becomes two Mars minutes.
    pub fork_two_height: i32,
    /// DarkGravityWave v2 activation height.
    pub dgw2_height: i32,
    /// DarkGravityWave v3 activation height.
    pub dgw3_height: i32,
    /// ASERT activation height.
    pub asert_height: i32,

    /// Height of the block all ASERT scheduling is computed from.
    pub asert_anchor_height: i32,
    /// Seconds ahead of or behind schedule that double or halve the
    /// difficulty.
    pub asert_half_life: i64,
    /// Ideal block spacing for the ASERT schedule.
    pub asert_spacing: i64,

    /// Blocks between subsidy halvings (668 sols, one Mars year).
    pub subsidy_halving_interval: i32,

    /// Buried deployment heights.
    pub bip34_height: i32,
    pub bip65_height: i32,
    pub bip66_height: i32,
    pub csv_height: i32,
    pub segwit_height: i32,

    /// Blocks that must signal within one confirmation window for a
    /// version-bits deployment to lock in.
    pub rule_change_activation_threshold: u32,
    /// Length of a version-bits confirmation window in blocks.
    pub miner_confirmation_window: u32,
    /// Version-bits deployments, indexed by [`DeploymentPos`].
    pub deployments: [Deployment; 2],

    /// Chain identifier for merge-mined (auxpow) blocks.
    pub auxpow_chain_id: i32,
    /// First height at which auxpow blocks are accepted.
    pub auxpow_start_height: i32,
    /// Reject auxpow parents with our own chain id.
    pub strict_chain_id: bool,

    /// Pruning is refused below this height.
    pub prune_after_height: u64,

    /// Signet block-signing challenge; empty on other networks.
    pub signet_challenge: Vec<u8>,

    /// Genesis header constants.
    pub genesis_time: i64,
    pub genesis_nonce: u32,
    pub genesis_nbits: u32,
}

impl ChainParams {
    /// Blocks between legacy retargets: `timespan / spacing`.
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }

    /// Main network parameters.
    pub fn main() -> Self {
        Self {
            chain_type: ChainType::Main,
            message_start: [0xfb, 0xc0, 0xb6, 0xdb],
            default_port: 8338,
            dns_seeds: vec!["dnsseed.marscoin.org.".to_string()],
            bech32_hrp: "mars",
            pow_limit: pow_limit(),
            pow_target_spacing: 150,
            pow_target_timespan: 302_400,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            fork_one_height: 14_260,
            fork_two_height: 70_000,
            dgw2_height: 120_000,
            dgw3_height: 126_000,
            asert_height: 2_999_999,
            asert_anchor_height: 2_999_999,
            asert_half_life: 2 * 60 * 60,
            asert_spacing: crate::sol::SOL_TARGET_SPACING,
            subsidy_halving_interval: 395_699,
            bip34_height: 227_931,
            bip65_height: 388_381,
            bip66_height: 363_725,
            csv_height: 419_328,
            segwit_height: i32::MAX,
            rule_change_activation_threshold: 1815, // 90% of 2016
            miner_confirmation_window: 2016,
            deployments: [
                Deployment {
                    bit: 28,
                    start_time: Deployment::NEVER_ACTIVE,
                    timeout: Deployment::NO_TIMEOUT,
                    min_activation_height: 0,
                },
                Deployment {
                    bit: 2,
                    start_time: 1_619_222_400, // April 24th, 2021
                    timeout: 1_628_640_000,    // August 11th, 2021
                    min_activation_height: 709_632,
                },
            ],
            auxpow_chain_id: 0x029c,
            auxpow_start_height: 3_145_555,
            strict_chain_id: true,
            prune_after_height: 100_000,
            signet_challenge: Vec::new(),
            genesis_time: 1_388_590_627,
            genesis_nonce: 638_933,
            genesis_nbits: 0x1e0f_fff0,
        }
    }

    /// Testnet (v3) parameters.
    pub fn testnet() -> Self {
        Self {
            chain_type: ChainType::Testnet,
            message_start: [0xfa, 0xaf, 0xde, 0xed],
            default_port: 18_337,
            dns_seeds: Vec::new(),
            bech32_hrp: "tmars",
            allow_min_difficulty_blocks: true,
            asert_anchor_height: 100,
            bip34_height: 21_111,
            bip65_height: 581_885,
            bip66_height: 330_776,
            csv_height: i32::MAX,
            segwit_height: i32::MAX,
            rule_change_activation_threshold: 1512, // 75% for testchains
            deployments: [
                Deployment {
                    bit: 28,
                    start_time: Deployment::NEVER_ACTIVE,
                    timeout: Deployment::NO_TIMEOUT,
                    min_activation_height: 0,
                },
                Deployment {
                    bit: 2,
                    start_time: 1_619_222_400,
                    timeout: 1_628_640_000,
                    min_activation_height: 0,
                },
            ],
            auxpow_chain_id: 0x029d,
            auxpow_start_height: i32::MAX,
            prune_after_height: 1000,
            genesis_time: 1_732_912_000,
            genesis_nonce: 958_757,
            ..Self::main()
        }
    }

    /// Testnet (v4) parameters.
    pub fn testnet4() -> Self {
        Self {
            chain_type: ChainType::Testnet4,
            message_start: [0xfc, 0xc1, 0xb7, 0xdc],
            default_port: 18_337,
            dns_seeds: Vec::new(),
            bech32_hrp: "tb",
            allow_min_difficulty_blocks: true,
            asert_anchor_height: 100,
            bip34_height: 1,
            bip65_height: 1,
            bip66_height: 1,
            csv_height: 1,
            segwit_height: 1,
            rule_change_activation_threshold: 1512,
            deployments: [
                Deployment {
                    bit: 28,
                    start_time: Deployment::NEVER_ACTIVE,
                    timeout: Deployment::NO_TIMEOUT,
                    min_activation_height: 0,
                },
                Deployment {
                    bit: 2,
                    start_time: Deployment::ALWAYS_ACTIVE,
                    timeout: Deployment::NO_TIMEOUT,
                    min_activation_height: 0,
                },
            ],
            auxpow_chain_id: 0x029d,
            auxpow_start_height: i32::MAX,
            prune_after_height: 1000,
            genesis_time: 1_388_590_627,
            genesis_nonce: 638_933,
            ..Self::main()
        }
    }

    /// Signet parameters.
    pub fn signet(options: SigNetOptions) -> Self {
        let challenge = options
            .challenge
            .unwrap_or_else(|| hex::decode(DEFAULT_SIGNET_CHALLENGE).expect("valid challenge hex"));
        let seeds = options.seeds.unwrap_or_else(|| {
            vec![
                "seed.signet.marscoin.org.".to_string(),
                "178.128.221.177".to_string(),
            ]
        });

        Self {
            chain_type: ChainType::Signet,
            message_start: signet_magic(&challenge),
            default_port: 38_333,
            dns_seeds: seeds,
            bech32_hrp: "tb",
            asert_anchor_height: 0,
            bip34_height: 1,
            bip65_height: 1,
            bip66_height: 1,
            csv_height: 1,
            segwit_height: 1,
            deployments: [
                Deployment {
                    bit: 28,
                    start_time: Deployment::NEVER_ACTIVE,
                    timeout: Deployment::NO_TIMEOUT,
                    min_activation_height: 0,
                },
                Deployment {
                    bit: 2,
                    start_time: Deployment::ALWAYS_ACTIVE,
                    timeout: Deployment::NO_TIMEOUT,
                    min_activation_height: 0,
                },
            ],
            auxpow_chain_id: 0x0001,
            auxpow_start_height: 0,
            prune_after_height: 1000,
            signet_challenge: challenge,
            genesis_time: 1_598_918_400,
            genesis_nonce: 52_613_770,
            genesis_nbits: 0x1e03_77ae,
            ..Self::main()
        }
    }

    /// Regtest parameters.
    pub fn regtest(options: RegTestOptions) -> Self {
        let mut params = Self {
            chain_type: ChainType::Regtest,
            message_start: [0xfa, 0xbf, 0xb5, 0xda],
            default_port: 18_444,
            dns_seeds: vec!["dummySeed.invalid.".to_string()],
            bech32_hrp: "bcrt",
            allow_min_difficulty_blocks: true,
            no_retargeting: true,
            asert_anchor_height: 0,
            subsidy_halving_interval: 150,
            bip34_height: 1,
            bip65_height: 1,
            bip66_height: 1,
            csv_height: 1,
            segwit_height: 0,
            rule_change_activation_threshold: 108, // 75% for testchains
            miner_confirmation_window: 144,
            deployments: [
                Deployment {
                    bit: 28,
                    start_time: 0,
                    timeout: Deployment::NO_TIMEOUT,
                    min_activation_height: 0,
                },
                Deployment {
                    bit: 2,
                    start_time: Deployment::ALWAYS_ACTIVE,
                    timeout: Deployment::NO_TIMEOUT,
                    min_activation_height: 0,
                },
            ],
            auxpow_chain_id: 0x0001,
            auxpow_start_height: 0,
            prune_after_height: if options.fastprune { 100 } else { 1000 },
            ..Self::main()
        };

        for (deployment, height) in &options.activation_heights {
            match deployment {
                BuriedDeployment::HeightInCoinbase => params.bip34_height = *height,
                BuriedDeployment::Cltv => params.bip65_height = *height,
                BuriedDeployment::Dersig => params.bip66_height = *height,
                BuriedDeployment::Csv => params.csv_height = *height,
                BuriedDeployment::Segwit => params.segwit_height = *height,
            }
        }

        for (pos, vbits) in &options.version_bits_parameters {
            let slot = &mut params.deployments[*pos as usize];
            slot.start_time = vbits.start_time;
            slot.timeout = vbits.timeout;
            slot.min_activation_height = vbits.min_activation_height;
        }

        params
    }
}

/// The shared powLimit of all Marscoin networks: 2^236 - 1.
fn pow_limit() -> Target {
    Target((U256::one() << 236) - U256::one())
}

/// Derive the signet message start: the first four bytes of SHA256d over
/// the serialized (length-prefixed) challenge script.
pub fn signet_magic(challenge: &[u8]) -> [u8; 4] {
    let mut serialized = compact_size(challenge.len() as u64);
    serialized.extend_from_slice(challenge);

    let first = Sha256::digest(&serialized);
    let second = Sha256::digest(first);

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&second[..4]);
    magic
}

/// Bitcoin-style variable-length integer prefix.
fn compact_size(n: u64) -> Vec<u8> {
    match n {
        0..=0xfc => vec![n as u8],
        0xfd..=0xffff => {
            let mut out = vec![0xfd];
            out.extend_from_slice(&(n as u16).to_le_bytes());
            out
        }
        0x1_0000..=0xffff_ffff => {
            let mut out = vec![0xfe];
            out.extend_from_slice(&(n as u32).to_le_bytes());
            out
        }
        _ => {
            let mut out = vec![0xff];
            out.extend_from_slice(&n.to_le_bytes());
            out
        }
    }
}

/// Identify the network a message-start magic belongs to.
pub fn network_for_magic(magic: [u8; 4]) -> Option<ChainType> {
    if magic == ChainParams::main().message_start {
        Some(ChainType::Main)
    } else if magic == ChainParams::testnet().message_start {
        Some(ChainType::Testnet)
    } else if magic == ChainParams::testnet4().message_start {
        Some(ChainType::Testnet4)
    } else if magic == ChainParams::regtest(RegTestOptions::default()).message_start {
        Some(ChainType::Regtest)
    } else if magic == ChainParams::signet(SigNetOptions::default()).message_start {
        Some(ChainType::Signet)
    } else {
        None
    }
}
