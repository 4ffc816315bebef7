// Lottery Program - Construction parameters and per-network defaults
use solana_program::pubkey::Pubkey;

use crate::error::LotteryError;
use crate::utils::sol_to_lamports;

/// Block confirmations the oracle waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words requested per round
pub const NUM_WORDS: u32 = 1;
/// Default time a round may wait for its randomness before it can be reopened
pub const STALL_TIMEOUT: u64 = 60 * 60 * 24;

/// Gas lane shared by the known networks
pub const DEFAULT_KEY_HASH: [u8; 32] = [
    0xd8, 0x9b, 0x2b, 0xf1, 0x50, 0xe3, 0xb9, 0xe1, 0x34, 0x46, 0x98, 0x6e, 0x57, 0x1f, 0xb9, 0xca,
    0xb2, 0x4b, 0x13, 0xce, 0xa0, 0xa4, 0x3e, 0xa2, 0x0a, 0x60, 0x49, 0xa8, 0x5c, 0xc8, 0x07, 0xcc,
];

/// Networks where the mock coordinator is deployed and a subscription is
/// created and funded during setup
pub const DEVELOPMENT_NETWORKS: [&str; 2] = ["localnet", "test"];

/// Funding given to a fresh subscription on development networks (30 SOL)
pub const DEVELOPMENT_SUBSCRIPTION_FUNDING: u64 = 30_000_000_000;

/// Mock coordinator flat fee per fulfillment
pub const MOCK_BASE_FEE: u64 = 250_000_000;
/// Mock coordinator price per unit of callback gas
pub const MOCK_GAS_PRICE: u64 = 1;

/// Everything the lottery consumes at construction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LotteryConfig {
    /// Exact payment per entry, in lamports
    pub entrance_fee: u64,
    /// Minimum seconds a round stays open
    pub interval: u64,
    /// Randomness endpoint identity (coordinator account)
    pub coordinator: Pubkey,
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    pub stall_timeout: u64,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            entrance_fee: sol_to_lamports(0.01),
            interval: 30,
            coordinator: Pubkey::default(),
            key_hash: DEFAULT_KEY_HASH,
            subscription_id: 0,
            callback_gas_limit: 500_000,
            stall_timeout: STALL_TIMEOUT,
        }
    }
}

impl LotteryConfig {
    pub fn validate(&self) -> Result<(), LotteryError> {
        if self.interval == 0 {
            return Err(LotteryError::InvalidConfig("interval must be non-zero"));
        }
        if self.stall_timeout == 0 {
            return Err(LotteryError::InvalidConfig("stall timeout must be non-zero"));
        }
        if self.callback_gas_limit == 0 {
            return Err(LotteryError::InvalidConfig(
                "callback gas limit must be non-zero",
            ));
        }
        Ok(())
    }
}

pub fn is_development_network(name: &str) -> bool {
    DEVELOPMENT_NETWORKS.contains(&name)
}

/// Defaults for a named network. Development networks leave `coordinator`
/// and `subscription_id` unset; setup fills them after deploying the mock.
pub fn network_config(name: &str) -> Option<LotteryConfig> {
    match name {
        "devnet" => Some(LotteryConfig {
            coordinator: Pubkey::new_from_array([
                138, 44, 29, 198, 47, 54, 138, 175, 101, 23, 5, 96, 190, 13, 150, 44, 178, 138,
                40, 205, 121, 10, 9, 29, 42, 193, 104, 92, 233, 181, 76, 25,
            ]),
            subscription_id: 1,
            ..LotteryConfig::default()
        }),
        name if is_development_network(name) => Some(LotteryConfig::default()),
        _ => None,
    }
}
