//! Capabilities the lottery consumes from the outside world: a randomness
//! coordinator that answers requests asynchronously, and a way to move the
//! pooled prize to the winner.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::LotteryError;

pub const RANDOM_WORD_LEN: usize = 32;

/// A 256-bit random value, big-endian.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RandomWord(pub [u8; RANDOM_WORD_LEN]);

impl RandomWord {
    /// Exact `self mod n` over the full 256 bits. Returns 0 when `n` is 0.
    pub fn modulo(&self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        let n = n as u128;
        self.0
            .iter()
            .fold(0u128, |acc, byte| (acc * 256 + *byte as u128) % n) as u64
    }
}

impl From<u64> for RandomWord {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; RANDOM_WORD_LEN];
        bytes[RANDOM_WORD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
        RandomWord(bytes)
    }
}

/// Parameters of a randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RandomWordsRequest {
    /// Gas lane the oracle should answer on
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    /// Account that receives the callback
    pub consumer: Pubkey,
}

/// Accepts randomness requests. The answer arrives later through
/// [`RandomnessConsumer::raw_fulfill_random_words`].
pub trait RandomnessCoordinator {
    /// Returns an id unique across all outstanding requests
    fn request_random_words(&mut self, request: &RandomWordsRequest) -> Result<u64, LotteryError>;

    /// Withdraw an outstanding request; it can no longer be fulfilled
    fn cancel_request(&mut self, request_id: u64) -> Result<(), LotteryError>;
}

/// Receives random words for a request it made earlier
pub trait RandomnessConsumer {
    fn raw_fulfill_random_words(
        &mut self,
        request_id: u64,
        random_words: &[RandomWord],
    ) -> Result<(), LotteryError>;
}

/// Moves the pooled prize to a winner
pub trait PrizeTransfer {
    fn transfer_prize(&mut self, winner: &Pubkey, amount: u64) -> Result<(), LotteryError>;
}
