use solana_program::{decode_error::DecodeError, msg, program_error::ProgramError};
use thiserror::Error;

use crate::state::RoundState;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Payment does not equal the entrance fee
    #[error("Payment of {paid} lamports does not match the entrance fee of {required}")]
    InsufficientPayment { paid: u64, required: u64 },

    /// Entry attempted while a winner is being calculated
    #[error("Lottery is not open")]
    RoundNotOpen,

    /// Readiness gate failed at close time
    #[error("Upkeep not needed: balance={balance}, players={players}, state={state:?}")]
    UpkeepNotNeeded {
        balance: u64,
        players: u64,
        state: RoundState,
    },

    /// Fulfillment for an id that is not the outstanding request
    #[error("Unknown randomness request {0}")]
    UnknownRequest(u64),

    /// Prize could not be delivered to the winner
    #[error("Prize payout to the winner failed")]
    PayoutFailed,

    /// Fulfillment delivered without any random values
    #[error("No random words delivered")]
    EmptyRandomWords,

    /// Fulfillment did not come from the configured coordinator
    #[error("Only the configured coordinator can fulfill")]
    OnlyCoordinatorCanFulfill,

    /// Player storage is exhausted
    #[error("Lottery is full")]
    LotteryFull,

    #[error("Player index {0} out of bounds")]
    PlayerIndexOutOfBounds(u64),

    /// Stall recovery attempted before the timeout or while open
    #[error("Round is not stalled")]
    RoundNotStalled,

    #[error("Invalid lottery configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Invalid subscription")]
    InvalidSubscription,

    #[error("Consumer is not registered with the subscription")]
    InvalidConsumer,

    #[error("Too many consumers")]
    TooManyConsumers,

    #[error("Too many outstanding requests")]
    TooManyRequests,

    /// Mock coordinator has no such request
    #[error("Nonexistent request")]
    NonexistentRequest,

    #[error("Insufficient subscription balance")]
    InsufficientBalance,

    #[error("Arithmetic overflow")]
    MathOverflow,
}

impl LotteryError {
    /// Stable numeric code carried by `ProgramError::Custom`
    pub fn code(&self) -> u32 {
        match self {
            LotteryError::InsufficientPayment { .. } => 0,
            LotteryError::RoundNotOpen => 1,
            LotteryError::UpkeepNotNeeded { .. } => 2,
            LotteryError::UnknownRequest(_) => 3,
            LotteryError::PayoutFailed => 4,
            LotteryError::EmptyRandomWords => 5,
            LotteryError::OnlyCoordinatorCanFulfill => 6,
            LotteryError::LotteryFull => 7,
            LotteryError::PlayerIndexOutOfBounds(_) => 8,
            LotteryError::RoundNotStalled => 9,
            LotteryError::InvalidConfig(_) => 10,
            LotteryError::InvalidSubscription => 11,
            LotteryError::InvalidConsumer => 12,
            LotteryError::TooManyConsumers => 13,
            LotteryError::TooManyRequests => 14,
            LotteryError::NonexistentRequest => 15,
            LotteryError::InsufficientBalance => 16,
            LotteryError::MathOverflow => 17,
        }
    }
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        msg!("Error: {}", e);
        ProgramError::Custom(e.code())
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}
