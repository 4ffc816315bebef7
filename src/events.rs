// Lottery Program - Events for observers (front ends, indexers)
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryEvent {
    Entered {
        player: Pubkey,
    },
    RoundClosed {
        request_id: u64,
    },
    WinnerPicked {
        winner: Pubkey,
        prize: u64,
    },
    RoundReopened {
        request_id: u64,
    },
    SubscriptionCreated {
        subscription_id: u64,
        owner: Pubkey,
    },
    SubscriptionFunded {
        subscription_id: u64,
        old_balance: u64,
        new_balance: u64,
    },
    ConsumerAdded {
        subscription_id: u64,
        consumer: Pubkey,
    },
    RandomWordsRequested {
        request_id: u64,
        subscription_id: u64,
        consumer: Pubkey,
    },
    RandomWordsFulfilled {
        request_id: u64,
        payment: u64,
    },
    RequestCancelled {
        request_id: u64,
        subscription_id: u64,
    },
}

impl LotteryEvent {
    /// Log the event as a readable line and as borsh-encoded program data
    pub fn emit(&self) {
        msg!("Event: {:?}", self);
        match self.try_to_vec() {
            Ok(data) => sol_log_data(&[&data]),
            Err(e) => msg!("Event encoding failed: {}", e),
        }
    }
}

/// Emit a batch of events in order
pub fn emit_all(events: &[LotteryEvent]) {
    for event in events {
        event.emit();
    }
}
