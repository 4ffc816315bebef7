//! Off-chain trigger: polls the readiness gate and closes the round when it
//! opens. Several keepers may poll the same lottery at once; closing
//! re-validates under the lock, so only one of them wins.

use std::sync::{Mutex, MutexGuard};

use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::error::LotteryError;
use crate::events::LotteryEvent;
use crate::lottery::Lottery;
use crate::randomness::RandomnessCoordinator;

/// Anything a keeper can poll and close
pub trait Upkeep {
    fn check_upkeep(&self, now: UnixTimestamp, check_data: &[u8]) -> (bool, Vec<u8>);

    fn perform_upkeep(
        &mut self,
        now: UnixTimestamp,
        perform_data: &[u8],
        consumer: &Pubkey,
        coordinator: &mut dyn RandomnessCoordinator,
    ) -> Result<LotteryEvent, LotteryError>;
}

impl Upkeep for Lottery {
    fn check_upkeep(&self, now: UnixTimestamp, check_data: &[u8]) -> (bool, Vec<u8>) {
        Lottery::check_upkeep(self, now, check_data)
    }

    fn perform_upkeep(
        &mut self,
        now: UnixTimestamp,
        perform_data: &[u8],
        consumer: &Pubkey,
        coordinator: &mut dyn RandomnessCoordinator,
    ) -> Result<LotteryEvent, LotteryError> {
        Lottery::perform_upkeep(self, now, perform_data, consumer, coordinator)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpkeepOutcome {
    /// Polled again before the poll interval elapsed
    Throttled,
    NotNeeded,
    /// This keeper closed the round
    Performed { request_id: u64 },
}

pub struct Keeper {
    /// Account registered as the randomness consumer
    consumer: Pubkey,
    /// Minimum seconds between polls
    poll_interval: u64,
    check_data: Vec<u8>,
    last_poll: Option<UnixTimestamp>,
}

fn lock<U: ?Sized>(target: &Mutex<U>) -> MutexGuard<'_, U> {
    // A panic in another keeper leaves the state consistent: every mutation
    // is validated before any field changes.
    target.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Keeper {
    pub fn new(consumer: Pubkey, poll_interval: u64) -> Self {
        Self {
            consumer,
            poll_interval,
            check_data: Vec::new(),
            last_poll: None,
        }
    }

    /// Opaque payload passed to every readiness check
    pub fn with_check_data(mut self, check_data: Vec<u8>) -> Self {
        self.check_data = check_data;
        self
    }

    fn due(&self, now: UnixTimestamp) -> bool {
        match self.last_poll {
            None => true,
            Some(last) => {
                let elapsed = now.saturating_sub(last);
                elapsed >= 0 && elapsed as u64 >= self.poll_interval
            }
        }
    }

    pub fn poll<U, C>(
        &mut self,
        target: &Mutex<U>,
        coordinator: &mut C,
        now: UnixTimestamp,
    ) -> Result<UpkeepOutcome, LotteryError>
    where
        U: Upkeep + ?Sized,
        C: RandomnessCoordinator,
    {
        if !self.due(now) {
            return Ok(UpkeepOutcome::Throttled);
        }
        self.last_poll = Some(now);

        let (needed, perform_data) = lock(target).check_upkeep(now, &self.check_data);
        if !needed {
            return Ok(UpkeepOutcome::NotNeeded);
        }

        // Another keeper may have closed the round since the check above.
        let result = lock(target).perform_upkeep(now, &perform_data, &self.consumer, coordinator);
        match result {
            Ok(LotteryEvent::RoundClosed { request_id }) => {
                msg!("Keeper closed round, request {}", request_id);
                Ok(UpkeepOutcome::Performed { request_id })
            }
            Ok(_) => Ok(UpkeepOutcome::NotNeeded),
            Err(LotteryError::UpkeepNotNeeded { .. }) => Ok(UpkeepOutcome::NotNeeded),
            Err(e) => Err(e),
        }
    }
}
