// Development randomness coordinator.
//
// Mirrors the subscription model of a production VRF coordinator (create a
// subscription, fund it, register consumers, pay per fulfillment) but answers
// requests on demand, synchronously, with generated or caller-supplied words.
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    keccak, msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::error::LotteryError;
use crate::events::LotteryEvent;
use crate::randomness::{RandomWord, RandomWordsRequest, RandomnessConsumer, RandomnessCoordinator};
use crate::state::AccountState;

pub const MAX_CONSUMERS: usize = 4;
pub const MAX_PENDING_REQUESTS: usize = 16;

/// A request waiting for fulfillment
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    pub consumer: Pubkey,
}

/// Coordinator account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq)]
pub struct VrfCoordinatorMock {
    is_initialized: bool,
    /// Coordinator account key, stamped on every subscription it creates
    address: Pubkey,
    /// Only signer allowed to deliver random words
    authority: Pubkey,
    /// Flat fee charged per fulfillment
    base_fee: u64,
    /// Fee per unit of callback gas
    gas_price: u64,
    current_subscription_id: u64,
    next_request_id: u64,
    requests: Vec<PendingRequest>,
}

impl IsInitialized for VrfCoordinatorMock {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl AccountState for VrfCoordinatorMock {
    const LEN: usize = 1 + 32 + 32 + 8 + 8 + 8 + 8 + 4 + MAX_PENDING_REQUESTS * (8 + 8 + 4 + 4 + 32);
}

/// Subscription account data
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Subscription {
    pub is_initialized: bool,
    pub id: u64,
    /// Coordinator that issued the subscription
    pub coordinator: Pubkey,
    pub owner: Pubkey,
    /// Prepaid lamports available for fulfillments
    pub balance: u64,
    pub request_count: u64,
    pub consumer_count: u8,
    pub consumers: [Pubkey; MAX_CONSUMERS],
}

impl Sealed for Subscription {}

impl IsInitialized for Subscription {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Subscription {
    const LEN: usize = 1 + 8 + 32 + 32 + 8 + 8 + 1 + 32 * MAX_CONSUMERS;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Subscription::LEN];
        let (
            is_initialized,
            id,
            coordinator,
            owner,
            balance,
            request_count,
            consumer_count,
            consumers,
        ) = array_refs![src, 1, 8, 32, 32, 8, 8, 1, 32 * MAX_CONSUMERS];

        let consumer_count = consumer_count[0];
        if consumer_count as usize > MAX_CONSUMERS {
            return Err(ProgramError::InvalidAccountData);
        }
        let mut keys = [Pubkey::default(); MAX_CONSUMERS];
        for (key, chunk) in keys.iter_mut().zip(consumers.chunks_exact(32)) {
            *key = Pubkey::new_from_array(*array_ref![chunk, 0, 32]);
        }

        Ok(Subscription {
            is_initialized: is_initialized[0] != 0,
            id: u64::from_le_bytes(*id),
            coordinator: Pubkey::new_from_array(*coordinator),
            owner: Pubkey::new_from_array(*owner),
            balance: u64::from_le_bytes(*balance),
            request_count: u64::from_le_bytes(*request_count),
            consumer_count,
            consumers: keys,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Subscription::LEN];
        let (
            is_initialized_dst,
            id_dst,
            coordinator_dst,
            owner_dst,
            balance_dst,
            request_count_dst,
            consumer_count_dst,
            consumers_dst,
        ) = mut_array_refs![dst, 1, 8, 32, 32, 8, 8, 1, 32 * MAX_CONSUMERS];

        is_initialized_dst[0] = self.is_initialized as u8;
        *id_dst = self.id.to_le_bytes();
        coordinator_dst.copy_from_slice(self.coordinator.as_ref());
        owner_dst.copy_from_slice(self.owner.as_ref());
        *balance_dst = self.balance.to_le_bytes();
        *request_count_dst = self.request_count.to_le_bytes();
        consumer_count_dst[0] = self.consumer_count;
        for (chunk, key) in consumers_dst.chunks_exact_mut(32).zip(self.consumers.iter()) {
            chunk.copy_from_slice(key.as_ref());
        }
    }
}

impl Subscription {
    pub fn consumers(&self) -> &[Pubkey] {
        &self.consumers[..self.consumer_count as usize]
    }

    pub fn is_consumer(&self, consumer: &Pubkey) -> bool {
        self.consumers().contains(consumer)
    }

    pub fn fund(&mut self, amount: u64) -> Result<LotteryEvent, LotteryError> {
        let old_balance = self.balance;
        self.balance = old_balance
            .checked_add(amount)
            .ok_or(LotteryError::MathOverflow)?;
        Ok(LotteryEvent::SubscriptionFunded {
            subscription_id: self.id,
            old_balance,
            new_balance: self.balance,
        })
    }

    /// Registering an existing consumer again is a no-op
    pub fn add_consumer(&mut self, consumer: Pubkey) -> Result<Option<LotteryEvent>, LotteryError> {
        if self.is_consumer(&consumer) {
            return Ok(None);
        }
        let slot = self.consumer_count as usize;
        if slot >= MAX_CONSUMERS {
            return Err(LotteryError::TooManyConsumers);
        }
        self.consumers[slot] = consumer;
        self.consumer_count += 1;
        Ok(Some(LotteryEvent::ConsumerAdded {
            subscription_id: self.id,
            consumer,
        }))
    }

    pub fn remove_consumer(&mut self, consumer: &Pubkey) -> Result<(), LotteryError> {
        let position = self
            .consumers()
            .iter()
            .position(|key| key == consumer)
            .ok_or(LotteryError::InvalidConsumer)?;
        let last = self.consumer_count as usize - 1;
        self.consumers.swap(position, last);
        self.consumers[last] = Pubkey::default();
        self.consumer_count -= 1;
        Ok(())
    }
}

/// Words the mock derives for a request when none are supplied:
/// keccak256(request_id ‖ index), both as 32-byte big-endian integers.
pub fn generate_random_words(request_id: u64, num_words: u32) -> Vec<RandomWord> {
    (0..num_words as u64)
        .map(|index| {
            let id_bytes = RandomWord::from(request_id).0;
            let index_bytes = RandomWord::from(index).0;
            RandomWord(keccak::hashv(&[&id_bytes[..], &index_bytes[..]]).0)
        })
        .collect()
}

impl VrfCoordinatorMock {
    pub fn new(address: Pubkey, authority: Pubkey, base_fee: u64, gas_price: u64) -> Self {
        Self {
            is_initialized: true,
            address,
            authority,
            base_fee,
            gas_price,
            current_subscription_id: 0,
            next_request_id: 1,
            requests: Vec::new(),
        }
    }

    pub fn address(&self) -> &Pubkey {
        &self.address
    }

    pub fn authority(&self) -> &Pubkey {
        &self.authority
    }

    /// Rejects deliveries signed by anyone but the coordinator authority
    pub fn ensure_authority(&self, caller: &Pubkey) -> Result<(), LotteryError> {
        if *caller != self.authority {
            return Err(LotteryError::OnlyCoordinatorCanFulfill);
        }
        Ok(())
    }

    fn issued(&self, subscription: &Subscription) -> bool {
        subscription.is_initialized && subscription.coordinator == self.address
    }

    pub fn base_fee(&self) -> u64 {
        self.base_fee
    }

    pub fn gas_price(&self) -> u64 {
        self.gas_price
    }

    pub fn pending_requests(&self) -> &[PendingRequest] {
        &self.requests
    }

    pub fn pending_request(&self, request_id: u64) -> Option<&PendingRequest> {
        self.requests.iter().find(|r| r.request_id == request_id)
    }

    pub fn create_subscription(&mut self, owner: Pubkey) -> (Subscription, LotteryEvent) {
        self.current_subscription_id += 1;
        let subscription = Subscription {
            is_initialized: true,
            id: self.current_subscription_id,
            coordinator: self.address,
            owner,
            ..Subscription::default()
        };
        msg!("Subscription {} created", subscription.id);
        (
            subscription,
            LotteryEvent::SubscriptionCreated {
                subscription_id: subscription.id,
                owner,
            },
        )
    }

    /// Fee charged to the subscription when a request is fulfilled
    pub fn payment_for(&self, callback_gas_limit: u32) -> Result<u64, LotteryError> {
        self.gas_price
            .checked_mul(callback_gas_limit as u64)
            .and_then(|gas| gas.checked_add(self.base_fee))
            .ok_or(LotteryError::MathOverflow)
    }

    pub fn request_random_words(
        &mut self,
        subscription: &mut Subscription,
        request: &RandomWordsRequest,
    ) -> Result<(u64, LotteryEvent), LotteryError> {
        if !self.issued(subscription) || subscription.id != request.subscription_id {
            return Err(LotteryError::InvalidSubscription);
        }
        if !subscription.is_consumer(&request.consumer) {
            return Err(LotteryError::InvalidConsumer);
        }
        if self.requests.len() >= MAX_PENDING_REQUESTS {
            return Err(LotteryError::TooManyRequests);
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        subscription.request_count += 1;
        self.requests.push(PendingRequest {
            request_id,
            subscription_id: subscription.id,
            callback_gas_limit: request.callback_gas_limit,
            num_words: request.num_words,
            consumer: request.consumer,
        });
        msg!(
            "Random words requested: id={}, subscription={}, consumer={}",
            request_id,
            subscription.id,
            request.consumer
        );
        Ok((
            request_id,
            LotteryEvent::RandomWordsRequested {
                request_id,
                subscription_id: subscription.id,
                consumer: request.consumer,
            },
        ))
    }

    /// Deliver generated words for `request_id` to `consumer`
    pub fn fulfill_random_words<C>(
        &mut self,
        subscription: &mut Subscription,
        request_id: u64,
        consumer_key: &Pubkey,
        consumer: &mut C,
    ) -> Result<LotteryEvent, LotteryError>
    where
        C: RandomnessConsumer + ?Sized,
    {
        self.fulfill_random_words_with_override(subscription, request_id, consumer_key, consumer, &[])
    }

    /// Deliver `words` for `request_id` to `consumer`; an empty slice means
    /// generate them. The request is consumed and the subscription charged
    /// only if the consumer accepts the delivery.
    pub fn fulfill_random_words_with_override<C>(
        &mut self,
        subscription: &mut Subscription,
        request_id: u64,
        consumer_key: &Pubkey,
        consumer: &mut C,
        words: &[RandomWord],
    ) -> Result<LotteryEvent, LotteryError>
    where
        C: RandomnessConsumer + ?Sized,
    {
        let position = self
            .requests
            .iter()
            .position(|r| r.request_id == request_id)
            .ok_or(LotteryError::NonexistentRequest)?;
        let request = self.requests[position].clone();
        if request.consumer != *consumer_key {
            return Err(LotteryError::InvalidConsumer);
        }
        if !self.issued(subscription) || subscription.id != request.subscription_id {
            return Err(LotteryError::InvalidSubscription);
        }

        let payment = self.payment_for(request.callback_gas_limit)?;
        let remaining = subscription
            .balance
            .checked_sub(payment)
            .ok_or(LotteryError::InsufficientBalance)?;

        let words = if words.is_empty() {
            generate_random_words(request_id, request.num_words)
        } else {
            words.to_vec()
        };
        consumer.raw_fulfill_random_words(request_id, &words)?;

        self.requests.remove(position);
        subscription.balance = remaining;
        msg!("Request {} fulfilled, charged {}", request_id, payment);
        Ok(LotteryEvent::RandomWordsFulfilled {
            request_id,
            payment,
        })
    }

    /// Drop an outstanding request made on `subscription`
    pub fn cancel_request(
        &mut self,
        subscription: &Subscription,
        request_id: u64,
    ) -> Result<LotteryEvent, LotteryError> {
        let position = self
            .requests
            .iter()
            .position(|r| r.request_id == request_id)
            .ok_or(LotteryError::NonexistentRequest)?;
        if !self.issued(subscription) || subscription.id != self.requests[position].subscription_id {
            return Err(LotteryError::InvalidSubscription);
        }
        self.requests.remove(position);
        msg!("Request {} cancelled", request_id);
        Ok(LotteryEvent::RequestCancelled {
            request_id,
            subscription_id: subscription.id,
        })
    }
}

/// A coordinator bound to one subscription, as seen by a requesting consumer
pub struct SubscriptionCoordinator<'a> {
    pub coordinator: &'a mut VrfCoordinatorMock,
    pub subscription: &'a mut Subscription,
    pub events: Vec<LotteryEvent>,
}

impl<'a> SubscriptionCoordinator<'a> {
    pub fn new(coordinator: &'a mut VrfCoordinatorMock, subscription: &'a mut Subscription) -> Self {
        Self {
            coordinator,
            subscription,
            events: Vec::new(),
        }
    }
}

impl<'a> RandomnessCoordinator for SubscriptionCoordinator<'a> {
    fn request_random_words(&mut self, request: &RandomWordsRequest) -> Result<u64, LotteryError> {
        let (request_id, event) = self
            .coordinator
            .request_random_words(self.subscription, request)?;
        self.events.push(event);
        Ok(request_id)
    }

    fn cancel_request(&mut self, request_id: u64) -> Result<(), LotteryError> {
        let event = self.coordinator.cancel_request(self.subscription, request_id)?;
        self.events.push(event);
        Ok(())
    }
}
