//! The lottery engine: pool state, entry and readiness rules, closing a
//! round into a randomness request and finalizing it from the callback.
//!
//! ```text
//! Open --perform_upkeep [upkeep needed]--> Calculating --fulfill [pending id]--> Open
//! Open --enter--> Open
//! ```

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp, msg, program_pack::IsInitialized, pubkey::Pubkey,
};

use crate::config::{LotteryConfig, NUM_WORDS, REQUEST_CONFIRMATIONS};
use crate::error::LotteryError;
use crate::events::LotteryEvent;
use crate::randomness::{
    PrizeTransfer, RandomWord, RandomWordsRequest, RandomnessConsumer, RandomnessCoordinator,
};
use crate::state::{AccountState, RoundState};

/// Entries one round can hold
pub const MAX_PLAYERS: usize = 64;

/// Lottery account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq)]
pub struct Lottery {
    is_initialized: bool,
    state: RoundState,
    entrance_fee: u64,
    interval: u64,
    /// Start of the current round
    last_timestamp: UnixTimestamp,
    coordinator: Pubkey,
    key_hash: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
    stall_timeout: u64,
    /// Set exactly while Calculating
    pending_request_id: Option<u64>,
    requested_at: Option<UnixTimestamp>,
    recent_winner: Option<Pubkey>,
    /// Lamports pooled since the last payout
    balance: u64,
    /// One slot per entry, in entry order
    players: Vec<Pubkey>,
}

impl IsInitialized for Lottery {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl AccountState for Lottery {
    const LEN: usize = 1 + 1 + 8 + 8 + 8 + 32 + 32 + 8 + 4 + 8 + 9 + 9 + 33 + 8 + 4 + 32 * MAX_PLAYERS;
}

impl Lottery {
    pub fn new(config: &LotteryConfig, now: UnixTimestamp) -> Result<Self, LotteryError> {
        config.validate()?;
        Ok(Self {
            is_initialized: true,
            state: RoundState::Open,
            entrance_fee: config.entrance_fee,
            interval: config.interval,
            last_timestamp: now,
            coordinator: config.coordinator,
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            callback_gas_limit: config.callback_gas_limit,
            stall_timeout: config.stall_timeout,
            pending_request_id: None,
            requested_at: None,
            recent_winner: None,
            balance: 0,
            players: Vec::new(),
        })
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn coordinator(&self) -> &Pubkey {
        &self.coordinator
    }

    pub fn subscription_id(&self) -> u64 {
        self.subscription_id
    }

    pub fn callback_gas_limit(&self) -> u32 {
        self.callback_gas_limit
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn number_of_players(&self) -> u64 {
        self.players.len() as u64
    }

    pub fn player(&self, index: u64) -> Result<Pubkey, LotteryError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.players.get(i))
            .copied()
            .ok_or(LotteryError::PlayerIndexOutOfBounds(index))
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    /// Record one entry for `player`. Only while open, and the payment must
    /// equal the entrance fee exactly.
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<LotteryEvent, LotteryError> {
        if self.state != RoundState::Open {
            return Err(LotteryError::RoundNotOpen);
        }
        if amount != self.entrance_fee {
            return Err(LotteryError::InsufficientPayment {
                paid: amount,
                required: self.entrance_fee,
            });
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(LotteryError::LotteryFull);
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(LotteryError::MathOverflow)?;

        self.players.push(player);
        self.balance = balance;
        msg!(
            "Player {} entered, {} players, pool {} lamports",
            player,
            self.players.len(),
            self.balance
        );
        Ok(LotteryEvent::Entered { player })
    }

    /// Readiness gate: open, interval elapsed, at least one player and
    /// something in the pool.
    pub fn is_upkeep_needed(&self, now: UnixTimestamp) -> bool {
        let elapsed = now.saturating_sub(self.last_timestamp);
        self.state == RoundState::Open
            && elapsed >= 0
            && elapsed as u64 >= self.interval
            && !self.players.is_empty()
            && self.balance > 0
    }

    /// Cheap poll for triggers. The payload is opaque and echoed back.
    pub fn check_upkeep(&self, now: UnixTimestamp, check_data: &[u8]) -> (bool, Vec<u8>) {
        (self.is_upkeep_needed(now), check_data.to_vec())
    }

    /// Close the round and ask `coordinator` for randomness on behalf of
    /// `consumer` (the lottery account). Readiness is re-checked here, a
    /// stale positive poll is not trusted.
    pub fn perform_upkeep<C>(
        &mut self,
        now: UnixTimestamp,
        _perform_data: &[u8],
        consumer: &Pubkey,
        coordinator: &mut C,
    ) -> Result<LotteryEvent, LotteryError>
    where
        C: RandomnessCoordinator + ?Sized,
    {
        if !self.is_upkeep_needed(now) {
            return Err(LotteryError::UpkeepNotNeeded {
                balance: self.balance,
                players: self.number_of_players(),
                state: self.state,
            });
        }

        let request_id = coordinator.request_random_words(&RandomWordsRequest {
            key_hash: self.key_hash,
            subscription_id: self.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: self.callback_gas_limit,
            num_words: NUM_WORDS,
            consumer: *consumer,
        })?;

        self.state = RoundState::Calculating;
        self.pending_request_id = Some(request_id);
        self.requested_at = Some(now);
        msg!("Round closed, randomness request {}", request_id);
        Ok(LotteryEvent::RoundClosed { request_id })
    }

    /// Rejects callbacks from anyone but the configured coordinator
    pub fn ensure_coordinator(&self, caller: &Pubkey) -> Result<(), LotteryError> {
        if *caller != self.coordinator {
            return Err(LotteryError::OnlyCoordinatorCanFulfill);
        }
        Ok(())
    }

    /// Pick the winner with `random_words[0] mod players`, pay out the pool
    /// and reopen. If the payout fails nothing changes and the round stays
    /// Calculating so the same request can be delivered again.
    pub fn fulfill_random_words<P>(
        &mut self,
        request_id: u64,
        random_words: &[RandomWord],
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<LotteryEvent, LotteryError>
    where
        P: PrizeTransfer + ?Sized,
    {
        if self.state != RoundState::Calculating || self.pending_request_id != Some(request_id) {
            return Err(LotteryError::UnknownRequest(request_id));
        }
        let word = random_words.first().ok_or(LotteryError::EmptyRandomWords)?;

        let index = word.modulo(self.number_of_players());
        let winner = self.player(index).map_err(|_| LotteryError::PayoutFailed)?;
        let prize = self.balance;
        msg!("Random winner index: {} of {}", index, self.players.len());

        payout.transfer_prize(&winner, prize)?;

        self.players.clear();
        self.balance = 0;
        self.last_timestamp = now;
        self.state = RoundState::Open;
        self.pending_request_id = None;
        self.requested_at = None;
        self.recent_winner = Some(winner);
        msg!("Winner {} paid {} lamports", winner, prize);
        Ok(LotteryEvent::WinnerPicked { winner, prize })
    }

    /// Abandon an outstanding request that has not been answered within the
    /// stall timeout and withdraw it from `coordinator`. Players and pool
    /// carry over into the reopened round.
    pub fn reopen_stalled_round<C>(
        &mut self,
        now: UnixTimestamp,
        coordinator: &mut C,
    ) -> Result<LotteryEvent, LotteryError>
    where
        C: RandomnessCoordinator + ?Sized,
    {
        let (request_id, requested_at) = match (self.state, self.pending_request_id, self.requested_at)
        {
            (RoundState::Calculating, Some(id), Some(at)) => (id, at),
            _ => return Err(LotteryError::RoundNotStalled),
        };
        let waited = now.saturating_sub(requested_at);
        if waited < 0 || (waited as u64) < self.stall_timeout {
            return Err(LotteryError::RoundNotStalled);
        }

        coordinator.cancel_request(request_id)?;

        self.state = RoundState::Open;
        self.pending_request_id = None;
        self.requested_at = None;
        msg!("Request {} abandoned after {}s, round reopened", request_id, waited);
        Ok(LotteryEvent::RoundReopened { request_id })
    }
}

/// Adapts the engine to the coordinator callback for one delivery
pub struct LotteryConsumer<'a, P: PrizeTransfer + ?Sized> {
    pub lottery: &'a mut Lottery,
    pub now: UnixTimestamp,
    pub payout: &'a mut P,
    pub events: Vec<LotteryEvent>,
}

impl<'a, P: PrizeTransfer + ?Sized> LotteryConsumer<'a, P> {
    pub fn new(lottery: &'a mut Lottery, now: UnixTimestamp, payout: &'a mut P) -> Self {
        Self {
            lottery,
            now,
            payout,
            events: Vec::new(),
        }
    }
}

impl<'a, P: PrizeTransfer + ?Sized> RandomnessConsumer for LotteryConsumer<'a, P> {
    fn raw_fulfill_random_words(
        &mut self,
        request_id: u64,
        random_words: &[RandomWord],
    ) -> Result<(), LotteryError> {
        let event =
            self.lottery
                .fulfill_random_words(request_id, random_words, self.now, &mut *self.payout)?;
        self.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    pub const FEE: u64 = 10_000_000;
    pub const INTERVAL: u64 = 30;
    pub const START: UnixTimestamp = 1_700_000_000;

    #[derive(Default)]
    pub struct Ledger {
        pub balances: HashMap<Pubkey, u64>,
        pub rejecting: HashSet<Pubkey>,
    }

    impl PrizeTransfer for Ledger {
        fn transfer_prize(&mut self, winner: &Pubkey, amount: u64) -> Result<(), LotteryError> {
            if self.rejecting.contains(winner) {
                return Err(LotteryError::PayoutFailed);
            }
            *self.balances.entry(*winner).or_default() += amount;
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubCoordinator {
        next_request_id: u64,
        requests: Vec<RandomWordsRequest>,
        cancelled: Vec<u64>,
        unavailable: bool,
    }

    impl RandomnessCoordinator for StubCoordinator {
        fn request_random_words(
            &mut self,
            request: &RandomWordsRequest,
        ) -> Result<u64, LotteryError> {
            if self.unavailable {
                return Err(LotteryError::InvalidSubscription);
            }
            self.next_request_id += 1;
            self.requests.push(request.clone());
            Ok(self.next_request_id)
        }

        fn cancel_request(&mut self, request_id: u64) -> Result<(), LotteryError> {
            if self.unavailable {
                return Err(LotteryError::NonexistentRequest);
            }
            self.cancelled.push(request_id);
            Ok(())
        }
    }

    pub fn config() -> LotteryConfig {
        LotteryConfig {
            entrance_fee: FEE,
            interval: INTERVAL,
            coordinator: Pubkey::new_unique(),
            ..LotteryConfig::default()
        }
    }

    fn lottery_with_players(n: usize) -> (Lottery, Vec<Pubkey>) {
        let mut lottery = Lottery::new(&config(), START).unwrap();
        let players: Vec<Pubkey> = (0..n).map(|_| Pubkey::new_unique()).collect();
        for player in &players {
            lottery.enter(*player, FEE).unwrap();
        }
        (lottery, players)
    }

    fn closed_lottery(n: usize) -> (Lottery, Vec<Pubkey>, u64) {
        let (mut lottery, players) = lottery_with_players(n);
        let mut coordinator = StubCoordinator::default();
        let event = lottery
            .perform_upkeep(
                START + INTERVAL as i64,
                &[],
                &Pubkey::new_unique(),
                &mut coordinator,
            )
            .unwrap();
        let request_id = match event {
            LotteryEvent::RoundClosed { request_id } => request_id,
            other => panic!("unexpected event {:?}", other),
        };
        (lottery, players, request_id)
    }

    #[test]
    fn initializes_open() {
        let lottery = Lottery::new(&config(), START).unwrap();
        assert_eq!(lottery.state(), RoundState::Open);
        assert_eq!(lottery.entrance_fee(), FEE);
        assert_eq!(lottery.interval(), INTERVAL);
        assert_eq!(lottery.last_timestamp(), START);
        assert_eq!(lottery.number_of_players(), 0);
        assert_eq!(lottery.pending_request_id(), None);
        assert_eq!(lottery.num_words(), 1);
        assert_eq!(lottery.request_confirmations(), 3);
    }

    #[test]
    fn enter_records_player_and_fee() {
        let mut lottery = Lottery::new(&config(), START).unwrap();
        let player = Pubkey::new_unique();
        for n in 1..=3u64 {
            let event = lottery.enter(player, FEE).unwrap();
            assert_eq!(event, LotteryEvent::Entered { player });
            assert_eq!(lottery.number_of_players(), n);
            assert_eq!(lottery.balance(), FEE * n);
        }
        // duplicates are distinct slots
        assert_eq!(lottery.player(0).unwrap(), player);
        assert_eq!(lottery.player(2).unwrap(), player);
        assert_eq!(
            lottery.player(3),
            Err(LotteryError::PlayerIndexOutOfBounds(3))
        );
    }

    #[test]
    fn enter_rejects_wrong_payment() {
        let mut lottery = Lottery::new(&config(), START).unwrap();
        for amount in [0, FEE - 1, FEE + 1] {
            assert_eq!(
                lottery.enter(Pubkey::new_unique(), amount),
                Err(LotteryError::InsufficientPayment {
                    paid: amount,
                    required: FEE
                })
            );
        }
        assert_eq!(lottery.number_of_players(), 0);
        assert_eq!(lottery.balance(), 0);
    }

    #[test]
    fn enter_rejected_while_calculating() {
        let (mut lottery, _, _) = closed_lottery(1);
        for amount in [FEE, 0, FEE * 2] {
            assert_eq!(
                lottery.enter(Pubkey::new_unique(), amount),
                Err(LotteryError::RoundNotOpen)
            );
        }
        assert_eq!(lottery.number_of_players(), 1);
    }

    #[test]
    fn enter_rejected_when_full() {
        let (mut lottery, _) = lottery_with_players(MAX_PLAYERS);
        assert_eq!(
            lottery.enter(Pubkey::new_unique(), FEE),
            Err(LotteryError::LotteryFull)
        );
        assert_eq!(lottery.balance(), FEE * MAX_PLAYERS as u64);
    }

    #[test]
    fn upkeep_gate_combinations() {
        let empty = Lottery::new(&config(), START).unwrap();
        assert!(!empty.is_upkeep_needed(START + 1_000));

        let (entered, _) = lottery_with_players(1);
        assert!(!entered.is_upkeep_needed(START));
        assert!(!entered.is_upkeep_needed(START + INTERVAL as i64 - 1));
        assert!(entered.is_upkeep_needed(START + INTERVAL as i64));
        // clock behind the round start
        assert!(!entered.is_upkeep_needed(START - 1));

        let (closed, _, _) = closed_lottery(1);
        assert!(!closed.is_upkeep_needed(START + 10 * INTERVAL as i64));
    }

    #[test]
    fn free_lottery_never_ready() {
        let mut lottery = Lottery::new(
            &LotteryConfig {
                entrance_fee: 0,
                ..config()
            },
            START,
        )
        .unwrap();
        lottery.enter(Pubkey::new_unique(), 0).unwrap();
        assert!(!lottery.is_upkeep_needed(START + INTERVAL as i64));
    }

    #[test]
    fn check_upkeep_echoes_payload() {
        let (lottery, _) = lottery_with_players(1);
        let (needed, data) = lottery.check_upkeep(START + INTERVAL as i64, b"meta");
        assert!(needed);
        assert_eq!(data, b"meta".to_vec());
    }

    #[test]
    fn perform_upkeep_requires_readiness() {
        let (mut lottery, _) = lottery_with_players(1);
        let mut coordinator = StubCoordinator::default();
        let consumer = Pubkey::new_unique();
        assert_eq!(
            lottery.perform_upkeep(START + 1, &[], &consumer, &mut coordinator),
            Err(LotteryError::UpkeepNotNeeded {
                balance: FEE,
                players: 1,
                state: RoundState::Open,
            })
        );
        assert!(coordinator.requests.is_empty());
        assert_eq!(lottery.state(), RoundState::Open);
    }

    #[test]
    fn perform_upkeep_requests_randomness() {
        let (mut lottery, _) = lottery_with_players(2);
        let mut coordinator = StubCoordinator::default();
        let consumer = Pubkey::new_unique();
        let now = START + INTERVAL as i64 + 5;
        let event = lottery
            .perform_upkeep(now, b"ignored", &consumer, &mut coordinator)
            .unwrap();
        assert_eq!(event, LotteryEvent::RoundClosed { request_id: 1 });
        assert_eq!(lottery.state(), RoundState::Calculating);
        assert_eq!(lottery.pending_request_id(), Some(1));

        let request = &coordinator.requests[0];
        assert_eq!(request.consumer, consumer);
        assert_eq!(request.num_words, NUM_WORDS);
        assert_eq!(request.request_confirmations, REQUEST_CONFIRMATIONS);
        assert_eq!(request.callback_gas_limit, lottery.callback_gas_limit());

        // a second trigger with the same stale readiness is refused
        assert!(matches!(
            lottery.perform_upkeep(now, &[], &consumer, &mut coordinator),
            Err(LotteryError::UpkeepNotNeeded {
                state: RoundState::Calculating,
                ..
            })
        ));
        assert_eq!(coordinator.requests.len(), 1);
    }

    #[test]
    fn failed_request_leaves_round_open() {
        let (mut lottery, _) = lottery_with_players(1);
        let mut coordinator = StubCoordinator {
            unavailable: true,
            ..StubCoordinator::default()
        };
        assert_eq!(
            lottery.perform_upkeep(
                START + INTERVAL as i64,
                &[],
                &Pubkey::new_unique(),
                &mut coordinator
            ),
            Err(LotteryError::InvalidSubscription)
        );
        assert_eq!(lottery.state(), RoundState::Open);
        assert_eq!(lottery.pending_request_id(), None);
    }

    #[test]
    fn fulfill_before_close_is_unknown() {
        let (mut lottery, _) = lottery_with_players(1);
        let mut ledger = Ledger::default();
        for id in [0, 1] {
            assert_eq!(
                lottery.fulfill_random_words(id, &[RandomWord::from(1)], START, &mut ledger),
                Err(LotteryError::UnknownRequest(id))
            );
        }
    }

    #[test]
    fn single_player_wins_whole_pool() {
        let (mut lottery, players, request_id) = closed_lottery(1);
        let mut ledger = Ledger::default();
        let now = START + 100;
        let event = lottery
            .fulfill_random_words(request_id, &[RandomWord::from(17)], now, &mut ledger)
            .unwrap();
        assert_eq!(
            event,
            LotteryEvent::WinnerPicked {
                winner: players[0],
                prize: FEE
            }
        );
        assert_eq!(ledger.balances[&players[0]], FEE);
        assert_eq!(lottery.state(), RoundState::Open);
        assert_eq!(lottery.number_of_players(), 0);
        assert_eq!(lottery.balance(), 0);
        assert_eq!(lottery.last_timestamp(), now);
        assert_eq!(lottery.pending_request_id(), None);
        assert_eq!(lottery.recent_winner(), Some(players[0]));
    }

    #[test]
    fn seven_players_index_is_word_mod_seven() {
        for word in [0u64, 6, 7, 17, 1_000_003] {
            let (mut lottery, players, request_id) = closed_lottery(7);
            let mut ledger = Ledger::default();
            lottery
                .fulfill_random_words(request_id, &[RandomWord::from(word)], START + 60, &mut ledger)
                .unwrap();
            let expected = players[(word % 7) as usize];
            assert_eq!(lottery.recent_winner(), Some(expected));
            assert_eq!(ledger.balances[&expected], 7 * FEE);
            assert_eq!(ledger.balances.len(), 1);
        }
    }

    #[test]
    fn fulfill_twice_is_unknown() {
        let (mut lottery, _, request_id) = closed_lottery(2);
        let mut ledger = Ledger::default();
        lottery
            .fulfill_random_words(request_id, &[RandomWord::from(3)], START + 60, &mut ledger)
            .unwrap();
        assert_eq!(
            lottery.fulfill_random_words(request_id, &[RandomWord::from(3)], START + 61, &mut ledger),
            Err(LotteryError::UnknownRequest(request_id))
        );
    }

    #[test]
    fn fulfill_with_wrong_id_or_no_words() {
        let (mut lottery, _, request_id) = closed_lottery(2);
        let mut ledger = Ledger::default();
        assert_eq!(
            lottery.fulfill_random_words(request_id + 1, &[RandomWord::from(3)], START, &mut ledger),
            Err(LotteryError::UnknownRequest(request_id + 1))
        );
        assert_eq!(
            lottery.fulfill_random_words(request_id, &[], START, &mut ledger),
            Err(LotteryError::EmptyRandomWords)
        );
        assert_eq!(lottery.state(), RoundState::Calculating);
    }

    #[test]
    fn failed_payout_keeps_round_calculating() {
        let (mut lottery, players, request_id) = closed_lottery(1);
        let before = lottery.clone();
        let mut ledger = Ledger::default();
        ledger.rejecting.insert(players[0]);
        assert_eq!(
            lottery.fulfill_random_words(request_id, &[RandomWord::from(0)], START + 60, &mut ledger),
            Err(LotteryError::PayoutFailed)
        );
        assert_eq!(lottery, before);

        // redelivery succeeds once the recipient can be paid
        ledger.rejecting.clear();
        lottery
            .fulfill_random_words(request_id, &[RandomWord::from(0)], START + 90, &mut ledger)
            .unwrap();
        assert_eq!(ledger.balances[&players[0]], FEE);
    }

    #[test]
    fn stalled_round_reopens_after_timeout() {
        let (mut lottery, _, request_id) = closed_lottery(3);
        let closed_at = START + INTERVAL as i64;
        let mut coordinator = StubCoordinator::default();
        assert_eq!(
            lottery.reopen_stalled_round(closed_at + 10, &mut coordinator),
            Err(LotteryError::RoundNotStalled)
        );
        assert!(coordinator.cancelled.is_empty());

        let event = lottery
            .reopen_stalled_round(closed_at + lottery.stall_timeout as i64, &mut coordinator)
            .unwrap();
        assert_eq!(event, LotteryEvent::RoundReopened { request_id });
        assert_eq!(coordinator.cancelled, vec![request_id]);
        assert_eq!(lottery.state(), RoundState::Open);
        assert_eq!(lottery.number_of_players(), 3);
        assert_eq!(lottery.balance(), 3 * FEE);

        // late answer to the abandoned request
        let mut ledger = Ledger::default();
        assert_eq!(
            lottery.fulfill_random_words(request_id, &[RandomWord::from(1)], START, &mut ledger),
            Err(LotteryError::UnknownRequest(request_id))
        );
        assert_eq!(
            lottery.reopen_stalled_round(
                closed_at + 10 * lottery.stall_timeout as i64,
                &mut coordinator
            ),
            Err(LotteryError::RoundNotStalled)
        );
    }

    #[test]
    fn failed_cancel_keeps_round_calculating() {
        let (mut lottery, _, request_id) = closed_lottery(2);
        let before = lottery.clone();
        let mut coordinator = StubCoordinator {
            unavailable: true,
            ..StubCoordinator::default()
        };
        let late = START + INTERVAL as i64 + lottery.stall_timeout as i64;
        assert_eq!(
            lottery.reopen_stalled_round(late, &mut coordinator),
            Err(LotteryError::NonexistentRequest)
        );
        assert_eq!(lottery, before);
        assert_eq!(lottery.pending_request_id(), Some(request_id));
    }

    #[test]
    fn only_coordinator_may_fulfill() {
        let lottery = Lottery::new(&config(), START).unwrap();
        assert!(lottery.ensure_coordinator(lottery.coordinator()).is_ok());
        assert_eq!(
            lottery.ensure_coordinator(&Pubkey::new_unique()),
            Err(LotteryError::OnlyCoordinatorCanFulfill)
        );
    }

    #[test]
    fn account_round_trip_at_capacity() {
        let (lottery, _) = lottery_with_players(MAX_PLAYERS);
        let mut data = vec![0u8; Lottery::LEN];
        lottery.save(&mut data).unwrap();
        assert_eq!(Lottery::load_initialized(&data).unwrap(), lottery);
    }

    #[test]
    fn zeroed_account_is_uninitialized() {
        let data = vec![0u8; Lottery::LEN];
        assert!(!Lottery::load(&data).unwrap().is_initialized());
        assert!(Lottery::load_initialized(&data).is_err());
    }
}
