use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::config::LotteryConfig;
use crate::error::LotteryError;
use crate::events::{emit_all, LotteryEvent};
use crate::instruction::LotteryInstruction;
use crate::lottery::{Lottery, LotteryConsumer};
use crate::randomness::{PrizeTransfer, RandomWord};
use crate::state::AccountState;
use crate::utils::{lamports_to_sol, transfer_lamports};
use crate::vrf_mock::{Subscription, SubscriptionCoordinator, VrfCoordinatorMock};

pub struct Processor;

/// Pays the prize out of the lottery account to one of the recipient
/// accounts passed with the fulfillment
struct LamportPayout<'a, 'info> {
    pool: &'a AccountInfo<'info>,
    recipients: &'a [AccountInfo<'info>],
}

impl<'a, 'info> PrizeTransfer for LamportPayout<'a, 'info> {
    fn transfer_prize(&mut self, winner: &Pubkey, amount: u64) -> Result<(), LotteryError> {
        let recipient = self
            .recipients
            .iter()
            .find(|account| account.key == winner && account.is_writable)
            .ok_or_else(|| {
                msg!("Winner {} was not passed as a writable account", winner);
                LotteryError::PayoutFailed
            })?;
        transfer_lamports(self.pool, recipient, amount).map_err(|e| {
            msg!("Prize transfer failed: {:?}", e);
            LotteryError::PayoutFailed
        })
    }
}

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::InitializeCoordinator {
                base_fee,
                gas_price,
            } => {
                msg!("Instruction: Initialize Coordinator");
                Self::process_initialize_coordinator(accounts, base_fee, gas_price, program_id)
            }
            LotteryInstruction::CreateSubscription {} => {
                msg!("Instruction: Create Subscription");
                Self::process_create_subscription(accounts, program_id)
            }
            LotteryInstruction::FundSubscription { amount } => {
                msg!("Instruction: Fund Subscription");
                Self::process_fund_subscription(accounts, amount, program_id)
            }
            LotteryInstruction::AddConsumer {} => {
                msg!("Instruction: Add Consumer");
                Self::process_add_consumer(accounts, program_id)
            }
            LotteryInstruction::InitializeLottery {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                callback_gas_limit,
                stall_timeout,
            } => {
                msg!("Instruction: Initialize Lottery");
                Self::process_initialize_lottery(
                    accounts,
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                    stall_timeout,
                    program_id,
                )
            }
            LotteryInstruction::EnterLottery { amount } => {
                msg!("Instruction: Enter Lottery");
                Self::process_enter_lottery(accounts, amount, program_id)
            }
            LotteryInstruction::CheckUpkeep { data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, &data, program_id)
            }
            LotteryInstruction::PerformUpkeep { data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, &data, program_id)
            }
            LotteryInstruction::FulfillRandomWords { request_id, words } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &words, program_id)
            }
            LotteryInstruction::ReopenStalledRound {} => {
                msg!("Instruction: Reopen Stalled Round");
                Self::process_reopen_stalled_round(accounts, program_id)
            }
        }
    }

    fn check_signer(account: &AccountInfo, what: &str) -> ProgramResult {
        if !account.is_signer {
            msg!("{} must sign the transaction", what);
            return Err(ProgramError::MissingRequiredSignature);
        }
        Ok(())
    }

    fn check_owned(account: &AccountInfo, program_id: &Pubkey, what: &str) -> ProgramResult {
        if account.owner != program_id {
            msg!("{} account must be owned by this program", what);
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }

    fn check_writable(account: &AccountInfo, what: &str) -> ProgramResult {
        if !account.is_writable {
            msg!("{} account must be writable", what);
            return Err(ProgramError::InvalidArgument);
        }
        Ok(())
    }

    fn check_rent_exempt(account: &AccountInfo, len: usize) -> ProgramResult {
        let rent = Rent::get()?;
        if !rent.is_exempt(account.lamports(), len) {
            msg!("Account is not rent exempt");
            return Err(ProgramError::AccountNotRentExempt);
        }
        Ok(())
    }

    fn process_initialize_coordinator(
        accounts: &[AccountInfo],
        base_fee: u64,
        gas_price: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;

        Self::check_signer(authority_info, "Deployer")?;
        Self::check_owned(coordinator_info, program_id, "Coordinator")?;
        Self::check_rent_exempt(coordinator_info, VrfCoordinatorMock::LEN)?;

        let existing = VrfCoordinatorMock::load(&coordinator_info.data.borrow())?;
        if existing.is_initialized() {
            msg!("Coordinator account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let coordinator =
            VrfCoordinatorMock::new(*coordinator_info.key, *authority_info.key, base_fee, gas_price);
        coordinator.save(&mut coordinator_info.data.borrow_mut())?;

        msg!(
            "Coordinator initialized: base fee {}, gas price {}",
            base_fee,
            gas_price
        );
        Ok(())
    }

    fn process_create_subscription(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        Self::check_signer(owner_info, "Subscription owner")?;
        Self::check_owned(coordinator_info, program_id, "Coordinator")?;
        Self::check_owned(subscription_info, program_id, "Subscription")?;
        Self::check_rent_exempt(subscription_info, Subscription::LEN)?;

        let existing = Subscription::unpack_unchecked(&subscription_info.data.borrow())?;
        if existing.is_initialized() {
            msg!("Subscription account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let mut coordinator = VrfCoordinatorMock::load_initialized(&coordinator_info.data.borrow())?;
        let (subscription, event) = coordinator.create_subscription(*owner_info.key);

        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;
        coordinator.save(&mut coordinator_info.data.borrow_mut())?;

        event.emit();
        Ok(())
    }

    fn process_fund_subscription(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let funder_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        Self::check_signer(funder_info, "Funder")?;
        Self::check_owned(subscription_info, program_id, "Subscription")?;
        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut subscription = Subscription::unpack(&subscription_info.data.borrow())?;
        let event = subscription.fund(amount)?;

        // The prepaid balance is held as lamports on the subscription account
        invoke(
            &system_instruction::transfer(funder_info.key, subscription_info.key, amount),
            &[
                funder_info.clone(),
                subscription_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn process_add_consumer(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let consumer_info = next_account_info(account_info_iter)?;

        Self::check_signer(owner_info, "Subscription owner")?;
        Self::check_owned(subscription_info, program_id, "Subscription")?;

        let mut subscription = Subscription::unpack(&subscription_info.data.borrow())?;
        if subscription.owner != *owner_info.key {
            msg!("Only the subscription owner can add consumers");
            return Err(ProgramError::InvalidArgument);
        }

        if let Some(event) = subscription.add_consumer(*consumer_info.key)? {
            event.emit();
        }
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn process_initialize_lottery(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        stall_timeout: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;

        Self::check_signer(authority_info, "Deployer")?;
        Self::check_owned(lottery_info, program_id, "Lottery")?;
        Self::check_owned(coordinator_info, program_id, "Coordinator")?;
        Self::check_rent_exempt(lottery_info, Lottery::LEN)?;

        let existing = Lottery::load(&lottery_info.data.borrow())?;
        if existing.is_initialized() {
            msg!("Lottery account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let config = LotteryConfig {
            entrance_fee,
            interval,
            coordinator: *coordinator_info.key,
            key_hash,
            subscription_id,
            callback_gas_limit,
            stall_timeout,
        };
        let clock = Clock::get()?;
        let lottery = Lottery::new(&config, clock.unix_timestamp)?;
        lottery.save(&mut lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: entrance fee {} SOL, interval {}s",
            lamports_to_sol(entrance_fee),
            interval
        );
        Ok(())
    }

    fn process_enter_lottery(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        Self::check_signer(player_info, "Player")?;
        Self::check_owned(lottery_info, program_id, "Lottery")?;
        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery = Lottery::load_initialized(&lottery_info.data.borrow())?;
        let event = lottery.enter(*player_info.key, amount)?;

        if amount > 0 {
            invoke(
                &system_instruction::transfer(player_info.key, lottery_info.key, amount),
                &[
                    player_info.clone(),
                    lottery_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }

        lottery.save(&mut lottery_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn process_check_upkeep(
        accounts: &[AccountInfo],
        data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;

        Self::check_owned(lottery_info, program_id, "Lottery")?;
        let lottery = Lottery::load_initialized(&lottery_info.data.borrow())?;

        let clock = Clock::get()?;
        let (needed, perform_data) = lottery.check_upkeep(clock.unix_timestamp, data);
        msg!("Upkeep needed: {}", needed);

        let mut result = Vec::with_capacity(1 + perform_data.len());
        result.push(needed as u8);
        result.extend_from_slice(&perform_data);
        set_return_data(&result);
        Ok(())
    }

    fn process_perform_upkeep(
        accounts: &[AccountInfo],
        data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        Self::check_owned(lottery_info, program_id, "Lottery")?;
        Self::check_owned(coordinator_info, program_id, "Coordinator")?;
        Self::check_owned(subscription_info, program_id, "Subscription")?;
        Self::check_writable(lottery_info, "Lottery")?;

        let mut lottery = Lottery::load_initialized(&lottery_info.data.borrow())?;
        if lottery.coordinator() != coordinator_info.key {
            msg!("Coordinator does not match the lottery configuration");
            return Err(ProgramError::InvalidArgument);
        }
        let mut coordinator = VrfCoordinatorMock::load_initialized(&coordinator_info.data.borrow())?;
        let mut subscription = Subscription::unpack(&subscription_info.data.borrow())?;

        let clock = Clock::get()?;
        let mut bound = SubscriptionCoordinator::new(&mut coordinator, &mut subscription);
        let closed = lottery.perform_upkeep(clock.unix_timestamp, data, lottery_info.key, &mut bound)?;
        let mut events = std::mem::take(&mut bound.events);
        events.push(closed);

        lottery.save(&mut lottery_info.data.borrow_mut())?;
        coordinator.save(&mut coordinator_info.data.borrow_mut())?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        emit_all(&events);
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        words: &[RandomWord],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let fulfiller_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let recipients = account_info_iter.as_slice();

        Self::check_owned(coordinator_info, program_id, "Coordinator")?;
        Self::check_owned(subscription_info, program_id, "Subscription")?;
        Self::check_owned(lottery_info, program_id, "Lottery")?;
        Self::check_writable(lottery_info, "Lottery")?;

        let mut lottery = Lottery::load_initialized(&lottery_info.data.borrow())?;
        lottery.ensure_coordinator(coordinator_info.key)?;
        let mut coordinator = VrfCoordinatorMock::load_initialized(&coordinator_info.data.borrow())?;
        if !fulfiller_info.is_signer {
            msg!("Coordinator authority must sign the delivery");
            return Err(LotteryError::OnlyCoordinatorCanFulfill.into());
        }
        coordinator.ensure_authority(fulfiller_info.key)?;
        let mut subscription = Subscription::unpack(&subscription_info.data.borrow())?;
        let balance_before = subscription.balance;

        let clock = Clock::get()?;
        let mut payout = LamportPayout {
            pool: lottery_info,
            recipients,
        };
        let mut consumer = LotteryConsumer::new(&mut lottery, clock.unix_timestamp, &mut payout);
        let fulfilled = coordinator.fulfill_random_words_with_override(
            &mut subscription,
            request_id,
            lottery_info.key,
            &mut consumer,
            words,
        )?;
        let mut events: Vec<LotteryEvent> = std::mem::take(&mut consumer.events);
        events.push(fulfilled);

        let charged = balance_before
            .checked_sub(subscription.balance)
            .ok_or(LotteryError::MathOverflow)?;
        transfer_lamports(subscription_info, coordinator_info, charged)?;

        lottery.save(&mut lottery_info.data.borrow_mut())?;
        coordinator.save(&mut coordinator_info.data.borrow_mut())?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        emit_all(&events);
        Ok(())
    }

    fn process_reopen_stalled_round(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        Self::check_owned(lottery_info, program_id, "Lottery")?;
        Self::check_owned(coordinator_info, program_id, "Coordinator")?;
        Self::check_owned(subscription_info, program_id, "Subscription")?;
        Self::check_writable(lottery_info, "Lottery")?;

        let mut lottery = Lottery::load_initialized(&lottery_info.data.borrow())?;
        if lottery.coordinator() != coordinator_info.key {
            msg!("Coordinator does not match the lottery configuration");
            return Err(ProgramError::InvalidArgument);
        }
        let mut coordinator = VrfCoordinatorMock::load_initialized(&coordinator_info.data.borrow())?;
        let mut subscription = Subscription::unpack(&subscription_info.data.borrow())?;

        let clock = Clock::get()?;
        let mut bound = SubscriptionCoordinator::new(&mut coordinator, &mut subscription);
        let reopened = lottery.reopen_stalled_round(clock.unix_timestamp, &mut bound)?;
        let mut events = std::mem::take(&mut bound.events);
        events.push(reopened);

        lottery.save(&mut lottery_info.data.borrow_mut())?;
        coordinator.save(&mut coordinator_info.data.borrow_mut())?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        emit_all(&events);
        Ok(())
    }
}
