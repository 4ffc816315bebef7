use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::randomness::{RandomWord, RANDOM_WORD_LEN};

#[derive(Clone, Debug, PartialEq)]
pub enum LotteryInstruction {
    /// Initialize the development randomness coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` The deployer, recorded as the authority allowed to deliver words
    /// 1. `[writable]` The coordinator account, allocated and owned by this program
    InitializeCoordinator {
        /// Flat fee per fulfillment, in lamports
        base_fee: u64,
        /// Fee per unit of callback gas, in lamports
        gas_price: u64,
    },

    /// Create a randomness subscription
    ///
    /// Accounts expected:
    /// 0. `[signer]` The subscription owner
    /// 1. `[writable]` The coordinator account
    /// 2. `[writable]` The subscription account, allocated and owned by this program
    CreateSubscription {},

    /// Add prepaid funds to a subscription
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The funder
    /// 1. `[writable]` The subscription account
    /// 2. `[]` The system program
    FundSubscription {
        /// Lamports to add
        amount: u64,
    },

    /// Allow a consumer to request randomness on a subscription
    ///
    /// Accounts expected:
    /// 0. `[signer]` The subscription owner
    /// 1. `[writable]` The subscription account
    /// 2. `[]` The consumer (lottery account)
    AddConsumer {},

    /// Initialize the lottery and open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer]` The deployer
    /// 1. `[writable]` The lottery account, allocated and owned by this program
    /// 2. `[]` The coordinator account that will answer randomness requests
    InitializeLottery {
        entrance_fee: u64,
        interval: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        stall_timeout: u64,
    },

    /// Enter the current round with exactly the entrance fee
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The system program
    EnterLottery {
        /// Payment in lamports
        amount: u64,
    },

    /// Report whether the round can be closed. The result is written as
    /// return data: one flag byte followed by the echoed payload.
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    CheckUpkeep {
        /// Opaque trigger payload
        data: Vec<u8>,
    },

    /// Close the round and request randomness (anyone can trigger)
    ///
    /// Accounts expected:
    /// 0. `[writable]` The lottery account
    /// 1. `[writable]` The coordinator account
    /// 2. `[writable]` The subscription account
    PerformUpkeep {
        /// Opaque trigger payload
        data: Vec<u8>,
    },

    /// Deliver random words for a pending request through the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator authority
    /// 1. `[writable]` The coordinator account
    /// 2. `[writable]` The subscription account
    /// 3. `[writable]` The lottery account (consumer)
    /// 4.. `[writable]` Prize recipients; the winner must be among them
    FulfillRandomWords {
        request_id: u64,
        /// Words to deliver; empty means the coordinator generates them
        words: Vec<RandomWord>,
    },

    /// Abandon an unanswered request after the stall timeout, withdraw it
    /// from the coordinator and reopen
    ///
    /// Accounts expected:
    /// 0. `[writable]` The lottery account
    /// 1. `[writable]` The coordinator account
    /// 2. `[writable]` The subscription account
    ReopenStalledRound {},
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input.split_first().ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (base_fee, rest) = Self::unpack_u64(rest)?;
                let (gas_price, _) = Self::unpack_u64(rest)?;
                Self::InitializeCoordinator {
                    base_fee,
                    gas_price,
                }
            }
            1 => Self::CreateSubscription {},
            2 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::FundSubscription { amount }
            }
            3 => Self::AddConsumer {},
            4 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, rest) = Self::unpack_u32(rest)?;
                let (stall_timeout, _) = Self::unpack_u64(rest)?;
                Self::InitializeLottery {
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                    stall_timeout,
                }
            }
            5 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterLottery { amount }
            }
            6 => {
                let (data, _) = Self::unpack_bytes(rest)?;
                Self::CheckUpkeep { data }
            }
            7 => {
                let (data, _) = Self::unpack_bytes(rest)?;
                Self::PerformUpkeep { data }
            }
            8 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (count, mut rest) = Self::unpack_u32(rest)?;
                let mut words = Vec::new();
                for _ in 0..count {
                    let (word, next) = Self::unpack_fixed_bytes::<RANDOM_WORD_LEN>(rest)?;
                    words.push(RandomWord(word));
                    rest = next;
                }
                Self::FulfillRandomWords { request_id, words }
            }
            9 => Self::ReopenStalledRound {},
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeCoordinator {
                base_fee,
                gas_price,
            } => {
                buf.push(0);
                buf.extend_from_slice(&base_fee.to_le_bytes());
                buf.extend_from_slice(&gas_price.to_le_bytes());
            }
            Self::CreateSubscription {} => buf.push(1),
            Self::FundSubscription { amount } => {
                buf.push(2);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::AddConsumer {} => buf.push(3),
            Self::InitializeLottery {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                callback_gas_limit,
                stall_timeout,
            } => {
                buf.push(4);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
                buf.extend_from_slice(&stall_timeout.to_le_bytes());
            }
            Self::EnterLottery { amount } => {
                buf.push(5);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep { data } => {
                buf.push(6);
                Self::pack_bytes(&mut buf, data);
            }
            Self::PerformUpkeep { data } => {
                buf.push(7);
                Self::pack_bytes(&mut buf, data);
            }
            Self::FulfillRandomWords { request_id, words } => {
                buf.push(8);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(words.len() as u32).to_le_bytes());
                for word in words {
                    buf.extend_from_slice(&word.0);
                }
            }
            Self::ReopenStalledRound {} => buf.push(9),
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (value, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(value), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (value, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(value), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(N);
        let bytes: [u8; N] = bytes
            .try_into()
            .map_err(|_| ProgramError::InvalidInstructionData)?;
        Ok((bytes, rest))
    }

    /// u32 length prefix followed by the bytes
    fn unpack_bytes(input: &[u8]) -> Result<(Vec<u8>, &[u8]), ProgramError> {
        let (len, rest) = Self::unpack_u32(input)?;
        let len = len as usize;
        if rest.len() < len {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = rest.split_at(len);
        Ok((bytes.to_vec(), rest))
    }

    fn pack_bytes(buf: &mut Vec<u8>, data: &[u8]) {
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(data);
    }
}

/// Create initialize_coordinator instruction
pub fn initialize_coordinator(
    program_id: &Pubkey,
    authority: &Pubkey,
    coordinator: &Pubkey,
    base_fee: u64,
    gas_price: u64,
) -> Instruction {
    let data = LotteryInstruction::InitializeCoordinator {
        base_fee,
        gas_price,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new(*coordinator, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create create_subscription instruction
pub fn create_subscription(
    program_id: &Pubkey,
    owner: &Pubkey,
    coordinator: &Pubkey,
    subscription: &Pubkey,
) -> Instruction {
    let data = LotteryInstruction::CreateSubscription {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(*coordinator, false),
        AccountMeta::new(*subscription, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create fund_subscription instruction
pub fn fund_subscription(
    program_id: &Pubkey,
    funder: &Pubkey,
    subscription: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = LotteryInstruction::FundSubscription { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*funder, true),
        AccountMeta::new(*subscription, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create add_consumer instruction
pub fn add_consumer(
    program_id: &Pubkey,
    owner: &Pubkey,
    subscription: &Pubkey,
    consumer: &Pubkey,
) -> Instruction {
    let data = LotteryInstruction::AddConsumer {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(*subscription, false),
        AccountMeta::new_readonly(*consumer, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create initialize_lottery instruction
#[allow(clippy::too_many_arguments)]
pub fn initialize_lottery(
    program_id: &Pubkey,
    authority: &Pubkey,
    lottery: &Pubkey,
    coordinator: &Pubkey,
    entrance_fee: u64,
    interval: u64,
    key_hash: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
    stall_timeout: u64,
) -> Instruction {
    let data = LotteryInstruction::InitializeLottery {
        entrance_fee,
        interval,
        key_hash,
        subscription_id,
        callback_gas_limit,
        stall_timeout,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new(*lottery, false),
        AccountMeta::new_readonly(*coordinator, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter_lottery instruction
pub fn enter_lottery(
    program_id: &Pubkey,
    player: &Pubkey,
    lottery: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = LotteryInstruction::EnterLottery { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*lottery, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, lottery: &Pubkey, data: Vec<u8>) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*lottery, false)],
        data: LotteryInstruction::CheckUpkeep { data }.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    lottery: &Pubkey,
    coordinator: &Pubkey,
    subscription: &Pubkey,
    data: Vec<u8>,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*lottery, false),
        AccountMeta::new(*coordinator, false),
        AccountMeta::new(*subscription, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: LotteryInstruction::PerformUpkeep { data }.pack(),
    }
}

/// Create fulfill_random_words instruction
#[allow(clippy::too_many_arguments)]
pub fn fulfill_random_words(
    program_id: &Pubkey,
    authority: &Pubkey,
    coordinator: &Pubkey,
    subscription: &Pubkey,
    lottery: &Pubkey,
    recipients: &[Pubkey],
    request_id: u64,
    words: Vec<RandomWord>,
) -> Instruction {
    let data = LotteryInstruction::FulfillRandomWords { request_id, words }.pack();

    let mut accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new(*coordinator, false),
        AccountMeta::new(*subscription, false),
        AccountMeta::new(*lottery, false),
    ];
    accounts.extend(recipients.iter().map(|key| AccountMeta::new(*key, false)));

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create reopen_stalled_round instruction
pub fn reopen_stalled_round(
    program_id: &Pubkey,
    lottery: &Pubkey,
    coordinator: &Pubkey,
    subscription: &Pubkey,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*lottery, false),
        AccountMeta::new(*coordinator, false),
        AccountMeta::new(*subscription, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: LotteryInstruction::ReopenStalledRound {}.pack(),
    }
}
