// Lottery Program
// Time-boxed rounds with exact-fee entries; the winner is drawn from a
// coordinator-delivered random word and paid the whole pool.

pub mod config;
pub mod entrypoint;
pub mod error;
pub mod events;
pub mod instruction;
pub mod keeper;
pub mod lottery;
pub mod processor;
pub mod randomness;
pub mod state;
pub mod utils;
pub mod vrf_mock;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
